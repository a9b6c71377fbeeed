//! Help Overlay
//!
//! Keybinding reference popup.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const BINDINGS: &[(&str, &str)] = &[
    ("j/k, ↓/↑", "Move selection"),
    ("g / G", "Jump to top / bottom"),
    ("Enter, d", "Show item details"),
    ("/", "Search (applies as you pause)"),
    (":", "Command mode"),
    ("Tab", "Next view"),
    ("b, Backspace", "Back to previous view"),
    ("[ / ]", "Previous / next page"),
    ("R", "Refresh from the first page"),
    ("x, Del", "Delete selected item"),
    ("?", "Toggle this help"),
    ("q, Ctrl+C", "Quit"),
];

pub fn render(f: &mut Frame) {
    let popup_area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(key, description)| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<14}", key),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(*description, Style::default().fg(Color::White)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
