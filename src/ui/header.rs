//! Header Bar
//!
//! Context line with org/project, the active view, and the aggregate
//! fetch status.

use crate::app::App;
use remoteview::controller::AggregateStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let org = app.location.param("org").unwrap_or("-");
    let project = app.location.param("project").unwrap_or("-");

    let (status_text, status_style) = match app.aggregate() {
        AggregateStatus::Loading => ("loading", Style::default().fg(Color::Yellow)),
        AggregateStatus::Error => ("error", Style::default().fg(Color::Red)),
        AggregateStatus::Ready => ("ready", Style::default().fg(Color::Green)),
    };

    let title_line = Line::from(vec![
        Span::styled(
            concat!(" remoteview ", env!("CARGO_PKG_VERSION")),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{}/{}", org, project),
            Style::default().fg(Color::White),
        ),
        if app.readonly {
            Span::styled("  [read-only]", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        },
    ]);

    let status_line = Line::from(vec![
        Span::styled(" view: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.view_key.clone(), Style::default().fg(Color::White)),
        Span::styled("  status: ", Style::default().fg(Color::DarkGray)),
        Span::styled(status_text, status_style.add_modifier(Modifier::BOLD)),
        if app.location.search().is_empty() {
            Span::raw("")
        } else {
            Span::styled(
                format!("  search: {}", app.location.search()),
                Style::default().fg(Color::DarkGray),
            )
        },
    ]);

    let block = Block::default().borders(Borders::BOTTOM);
    let paragraph = Paragraph::new(vec![title_line, status_line]).block(block);
    f.render_widget(paragraph, area);
}
