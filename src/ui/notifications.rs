//! Toast Notifications
//!
//! Renders the most recent mutation outcome as a transient toast in the
//! top-right corner.

use crate::app::App;
use crate::notification::NotificationStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_toast(f: &mut Frame, app: &App) {
    let Some(toast) = app.notifications.active_toast() else {
        return;
    };

    let color = match toast.status {
        NotificationStatus::Pending => Color::Yellow,
        NotificationStatus::Success => Color::Green,
        NotificationStatus::Error(_) => Color::Red,
    };

    let text = toast.toast_text();
    let width = (text.chars().count() as u16 + 4).min(f.area().width);
    let area = Rect {
        x: f.area().width.saturating_sub(width + 1),
        y: 1,
        width,
        height: 3,
    };

    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(color),
    )))
    .block(block);

    f.render_widget(paragraph, area);
}
