//! Terminal User Interface rendering module
//!
//! Renders the active view from the controller's per-resource state: a list
//! table or a detail panel, plus the search bar, status footer, and modal
//! overlays. Panels render independently as resources settle, so a slow
//! endpoint never blanks the rest of the screen.
//!
//! - `header` - context bar with org/project and aggregate status
//! - `help` - help overlay showing keybindings
//! - `dialog` - confirmation dialogs for destructive operations
//! - `command_box` - command mode input (`:` key)
//! - `notifications` - toast messages for async mutations

mod command_box;
mod dialog;
mod header;
mod help;
mod notifications;

use crate::app::{App, Mode};
use remoteview::controller::{FetchState, FetchStatus};
use remoteview::view::{extract_json_value, format_bytes, format_timestamp_short, ColumnFormat, ViewDef};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);

    match app.mode {
        Mode::Describe => render_describe_view(f, app, chunks[1]),
        _ => render_main_content(f, app, chunks[1]),
    }

    render_footer(f, app, chunks[2]);

    // Overlays
    match app.mode {
        Mode::Help => help::render(f),
        Mode::Confirm | Mode::Warning => dialog::render(f, app),
        Mode::Command => command_box::render(f, app),
        _ => {}
    }

    notifications::render_toast(f, app);
}

fn render_main_content(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(view) = app.current_view() else {
        let msg = Paragraph::new("Unknown view").style(Style::default().fg(Color::Red));
        f.render_widget(msg, area);
        return;
    };

    if view.is_list() {
        // Search bar sits above the table whenever it has content or focus.
        let show_search = app.mode == Mode::Search || !app.search_text.is_empty();
        if show_search {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(area);
            render_search_bar(f, app, chunks[0]);
            render_list(f, app, view, chunks[1]);
        } else {
            render_list(f, app, view, area);
        }
    } else {
        render_detail(f, app, view, area);
    }
}

fn render_search_bar(f: &mut Frame, app: &App, area: Rect) {
    let style = if app.mode == Mode::Search {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let display = if app.mode == Mode::Search {
        format!("/{}_", app.search_text)
    } else {
        format!("/{}", app.search_text)
    };

    f.render_widget(Paragraph::new(Line::from(Span::styled(display, style))), area);
}

/// Render the view's list resource as a table, or its in-between states.
fn render_list(f: &mut Frame, app: &mut App, view: &'static ViewDef, area: Rect) {
    let Some(list) = view.list_resource.as_deref() else {
        return;
    };

    let state = app.controller.read(list);

    // No payload yet: show the resource-level state instead of a table.
    if app.items.is_empty() {
        match state {
            Some(FetchState {
                status: FetchStatus::Pending,
                payload: None,
                ..
            })
            | None => {
                let msg = Paragraph::new("Loading...")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(titled_block(view, app, list));
                f.render_widget(msg, area);
                return;
            }
            Some(FetchState {
                status: FetchStatus::Failure,
                error,
                ..
            }) => {
                let message = error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request failed".to_string());
                let msg = Paragraph::new(message)
                    .style(Style::default().fg(Color::Red))
                    .block(titled_block(view, app, list));
                f.render_widget(msg, area);
                return;
            }
            _ => {
                let empty = if app.location.search().is_empty() {
                    view.empty_message.as_deref()
                } else {
                    view.empty_search_message.as_deref()
                };
                let msg = Paragraph::new(empty.unwrap_or("Nothing here."))
                    .style(Style::default().fg(Color::DarkGray))
                    .block(titled_block(view, app, list));
                f.render_widget(msg, area);
                return;
            }
        }
    }

    // Virtual scrolling: account for borders + header row.
    let table_height = area.height.saturating_sub(3) as usize;
    app.update_viewport(table_height);
    app.ensure_visible();
    let visible = app.visible_range();

    let header_cells: Vec<Cell> = view
        .columns
        .iter()
        .map(|col| {
            Cell::from(col.header.as_str()).style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    let header_row = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app.items[visible.clone()]
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let absolute = visible.start + i;
            let cells: Vec<Cell> = view
                .columns
                .iter()
                .map(|col| Cell::from(format_cell(item, &col.json_path, col.format)))
                .collect();

            let style = if absolute == app.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(cells).style(style)
        })
        .collect();

    let widths: Vec<Constraint> = view
        .columns
        .iter()
        .map(|col| Constraint::Length(col.width))
        .collect();

    let table = Table::new(rows, widths)
        .header(header_row)
        .block(titled_block(view, app, list));

    f.render_widget(table, area);
}

fn format_cell(item: &serde_json::Value, json_path: &str, format: ColumnFormat) -> String {
    let raw = extract_json_value(item, json_path);
    match format {
        ColumnFormat::Text => raw,
        ColumnFormat::Bytes => raw
            .parse::<u64>()
            .map(format_bytes)
            .unwrap_or(raw),
        ColumnFormat::Date => {
            if raw == "-" {
                raw
            } else {
                format_timestamp_short(&raw)
            }
        }
    }
}

/// Table block with count, total and page indicators in the title.
fn titled_block(view: &'static ViewDef, app: &App, list: &str) -> Block<'static> {
    let count = app.items.len();
    let total = app.controller.store().total(list);

    let count_info = match total {
        Some(total) if total as usize != count => format!("[{}/{}]", count, total),
        _ => format!("[{}]", count),
    };

    let page_info = app
        .controller
        .store()
        .page_links(list)
        .map(|links| {
            let mut s = String::new();
            if links.has_previous() {
                s.push('<');
            }
            if links.has_next() {
                s.push('>');
            }
            if s.is_empty() {
                s
            } else {
                format!(" {}", s)
            }
        })
        .unwrap_or_default();

    Block::default().borders(Borders::ALL).title(format!(
        " {} {}{} ",
        view.title, count_info, page_info
    ))
}

/// Detail panel: one labeled line per field, each rendered from its own
/// resource's state so partial results show up as they arrive.
fn render_detail(f: &mut Frame, app: &App, view: &'static ViewDef, area: Rect) {
    let lines: Vec<Line> = view
        .detail_fields
        .iter()
        .map(|field| {
            let label = Span::styled(
                format!("{:>16}: ", field.label),
                Style::default().fg(Color::Cyan),
            );

            let value = match app.controller.read(&field.resource) {
                Some(FetchState {
                    status: FetchStatus::Success,
                    payload: Some(payload),
                    ..
                }) => {
                    let raw = extract_json_value(payload, &field.json_path);
                    let text = match field.format {
                        ColumnFormat::Date if raw != "-" => format_timestamp_short(&raw),
                        _ => raw,
                    };
                    Span::styled(text, Style::default().fg(Color::White))
                }
                Some(FetchState {
                    status: FetchStatus::Failure,
                    ..
                }) => Span::styled("unavailable", Style::default().fg(Color::Red)),
                _ => Span::styled("...", Style::default().fg(Color::DarkGray)),
            };

            Line::from(vec![label, value])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.title));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_describe_view(f: &mut Frame, app: &App, area: Rect) {
    let json = app.selected_item_json().unwrap_or_default();
    let lines: Vec<Line> = json
        .lines()
        .skip(app.describe_scroll)
        .map(|l| Line::from(l.to_string()))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Details (Esc to close) ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    // Errors win the footer; otherwise show key hints.
    let line = if let Some(error) = &app.error_message {
        Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(Color::Red),
        ))
    } else if let Some(error) = app.first_error() {
        Line::from(Span::styled(error, Style::default().fg(Color::Red)))
    } else {
        Line::from(Span::styled(
            " j/k move  / search  : command  Tab view  [/] pages  R refresh  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ))
    };

    f.render_widget(Paragraph::new(line), area);
}
