//! Event Handling
//!
//! Keyboard and event handling for remoteview.

use crate::app::{App, Mode};
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;

/// Handle events, returns true if app should quit
pub fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return handle_key_event(app, key.code, key.modifiers);
        }
    }
    Ok(false)
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers),
        Mode::Search => handle_search_mode(app, code, modifiers),
        Mode::Command => handle_command_mode(app, code, modifiers),
        Mode::Help => handle_help_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code),
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Describe => handle_describe_mode(app, code, modifiers),
    }
}

fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        // Quit
        KeyCode::Char('q') => return Ok(true),

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Char('g') | KeyCode::Home => app.go_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.go_to_bottom(),
        KeyCode::PageDown => app.page_down(10),
        KeyCode::PageUp => app.page_up(10),

        // Ctrl+D/U for page navigation
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_down(10);
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_up(10);
        }

        // Pagination
        KeyCode::Char(']') => app.next_page(),
        KeyCode::Char('[') => app.prev_page(),

        // Refresh
        KeyCode::Char('R') => app.refresh_from_start(),

        // Describe/Enter
        KeyCode::Enter | KeyCode::Char('d') => app.enter_describe_mode(),

        // Search
        KeyCode::Char('/') => app.enter_search_mode(),

        // Command mode
        KeyCode::Char(':') => app.enter_command_mode(),

        // Help
        KeyCode::Char('?') => app.enter_help_mode(),

        // Cycle views
        KeyCode::Tab => app.navigate_to_next_view(),

        // Back navigation
        KeyCode::Backspace | KeyCode::Left | KeyCode::Char('b') => app.navigate_back(),

        // Delete action with Delete key
        KeyCode::Delete => {
            if let Some(view) = app.current_view() {
                let delete_action = view.actions.iter().find(|a| a.method == "DELETE");
                if let Some(action) = delete_action {
                    app.request_action(action);
                }
            }
        }

        // Action shortcuts declared by the view
        KeyCode::Char(c) => {
            if let Some(view) = app.current_view() {
                if let Some(action) = view.action_by_shortcut(c) {
                    app.request_action(action);
                }
            }
        }

        _ => {}
    }

    Ok(false)
}

fn handle_search_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.clear_search();
            app.exit_mode();
        }
        KeyCode::Enter => {
            app.commit_search();
            app.exit_mode();
        }
        KeyCode::Backspace => {
            app.search_text.pop();
            app.edit_search();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_text.push(c);
            app.edit_search();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_command_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        }
        KeyCode::Enter => {
            let should_quit = app.execute_command();
            app.exit_mode();
            return Ok(should_quit);
        }
        KeyCode::Backspace => {
            app.command_text.pop();
            app.update_command_suggestions();
        }
        KeyCode::Tab | KeyCode::Right => {
            app.apply_suggestion();
        }
        KeyCode::Down => {
            app.next_suggestion();
        }
        KeyCode::Up => {
            app.prev_suggestion();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_text.push(c);
            app.update_command_suggestions();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.exit_mode();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            app.exit_mode();
        }
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = false;
            }
        }
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(pending) = app.pending_action.take() {
                if pending.selected_yes || code == KeyCode::Char('y') || code == KeyCode::Char('Y')
                {
                    app.execute_pending(pending);
                }
            }
            app.exit_mode();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_warning_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Enter => {
            app.warning_message = None;
            app.exit_mode();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_describe_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
            app.exit_mode();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.describe_scroll = app.describe_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.describe_scroll = app.describe_scroll.saturating_sub(1);
        }
        KeyCode::PageDown => {
            app.describe_scroll = app.describe_scroll.saturating_add(10);
        }
        KeyCode::PageUp => {
            app.describe_scroll = app.describe_scroll.saturating_sub(10);
        }
        KeyCode::Char('d') => {
            if modifiers.contains(KeyModifiers::CONTROL) {
                app.describe_scroll = app.describe_scroll.saturating_add(10);
            } else {
                app.exit_mode();
            }
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.describe_scroll = app.describe_scroll.saturating_sub(10);
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.describe_scroll = 0;
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.describe_scroll = app.describe_line_count().saturating_sub(30);
        }
        _ => {}
    }
    Ok(false)
}
