//! Application State
//!
//! Central application state for remoteview. The app owns one controller
//! per mounted view, the current location (the address-bar analog), and the
//! interaction state around them. All remote data lives in the controller's
//! result store; the app only caches the extracted list items for rendering.

use crate::config::Config;
use crate::notification::NotificationManager;
use remoteview::api::{format_api_error, ApiError, HttpTransport, Method};
use remoteview::controller::{
    resolve, AggregateStatus, Controller, ControllerEvent, FetchStatus, MutationRequest,
};
use remoteview::route::Location;
use remoteview::view::{extract_json_value, get_all_view_keys, get_view, ActionDef, ViewDef};
use serde_json::Value;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a search edit may rest before it is committed to the location.
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default viewport height (will be updated during render based on terminal size)
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,   // Viewing list/detail
    Search,   // / search input
    Command,  // : command input
    Help,     // ? help popup
    Confirm,  // Confirmation dialog
    Warning,  // Warning/info dialog (OK only)
    Describe, // Viewing JSON details of selected item
}

/// Mutation awaiting confirmation
#[derive(Debug, Clone)]
pub struct PendingAction {
    /// Controller resource name the mutation targets
    pub resource: String,
    pub action_name: String,
    pub request: MutationRequest,
    pub item_label: String,
    pub message: String,
    pub destructive: bool,
    pub selected_yes: bool,
}

/// Main application state
pub struct App {
    transport: Arc<HttpTransport>,

    // Controller for the mounted view
    pub controller: Controller<HttpTransport>,

    // Current screen + route state
    pub view_key: String,
    pub location: Location,
    pub history: Vec<(String, Location)>,

    // List items extracted from the list resource's payload
    pub items: Vec<Value>,

    // Navigation state
    pub selected: usize,
    pub mode: Mode,

    // Search input (committed into the location after a debounce)
    pub search_text: String,
    search_pending_since: Option<Instant>,

    // Command input
    pub command_text: String,
    pub command_suggestions: Vec<String>,
    pub command_suggestion_selected: usize,

    // Confirmation
    pub pending_action: Option<PendingAction>,
    pending_notification: Option<Uuid>,

    // UI state
    pub error_message: Option<String>,
    pub warning_message: Option<String>,
    pub describe_scroll: usize,

    // Virtual scrolling
    pub viewport_height: usize,
    pub scroll_offset: usize,

    // Read-only mode
    pub readonly: bool,

    // Persistent configuration
    pub config: Config,

    // Notifications
    pub notifications: NotificationManager,
}

impl App {
    pub fn new(
        transport: Arc<HttpTransport>,
        config: Config,
        location: Location,
        initial_view: &str,
        readonly: bool,
    ) -> Self {
        let controller = Controller::new(Arc::clone(&transport));

        let mut app = Self {
            transport,
            controller,
            view_key: String::new(),
            location,
            history: Vec::new(),
            items: Vec::new(),
            selected: 0,
            mode: Mode::Normal,
            search_text: String::new(),
            search_pending_since: None,
            command_text: String::new(),
            command_suggestions: Vec::new(),
            command_suggestion_selected: 0,
            pending_action: None,
            pending_notification: None,
            error_message: None,
            warning_message: None,
            describe_scroll: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_offset: 0,
            readonly,
            config,
            notifications: NotificationManager::new(),
        };

        app.mount_view(initial_view);
        app
    }

    // =========================================================================
    // View Definition Access
    // =========================================================================

    pub fn current_view(&self) -> Option<&'static ViewDef> {
        get_view(&self.view_key)
    }

    pub fn list_resource(&self) -> Option<&'static str> {
        self.current_view()
            .and_then(|v| v.list_resource.as_deref())
    }

    pub fn get_available_commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = get_all_view_keys()
            .iter()
            .map(|s| s.to_string())
            .collect();

        // Add built-in commands
        commands.push("back".to_string());
        commands.push("refresh".to_string());
        commands.push("quit".to_string());

        commands.sort();
        commands
    }

    // =========================================================================
    // Mounting & Navigation
    // =========================================================================

    /// Replace the controller with a fresh one for `view_key` and kick off
    /// its fetches. The old controller is closed first, so any of its
    /// in-flight responses are dead on arrival.
    fn mount_view(&mut self, view_key: &str) {
        self.controller.close();
        self.controller = Controller::new(Arc::clone(&self.transport));

        self.view_key = view_key.to_string();
        self.items.clear();
        self.selected = 0;
        self.scroll_offset = 0;
        self.error_message = None;
        self.search_text = self.location.search().to_string();
        self.search_pending_since = None;

        self.run_current();
    }

    /// Resolve the current view's resources against the location and
    /// dispatch them. Resolution failures surface in the status line and
    /// leave the store empty.
    fn run_current(&mut self) {
        let Some(view) = self.current_view() else {
            self.error_message = Some(format!("Unknown view: {}", self.view_key));
            return;
        };

        match resolve(&view.resources, &self.location) {
            Ok(descriptors) => {
                self.controller.run_all(descriptors);
            }
            Err(e) => {
                self.error_message = Some(e.to_string());
            }
        }
    }

    pub fn navigate_to_view(&mut self, view_key: &str) {
        if get_view(view_key).is_none() {
            self.error_message = Some(format!("Unknown view: {}", view_key));
            return;
        }

        self.history
            .push((self.view_key.clone(), self.location.clone()));

        // A new screen starts with a clean query string.
        self.location.query.clear();
        self.mode = Mode::Normal;
        self.mount_view(view_key);
    }

    /// Cycle to the next view in registry order.
    pub fn navigate_to_next_view(&mut self) {
        let keys = get_all_view_keys();
        if keys.is_empty() {
            return;
        }
        let current = keys.iter().position(|k| *k == self.view_key);
        let next = match current {
            Some(i) => keys[(i + 1) % keys.len()],
            None => keys[0],
        };
        self.navigate_to_view(next);
    }

    /// Pop the history stack, restoring the previous screen together with
    /// its query string - search text and descriptors stay consistent.
    pub fn navigate_back(&mut self) {
        if let Some((view_key, location)) = self.history.pop() {
            self.location = location;
            self.mode = Mode::Normal;
            self.mount_view(&view_key);
        }
    }

    // =========================================================================
    // Data Fetching
    // =========================================================================

    /// Re-issue every resource fetch under a new epoch.
    pub fn refresh(&mut self) {
        self.error_message = None;
        self.run_current();
    }

    /// Full refresh from the first page.
    pub fn refresh_from_start(&mut self) {
        self.location.clear_cursor();
        self.refresh();
    }

    /// Per-tick housekeeping: commit rested search edits, then absorb any
    /// settlements that arrived since the last frame.
    pub fn tick(&mut self) {
        if let Some(since) = self.search_pending_since {
            if since.elapsed() >= SEARCH_DEBOUNCE {
                self.commit_search();
            }
        }

        while let Some(event) = self.controller.poll_settlement() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::ResourceSettled { name, status } => {
                tracing::debug!("resource `{}` settled: {:?}", name, status);
                if Some(name.as_str()) == self.list_resource() {
                    self.rebuild_items();
                }
            }
            ControllerEvent::MutationSucceeded { .. } => {
                if let Some(id) = self.pending_notification.take() {
                    self.notifications.mark_success(id);
                }
            }
            ControllerEvent::MutationFailed { error, .. } => {
                let message = match error.status {
                    Some(status) => format_api_error(&ApiError::Server {
                        status,
                        message: error.message.clone(),
                    }),
                    None => format_api_error(&ApiError::Network(error.message.clone())),
                };
                if let Some(id) = self.pending_notification.take() {
                    self.notifications.mark_error(id, message);
                }
            }
        }
    }

    /// Pull the item array out of the list resource's payload.
    fn rebuild_items(&mut self) {
        let Some(view) = self.current_view() else {
            return;
        };
        let Some(list) = view.list_resource.as_deref() else {
            return;
        };

        let items = self
            .controller
            .read(list)
            .and_then(|state| state.payload.as_ref())
            .map(|payload| {
                let root = if view.items_path.is_empty() {
                    Some(payload)
                } else {
                    view.items_path
                        .split('.')
                        .try_fold(payload, |v, part| v.get(part))
                };
                root.and_then(|v| v.as_array()).cloned().unwrap_or_default()
            })
            .unwrap_or_default();

        self.items = items;

        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
        if self.items.is_empty() {
            self.selected = 0;
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Record a keystroke in the search box; the location is only updated
    /// once the input rests (or on Enter).
    pub fn edit_search(&mut self) {
        self.search_pending_since = Some(Instant::now());
    }

    /// Push the search text into the location and refetch. Dropping the
    /// cursor is implicit: a new search restarts from the first page.
    pub fn commit_search(&mut self) {
        self.search_pending_since = None;
        if self.search_text == self.location.search() {
            return;
        }
        self.location.set_search(&self.search_text.clone());
        self.refresh();
    }

    pub fn clear_search(&mut self) {
        self.search_text.clear();
        self.commit_search();
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    pub fn next_page(&mut self) {
        let Some(list) = self.list_resource() else {
            return;
        };
        let cursor = self
            .controller
            .store()
            .page_links(list)
            .filter(|links| links.has_next())
            .and_then(|links| links.next.as_ref())
            .and_then(|link| link.cursor.clone());

        if let Some(cursor) = cursor {
            self.location.set_cursor(&cursor);
            self.refresh();
        }
    }

    pub fn prev_page(&mut self) {
        let Some(list) = self.list_resource() else {
            return;
        };
        let cursor = self
            .controller
            .store()
            .page_links(list)
            .filter(|links| links.has_previous())
            .and_then(|links| links.previous.as_ref())
            .and_then(|link| link.cursor.clone());

        if let Some(cursor) = cursor {
            self.location.set_cursor(&cursor);
            self.refresh();
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Build the pending mutation for an action on the selected item and
    /// either queue it behind a confirmation or fire it directly.
    pub fn request_action(&mut self, action: &ActionDef) {
        if self.readonly {
            self.show_warning("Read-only mode: actions are disabled");
            return;
        }

        let Some(view) = self.current_view() else {
            return;
        };
        let Some(resource) = view.list_resource.clone() else {
            return;
        };
        let Some(item) = self.selected_item() else {
            return;
        };

        let id_field = view.id_field.as_deref().unwrap_or("id");
        let id = extract_json_value(item, id_field);
        if id == "-" {
            return;
        }

        let name_field = view.name_field.as_deref().unwrap_or(id_field);
        let label = match extract_json_value(item, name_field) {
            l if l != "-" && !l.is_empty() => l,
            _ => id.clone(),
        };

        let method = match action.method.as_str() {
            "DELETE" => Method::Delete,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            other => {
                self.error_message = Some(format!("Unsupported action method: {}", other));
                return;
            }
        };

        let request = MutationRequest {
            method,
            query: vec![(action.id_param.clone(), id)],
            body: None,
        };

        let pending = PendingAction {
            resource,
            action_name: action.display_name.clone(),
            request,
            item_label: label.clone(),
            message: match action.confirm.as_ref().and_then(|c| c.message.clone()) {
                Some(message) => format!("{} '{}'?", message, label),
                None => format!("{} '{}'?", action.display_name, label),
            },
            destructive: action
                .confirm
                .as_ref()
                .map(|c| c.destructive)
                .unwrap_or(false),
            selected_yes: action
                .confirm
                .as_ref()
                .map(|c| c.default_yes)
                .unwrap_or(false),
        };

        if action.confirm.is_some() {
            self.pending_action = Some(pending);
            self.mode = Mode::Confirm;
        } else {
            self.execute_pending(pending);
        }
    }

    /// Hand the mutation to the controller. The outcome comes back through
    /// the settlement channel and lands in the toast created here.
    pub fn execute_pending(&mut self, pending: PendingAction) {
        let id = self
            .notifications
            .create(&pending.action_name, &pending.item_label);
        self.pending_notification = Some(id);

        if let Err(e) = self
            .controller
            .mutate(&pending.resource, pending.request)
        {
            self.notifications.mark_error(id, e.to_string());
            self.pending_notification = None;
        }
    }

    // =========================================================================
    // Selection & Scrolling
    // =========================================================================

    pub fn selected_item(&self) -> Option<&Value> {
        self.items.get(self.selected)
    }

    pub fn selected_item_json(&self) -> Option<String> {
        self.selected_item()
            .map(|item| serde_json::to_string_pretty(item).unwrap_or_default())
    }

    pub fn describe_line_count(&self) -> usize {
        self.selected_item_json()
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1).min(self.items.len() - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self) {
        if !self.items.is_empty() {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn page_down(&mut self, page_size: usize) {
        if !self.items.is_empty() {
            self.selected = (self.selected + page_size).min(self.items.len() - 1);
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    /// Update the viewport height (called from UI during render)
    pub fn update_viewport(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Ensure the selected item is visible in the viewport
    pub fn ensure_visible(&mut self) {
        if self.items.is_empty() {
            self.scroll_offset = 0;
            return;
        }

        let visible_height = self.viewport_height;
        let margin = 2; // Keep cursor at least this far from edge

        if self.selected < self.scroll_offset + margin {
            self.scroll_offset = self.selected.saturating_sub(margin);
        } else if self.selected >= self.scroll_offset + visible_height.saturating_sub(margin) {
            self.scroll_offset = self
                .selected
                .saturating_sub(visible_height.saturating_sub(margin + 1));
        }

        let max_offset = self.items.len().saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Get the range of visible items based on scroll offset and viewport
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_offset;
        let end = (self.scroll_offset + self.viewport_height).min(self.items.len());
        start..end
    }

    // =========================================================================
    // Aggregate Status Helpers
    // =========================================================================

    pub fn aggregate(&self) -> AggregateStatus {
        self.controller.aggregate()
    }

    /// First failing resource's error, for the status line.
    pub fn first_error(&self) -> Option<String> {
        let store = self.controller.store();
        let name = store
            .names()
            .find(|name| {
                store
                    .read(name)
                    .map(|s| s.status == FetchStatus::Failure)
                    .unwrap_or(false)
            })?
            .to_string();
        let state = store.read(&name)?;
        let error = state.error.as_ref()?;
        Some(format!("{}: {}", name, error.message))
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_search_mode(&mut self) {
        self.mode = Mode::Search;
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_text.clear();
        self.command_suggestions = self.get_available_commands();
        self.command_suggestion_selected = 0;
    }

    pub fn update_command_suggestions(&mut self) {
        let input = self.command_text.to_lowercase();
        let all_commands = self.get_available_commands();

        if input.is_empty() {
            self.command_suggestions = all_commands;
        } else {
            self.command_suggestions = all_commands
                .into_iter()
                .filter(|cmd| cmd.contains(&input))
                .collect();
        }

        if self.command_suggestion_selected >= self.command_suggestions.len() {
            self.command_suggestion_selected = 0;
        }
    }

    pub fn next_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            self.command_suggestion_selected =
                (self.command_suggestion_selected + 1) % self.command_suggestions.len();
        }
    }

    pub fn prev_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            if self.command_suggestion_selected == 0 {
                self.command_suggestion_selected = self.command_suggestions.len() - 1;
            } else {
                self.command_suggestion_selected -= 1;
            }
        }
    }

    pub fn apply_suggestion(&mut self) {
        if let Some(suggestion) = self
            .command_suggestions
            .get(self.command_suggestion_selected)
        {
            self.command_text = suggestion.clone();
            self.update_command_suggestions();
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_describe_mode(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.mode = Mode::Describe;
        self.describe_scroll = 0;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    pub fn execute_command(&mut self) -> bool {
        let command_text = if self.command_text.is_empty() {
            self.command_suggestions
                .get(self.command_suggestion_selected)
                .cloned()
                .unwrap_or_default()
        } else {
            self.command_text.clone()
        };

        let cmd = command_text.trim();
        if cmd.is_empty() {
            return false;
        }

        match cmd {
            "q" | "quit" => return true,
            "back" => self.navigate_back(),
            "refresh" => self.refresh_from_start(),
            _ => {
                if get_view(cmd).is_some() {
                    self.navigate_to_view(cmd);
                } else {
                    self.error_message = Some(format!("Unknown command: {}", cmd));
                }
            }
        }

        false
    }

    /// Shut the controller down; called once on quit.
    pub fn close(&mut self) {
        self.controller.close();
        if let Err(e) = self.config.set_last_view(&self.view_key.clone()) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
