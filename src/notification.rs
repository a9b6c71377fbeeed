//! Notification System
//!
//! Tracks mutation outcomes as toast messages with a bounded history.
//! Mutations are fire-and-forget; these toasts are how the user learns
//! whether a delete landed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Status of a notification/operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Operation has been submitted, waiting for the server
    Pending,
    /// Operation completed successfully
    Success,
    /// Operation failed with error message
    Error(String),
}

impl NotificationStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "◯",
            Self::Success => "✓",
            Self::Error(_) => "✗",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    /// Action display name, e.g. "Delete"
    pub action: String,
    /// Label of the item acted on
    pub resource: String,
    pub status: NotificationStatus,
    pub created_at: Instant,
    pub completed_at: Option<Instant>,
}

impl Notification {
    fn new(action: String, resource: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            resource,
            status: NotificationStatus::Pending,
            created_at: Instant::now(),
            completed_at: None,
        }
    }

    /// Format for toast display
    pub fn toast_text(&self) -> String {
        match &self.status {
            NotificationStatus::Pending => {
                format!(
                    "{} {} '{}'...",
                    self.status.icon(),
                    self.action,
                    self.resource
                )
            }
            NotificationStatus::Success => {
                format!(
                    "{} {} '{}' succeeded",
                    self.status.icon(),
                    self.action,
                    self.resource
                )
            }
            NotificationStatus::Error(message) => {
                format!(
                    "{} {} '{}' failed: {}",
                    self.status.icon(),
                    self.action,
                    self.resource,
                    message
                )
            }
        }
    }
}

/// Manages toast lifetime and history
pub struct NotificationManager {
    history: VecDeque<Notification>,
    pub toast_duration: Duration,
    pub max_history: usize,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            toast_duration: Duration::from_secs(5),
            max_history: 50,
        }
    }

    /// Record a newly submitted operation and return its ID
    pub fn create(&mut self, action: &str, resource: &str) -> Uuid {
        let notification = Notification::new(action.to_string(), resource.to_string());
        let id = notification.id;

        self.history.push_front(notification);
        self.history.truncate(self.max_history);
        id
    }

    pub fn mark_success(&mut self, id: Uuid) {
        if let Some(n) = self.find_mut(id) {
            n.status = NotificationStatus::Success;
            n.completed_at = Some(Instant::now());
        }
    }

    pub fn mark_error(&mut self, id: Uuid, error: String) {
        if let Some(n) = self.find_mut(id) {
            n.status = NotificationStatus::Error(error);
            n.completed_at = Some(Instant::now());
        }
    }

    /// The notification to show as a toast right now, if any. Terminal
    /// notifications expire after `toast_duration`; pending ones stay up.
    pub fn active_toast(&self) -> Option<&Notification> {
        self.history.front().filter(|n| match n.completed_at {
            Some(done) => done.elapsed() < self.toast_duration,
            None => true,
        })
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn find_mut(&mut self, id: Uuid) -> Option<&mut Notification> {
        self.history.iter_mut().find(|n| n.id == id)
    }
}
