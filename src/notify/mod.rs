//! Transient messages raised by the controller for the presentation layer.

use std::{collections::VecDeque, time::Duration};

use crate::domain::EntityId;

pub const SAVED: &str = "Data updated";
pub const CONFLICT: &str =
    "Error updating the data. Somebody else has updated the record while you were making changes.";
pub const INVALID: &str = "Failed to update the data. Check again that all values are valid";

const DEFAULT_DURATION: Duration = Duration::from_secs(5);
const NOT_FOUND_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    BottomStart,
    Middle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub placement: Placement,
    pub duration: Duration,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            placement: Placement::BottomStart,
            duration: DEFAULT_DURATION,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::info(message)
        }
    }

    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn saved() -> Self {
        Self::info(SAVED)
    }

    /// Shown mid-screen so the user cannot miss that their save was rejected.
    pub fn conflict() -> Self {
        Self::error(CONFLICT).placed(Placement::Middle)
    }

    pub fn invalid() -> Self {
        Self::info(INVALID)
    }

    pub fn not_found(label: &str, id: impl std::fmt::Display) -> Self {
        Self::info(format!("The requested {label} was not found, ID = {id}"))
            .lasting(NOT_FOUND_DURATION)
    }

    pub fn deleted(label: &str, id: EntityId) -> Self {
        Self::info(format!("Deleted {label} {id}"))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::error(message)
    }
}

/// FIFO of notifications not yet shown.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: VecDeque<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        self.queue.push_back(notification);
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
