//! User-action state machines.
//!
//! DESIGN
//! ======
//! Each flow owns its form fields and phase. Submitting takes `&mut self`
//! across the network call, so one flow has at most one request in flight;
//! `can_submit()` exposes the same rule to whatever renders the button.
//!
//! Every action ends in an [`Outcome`]: the notification to show plus the
//! value produced on success. Failures leave the flow in its pre-action
//! state with the form fields intact.

pub mod auth;
pub mod compose;
pub mod feed;

#[cfg(test)]
pub(crate) mod test_helpers;

use crate::error::ApiError;
use crate::notify::Notification;

/// Result of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub notification: Notification,
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    pub(crate) fn success(value: T, notification: Notification) -> Self {
        Self { notification, value: Some(value) }
    }

    pub(crate) fn failure(notification: Notification) -> Self {
        Self { notification, value: None }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }
}

/// Map an API failure to a notification: the backend's message verbatim for
/// rejections, `fallback` for anything transport-shaped.
pub(crate) fn failure_notice(title: &str, fallback: &str, error: &ApiError) -> Notification {
    match error.rejection() {
        Some(message) => Notification::error(title, message),
        None => Notification::error("Error", fallback),
    }
}
