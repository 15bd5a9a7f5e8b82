//! Navigation capability.
//!
//! Controllers never change location themselves; they ask a [`Navigator`]
//! to go to a route path. A browser shell would assign `location.href`, the
//! CLI prints the target, and tests record it.

use std::sync::Mutex;

/// Route the client lands on after a successful login.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Route an administrator lands on after signing out.
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Performs full navigations to route paths.
pub trait Navigator: Send + Sync {
    /// Navigate to `path`. Navigation is unconditional and fire-and-forget.
    fn navigate(&self, path: &str);
}

/// A navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path navigated to, oldest first.
    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// The most recent navigation target.
    pub fn last(&self) -> Option<String> {
        self.visited().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(path.to_owned());
    }
}
