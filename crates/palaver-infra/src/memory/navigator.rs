//! Recording navigator for headless shells.

use palaver_core::route::{Navigator, Route};

use std::sync::Arc;
use std::sync::Mutex;

/// Records navigation requests instead of rendering views.
///
/// Stands in for the UI/routing collaborator in headless development
/// shells and tests.
#[derive(Default, Clone)]
pub struct RecordingNavigator {
    routes: Arc<Mutex<Vec<Route>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All navigation requests observed so far, in order.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// The most recent navigation request, if any.
    pub fn current(&self) -> Option<Route> {
        self.routes().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route);
    }
}
