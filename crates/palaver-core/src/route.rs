//! Navigation port for the UI/routing collaborator.
//!
//! The session manager drives navigation after login and logout; the
//! presentation layer supplies the implementation.

/// Views the session manager can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Chat,
}

/// UI/routing collaborator invoked after auth transitions.
///
/// Implementations must not block: navigation is a notification, not a
/// remote call.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
