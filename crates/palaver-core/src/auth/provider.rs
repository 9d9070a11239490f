//! IdentityProvider trait definition.
//!
//! The external identity provider performs interactive sign-in, revocable
//! sign-out, and emits asynchronous session-change events -- including
//! changes not initiated by this client (token expiry, external sign-out).

use palaver_types::error::AuthOperationError;
use palaver_types::session::{Session, UserProfile};
use tokio::sync::broadcast;

/// Port for the external identity provider.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in `palaver-infra`.
pub trait IdentityProvider: Send + Sync {
    /// Run an interactive sign-in and return the signed-in principal.
    ///
    /// Cancellation by the user surfaces as `AuthOperationError::Cancelled`.
    fn sign_in(
        &self,
    ) -> impl std::future::Future<Output = Result<UserProfile, AuthOperationError>> + Send;

    /// Revoke the current credential with the provider.
    fn sign_out(
        &self,
    ) -> impl std::future::Future<Output = Result<(), AuthOperationError>> + Send;

    /// Subscribe to provider-driven session changes.
    ///
    /// The stream carries every auth-state transition the provider observes,
    /// whether or not this client initiated it.
    fn auth_changes(&self) -> broadcast::Receiver<Session>;
}
