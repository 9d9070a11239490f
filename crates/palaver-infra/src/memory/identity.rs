//! In-memory identity provider.
//!
//! Implements `IdentityProvider` from `palaver-core` with a fixed principal
//! and scripted failures. The `revoke` hook emits a provider-driven
//! signed-out change, the way a hosted provider reports a token revoked on
//! another device.

use palaver_core::auth::provider::IdentityProvider;
use palaver_types::error::AuthOperationError;
use palaver_types::session::{Session, UserProfile};
use tokio::sync::broadcast;
use tracing::debug;

use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory implementation of `IdentityProvider`.
pub struct MemoryIdentityProvider {
    profile: UserProfile,
    changes: broadcast::Sender<Session>,
    fail_next_sign_in: AtomicBool,
    fail_next_sign_out: AtomicBool,
}

impl MemoryIdentityProvider {
    pub fn new(profile: UserProfile) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            profile,
            changes,
            fail_next_sign_in: AtomicBool::new(false),
            fail_next_sign_out: AtomicBool::new(false),
        }
    }

    /// Make the next `sign_in` fail.
    pub fn fail_next_sign_in(&self) {
        self.fail_next_sign_in.store(true, Ordering::SeqCst);
    }

    /// Make the next `sign_out` fail.
    pub fn fail_next_sign_out(&self) {
        self.fail_next_sign_out.store(true, Ordering::SeqCst);
    }

    /// Revoke the credential from outside this client.
    ///
    /// Subscribers observe a signed-out session change that no local call
    /// initiated.
    pub fn revoke(&self) {
        debug!(uid = %self.profile.uid, "credential revoked externally");
        let _ = self.changes.send(Session::SignedOut);
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self) -> Result<UserProfile, AuthOperationError> {
        if self.fail_next_sign_in.swap(false, Ordering::SeqCst) {
            return Err(AuthOperationError::SignIn("provider unavailable".into()));
        }
        let _ = self.changes.send(Session::SignedIn(self.profile.clone()));
        Ok(self.profile.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthOperationError> {
        if self.fail_next_sign_out.swap(false, Ordering::SeqCst) {
            return Err(AuthOperationError::SignOut("provider unavailable".into()));
        }
        let _ = self.changes.send(Session::SignedOut);
        Ok(())
    }

    fn auth_changes(&self) -> broadcast::Receiver<Session> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryIdentityProvider {
        MemoryIdentityProvider::new(UserProfile::new("u-1").with_display_name("Ada"))
    }

    #[tokio::test]
    async fn sign_in_returns_the_principal_and_emits_a_change() {
        let provider = provider();
        let mut changes = provider.auth_changes();

        let profile = provider.sign_in().await.unwrap();
        assert_eq!(profile.uid, "u-1");
        assert_eq!(
            changes.recv().await.unwrap(),
            Session::SignedIn(profile)
        );
    }

    #[tokio::test]
    async fn scripted_sign_in_failure_fires_once() {
        let provider = provider();
        provider.fail_next_sign_in();

        assert!(provider.sign_in().await.is_err());
        assert!(provider.sign_in().await.is_ok());
    }

    #[tokio::test]
    async fn revoke_emits_signed_out_without_a_local_call() {
        let provider = provider();
        let mut changes = provider.auth_changes();

        provider.revoke();
        assert_eq!(changes.recv().await.unwrap(), Session::SignedOut);
    }
}
