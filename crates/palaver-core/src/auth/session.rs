//! Session manager owning the live session value.
//!
//! The manager is the single writer of a `watch` channel carrying the
//! current `Session`; every other component reads through `current()` or a
//! `subscribe()`d receiver. One provider subscription is held for the
//! manager's lifetime and released when the manager is dropped.

use palaver_types::error::AuthOperationError;
use palaver_types::session::{Session, UserProfile};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use std::sync::Arc;

use crate::auth::provider::IdentityProvider;
use crate::route::{Navigator, Route};

/// Owns the signed-in user's identity and drives sign-in/sign-out.
///
/// Construction subscribes to the provider's auth-change stream; `Drop`
/// aborts the listener task, so the subscription never outlives the manager.
pub struct SessionManager<P, N> {
    provider: Arc<P>,
    navigator: N,
    sessions: watch::Sender<Session>,
    listener: JoinHandle<()>,
}

impl<P, N> SessionManager<P, N>
where
    P: IdentityProvider,
    N: Navigator,
{
    pub fn new(provider: Arc<P>, navigator: N) -> Self {
        let (sessions, _) = watch::channel(Session::SignedOut);
        let mut changes = provider.auth_changes();
        let forward = sessions.clone();
        let listener = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(session) => {
                        debug!(signed_in = session.is_signed_in(), "provider auth change");
                        publish(&forward, session);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // The watch channel only cares about the latest value.
                        warn!(skipped, "auth change stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self {
            provider,
            navigator,
            sessions,
            listener,
        }
    }

    /// The latest known session.
    pub fn current(&self) -> Session {
        self.sessions.borrow().clone()
    }

    /// Subscribe to the live session stream.
    ///
    /// The receiver observes every session transition, including
    /// provider-driven ones such as external revocation.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.sessions.subscribe()
    }

    /// Run an interactive sign-in.
    ///
    /// On success the live session is updated and the UI is navigated to the
    /// chat view. On failure or cancellation the session is unchanged and
    /// the error is returned to the caller.
    pub async fn login(&self) -> Result<UserProfile, AuthOperationError> {
        let profile = self.provider.sign_in().await.map_err(|err| {
            warn!(error = %err, "sign-in failed; session unchanged");
            err
        })?;

        publish(&self.sessions, Session::SignedIn(profile.clone()));
        self.navigator.navigate(Route::Chat);
        info!(uid = %profile.uid, "signed in");
        Ok(profile)
    }

    /// Sign out with the provider, then clear the local session.
    ///
    /// If the remote sign-out fails, local state is NOT cleared: showing a
    /// signed-out UI while the user is still authenticated server-side is
    /// worse than surfacing the failure.
    pub async fn logout(&self) -> Result<(), AuthOperationError> {
        self.provider.sign_out().await.map_err(|err| {
            warn!(error = %err, "sign-out failed; keeping local session");
            err
        })?;

        publish(&self.sessions, Session::SignedOut);
        self.navigator.navigate(Route::Login);
        info!("signed out");
        Ok(())
    }
}

impl<P, N> Drop for SessionManager<P, N> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Update the watch channel only on an actual transition, so subscribers do
/// not see duplicate notifications when the provider echoes a change the
/// manager already applied.
fn publish(sessions: &watch::Sender<Session>, session: Session) {
    sessions.send_if_modified(|current| {
        if *current == session {
            false
        } else {
            *current = session;
            true
        }
    });
}
