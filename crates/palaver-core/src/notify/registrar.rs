//! Notification registrar.
//!
//! Requests permission, registers the device token against the current
//! session's identity, and forwards foreground notifications to a handler.

use palaver_types::error::NotifyError;
use palaver_types::notify::{DeviceToken, NotificationPermission, PushNotification};
use palaver_types::session::Session;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use std::sync::Arc;

use crate::notify::gateway::{DeviceTokenStore, PushGateway};

/// Outcome of a registration attempt.
///
/// Permission denial and a signed-out session are reported outcomes the
/// caller can observe, not errors it must handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRegistration {
    Registered(DeviceToken),
    PermissionDenied,
    SignedOut,
}

/// Registers this client for push delivery and surfaces foreground
/// notifications.
pub struct NotificationRegistrar<G, T> {
    gateway: Arc<G>,
    tokens: Arc<T>,
    sessions: watch::Receiver<Session>,
}

/// Owns the foreground forwarding task; dropping the guard stops delivery.
pub struct ForegroundGuard {
    token: CancellationToken,
    _handle: JoinHandle<()>,
}

impl ForegroundGuard {
    /// Stop delivering notifications to the handler.
    pub fn stop(self) {
        self.token.cancel();
    }
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl<G, T> NotificationRegistrar<G, T>
where
    G: PushGateway,
    T: DeviceTokenStore,
{
    pub fn new(gateway: Arc<G>, tokens: Arc<T>, sessions: watch::Receiver<Session>) -> Self {
        Self {
            gateway,
            tokens,
            sessions,
        }
    }

    /// Request permission and, if granted, associate the device token with
    /// the current session's identity.
    ///
    /// Idempotent: the token store keys records by token, so repeated calls
    /// with the same token are no-ops. Gateway and store failures are
    /// returned as errors; denial and signed-out are reported outcomes.
    pub async fn register(&self) -> Result<TokenRegistration, NotifyError> {
        let uid = match self.sessions.borrow().profile() {
            Some(profile) => profile.uid.clone(),
            None => {
                warn!("device token registration skipped: no active session");
                return Ok(TokenRegistration::SignedOut);
            }
        };

        match self.gateway.request_permission().await? {
            NotificationPermission::Denied => {
                warn!(uid = %uid, "notification permission denied");
                Ok(TokenRegistration::PermissionDenied)
            }
            NotificationPermission::Granted => {
                let token = self.gateway.device_token().await?;
                self.tokens.register(&token, &uid).await?;
                info!(uid = %uid, token = %token, "device token registered");
                Ok(TokenRegistration::Registered(token))
            }
        }
    }

    /// Deliver foreground notifications to `handler` until the returned
    /// guard is dropped.
    ///
    /// Notifications are not persisted or deduplicated.
    pub fn on_foreground<F>(&self, mut handler: F) -> ForegroundGuard
    where
        F: FnMut(PushNotification) + Send + 'static,
    {
        let mut messages = self.gateway.foreground_messages();
        let token = CancellationToken::new();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    received = messages.recv() => match received {
                        Ok(notification) => handler(notification),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "foreground notification stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        ForegroundGuard {
            token,
            _handle: handle,
        }
    }
}
