//! In-memory push gateway.
//!
//! Implements `PushGateway` from `palaver-core` with a settable permission
//! answer, a fixed device token, and a `deliver` hook standing in for the
//! platform's foreground delivery callback.

use palaver_core::notify::gateway::PushGateway;
use palaver_types::error::NotifyError;
use palaver_types::notify::{DeviceToken, NotificationPermission, PushNotification};
use tokio::sync::broadcast;

use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory implementation of `PushGateway`.
pub struct MemoryPushGateway {
    granted: AtomicBool,
    token: DeviceToken,
    messages: broadcast::Sender<PushNotification>,
}

impl MemoryPushGateway {
    /// Gateway that grants permission and issues `token`.
    pub fn new(token: impl Into<String>) -> Self {
        let (messages, _) = broadcast::channel(16);
        Self {
            granted: AtomicBool::new(true),
            token: DeviceToken::new(token),
            messages,
        }
    }

    /// Change the platform's permission answer.
    pub fn set_permission(&self, permission: NotificationPermission) {
        self.granted.store(
            permission == NotificationPermission::Granted,
            Ordering::SeqCst,
        );
    }

    /// Deliver a foreground notification to all current subscribers.
    pub fn deliver(&self, notification: PushNotification) {
        let _ = self.messages.send(notification);
    }
}

impl PushGateway for MemoryPushGateway {
    async fn request_permission(&self) -> Result<NotificationPermission, NotifyError> {
        if self.granted.load(Ordering::SeqCst) {
            Ok(NotificationPermission::Granted)
        } else {
            Ok(NotificationPermission::Denied)
        }
    }

    async fn device_token(&self) -> Result<DeviceToken, NotifyError> {
        if !self.granted.load(Ordering::SeqCst) {
            return Err(NotifyError::Gateway(
                "device token requested without permission".into(),
            ));
        }
        Ok(self.token.clone())
    }

    fn foreground_messages(&self) -> broadcast::Receiver<PushNotification> {
        self.messages.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permission_answer_is_settable() {
        let gateway = MemoryPushGateway::new("t-1");
        assert_eq!(
            gateway.request_permission().await.unwrap(),
            NotificationPermission::Granted
        );

        gateway.set_permission(NotificationPermission::Denied);
        assert_eq!(
            gateway.request_permission().await.unwrap(),
            NotificationPermission::Denied
        );
    }

    #[tokio::test]
    async fn token_requires_permission() {
        let gateway = MemoryPushGateway::new("t-1");
        gateway.set_permission(NotificationPermission::Denied);
        assert!(gateway.device_token().await.is_err());
    }

    #[tokio::test]
    async fn delivered_notifications_reach_subscribers() {
        let gateway = MemoryPushGateway::new("t-1");
        let mut messages = gateway.foreground_messages();

        let notification = PushNotification {
            title: Some("hi".to_string()),
            body: None,
            data: serde_json::Value::Null,
        };
        gateway.deliver(notification.clone());
        assert_eq!(messages.recv().await.unwrap(), notification);
    }
}
