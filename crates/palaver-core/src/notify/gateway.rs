//! Push gateway and device-token store trait definitions.

use palaver_types::error::{NotifyError, StoreWriteError};
use palaver_types::notify::{DeviceToken, NotificationPermission, PushNotification};
use tokio::sync::broadcast;

/// Port for the platform push notification service.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in `palaver-infra`.
pub trait PushGateway: Send + Sync {
    /// Ask the platform for notification permission.
    ///
    /// Denial is an answer, not an error; only gateway failures error.
    fn request_permission(
        &self,
    ) -> impl std::future::Future<Output = Result<NotificationPermission, NotifyError>> + Send;

    /// Obtain the device token targeting this client instance.
    ///
    /// Only valid once permission has been granted.
    fn device_token(
        &self,
    ) -> impl std::future::Future<Output = Result<DeviceToken, NotifyError>> + Send;

    /// Subscribe to notifications delivered while the app is active.
    fn foreground_messages(&self) -> broadcast::Receiver<PushNotification>;
}

/// Port for the remote association of device tokens with user identities,
/// consumed by server-side fan-out.
pub trait DeviceTokenStore: Send + Sync {
    /// Associate `token` with `uid`.
    ///
    /// Idempotent: registering the same token twice leaves exactly one
    /// record (keyed by token).
    fn register(
        &self,
        token: &DeviceToken,
        uid: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreWriteError>> + Send;
}
