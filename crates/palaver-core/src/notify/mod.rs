//! Push notification registration and foreground delivery.
//!
//! `gateway` defines the platform push ports; `registrar` ties permission,
//! token issuance, and token persistence to the current session.

pub mod gateway;
pub mod registrar;

pub use gateway::{DeviceTokenStore, PushGateway};
pub use registrar::{ForegroundGuard, NotificationRegistrar, TokenRegistration};
