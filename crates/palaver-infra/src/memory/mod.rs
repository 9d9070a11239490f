//! In-process backend: in-memory implementations of every collaborator
//! trait in `palaver-core`.
//!
//! Suitable for headless development shells and integration tests; a real
//! deployment replaces these with implementations backed by the hosted
//! services.

pub mod identity;
pub mod message_store;
pub mod navigator;
pub mod object_store;
pub mod push;

pub use identity::MemoryIdentityProvider;
pub use message_store::{MemoryDeviceTokenStore, MemoryMessageStore};
pub use navigator::RecordingNavigator;
pub use object_store::MemoryObjectStore;
pub use push::MemoryPushGateway;
