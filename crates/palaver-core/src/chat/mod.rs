//! Message store adapter.
//!
//! `store` defines the remote document-store port and the `LiveWindow`
//! subscription handle; `feed` turns user intents into persisted messages
//! and live windows.

pub mod feed;
pub mod store;

pub use feed::{ChatFeed, PendingAttachment};
pub use store::{LiveWindow, MessageStore};
