//! Shared domain types for Palaver.
//!
//! This crate contains the core domain types used across the Palaver chat
//! client: sessions, chat messages, attachments, device tokens, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod error;
pub mod message;
pub mod notify;
pub mod session;
pub mod upload;
