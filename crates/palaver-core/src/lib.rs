//! Session and messaging synchronization logic for Palaver.
//!
//! This crate defines the "ports" (collaborator traits) that the
//! infrastructure layer implements -- identity provider, message store,
//! object store, push gateway, navigator -- and the services built on them.
//! It depends only on `palaver-types` and never on `palaver-infra` or any
//! network/IO crate.
//!
//! Everything is single-logical-thread cooperative: remote calls suspend,
//! live values are watch/broadcast subscriptions, and every spawned task is
//! owned by a handle or guard that cancels it on drop.

pub mod auth;
pub mod chat;
pub mod notify;
pub mod route;
pub mod upload;
