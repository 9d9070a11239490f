//! Infrastructure layer for Palaver.
//!
//! Contains implementations of the collaborator traits defined in
//! `palaver-core`. The `memory` backend keeps everything in-process and is
//! used by headless development shells and the integration tests; a real
//! deployment swaps in implementations backed by the hosted identity,
//! document-store, object-storage, and push services.

pub mod memory;
