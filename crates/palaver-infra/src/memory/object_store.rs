//! In-memory object store with resumable uploads.
//!
//! Implements `ObjectStore` from `palaver-core`. Partial transfers live in
//! a concurrent map keyed by path; finalized objects are served under
//! `mem://` URLs. Failure injection (transient faults, quota, denied path
//! prefixes) exercises the pipeline's retry and permanent-failure paths.

use dashmap::{DashMap, DashSet};
use palaver_core::upload::store::ObjectStore;
use palaver_types::error::UploadError;
use tracing::debug;

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// In-memory implementation of `ObjectStore`.
#[derive(Default)]
pub struct MemoryObjectStore {
    partial: DashMap<String, Vec<u8>>,
    finalized: DashMap<String, Vec<u8>>,
    denied_prefixes: DashSet<String>,
    /// Remaining injected transient failures.
    transient_failures: AtomicU32,
    used_bytes: AtomicU64,
    quota_bytes: Option<u64>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap total stored bytes; writes beyond the cap fail with
    /// `QuotaExceeded`.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Fail the next `count` chunk writes with a transient error.
    pub fn inject_transient_failures(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Deny all writes under a path prefix (permanent failure).
    pub fn deny_prefix(&self, prefix: impl Into<String>) {
        self.denied_prefixes.insert(prefix.into());
    }

    /// The finalized object at `path`, if the transfer completed.
    pub fn finalized_object(&self, path: &str) -> Option<Vec<u8>> {
        self.finalized.get(path).map(|data| data.clone())
    }

    /// Number of incomplete transfers currently held.
    pub fn partial_count(&self) -> usize {
        self.partial.len()
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn write_chunk(&self, path: &str, offset: u64, data: &[u8]) -> Result<u64, UploadError> {
        if self
            .denied_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.key()))
        {
            return Err(UploadError::PermissionDenied(path.to_string()));
        }
        if self.take_transient_failure() {
            return Err(UploadError::Transient("injected connection reset".into()));
        }

        let mut buffer = self.partial.entry(path.to_string()).or_default();
        let acked = buffer.len() as u64;
        if offset < acked {
            // Duplicate of already-acknowledged bytes; idempotent resume.
            return Ok(acked);
        }
        if offset > acked {
            return Err(UploadError::Transient(format!(
                "chunk at offset {offset} leaves a gap after {acked} acknowledged bytes"
            )));
        }

        if let Some(quota) = self.quota_bytes {
            let used = self.used_bytes.load(Ordering::SeqCst);
            if used + data.len() as u64 > quota {
                return Err(UploadError::QuotaExceeded);
            }
        }

        buffer.extend_from_slice(data);
        self.used_bytes
            .fetch_add(data.len() as u64, Ordering::SeqCst);
        Ok(buffer.len() as u64)
    }

    async fn finalize(&self, path: &str) -> Result<String, UploadError> {
        let data = self
            .partial
            .remove(path)
            .map(|(_, data)| data)
            .unwrap_or_default();
        debug!(path = %path, bytes = data.len(), "object finalized");
        self.finalized.insert(path.to_string(), data);
        Ok(format!("mem://{path}"))
    }

    async fn abort(&self, path: &str) {
        if let Some((_, data)) = self.partial.remove(path) {
            self.used_bytes
                .fetch_sub(data.len() as u64, Ordering::SeqCst);
            debug!(path = %path, discarded = data.len(), "partial transfer aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_accumulate_and_finalize_to_a_url() {
        let store = MemoryObjectStore::new();

        assert_eq!(store.write_chunk("u/a.png", 0, &[1, 2]).await.unwrap(), 2);
        assert_eq!(store.write_chunk("u/a.png", 2, &[3]).await.unwrap(), 3);
        let url = store.finalize("u/a.png").await.unwrap();

        assert_eq!(url, "mem://u/a.png");
        assert_eq!(store.finalized_object("u/a.png").unwrap(), vec![1, 2, 3]);
        assert_eq!(store.partial_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_chunk_is_acknowledged_without_rewriting() {
        let store = MemoryObjectStore::new();
        store.write_chunk("u/a.png", 0, &[1, 2, 3]).await.unwrap();

        // Retransmit after a lost acknowledgement.
        assert_eq!(store.write_chunk("u/a.png", 0, &[1, 2, 3]).await.unwrap(), 3);
        store.finalize("u/a.png").await.unwrap();
        assert_eq!(store.finalized_object("u/a.png").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn gap_is_a_transient_error() {
        let store = MemoryObjectStore::new();
        let err = store.write_chunk("u/a.png", 8, &[1]).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn denied_prefix_is_permanent() {
        let store = MemoryObjectStore::new();
        store.deny_prefix("banned/");

        let err = store.write_chunk("banned/a.png", 0, &[1]).await.unwrap_err();
        assert!(matches!(err, UploadError::PermissionDenied(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn quota_is_enforced_across_objects() {
        let store = MemoryObjectStore::with_quota(4);
        store.write_chunk("u/a.png", 0, &[1, 2, 3]).await.unwrap();

        let err = store.write_chunk("u/b.png", 0, &[4, 5]).await.unwrap_err();
        assert!(matches!(err, UploadError::QuotaExceeded));
    }

    #[tokio::test]
    async fn abort_releases_quota() {
        let store = MemoryObjectStore::with_quota(4);
        store.write_chunk("u/a.png", 0, &[1, 2, 3]).await.unwrap();
        store.abort("u/a.png").await;

        store.write_chunk("u/b.png", 0, &[4, 5]).await.unwrap();
        assert_eq!(store.partial_count(), 1);
    }

    #[tokio::test]
    async fn injected_transient_failures_are_consumed() {
        let store = MemoryObjectStore::new();
        store.inject_transient_failures(1);

        assert!(store.write_chunk("u/a.png", 0, &[1]).await.is_err());
        assert!(store.write_chunk("u/a.png", 0, &[1]).await.is_ok());
    }
}
