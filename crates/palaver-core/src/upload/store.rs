//! ObjectStore trait definition.
//!
//! The object-storage collaborator accepts sequential chunk writes keyed by
//! path, acknowledges how far a transfer has progressed (the resumption
//! point), and returns a durable retrieval URL on finalization.

use palaver_types::error::UploadError;

/// Port for the remote object-storage service.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in `palaver-infra`.
pub trait ObjectStore: Send + Sync {
    /// Write one chunk at `offset` and return the total acknowledged length.
    ///
    /// A transfer interrupted by a `Transient` error resumes by writing the
    /// next chunk at the last acknowledged length.
    fn write_chunk(
        &self,
        path: &str,
        offset: u64,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<u64, UploadError>> + Send;

    /// Complete the transfer and return the durable retrieval URL.
    fn finalize(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<String, UploadError>> + Send;

    /// Best-effort cleanup of a cancelled or permanently failed transfer.
    fn abort(&self, path: &str) -> impl std::future::Future<Output = ()> + Send;
}
