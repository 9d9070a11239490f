//! Attachment types for the upload pipeline.

use serde::{Deserialize, Serialize};

/// Maximum attachment size accepted by the upload pipeline (20 MB).
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

/// A user-selected file staged for upload to object storage.
///
/// The bytes are held in memory. Files above `MAX_ATTACHMENT_BYTES` are
/// rejected when staged from disk, before their contents are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Progress snapshot for an in-flight transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Bytes acknowledged by the object store so far.
    pub acked_bytes: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Completed fraction in [0, 1]. Empty transfers report 1.0.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.acked_bytes as f64 / self.total_bytes as f64
        }
    }
}
