//! Attachment upload pipeline.
//!
//! `store` defines the object-storage port; `pipeline` drives chunked,
//! resumable transfers with live progress.

pub mod file;
pub mod pipeline;
pub mod store;

pub use pipeline::{UploadPipeline, UploadTask};
pub use store::ObjectStore;
