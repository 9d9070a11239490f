//! Error types for Palaver.
//!
//! One enum per concern, used by the trait definitions in `palaver-core`.
//! Nothing here is fatal to the process: every failure is scoped to the
//! operation that produced it and leaves prior state unchanged.

use thiserror::Error;

/// Rejected before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message must contain text or an image")]
    EmptyMessage,
}

/// Errors from sign-in and sign-out against the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthOperationError {
    #[error("sign-in failed: {0}")]
    SignIn(String),

    #[error("sign-in cancelled by the user")]
    Cancelled,

    #[error("sign-out failed: {0}")]
    SignOut(String),
}

/// A write to the remote document store did not reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreWriteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("permission denied by the store")]
    PermissionDenied,

    #[error("store rejected the write: {0}")]
    Rejected(String),

    #[error("no record with the given id")]
    NotFound,
}

/// A transfer to object storage failed.
///
/// `Transient` is retryable from the last acknowledged byte; every other
/// variant is permanent and never retried by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("permission denied for path '{0}'")]
    PermissionDenied(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("transient transfer error: {0}")]
    Transient(String),

    #[error("transfer failed after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },

    #[error("upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Whether the pipeline may resume this transfer from the last
    /// acknowledged offset.
    pub fn is_transient(&self) -> bool {
        matches!(self, UploadError::Transient(_))
    }
}

/// Why a message submission was rejected or failed.
///
/// `Validation` and `AuthRequired` are raised before any remote call;
/// `Upload` and `Store` carry the failing remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("a signed-in session is required")]
    AuthRequired,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Store(#[from] StoreWriteError),
}

/// Errors from the push notification gateway and token registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("push gateway error: {0}")]
    Gateway(String),

    #[error("device token registration failed: {0}")]
    Registration(#[from] StoreWriteError),
}
