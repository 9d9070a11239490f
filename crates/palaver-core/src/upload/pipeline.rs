//! Chunked, resumable upload pipeline.
//!
//! Streams an attachment to object storage chunk by chunk, publishing an
//! [`UploadProgress`] snapshot through a watch channel. Transient failures
//! resume from the last acknowledged byte; permanent failures (permission,
//! quota) are never retried. The caller may cancel at any point before
//! resolution.

use palaver_types::error::UploadError;
use palaver_types::upload::{Attachment, UploadProgress};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use std::sync::Arc;

/// Default transfer chunk size (256 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Default number of resumption attempts after transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Transfer tuning knobs.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub chunk_size: usize,
    pub max_retries: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Streams local files to remote object storage and resolves each to a
/// retrievable URL.
pub struct UploadPipeline<O> {
    store: Arc<O>,
    config: UploadConfig,
}

/// An in-flight file transfer.
///
/// Destroyed once resolved to a URL or permanently failed; never persisted.
pub struct UploadTask {
    path: String,
    progress: watch::Receiver<UploadProgress>,
    token: CancellationToken,
    handle: JoinHandle<Result<String, UploadError>>,
}

impl<O> UploadPipeline<O>
where
    O: super::store::ObjectStore + 'static,
{
    pub fn new(store: Arc<O>) -> Self {
        Self::with_config(store, UploadConfig::default())
    }

    pub fn with_config(store: Arc<O>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    /// Derive a destination path that cannot collide with concurrent
    /// uploads from the same session.
    ///
    /// UUID v7 embeds the creation timestamp, so the path combines user id,
    /// timestamp, and the original filename.
    pub fn destination_path(&self, uid: &str, filename: &str) -> String {
        format!("{uid}/{}-{filename}", Uuid::now_v7())
    }

    /// Begin a transfer to `path`.
    ///
    /// The transfer runs in a spawned task; the returned `UploadTask`
    /// exposes progress, cancellation, and the terminal outcome.
    pub fn start(&self, path: String, attachment: Attachment) -> UploadTask {
        let (progress_tx, progress_rx) = watch::channel(UploadProgress {
            acked_bytes: 0,
            total_bytes: attachment.len(),
        });
        let token = CancellationToken::new();

        let store = Arc::clone(&self.store);
        let config = self.config.clone();
        let task_path = path.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            run_transfer(store, config, task_path, attachment, progress_tx, task_token).await
        });

        UploadTask {
            path,
            progress: progress_rx,
            token,
            handle,
        }
    }
}

impl UploadTask {
    /// Destination path of this transfer.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Live progress snapshot; `UploadProgress::fraction` gives the
    /// displayable [0, 1] value.
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    /// Cancel the transfer.
    ///
    /// Takes effect before the next chunk write; the transfer resolves to
    /// `UploadError::Cancelled` and the partial remote object is aborted.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Await the terminal outcome: a durable retrieval URL or the error
    /// that permanently ended the transfer.
    pub async fn await_url(self) -> Result<String, UploadError> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(join) if join.is_cancelled() => Err(UploadError::Cancelled),
            Err(join) => Err(UploadError::Exhausted {
                attempts: 0,
                reason: join.to_string(),
            }),
        }
    }
}

async fn run_transfer<O: super::store::ObjectStore>(
    store: Arc<O>,
    config: UploadConfig,
    path: String,
    attachment: Attachment,
    progress: watch::Sender<UploadProgress>,
    token: CancellationToken,
) -> Result<String, UploadError> {
    let total = attachment.data.len() as u64;
    let mut acked: u64 = 0;
    let mut attempts: u32 = 0;

    while acked < total {
        let end = usize::min(acked as usize + config.chunk_size, attachment.data.len());
        let chunk = &attachment.data[acked as usize..end];

        let written = tokio::select! {
            _ = token.cancelled() => {
                debug!(path = %path, acked, "upload cancelled");
                store.abort(&path).await;
                return Err(UploadError::Cancelled);
            }
            written = store.write_chunk(&path, acked, chunk) => written,
        };

        match written {
            Ok(new_acked) => {
                acked = new_acked;
                attempts = 0;
                let _ = progress.send(UploadProgress {
                    acked_bytes: acked,
                    total_bytes: total,
                });
            }
            Err(err) if err.is_transient() => {
                attempts += 1;
                if attempts > config.max_retries {
                    warn!(path = %path, attempts, error = %err, "upload retries exhausted");
                    store.abort(&path).await;
                    return Err(UploadError::Exhausted {
                        attempts,
                        reason: err.to_string(),
                    });
                }
                // Resume from the last acknowledged byte.
                debug!(path = %path, acked, attempt = attempts, "resuming after transient failure");
            }
            Err(err) => {
                warn!(path = %path, error = %err, "upload failed permanently");
                store.abort(&path).await;
                return Err(err);
            }
        }
    }

    let url = store.finalize(&path).await?;
    let _ = progress.send(UploadProgress {
        acked_bytes: total,
        total_bytes: total,
    });
    debug!(path = %path, url = %url, "upload complete");
    Ok(url)
}
