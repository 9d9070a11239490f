//! MessageStore trait and the live window subscription handle.
//!
//! The remote document store supports atomic single-document appends with a
//! store-assigned creation order, plus live push subscriptions to a
//! timestamp-ordered, limit-bounded query. Messages are append-only: the
//! core never mutates or deletes a record the store has accepted.

use palaver_types::error::StoreWriteError;
use palaver_types::message::{ChatMessage, OutgoingMessage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Port for the remote document store.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in `palaver-infra`.
pub trait MessageStore: Send + Sync {
    /// Append one message; the store assigns the timestamp.
    ///
    /// Returns the persisted record. Not retried on failure -- the caller
    /// decides.
    fn append(
        &self,
        message: &OutgoingMessage,
    ) -> impl std::future::Future<Output = Result<ChatMessage, StoreWriteError>> + Send;

    /// Subscribe to the `limit` most recent messages.
    ///
    /// Every insertion inside the window emits the new full window (not a
    /// delta), ordered oldest-first for display -- exactly the store's
    /// timestamp-descending, limit-N query reversed. The store-side listener
    /// is released when the returned handle is unsubscribed or dropped.
    fn watch_recent(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = LiveWindow> + Send;
}

/// A live, bounded view of recent messages.
///
/// Owns the subscription: `unsubscribe()` (or dropping the handle) cancels
/// the store-side listener synchronously, so no emission is produced after
/// unsubscribe completes and repeated subscribe/unsubscribe cycles never
/// leak listeners.
pub struct LiveWindow {
    emissions: mpsc::UnboundedReceiver<Vec<ChatMessage>>,
    token: CancellationToken,
}

impl LiveWindow {
    /// Build a window handle from its emission channel and the token the
    /// store-side forwarder watches.
    pub fn new(
        emissions: mpsc::UnboundedReceiver<Vec<ChatMessage>>,
        token: CancellationToken,
    ) -> Self {
        Self { emissions, token }
    }

    /// Await the next full-window emission.
    ///
    /// Returns `None` once the subscription has ended: after `unsubscribe`
    /// (buffered emissions included), or when the store shut down and the
    /// buffer drained.
    pub async fn recv(&mut self) -> Option<Vec<ChatMessage>> {
        if self.token.is_cancelled() {
            return None;
        }
        self.emissions.recv().await
    }

    /// Stop emissions and release the store-side listener.
    ///
    /// Nothing is observed through `recv` after this returns, not even
    /// emissions buffered before the call.
    pub fn unsubscribe(&mut self) {
        self.token.cancel();
    }
}

impl Drop for LiveWindow {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
