//! In-memory message store with live query subscriptions.
//!
//! Implements `MessageStore` from `palaver-core`: an append-only log with
//! store-assigned timestamps and push-based live windows, plus the
//! token-keyed device-token collection (`DeviceTokenStore`).

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use palaver_core::chat::store::{LiveWindow, MessageStore};
use palaver_core::notify::gateway::DeviceTokenStore;
use palaver_types::error::StoreWriteError;
use palaver_types::message::{ChatMessage, OutgoingMessage, ServerTimestamp};
use palaver_types::notify::DeviceToken;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use std::collections::VecDeque;
use std::sync::Arc;

/// In-memory implementation of `MessageStore`.
///
/// Cloning shares the underlying log, so multiple components observe the
/// same store.
#[derive(Clone)]
pub struct MemoryMessageStore {
    inner: Arc<Inner>,
}

struct Inner {
    log: Mutex<Vec<ChatMessage>>,
    /// Fires on every accepted append; live-window forwarders requery.
    changes: broadcast::Sender<()>,
    /// Test hook: errors returned by upcoming appends, in order.
    fail_next: Mutex<VecDeque<StoreWriteError>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                log: Mutex::new(Vec::new()),
                changes,
                fail_next: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Queue an error for the next append (failure injection for tests and
    /// fault drills).
    pub async fn fail_next_append(&self, error: StoreWriteError) {
        self.inner.fail_next.lock().await.push_back(error);
    }

    /// Number of live-window listeners currently held on the store.
    pub fn active_watchers(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    /// Total messages persisted, across all windows.
    pub async fn message_count(&self) -> usize {
        self.inner.log.lock().await.len()
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// The `limit` most recent messages: timestamp-descending scan,
    /// reversed to oldest-first for display.
    async fn window(&self, limit: usize) -> Vec<ChatMessage> {
        let log = self.log.lock().await;
        let start = log.len().saturating_sub(limit);
        log[start..].to_vec()
    }
}

impl MessageStore for MemoryMessageStore {
    async fn append(&self, message: &OutgoingMessage) -> Result<ChatMessage, StoreWriteError> {
        if let Some(error) = self.inner.fail_next.lock().await.pop_front() {
            return Err(error);
        }

        let mut log = self.inner.log.lock().await;
        let persisted = ChatMessage {
            id: message.id,
            author_id: message.author_id.clone(),
            author_name: message.author_name.clone(),
            author_avatar_url: message.author_avatar_url.clone(),
            text: message.text.clone(),
            image_url: message.image_url.clone(),
            timestamp: assign_timestamp(&log),
        };
        log.push(persisted.clone());
        drop(log);

        let _ = self.inner.changes.send(());
        Ok(persisted)
    }

    async fn watch_recent(&self, limit: usize) -> LiveWindow {
        let (emit, emissions) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let mut changes = self.inner.changes.subscribe();

        // Initial emission reflects the current window.
        let _ = emit.send(self.inner.window(limit).await);

        let inner = Arc::clone(&self.inner);
        let task_token = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    changed = changes.recv() => match changed {
                        // Full-window emissions make lag harmless: requery.
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            let window = inner.window(limit).await;
                            if emit.send(window).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!("live window listener released");
        });

        LiveWindow::new(emissions, token)
    }
}

/// Server-assigned creation order: wall clock clamped to be monotonic, with
/// the log index breaking ties.
fn assign_timestamp(log: &[ChatMessage]) -> ServerTimestamp {
    let now = Utc::now();
    let at: DateTime<Utc> = match log.last() {
        Some(last) => now.max(last.timestamp.at),
        None => now,
    };
    ServerTimestamp {
        at,
        seq: log.len() as u64,
    }
}

/// Token-keyed device token collection.
///
/// Registering the same token twice overwrites the single record, so
/// registration is idempotent.
#[derive(Default)]
pub struct MemoryDeviceTokenStore {
    records: DashMap<String, String>,
}

impl MemoryDeviceTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token_count(&self) -> usize {
        self.records.len()
    }

    /// The uid a token is associated with, if registered.
    pub fn registered_uid(&self, token: &DeviceToken) -> Option<String> {
        self.records.get(token.as_str()).map(|uid| uid.clone())
    }
}

impl DeviceTokenStore for MemoryDeviceTokenStore {
    async fn register(&self, token: &DeviceToken, uid: &str) -> Result<(), StoreWriteError> {
        self.records
            .insert(token.as_str().to_string(), uid.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_types::message::MessageId;

    fn outgoing(text: &str) -> OutgoingMessage {
        OutgoingMessage {
            id: MessageId::new(),
            author_id: Some("u-1".to_string()),
            author_name: Some("Ada".to_string()),
            author_avatar_url: None,
            text: Some(text.to_string()),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn append_assigns_monotonic_timestamps() {
        let store = MemoryMessageStore::new();

        let first = store.append(&outgoing("a")).await.unwrap();
        let second = store.append(&outgoing("b")).await.unwrap();
        let third = store.append(&outgoing("c")).await.unwrap();

        assert!(first.timestamp < second.timestamp);
        assert!(second.timestamp < third.timestamp);
        assert_eq!(third.timestamp.seq, 2);
    }

    #[tokio::test]
    async fn window_is_bounded_and_oldest_first() {
        let store = MemoryMessageStore::new();
        for i in 0..20 {
            store.append(&outgoing(&format!("m{i}"))).await.unwrap();
        }

        let mut window = store.watch_recent(12).await;
        let emission = window.recv().await.unwrap();

        assert_eq!(emission.len(), 12);
        assert_eq!(emission[0].text.as_deref(), Some("m8"));
        assert_eq!(emission[11].text.as_deref(), Some("m19"));
        assert!(emission.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test]
    async fn every_insert_emits_the_new_full_window() {
        let store = MemoryMessageStore::new();
        let mut window = store.watch_recent(3).await;
        assert!(window.recv().await.unwrap().is_empty());

        store.append(&outgoing("a")).await.unwrap();
        assert_eq!(window.recv().await.unwrap().len(), 1);

        store.append(&outgoing("b")).await.unwrap();
        let emission = window.recv().await.unwrap();
        assert_eq!(emission.len(), 2);
        assert_eq!(emission[1].text.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn unsubscribe_stops_emissions_and_releases_the_listener() {
        let store = MemoryMessageStore::new();
        let mut window = store.watch_recent(5).await;
        assert!(window.recv().await.unwrap().is_empty());
        assert_eq!(store.active_watchers(), 1);

        // Leave an emission sitting in the window's buffer, then unsubscribe
        // before reading it: it must not be observed either.
        store.append(&outgoing("buffered")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        window.unsubscribe();
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // The forwarder dropped its change receiver and its sender.
        assert_eq!(store.active_watchers(), 0);
        store.append(&outgoing("late")).await.unwrap();
        assert!(window.recv().await.is_none());
    }

    #[tokio::test]
    async fn repeated_subscribe_cycles_do_not_leak_listeners() {
        let store = MemoryMessageStore::new();
        for _ in 0..10 {
            let window = store.watch_recent(5).await;
            drop(window);
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(store.active_watchers(), 0);
    }

    #[tokio::test]
    async fn injected_append_failure_surfaces_once() {
        let store = MemoryMessageStore::new();
        store
            .fail_next_append(StoreWriteError::Network("offline".into()))
            .await;

        let err = store.append(&outgoing("a")).await.unwrap_err();
        assert!(matches!(err, StoreWriteError::Network(_)));
        assert_eq!(store.message_count().await, 0);

        store.append(&outgoing("b")).await.unwrap();
        assert_eq!(store.message_count().await, 1);
    }

    #[tokio::test]
    async fn device_token_registration_is_idempotent() {
        let tokens = MemoryDeviceTokenStore::new();
        let token = DeviceToken::new("t-1");

        tokens.register(&token, "u-1").await.unwrap();
        tokens.register(&token, "u-1").await.unwrap();

        assert_eq!(tokens.token_count(), 1);
        assert_eq!(tokens.registered_uid(&token).as_deref(), Some("u-1"));
    }
}
