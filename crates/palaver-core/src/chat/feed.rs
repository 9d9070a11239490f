//! Chat feed: the message store adapter.
//!
//! Bridges user intents (send text, send image) to the remote store, tagged
//! with the current session's identity. Validation and auth checks happen
//! before any remote call; store failures are returned to the caller and
//! never retried automatically.

use chrono::Utc;
use palaver_types::error::SubmitError;
use palaver_types::message::{ChatMessage, MessageDraft, MessageId, OutgoingMessage, ServerTimestamp};
use palaver_types::session::{Session, UserProfile};
use palaver_types::upload::Attachment;
use tokio::sync::watch;
use tracing::{debug, warn};

use std::sync::Arc;

use crate::chat::store::{LiveWindow, MessageStore};
use crate::upload::pipeline::{UploadPipeline, UploadTask};
use crate::upload::store::ObjectStore;

/// Default size of the live recent-messages window.
pub const DEFAULT_WINDOW: usize = 12;

/// Placeholder image shown locally while an attachment upload is in flight.
pub const LOADING_IMAGE_URL: &str = "https://www.google.com/images/spin-32.gif?a";

/// Converts outgoing chat intents into persisted documents and exposes a
/// live, bounded window of recent messages.
///
/// Reads the session through a watch receiver owned by the session manager;
/// it never mutates it.
pub struct ChatFeed<S> {
    store: Arc<S>,
    sessions: watch::Receiver<Session>,
}

/// An attachment submit that has started its upload but not yet written to
/// the store.
///
/// `placeholder` is a local-only record for optimistic display. It shares
/// `id` with the message that will eventually be persisted, so the UI swaps
/// it out by id -- never by position in a window that may have shifted.
pub struct PendingAttachment {
    pub id: MessageId,
    pub placeholder: ChatMessage,
    pub task: UploadTask,
    /// Identity snapshot taken when the submit began. A logout or login
    /// that happens while the upload is in flight does not change whose
    /// message this is.
    author: UserProfile,
    caption: Option<String>,
}

impl<S: MessageStore> ChatFeed<S> {
    pub fn new(store: Arc<S>, sessions: watch::Receiver<Session>) -> Self {
        Self { store, sessions }
    }

    /// Snapshot the signed-in profile, or fail fast.
    fn author_snapshot(&self) -> Result<UserProfile, SubmitError> {
        match self.sessions.borrow().profile() {
            Some(profile) => Ok(profile.clone()),
            None => Err(SubmitError::AuthRequired),
        }
    }

    /// Persist one message for the current session.
    ///
    /// Fails with `Validation` when the draft has neither text nor image and
    /// with `AuthRequired` when no session is active -- both before any
    /// remote call. Returns the persisted record with its server-assigned
    /// timestamp.
    pub async fn submit(&self, draft: MessageDraft) -> Result<ChatMessage, SubmitError> {
        draft.validate()?;
        let author = self.author_snapshot()?;

        let outgoing = OutgoingMessage {
            id: MessageId::new(),
            author_id: Some(author.uid),
            author_name: author.display_name,
            author_avatar_url: author.avatar_url,
            text: draft.text,
            image_url: draft.image_url,
        };

        let persisted = self.store.append(&outgoing).await.map_err(|err| {
            warn!(message_id = %outgoing.id, error = %err, "message write failed");
            err
        })?;
        debug!(message_id = %persisted.id, seq = persisted.timestamp.seq, "message persisted");
        Ok(persisted)
    }

    /// Persist a text-only message.
    pub async fn submit_text(&self, text: impl Into<String>) -> Result<ChatMessage, SubmitError> {
        self.submit(MessageDraft::text(text)).await
    }

    /// Subscribe to the live window of the `limit` most recent messages.
    ///
    /// The window is independent of session liveness: a logout does not
    /// invalidate it.
    pub async fn live_recent(&self, limit: usize) -> LiveWindow {
        self.store.watch_recent(limit).await
    }

    /// Start an attachment submit: derive a destination path, begin the
    /// upload, and hand back a placeholder for optimistic display.
    ///
    /// The store write happens in [`finish_attachment`] only after the
    /// upload resolves a URL; upload-then-write is strictly ordered.
    ///
    /// [`finish_attachment`]: ChatFeed::finish_attachment
    pub fn begin_attachment<O>(
        &self,
        uploads: &UploadPipeline<O>,
        attachment: Attachment,
        caption: Option<String>,
    ) -> Result<PendingAttachment, SubmitError>
    where
        O: ObjectStore + 'static,
    {
        let author = self.author_snapshot()?;
        let id = MessageId::new();

        let placeholder = ChatMessage {
            id,
            author_id: Some(author.uid.clone()),
            author_name: author.display_name.clone(),
            author_avatar_url: author.avatar_url.clone(),
            text: caption.clone(),
            image_url: Some(LOADING_IMAGE_URL.to_string()),
            // Local preview only; the persisted record gets the real
            // store-assigned timestamp.
            timestamp: ServerTimestamp {
                at: Utc::now(),
                seq: 0,
            },
        };

        let path = uploads.destination_path(&author.uid, &attachment.filename);
        let task = uploads.start(path, attachment);
        debug!(message_id = %id, "attachment upload started");

        Ok(PendingAttachment {
            id,
            placeholder,
            task,
            author,
            caption,
        })
    }

    /// Await the upload and persist the message under the id and identity
    /// snapshot taken at begin time.
    ///
    /// A failed upload returns `SubmitError::Upload` and performs no store
    /// write for this message.
    pub async fn finish_attachment(
        &self,
        pending: PendingAttachment,
    ) -> Result<ChatMessage, SubmitError> {
        let PendingAttachment {
            id,
            task,
            author,
            caption,
            ..
        } = pending;

        let url = task.await_url().await.map_err(|err| {
            warn!(message_id = %id, error = %err, "attachment upload failed; message not written");
            err
        })?;

        let outgoing = OutgoingMessage {
            id,
            author_id: Some(author.uid),
            author_name: author.display_name,
            author_avatar_url: author.avatar_url,
            text: caption,
            image_url: Some(url),
        };
        Ok(self.store.append(&outgoing).await?)
    }

    /// Upload an attachment and persist the message in one call.
    pub async fn submit_attachment<O>(
        &self,
        uploads: &UploadPipeline<O>,
        attachment: Attachment,
        caption: Option<String>,
    ) -> Result<ChatMessage, SubmitError>
    where
        O: ObjectStore + 'static,
    {
        let pending = self.begin_attachment(uploads, attachment, caption)?;
        self.finish_attachment(pending).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_types::error::{StoreWriteError, ValidationError};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeStore {
        appended: Mutex<Vec<OutgoingMessage>>,
        fail_append: AtomicBool,
    }

    impl MessageStore for FakeStore {
        async fn append(&self, message: &OutgoingMessage) -> Result<ChatMessage, StoreWriteError> {
            if self.fail_append.swap(false, Ordering::SeqCst) {
                return Err(StoreWriteError::Network("connection reset".into()));
            }
            let mut appended = self.appended.lock().unwrap();
            let seq = appended.len() as u64;
            appended.push(message.clone());
            Ok(ChatMessage {
                id: message.id,
                author_id: message.author_id.clone(),
                author_name: message.author_name.clone(),
                author_avatar_url: message.author_avatar_url.clone(),
                text: message.text.clone(),
                image_url: message.image_url.clone(),
                timestamp: ServerTimestamp {
                    at: Utc::now(),
                    seq,
                },
            })
        }

        async fn watch_recent(&self, _limit: usize) -> LiveWindow {
            let (_tx, rx) = mpsc::unbounded_channel();
            LiveWindow::new(rx, CancellationToken::new())
        }
    }

    fn feed_with_session(
        session: Session,
    ) -> (Arc<FakeStore>, watch::Sender<Session>, ChatFeed<FakeStore>) {
        let store = Arc::new(FakeStore::default());
        let (tx, rx) = watch::channel(session);
        let feed = ChatFeed::new(Arc::clone(&store), rx);
        (store, tx, feed)
    }

    fn signed_in() -> Session {
        Session::SignedIn(
            UserProfile::new("u-1")
                .with_display_name("Ada")
                .with_avatar_url("https://example.com/ada.png"),
        )
    }

    #[tokio::test]
    async fn empty_draft_is_rejected_before_any_write() {
        let (store, _sessions, feed) = feed_with_session(signed_in());

        let err = feed.submit(MessageDraft::default()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::EmptyMessage)
        ));
        assert!(store.appended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signed_out_submit_is_rejected_before_any_write() {
        let (store, _sessions, feed) = feed_with_session(Session::SignedOut);

        let err = feed.submit_text("hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::AuthRequired));
        assert!(store.appended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_stamps_the_author_snapshot() {
        let (store, _sessions, feed) = feed_with_session(signed_in());

        let persisted = feed.submit_text("Hello").await.unwrap();
        assert_eq!(persisted.text.as_deref(), Some("Hello"));
        assert_eq!(persisted.author_id.as_deref(), Some("u-1"));
        assert_eq!(persisted.author_name.as_deref(), Some("Ada"));

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].id, persisted.id);
    }

    #[tokio::test]
    async fn store_failure_is_returned_not_swallowed() {
        let (store, _sessions, feed) = feed_with_session(signed_in());
        store.fail_append.store(true, Ordering::SeqCst);

        let err = feed.submit_text("hello").await.unwrap_err();
        assert!(matches!(err, SubmitError::Store(StoreWriteError::Network(_))));
        assert!(store.appended.lock().unwrap().is_empty());
    }

    /// Accepts every chunk and finalizes to a fixed URL.
    struct NullObjectStore;

    impl ObjectStore for NullObjectStore {
        async fn write_chunk(
            &self,
            _path: &str,
            offset: u64,
            data: &[u8],
        ) -> Result<u64, palaver_types::error::UploadError> {
            Ok(offset + data.len() as u64)
        }

        async fn finalize(&self, path: &str) -> Result<String, palaver_types::error::UploadError> {
            Ok(format!("mem://{path}"))
        }

        async fn abort(&self, _path: &str) {}
    }

    #[tokio::test]
    async fn placeholder_shares_the_id_of_the_eventual_message() {
        let (store, _sessions, feed) = feed_with_session(signed_in());
        let uploads = UploadPipeline::new(Arc::new(NullObjectStore));
        let attachment = Attachment::new("cat.png", "image/png", vec![1, 2, 3]);

        let pending = feed.begin_attachment(&uploads, attachment, None).unwrap();
        let placeholder_id = pending.placeholder.id;
        assert_eq!(placeholder_id, pending.id);
        assert_eq!(
            pending.placeholder.image_url.as_deref(),
            Some(LOADING_IMAGE_URL)
        );

        let persisted = feed.finish_attachment(pending).await.unwrap();
        assert_eq!(persisted.id, placeholder_id);
        assert_ne!(persisted.image_url.as_deref(), Some(LOADING_IMAGE_URL));
        assert_eq!(store.appended.lock().unwrap().len(), 1);
    }
}
