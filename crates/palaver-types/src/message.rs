//! Chat message types for Palaver.
//!
//! A `ChatMessage` is an immutable record once the remote store accepts it;
//! the single sanctioned amendment is the image-URL fill-in for attachment
//! messages, keyed by the client-assigned `MessageId`. Ordering always comes
//! from the store-assigned `ServerTimestamp`, never the client clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::error::ValidationError;

/// Stable client-assigned message identifier.
///
/// Assigned at submit time, before any remote call. This is the key the
/// placeholder-replacement pattern uses: an optimistic local record and the
/// persisted record share the same id, so a later swap targets the exact
/// message rather than a position in a window that may have shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Generate a fresh time-sortable id (UUID v7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordering value assigned by the remote store at write time.
///
/// `seq` is the store's insertion order and breaks wall-clock ties, so the
/// composite key `(at, seq)` is strictly monotonic within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerTimestamp {
    pub at: DateTime<Utc>,
    pub seq: u64,
}

/// A single chat message as persisted by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    /// Author identity snapshot taken at submit time (nullable: the
    /// provider may not expose all fields).
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    /// Store-assigned creation order (never the client clock).
    pub timestamp: ServerTimestamp,
}

/// What the user composed: optional text, optional image URL.
///
/// At least one of the two must be present; `validate` rejects empty drafts
/// before any remote call is made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    pub text: Option<String>,
    pub image_url: Option<String>,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image_url: None,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            text: None,
            image_url: Some(url.into()),
        }
    }

    /// Reject drafts with neither text nor image.
    ///
    /// Whitespace-only text counts as absent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_text = self
            .text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        let has_image = self.image_url.as_deref().is_some_and(|u| !u.is_empty());
        if has_text || has_image {
            Ok(())
        } else {
            Err(ValidationError::EmptyMessage)
        }
    }
}

/// A validated draft plus the author snapshot, ready for `MessageStore::append`.
///
/// The store assigns the timestamp; everything else is fixed at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub id: MessageId,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
}
