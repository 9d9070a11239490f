//! Session and user identity types for Palaver.
//!
//! A `Session` is the authenticated identity currently driving the client.
//! It is owned exclusively by the session manager in `palaver-core`; every
//! other component reads it through a watch subscription.

use serde::{Deserialize, Serialize};

/// The principal returned by the identity provider on sign-in.
///
/// Display name and avatar are optional because some providers only
/// guarantee an opaque user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque provider-assigned user id.
    pub uid: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Create a profile with just a user id.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            avatar_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Liveness of the client's authenticated session.
///
/// Created on successful sign-in, replaced on provider-driven auth-state
/// changes (token expiry, external sign-out), destroyed on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Session {
    SignedIn(UserProfile),
    #[default]
    SignedOut,
}

impl Session {
    /// The signed-in profile, if any.
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Session::SignedIn(profile) => Some(profile),
            Session::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Session::SignedIn(_))
    }
}
