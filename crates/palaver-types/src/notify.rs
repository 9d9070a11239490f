//! Push notification types for Palaver.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Opaque identifier targeting this client instance for push delivery.
///
/// Issued lazily by the push gateway once notification permission is
/// granted; invalidated if the platform revokes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceToken(pub String);

impl DeviceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tokens are credentials; only the last four characters are shown.
impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Char boundary, not a byte offset: tokens are opaque and may not
        // be ASCII.
        let tail = self.0.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
        write!(f, "...{}", &self.0[tail..])
    }
}

/// Platform answer to a notification permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
}

/// A notification delivered while the app is in the foreground.
///
/// Not persisted and not deduplicated by the core; handlers see every
/// delivery as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Provider-specific payload passed through untouched.
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_token_display_redacts() {
        let token = DeviceToken::new("secret-token-abcd");
        let shown = token.to_string();
        assert_eq!(shown, "...abcd");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_device_token_display_handles_non_ascii() {
        assert_eq!(DeviceToken::new("aéxyz").to_string(), "...éxyz");
        assert_eq!(DeviceToken::new("ab").to_string(), "...ab");
        assert_eq!(DeviceToken::new("").to_string(), "...");
    }

    #[test]
    fn test_permission_serde() {
        let json = serde_json::to_string(&NotificationPermission::Granted).unwrap();
        assert_eq!(json, "\"granted\"");
    }

    #[test]
    fn test_push_notification_serde() {
        let notification = PushNotification {
            title: Some("New message".to_string()),
            body: Some("Ada: hello".to_string()),
            data: serde_json::json!({"kind": "chat"}),
        };
        let json = serde_json::to_string(&notification).unwrap();
        let parsed: PushNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, notification);
    }
}
