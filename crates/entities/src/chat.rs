//! Workspace chat messages.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// A chat message posted to a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: Uuid,
    /// Workspace the message was posted in.
    pub workspace_id: Uuid,
    /// Author.
    pub user_id: Uuid,
    /// Message body.
    pub content: String,
    /// When the message was posted.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message.
    pub fn new(workspace_id: Uuid, user_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            user_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Stamps the message as posted now, strictly after `latest`.
    ///
    /// Must be called while holding the workspace's write lock so that
    /// commit order matches timestamp order and polling cursors never skip
    /// a message.
    pub fn stamp_after(&mut self, latest: Option<DateTime<Utc>>) {
        // Databases keep microseconds.
        let now = Utc::now().trunc_subsecs(6);
        self.created_at = match latest {
            Some(latest) if latest >= now => latest + Duration::microseconds(1),
            _ => now,
        };
    }
}

/// A message together with its author's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageWithAuthor {
    /// The message.
    #[serde(flatten)]
    pub message: Message,
    /// Author's name, or email when no name is set.
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_after_is_strictly_increasing() {
        let mut message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "hi");
        let ahead = Utc::now() + Duration::seconds(5);

        message.stamp_after(Some(ahead));
        assert_eq!(message.created_at, ahead + Duration::microseconds(1));

        let past = Utc::now() - Duration::seconds(5);
        message.stamp_after(Some(past));
        assert!(message.created_at > past);

        message.stamp_after(None);
        assert!(message.created_at <= Utc::now());
    }
}
