//! User-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when the identity provider supplies none.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Role of a user in the ride marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Requests rides.
    #[default]
    Rider,
    /// Has a driver profile and accepts rides.
    Driver,
}

impl UserRole {
    /// Converts the role to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Driver => "driver",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rider" => Some(Self::Rider),
            "driver" => Some(Self::Driver),
            _ => None,
        }
    }
}

/// A user synced from the external identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Subject identifier issued by the identity provider.
    pub external_id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Marketplace role.
    pub role: UserRole,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional avatar image URL.
    pub avatar_url: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new rider for the given external identity.
    pub fn new(external_id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            email: email.into(),
            name: DEFAULT_DISPLAY_NAME.to_string(),
            role: UserRole::Rider,
            phone: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the display name. Blank names keep the default.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.name = name.trim().to_string();
        }
        self
    }

    /// Name shown next to chat messages and documents.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}
