//! Shared workspace documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rich-text document shared within a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Document title.
    pub title: String,
    /// Document body (serialized editor content).
    pub content: String,
    /// User who created the document.
    pub created_by_id: Uuid,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new(workspace_id: Uuid, created_by_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            title: title.into(),
            content: String::new(),
            created_by_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update.
    pub fn apply(&mut self, patch: DocumentPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPatch {
    /// New title.
    pub title: Option<String>,
    /// New body.
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_starts_empty() {
        let doc = Document::new(Uuid::new_v4(), Uuid::new_v4(), "Runbook");
        assert_eq!(doc.title, "Runbook");
        assert!(doc.content.is_empty());
    }

    #[test]
    fn test_patch_updates_only_given_fields() {
        let mut doc = Document::new(Uuid::new_v4(), Uuid::new_v4(), "Runbook");
        doc.apply(DocumentPatch {
            content: Some("Step 1: page the on-call".to_string()),
            ..Default::default()
        });

        assert_eq!(doc.title, "Runbook");
        assert_eq!(doc.content, "Step 1: page the on-call");
    }
}
