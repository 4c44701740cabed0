//! Kanban board task definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Board column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Converts the status to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Priority of a board task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl TaskPriority {
    /// Converts the priority to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a priority from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A card on a workspace's kanban board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardTask {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning workspace.
    pub workspace_id: Uuid,
    /// Task title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Column the task sits in.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Assigned member, if any.
    pub assignee_id: Option<Uuid>,
    /// User who created the task.
    pub created_by_id: Uuid,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Sort position within the column, ascending.
    pub position: i32,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl BoardTask {
    /// Creates a new todo task. The store assigns the final position.
    pub fn new(workspace_id: Uuid, created_by_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee_id: None,
            created_by_id,
            due_date: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the column.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignee.
    pub fn with_assignee(mut self, assignee_id: Uuid) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Sets the due date.
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Applies a partial update. Returns true if the task changed column.
    pub fn apply(&mut self, patch: TaskPatch) -> bool {
        let previous_status = self.status;
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.assignee_id = assignee_id;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        self.updated_at = Utc::now();
        self.status != previous_status
    }
}

/// Partial update of a board task.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New column.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<TaskPriority>,
    /// New assignee.
    pub assignee_id: Option<Option<Uuid>>,
    /// New due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults() {
        let task = BoardTask::new(Uuid::new_v4(), Uuid::new_v4(), "Write onboarding doc");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.assignee_id.is_none());
    }

    #[test]
    fn test_patch_clears_and_sets_fields() {
        let assignee = Uuid::new_v4();
        let mut task = BoardTask::new(Uuid::new_v4(), Uuid::new_v4(), "Ship release")
            .with_description("Cut the tag")
            .with_assignee(assignee);

        let moved = task.apply(TaskPatch {
            title: Some("Ship 1.2 release".to_string()),
            description: Some(None),
            priority: Some(TaskPriority::High),
            ..Default::default()
        });

        assert!(!moved);
        assert_eq!(task.title, "Ship 1.2 release");
        assert!(task.description.is_none());
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.assignee_id, Some(assignee));
    }

    #[test]
    fn test_patch_reports_column_change() {
        let mut task = BoardTask::new(Uuid::new_v4(), Uuid::new_v4(), "Fix login");
        assert!(task.apply(TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        }));
        assert!(!task.apply(TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        }));
    }

    #[test]
    fn test_columns_sort_in_board_order() {
        let mut statuses = vec![TaskStatus::Done, TaskStatus::Todo, TaskStatus::InProgress];
        statuses.sort();
        assert_eq!(
            statuses,
            vec![TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done]
        );
    }
}
