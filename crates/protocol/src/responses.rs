//! Response bodies.

use chrono::{DateTime, Utc};
use entities::{
    BoardTask, Document, Driver, MessageWithAuthor, Review, Ride, User, Workspace,
    WorkspaceMember,
};
use serde::{Deserialize, Serialize};

// ========== Users ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

// ========== Drivers ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverResponse {
    pub driver: Driver,
}

/// `driver/me`: the caller's profile, if they registered one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionalDriverResponse {
    pub driver: Option<Driver>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverListResponse {
    pub drivers: Vec<Driver>,
    pub next_cursor: Option<String>,
}

// ========== Rides ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideResponse {
    pub ride: Ride,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideListResponse {
    pub rides: Vec<Ride>,
    pub next_cursor: Option<String>,
}

/// `ride/estimate` returns the quote itself:
/// `{ distance_km, duration_minutes, fare }`.
pub use entities::FareQuote as EstimateFareResponse;

// ========== Reviews ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub review: Review,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionalReviewResponse {
    pub review: Option<Review>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
    pub next_cursor: Option<String>,
}

// ========== Workspaces ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceResponse {
    pub workspace: Workspace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceListResponse {
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub member: WorkspaceMember,
}

/// A member with the public parts of their user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: WorkspaceMember,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberListResponse {
    pub members: Vec<MemberView>,
}

// ========== Board ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: BoardTask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<BoardTask>,
}

// ========== Chat ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: MessageWithAuthor,
}

/// A page of messages, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageWithAuthor>,
    /// Pass back as `after` on the next poll. Present whenever the caller has
    /// a position, even if this page was empty.
    pub cursor: Option<String>,
    /// True when more messages are already waiting past this page.
    pub has_more: bool,
}

// ========== Documents ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
}

// ========== Common ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletedResponse {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEnvironment {
    pub has_database: bool,
    pub has_auth: bool,
    pub has_maps: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub environment: HealthEnvironment,
}
