//! Store trait definitions.

use async_trait::async_trait;
use entities::{
    BoardTask, Document, DocumentPatch, Driver, DriverProfile, GeoPoint, Message,
    MessageWithAuthor, Rating, Review, Ride, TaskPatch, TaskStatus, User, Workspace,
    WorkspaceMember,
};
use pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::StoreResult;

/// A rider's review of a finished ride, before it is checked and recorded.
#[derive(Debug, Clone)]
pub struct ReviewSubmission {
    /// Ride being reviewed.
    pub ride_id: Uuid,
    /// Rider submitting the review.
    pub rider_id: Uuid,
    /// Star rating.
    pub rating: Rating,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// A workspace member together with the user record behind it.
#[derive(Debug, Clone)]
pub struct MemberWithUser {
    /// The membership.
    pub member: WorkspaceMember,
    /// The member's user record.
    pub user: User,
}

/// Trait for persistent storage.
///
/// Every ride transition is a compare-and-swap keyed by ride ID, expected
/// status and acting party. Implementations must make each method atomic.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Inserts the user unless one with the same external ID exists, and
    /// returns the stored user either way.
    async fn ensure_user(&self, user: User) -> StoreResult<User>;

    /// Gets a user by identity-provider subject.
    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    /// Gets a user by email.
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Sets or clears a user's phone number.
    async fn update_user_phone(&self, id: Uuid, phone: Option<String>) -> StoreResult<User>;

    // =========================================================================
    // Driver operations
    // =========================================================================

    /// Creates the user's driver profile, or updates its licence and vehicle
    /// details if one exists. The user's role becomes driver.
    async fn register_driver(&self, user_id: Uuid, profile: DriverProfile) -> StoreResult<Driver>;

    /// Gets a driver by ID.
    async fn get_driver(&self, id: Uuid) -> StoreResult<Option<Driver>>;

    /// Gets the driver profile of a user.
    async fn get_driver_by_user(&self, user_id: Uuid) -> StoreResult<Option<Driver>>;

    /// Sets a driver's availability. Becoming available while bound to an
    /// active ride is a conflict.
    async fn set_driver_availability(&self, driver_id: Uuid, available: bool)
        -> StoreResult<Driver>;

    /// Records a driver's current position.
    async fn update_driver_location(&self, driver_id: Uuid, location: GeoPoint)
        -> StoreResult<Driver>;

    /// Lists available drivers, oldest profile first.
    async fn list_available_drivers(&self, page: PageRequest) -> StoreResult<Page<Driver>>;

    // =========================================================================
    // Ride operations
    // =========================================================================

    /// Persists a new pending ride.
    async fn create_ride(&self, ride: Ride) -> StoreResult<Ride>;

    /// Gets a ride by ID.
    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>>;

    /// Lists a rider's rides.
    async fn list_rides_for_rider(&self, rider_id: Uuid, page: PageRequest)
        -> StoreResult<Page<Ride>>;

    /// Lists rides bound to a driver.
    async fn list_rides_for_driver(
        &self,
        driver_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Ride>>;

    /// Lists rides waiting for a driver.
    async fn list_pending_rides(&self, page: PageRequest) -> StoreResult<Page<Ride>>;

    /// Binds an available driver to a pending ride and marks the driver
    /// unavailable, as one atomic step. Of two concurrent accepts exactly one
    /// succeeds; the other gets a conflict.
    async fn accept_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride>;

    /// Moves an accepted ride to in progress. Only its driver may do this.
    async fn start_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride>;

    /// Moves an in-progress ride to completed. Only its driver may do this.
    async fn complete_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride>;

    /// Cancels a pending or accepted ride on behalf of its rider, releasing
    /// any bound driver.
    async fn cancel_ride(&self, ride_id: Uuid, rider_id: Uuid) -> StoreResult<Ride>;

    // =========================================================================
    // Review operations
    // =========================================================================

    /// Records a review and folds it into the driver's aggregate rating in
    /// the same transaction.
    async fn create_review(&self, submission: ReviewSubmission) -> StoreResult<Review>;

    /// Gets the review of a ride.
    async fn get_review_by_ride(&self, ride_id: Uuid) -> StoreResult<Option<Review>>;

    /// Lists reviews of a driver, newest first.
    async fn list_reviews_for_driver(
        &self,
        driver_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Review>>;

    // =========================================================================
    // Workspace operations
    // =========================================================================

    /// Creates a workspace and its owner membership.
    async fn create_workspace(&self, workspace: Workspace) -> StoreResult<Workspace>;

    /// Gets a workspace by ID.
    async fn get_workspace(&self, id: Uuid) -> StoreResult<Option<Workspace>>;

    /// Lists the workspaces a user belongs to, newest first.
    async fn list_workspaces_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Workspace>>;

    /// Adds a member. Fails with `AlreadyExists` if the user is already one.
    async fn add_workspace_member(&self, member: WorkspaceMember) -> StoreResult<WorkspaceMember>;

    /// Gets a user's membership in a workspace.
    async fn get_workspace_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<WorkspaceMember>>;

    /// Lists members of a workspace in join order.
    async fn list_workspace_members(&self, workspace_id: Uuid)
        -> StoreResult<Vec<MemberWithUser>>;

    // =========================================================================
    // Board operations
    // =========================================================================

    /// Appends a task to the end of its column.
    async fn create_board_task(&self, task: BoardTask) -> StoreResult<BoardTask>;

    /// Gets a task by ID.
    async fn get_board_task(&self, id: Uuid) -> StoreResult<Option<BoardTask>>;

    /// Applies a partial update. A task that changes column moves to the end
    /// of its new column.
    async fn update_board_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<BoardTask>;

    /// Places `task_ids` into `status` at positions matching their order, in
    /// one transaction, and returns the whole board.
    async fn reorder_board_tasks(
        &self,
        workspace_id: Uuid,
        status: TaskStatus,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<BoardTask>>;

    /// Lists a workspace's board by column, then position.
    async fn list_board_tasks(&self, workspace_id: Uuid) -> StoreResult<Vec<BoardTask>>;

    /// Deletes a task.
    async fn delete_board_task(&self, id: Uuid) -> StoreResult<()>;

    // =========================================================================
    // Chat operations
    // =========================================================================

    /// Posts a message, stamping `created_at` at commit time. Stamps strictly
    /// increase within a workspace, so a poller's cursor never passes a
    /// message that has yet to be stored.
    async fn create_message(&self, message: Message) -> StoreResult<MessageWithAuthor>;

    /// Lists a workspace's messages, oldest first.
    async fn list_messages(
        &self,
        workspace_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<MessageWithAuthor>>;

    // =========================================================================
    // Document operations
    // =========================================================================

    /// Creates a document.
    async fn create_document(&self, document: Document) -> StoreResult<Document>;

    /// Gets a document by ID.
    async fn get_document(&self, id: Uuid) -> StoreResult<Option<Document>>;

    /// Lists a workspace's documents, most recently updated first.
    async fn list_documents(&self, workspace_id: Uuid) -> StoreResult<Vec<Document>>;

    /// Applies a partial update.
    async fn update_document(&self, id: Uuid, patch: DocumentPatch) -> StoreResult<Document>;

    /// Deletes a document.
    async fn delete_document(&self, id: Uuid) -> StoreResult<()>;
}
