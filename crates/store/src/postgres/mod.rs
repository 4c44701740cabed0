//! PostgreSQL store implementation.
//!
//! Ride transitions are single conditional `UPDATE`s (or short transactions
//! holding row locks), so concurrent requests race at the database rather
//! than in the application.

mod board;
mod chat;
mod documents;
mod drivers;
mod reviews;
mod rides;
mod rows;
mod schema;
mod users;
mod workspaces;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{
    BoardTask, Document, DocumentPatch, Driver, DriverProfile, GeoPoint, Message,
    MessageWithAuthor, Review, Ride, TaskPatch, TaskStatus, User, Workspace, WorkspaceMember,
};
use pagination::{Page, PageRequest};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::{MemberWithUser, ReviewSubmission, Store, StoreResult};

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to `database_url` and applies the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Wraps an existing pool without touching the schema.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates any missing tables and indexes.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(schema::SCHEMA_SQL).execute(&self.pool).await?;
        info!("Database schema is up to date");
        Ok(())
    }
}

/// Splits a page request into the bind parameters of a keyset predicate.
fn keyset(page: &PageRequest) -> (Option<DateTime<Utc>>, Option<Uuid>) {
    page.cursor().map(|c| (c.created_at, c.id)).unzip()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl Store for PgStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn ensure_user(&self, user: User) -> StoreResult<User> {
        users::ensure(&self.pool, user).await
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        users::get_by_external_id(&self.pool, external_id).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        users::get_by_email(&self.pool, email).await
    }

    async fn update_user_phone(&self, id: Uuid, phone: Option<String>) -> StoreResult<User> {
        users::update_phone(&self.pool, id, phone).await
    }

    // =========================================================================
    // Driver operations
    // =========================================================================

    async fn register_driver(&self, user_id: Uuid, profile: DriverProfile) -> StoreResult<Driver> {
        drivers::register(&self.pool, user_id, profile).await
    }

    async fn get_driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
        drivers::get(&self.pool, id).await
    }

    async fn get_driver_by_user(&self, user_id: Uuid) -> StoreResult<Option<Driver>> {
        drivers::get_by_user(&self.pool, user_id).await
    }

    async fn set_driver_availability(
        &self,
        driver_id: Uuid,
        available: bool,
    ) -> StoreResult<Driver> {
        drivers::set_availability(&self.pool, driver_id, available).await
    }

    async fn update_driver_location(
        &self,
        driver_id: Uuid,
        location: GeoPoint,
    ) -> StoreResult<Driver> {
        drivers::update_location(&self.pool, driver_id, location).await
    }

    async fn list_available_drivers(&self, page: PageRequest) -> StoreResult<Page<Driver>> {
        drivers::list_available(&self.pool, &page).await
    }

    // =========================================================================
    // Ride operations
    // =========================================================================

    async fn create_ride(&self, ride: Ride) -> StoreResult<Ride> {
        rides::create(&self.pool, ride).await
    }

    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        rides::get(&self.pool, id).await
    }

    async fn list_rides_for_rider(
        &self,
        rider_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Ride>> {
        rides::list_for_rider(&self.pool, rider_id, &page).await
    }

    async fn list_rides_for_driver(
        &self,
        driver_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Ride>> {
        rides::list_for_driver(&self.pool, driver_id, &page).await
    }

    async fn list_pending_rides(&self, page: PageRequest) -> StoreResult<Page<Ride>> {
        rides::list_pending(&self.pool, &page).await
    }

    async fn accept_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
        rides::accept(&self.pool, ride_id, driver_id).await
    }

    async fn start_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
        rides::start(&self.pool, ride_id, driver_id).await
    }

    async fn complete_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
        rides::complete(&self.pool, ride_id, driver_id).await
    }

    async fn cancel_ride(&self, ride_id: Uuid, rider_id: Uuid) -> StoreResult<Ride> {
        rides::cancel(&self.pool, ride_id, rider_id).await
    }

    // =========================================================================
    // Review operations
    // =========================================================================

    async fn create_review(&self, submission: ReviewSubmission) -> StoreResult<Review> {
        reviews::create(&self.pool, submission).await
    }

    async fn get_review_by_ride(&self, ride_id: Uuid) -> StoreResult<Option<Review>> {
        reviews::get_by_ride(&self.pool, ride_id).await
    }

    async fn list_reviews_for_driver(
        &self,
        driver_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Review>> {
        reviews::list_for_driver(&self.pool, driver_id, &page).await
    }

    // =========================================================================
    // Workspace operations
    // =========================================================================

    async fn create_workspace(&self, workspace: Workspace) -> StoreResult<Workspace> {
        workspaces::create(&self.pool, workspace).await
    }

    async fn get_workspace(&self, id: Uuid) -> StoreResult<Option<Workspace>> {
        workspaces::get(&self.pool, id).await
    }

    async fn list_workspaces_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Workspace>> {
        workspaces::list_for_user(&self.pool, user_id).await
    }

    async fn add_workspace_member(&self, member: WorkspaceMember) -> StoreResult<WorkspaceMember> {
        workspaces::add_member(&self.pool, member).await
    }

    async fn get_workspace_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<WorkspaceMember>> {
        workspaces::get_member(&self.pool, workspace_id, user_id).await
    }

    async fn list_workspace_members(
        &self,
        workspace_id: Uuid,
    ) -> StoreResult<Vec<MemberWithUser>> {
        workspaces::list_members(&self.pool, workspace_id).await
    }

    // =========================================================================
    // Board operations
    // =========================================================================

    async fn create_board_task(&self, task: BoardTask) -> StoreResult<BoardTask> {
        board::create(&self.pool, task).await
    }

    async fn get_board_task(&self, id: Uuid) -> StoreResult<Option<BoardTask>> {
        board::get(&self.pool, id).await
    }

    async fn update_board_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<BoardTask> {
        board::update(&self.pool, id, patch).await
    }

    async fn reorder_board_tasks(
        &self,
        workspace_id: Uuid,
        status: TaskStatus,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<BoardTask>> {
        board::reorder(&self.pool, workspace_id, status, task_ids).await
    }

    async fn list_board_tasks(&self, workspace_id: Uuid) -> StoreResult<Vec<BoardTask>> {
        board::list(&self.pool, workspace_id).await
    }

    async fn delete_board_task(&self, id: Uuid) -> StoreResult<()> {
        board::delete(&self.pool, id).await
    }

    // =========================================================================
    // Chat operations
    // =========================================================================

    async fn create_message(&self, message: Message) -> StoreResult<MessageWithAuthor> {
        chat::create(&self.pool, message).await
    }

    async fn list_messages(
        &self,
        workspace_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<MessageWithAuthor>> {
        chat::list(&self.pool, workspace_id, &page).await
    }

    // =========================================================================
    // Document operations
    // =========================================================================

    async fn create_document(&self, document: Document) -> StoreResult<Document> {
        documents::create(&self.pool, document).await
    }

    async fn get_document(&self, id: Uuid) -> StoreResult<Option<Document>> {
        documents::get(&self.pool, id).await
    }

    async fn list_documents(&self, workspace_id: Uuid) -> StoreResult<Vec<Document>> {
        documents::list(&self.pool, workspace_id).await
    }

    async fn update_document(&self, id: Uuid, patch: DocumentPatch) -> StoreResult<Document> {
        documents::update(&self.pool, id, patch).await
    }

    async fn delete_document(&self, id: Uuid) -> StoreResult<()> {
        documents::delete(&self.pool, id).await
    }
}
