//! In-memory store implementation.
//!
//! All tables sit behind one lock, so every method observes and mutates a
//! consistent snapshot. This gives the same atomicity the PostgreSQL store
//! gets from transactions and conditional updates.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use entities::{
    BoardTask, Document, DocumentPatch, Driver, DriverProfile, GeoPoint, MemberRole, Message,
    MessageWithAuthor, Review, Ride, RideStatus, TaskPatch, TaskStatus, User, UserRole,
    Workspace, WorkspaceMember,
};
use pagination::{Cursor, Direction, Page, PageRequest};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{MemberWithUser, ReviewSubmission, Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    drivers: HashMap<Uuid, Driver>,
    rides: HashMap<Uuid, Ride>,
    reviews: HashMap<Uuid, Review>,
    workspaces: HashMap<Uuid, Workspace>,
    members: HashMap<Uuid, WorkspaceMember>,
    tasks: HashMap<Uuid, BoardTask>,
    messages: HashMap<Uuid, Message>,
    documents: HashMap<Uuid, Document>,
}

impl Tables {
    fn driver_has_active_ride(&self, driver_id: Uuid) -> bool {
        self.rides
            .values()
            .any(|r| r.driver_id == Some(driver_id) && r.status.is_active())
    }

    fn next_position(&self, workspace_id: Uuid, status: TaskStatus, excluding: Uuid) -> i32 {
        self.tasks
            .values()
            .filter(|t| t.workspace_id == workspace_id && t.status == status && t.id != excluding)
            .map(|t| t.position + 1)
            .max()
            .unwrap_or(0)
    }

    fn board(&self, workspace_id: Uuid) -> Vec<BoardTask> {
        let mut tasks: Vec<BoardTask> = self
            .tasks
            .values()
            .filter(|t| t.workspace_id == workspace_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            (a.status, a.position, a.created_at).cmp(&(b.status, b.position, b.created_at))
        });
        tasks
    }

    fn with_author(&self, message: Message) -> MessageWithAuthor {
        let user_name = self
            .users
            .get(&message.user_id)
            .map(|u| u.display_name().to_string())
            .unwrap_or_default();
        MessageWithAuthor { message, user_name }
    }
}

/// Selects one page of `rows` ordered by `position` in `direction`.
fn paginate<'a, T, F>(
    rows: impl Iterator<Item = &'a T>,
    request: &PageRequest,
    direction: Direction,
    position: F,
) -> Page<T>
where
    T: Clone + 'a,
    F: Fn(&T) -> Cursor,
{
    let mut rows: Vec<T> = rows
        .filter(|row| request.admits(direction, &position(*row)))
        .cloned()
        .collect();
    rows.sort_by(|a, b| direction.compare(&position(a), &position(b)));
    rows.truncate(request.fetch_limit() as usize);
    Page::from_overfetch(rows, request, &position)
}

fn ride_position(ride: &Ride) -> Cursor {
    Cursor::new(ride.created_at, ride.id)
}

/// In-memory store for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn ensure_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .users
            .values()
            .find(|u| u.external_id == user.external_id)
        {
            return Ok(existing.clone());
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::already_exists("User", &user.email));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user_phone(&self, id: Uuid, phone: Option<String>) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("User", id))?;
        user.phone = phone;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    // =========================================================================
    // Driver operations
    // =========================================================================

    async fn register_driver(&self, user_id: Uuid, profile: DriverProfile) -> StoreResult<Driver> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found("User", user_id))?;
        user.role = UserRole::Driver;
        user.updated_at = Utc::now();

        if let Some(driver) = tables.drivers.values_mut().find(|d| d.user_id == user_id) {
            driver.update_profile(profile);
            return Ok(driver.clone());
        }

        let driver = Driver::new(user_id, profile);
        tables.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    async fn get_driver(&self, id: Uuid) -> StoreResult<Option<Driver>> {
        let tables = self.tables.read().await;
        Ok(tables.drivers.get(&id).cloned())
    }

    async fn get_driver_by_user(&self, user_id: Uuid) -> StoreResult<Option<Driver>> {
        let tables = self.tables.read().await;
        Ok(tables
            .drivers
            .values()
            .find(|d| d.user_id == user_id)
            .cloned())
    }

    async fn set_driver_availability(
        &self,
        driver_id: Uuid,
        available: bool,
    ) -> StoreResult<Driver> {
        let mut tables = self.tables.write().await;
        if available && tables.driver_has_active_ride(driver_id) {
            return Err(StoreError::conflict(
                "driver has an active ride and cannot become available",
            ));
        }
        let driver = tables
            .drivers
            .get_mut(&driver_id)
            .ok_or_else(|| StoreError::not_found("Driver", driver_id))?;
        driver.is_available = available;
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    async fn update_driver_location(
        &self,
        driver_id: Uuid,
        location: GeoPoint,
    ) -> StoreResult<Driver> {
        let mut tables = self.tables.write().await;
        let driver = tables
            .drivers
            .get_mut(&driver_id)
            .ok_or_else(|| StoreError::not_found("Driver", driver_id))?;
        driver.current_location = Some(location);
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    async fn list_available_drivers(&self, page: PageRequest) -> StoreResult<Page<Driver>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables.drivers.values().filter(|d| d.is_available),
            &page,
            Direction::Ascending,
            |d: &Driver| Cursor::new(d.created_at, d.id),
        ))
    }

    // =========================================================================
    // Ride operations
    // =========================================================================

    async fn create_ride(&self, ride: Ride) -> StoreResult<Ride> {
        let mut tables = self.tables.write().await;
        if tables.rides.contains_key(&ride.id) {
            return Err(StoreError::already_exists("Ride", ride.id));
        }
        tables.rides.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        let tables = self.tables.read().await;
        Ok(tables.rides.get(&id).cloned())
    }

    async fn list_rides_for_rider(
        &self,
        rider_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Ride>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables.rides.values().filter(|r| r.rider_id == rider_id),
            &page,
            Direction::Descending,
            ride_position,
        ))
    }

    async fn list_rides_for_driver(
        &self,
        driver_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Ride>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables
                .rides
                .values()
                .filter(|r| r.driver_id == Some(driver_id)),
            &page,
            Direction::Descending,
            ride_position,
        ))
    }

    async fn list_pending_rides(&self, page: PageRequest) -> StoreResult<Page<Ride>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables
                .rides
                .values()
                .filter(|r| r.status == RideStatus::Pending),
            &page,
            Direction::Ascending,
            ride_position,
        ))
    }

    async fn accept_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
        let mut tables = self.tables.write().await;
        let Tables { rides, drivers, .. } = &mut *tables;

        let ride = rides
            .get_mut(&ride_id)
            .ok_or_else(|| StoreError::not_found("Ride", ride_id))?;
        let driver = drivers
            .get_mut(&driver_id)
            .ok_or_else(|| StoreError::not_found("Driver", driver_id))?;

        if ride.status != RideStatus::Pending {
            return Err(StoreError::InvalidStateTransition {
                from: ride.status,
                to: RideStatus::Accepted,
            });
        }
        if !driver.is_available {
            return Err(StoreError::conflict("driver is not available"));
        }

        ride.accept(driver_id)?;
        driver.is_available = false;
        driver.updated_at = ride.updated_at;
        Ok(ride.clone())
    }

    async fn start_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
        let mut tables = self.tables.write().await;
        let ride = tables
            .rides
            .get_mut(&ride_id)
            .filter(|r| r.driver_id.is_none_or(|d| d == driver_id))
            .ok_or_else(|| StoreError::not_found("Ride", ride_id))?;
        ride.start()?;
        Ok(ride.clone())
    }

    async fn complete_ride(&self, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
        let mut tables = self.tables.write().await;
        let ride = tables
            .rides
            .get_mut(&ride_id)
            .filter(|r| r.driver_id.is_none_or(|d| d == driver_id))
            .ok_or_else(|| StoreError::not_found("Ride", ride_id))?;
        ride.complete()?;
        Ok(ride.clone())
    }

    async fn cancel_ride(&self, ride_id: Uuid, rider_id: Uuid) -> StoreResult<Ride> {
        let mut tables = self.tables.write().await;
        let Tables { rides, drivers, .. } = &mut *tables;

        let ride = rides
            .get_mut(&ride_id)
            .filter(|r| r.rider_id == rider_id)
            .ok_or_else(|| StoreError::not_found("Ride", ride_id))?;
        if let Some(released) = ride.cancel()? {
            if let Some(driver) = drivers.get_mut(&released) {
                driver.is_available = true;
                driver.updated_at = ride.updated_at;
            }
        }
        Ok(ride.clone())
    }

    // =========================================================================
    // Review operations
    // =========================================================================

    async fn create_review(&self, submission: ReviewSubmission) -> StoreResult<Review> {
        let mut tables = self.tables.write().await;
        let Tables {
            rides,
            drivers,
            reviews,
            ..
        } = &mut *tables;

        let ride = rides
            .get(&submission.ride_id)
            .filter(|r| r.rider_id == submission.rider_id)
            .ok_or_else(|| StoreError::not_found("Ride", submission.ride_id))?;
        let driver_id = ride
            .driver_id
            .ok_or_else(|| StoreError::conflict("ride has no driver to review"))?;
        if ride.status != RideStatus::Completed {
            return Err(StoreError::conflict(format!(
                "only completed rides can be reviewed (ride is {})",
                ride.status
            )));
        }
        if reviews.values().any(|r| r.ride_id == ride.id) {
            return Err(StoreError::already_exists("Review", ride.id));
        }
        let driver = drivers
            .get_mut(&driver_id)
            .ok_or_else(|| StoreError::not_found("Driver", driver_id))?;

        let mut review = Review::new(ride.id, ride.rider_id, driver_id, submission.rating);
        if let Some(comment) = submission.comment {
            review = review.with_comment(comment);
        }
        driver.record_rating(submission.rating);
        reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_review_by_ride(&self, ride_id: Uuid) -> StoreResult<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .find(|r| r.ride_id == ride_id)
            .cloned())
    }

    async fn list_reviews_for_driver(
        &self,
        driver_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<Review>> {
        let tables = self.tables.read().await;
        Ok(paginate(
            tables.reviews.values().filter(|r| r.driver_id == driver_id),
            &page,
            Direction::Descending,
            |r: &Review| Cursor::new(r.created_at, r.id),
        ))
    }

    // =========================================================================
    // Workspace operations
    // =========================================================================

    async fn create_workspace(&self, workspace: Workspace) -> StoreResult<Workspace> {
        let mut tables = self.tables.write().await;
        if tables.workspaces.contains_key(&workspace.id) {
            return Err(StoreError::already_exists("Workspace", workspace.id));
        }
        let owner = WorkspaceMember::new(workspace.id, workspace.owner_id, MemberRole::Owner);
        tables.members.insert(owner.id, owner);
        tables.workspaces.insert(workspace.id, workspace.clone());
        Ok(workspace)
    }

    async fn get_workspace(&self, id: Uuid) -> StoreResult<Option<Workspace>> {
        let tables = self.tables.read().await;
        Ok(tables.workspaces.get(&id).cloned())
    }

    async fn list_workspaces_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Workspace>> {
        let tables = self.tables.read().await;
        let mut result: Vec<Workspace> = tables
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.workspaces.get(&m.workspace_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn add_workspace_member(&self, member: WorkspaceMember) -> StoreResult<WorkspaceMember> {
        let mut tables = self.tables.write().await;
        if !tables.workspaces.contains_key(&member.workspace_id) {
            return Err(StoreError::not_found("Workspace", member.workspace_id));
        }
        if tables
            .members
            .values()
            .any(|m| m.workspace_id == member.workspace_id && m.user_id == member.user_id)
        {
            return Err(StoreError::already_exists("WorkspaceMember", member.user_id));
        }
        tables.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn get_workspace_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<WorkspaceMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.workspace_id == workspace_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_workspace_members(
        &self,
        workspace_id: Uuid,
    ) -> StoreResult<Vec<MemberWithUser>> {
        let tables = self.tables.read().await;
        let mut result: Vec<MemberWithUser> = tables
            .members
            .values()
            .filter(|m| m.workspace_id == workspace_id)
            .filter_map(|m| {
                tables.users.get(&m.user_id).map(|u| MemberWithUser {
                    member: m.clone(),
                    user: u.clone(),
                })
            })
            .collect();
        result.sort_by(|a, b| a.member.joined_at.cmp(&b.member.joined_at));
        Ok(result)
    }

    // =========================================================================
    // Board operations
    // =========================================================================

    async fn create_board_task(&self, mut task: BoardTask) -> StoreResult<BoardTask> {
        let mut tables = self.tables.write().await;
        if !tables.workspaces.contains_key(&task.workspace_id) {
            return Err(StoreError::not_found("Workspace", task.workspace_id));
        }
        task.position = tables.next_position(task.workspace_id, task.status, task.id);
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_board_task(&self, id: Uuid) -> StoreResult<Option<BoardTask>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).cloned())
    }

    async fn update_board_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<BoardTask> {
        let mut tables = self.tables.write().await;
        let mut task = tables
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("BoardTask", id))?;
        if task.apply(patch) {
            task.position = tables.next_position(task.workspace_id, task.status, task.id);
        }
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn reorder_board_tasks(
        &self,
        workspace_id: Uuid,
        status: TaskStatus,
        task_ids: &[Uuid],
    ) -> StoreResult<Vec<BoardTask>> {
        let mut tables = self.tables.write().await;

        let mut seen = HashSet::new();
        for id in task_ids {
            if !seen.insert(*id) {
                return Err(StoreError::validation(format!("task {id} listed twice")));
            }
            if !tables
                .tasks
                .get(id)
                .is_some_and(|t| t.workspace_id == workspace_id)
            {
                return Err(StoreError::validation(format!(
                    "task {id} is not on this board"
                )));
            }
        }

        let now = Utc::now();
        for (index, id) in task_ids.iter().enumerate() {
            if let Some(task) = tables.tasks.get_mut(id) {
                task.status = status;
                task.position = i32::try_from(index).unwrap_or(i32::MAX);
                task.updated_at = now;
            }
        }
        Ok(tables.board(workspace_id))
    }

    async fn list_board_tasks(&self, workspace_id: Uuid) -> StoreResult<Vec<BoardTask>> {
        let tables = self.tables.read().await;
        Ok(tables.board(workspace_id))
    }

    async fn delete_board_task(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.tasks.remove(&id).is_none() {
            return Err(StoreError::not_found("BoardTask", id));
        }
        Ok(())
    }

    // =========================================================================
    // Chat operations
    // =========================================================================

    async fn create_message(&self, mut message: Message) -> StoreResult<MessageWithAuthor> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&message.user_id) {
            return Err(StoreError::not_found("User", message.user_id));
        }
        let latest = tables
            .messages
            .values()
            .filter(|m| m.workspace_id == message.workspace_id)
            .map(|m| m.created_at)
            .max();
        message.stamp_after(latest);
        tables.messages.insert(message.id, message.clone());
        Ok(tables.with_author(message))
    }

    async fn list_messages(
        &self,
        workspace_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<MessageWithAuthor>> {
        let tables = self.tables.read().await;
        let page = paginate(
            tables
                .messages
                .values()
                .filter(|m| m.workspace_id == workspace_id),
            &page,
            Direction::Ascending,
            |m: &Message| Cursor::new(m.created_at, m.id),
        );
        Ok(page.map(|m| tables.with_author(m)))
    }

    // =========================================================================
    // Document operations
    // =========================================================================

    async fn create_document(&self, document: Document) -> StoreResult<Document> {
        let mut tables = self.tables.write().await;
        if !tables.workspaces.contains_key(&document.workspace_id) {
            return Err(StoreError::not_found("Workspace", document.workspace_id));
        }
        tables.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> StoreResult<Option<Document>> {
        let tables = self.tables.read().await;
        Ok(tables.documents.get(&id).cloned())
    }

    async fn list_documents(&self, workspace_id: Uuid) -> StoreResult<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut result: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.workspace_id == workspace_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result)
    }

    async fn update_document(&self, id: Uuid, patch: DocumentPatch) -> StoreResult<Document> {
        let mut tables = self.tables.write().await;
        let document = tables
            .documents
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Document", id))?;
        document.apply(patch);
        Ok(document.clone())
    }

    async fn delete_document(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.documents.remove(&id).is_none() {
            return Err(StoreError::not_found("Document", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use entities::{FareQuote, Place, Rating};
    use rust_decimal::Decimal;

    use super::*;

    fn profile(plate: &str) -> DriverProfile {
        DriverProfile {
            license_number: "D1234567".to_string(),
            vehicle_model: "Toyota Prius".to_string(),
            vehicle_color: "Silver".to_string(),
            vehicle_plate: plate.to_string(),
        }
    }

    async fn rider(store: &MemoryStore, name: &str) -> User {
        store
            .ensure_user(User::new(name, format!("{name}@example.com")).with_name(name))
            .await
            .unwrap()
    }

    async fn driver(store: &MemoryStore, name: &str) -> Driver {
        let user = rider(store, name).await;
        store
            .register_driver(user.id, profile(&format!("{name}-1")))
            .await
            .unwrap()
    }

    async fn pending_ride(store: &MemoryStore, rider_id: Uuid) -> Ride {
        let ride = Ride::new(
            rider_id,
            Place::new(37.7749, -122.4194, "Market St"),
            Place::new(37.7849, -122.4094, "Polk St"),
            FareQuote::new(Decimal::new(10, 0), 20),
        );
        store.create_ride(ride).await.unwrap()
    }

    async fn completed_ride(store: &MemoryStore, rider_id: Uuid, driver_id: Uuid) -> Ride {
        let ride = pending_ride(store, rider_id).await;
        store.accept_ride(ride.id, driver_id).await.unwrap();
        store.start_ride(ride.id, driver_id).await.unwrap();
        store.complete_ride(ride.id, driver_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        let first = rider(&store, "alice").await;
        let again = store
            .ensure_user(User::new("alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(again.name, "alice");
    }

    #[tokio::test]
    async fn test_register_driver_sets_role_and_updates_in_place() {
        let store = MemoryStore::new();
        let user = rider(&store, "dana").await;

        let created = store.register_driver(user.id, profile("ABC-123")).await.unwrap();
        assert!(created.is_available);
        assert_eq!(created.rating, Decimal::ZERO);

        let updated = store.register_driver(user.id, profile("XYZ-999")).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.vehicle_plate, "XYZ-999");

        let user = store
            .get_user_by_external_id(&user.external_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, UserRole::Driver);
    }

    #[tokio::test]
    async fn test_accept_binds_driver_and_marks_unavailable() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let ride = pending_ride(&store, alice.id).await;

        let accepted = store.accept_ride(ride.id, dana.id).await.unwrap();
        assert_eq!(accepted.status, RideStatus::Accepted);
        assert_eq!(accepted.driver_id, Some(dana.id));

        let dana = store.get_driver(dana.id).await.unwrap().unwrap();
        assert!(!dana.is_available);
    }

    #[tokio::test]
    async fn test_second_accept_conflicts_and_keeps_first_driver() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let erin = driver(&store, "erin").await;
        let ride = pending_ride(&store, alice.id).await;

        store.accept_ride(ride.id, dana.id).await.unwrap();
        let err = store.accept_ride(ride.id, erin.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidStateTransition {
                from: RideStatus::Accepted,
                ..
            }
        ));

        let ride = store.get_ride(ride.id).await.unwrap().unwrap();
        assert_eq!(ride.driver_id, Some(dana.id));
        assert!(store.get_driver(erin.id).await.unwrap().unwrap().is_available);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_have_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let alice = rider(&store, "alice").await;
        let ride = pending_ride(&store, alice.id).await;
        let mut drivers = Vec::new();
        for name in ["d1", "d2", "d3", "d4", "d5"] {
            drivers.push(driver(&store, name).await);
        }

        let handles: Vec<_> = drivers
            .iter()
            .map(|d| {
                let store = Arc::clone(&store);
                let (ride_id, driver_id) = (ride.id, d.id);
                tokio::spawn(async move { store.accept_ride(ride_id, driver_id).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let available = store
            .list_available_drivers(PageRequest::bounded(None, 20))
            .await
            .unwrap();
        assert_eq!(available.items.len(), drivers.len() - 1);
    }

    #[tokio::test]
    async fn test_busy_driver_cannot_accept_another_ride() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let first = pending_ride(&store, alice.id).await;
        let second = pending_ride(&store, alice.id).await;

        store.accept_ride(first.id, dana.id).await.unwrap();
        let err = store.accept_ride(second.id, dana.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let second = store.get_ride(second.id).await.unwrap().unwrap();
        assert_eq!(second.status, RideStatus::Pending);
    }

    #[tokio::test]
    async fn test_accept_unknown_ride_is_not_found() {
        let store = MemoryStore::new();
        let dana = driver(&store, "dana").await;
        let err = store.accept_ride(Uuid::new_v4(), dana.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_only_bound_driver_can_start_and_complete() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let erin = driver(&store, "erin").await;
        let ride = pending_ride(&store, alice.id).await;

        let err = store.start_ride(ride.id, dana.id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidStateTransition { .. }));

        store.accept_ride(ride.id, dana.id).await.unwrap();
        let err = store.start_ride(ride.id, erin.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = store.complete_ride(ride.id, dana.id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidStateTransition { .. }));

        store.start_ride(ride.id, dana.id).await.unwrap();
        let done = store.complete_ride(ride.id, dana.id).await.unwrap();
        assert_eq!(done.status, RideStatus::Completed);

        let dana = store.get_driver(dana.id).await.unwrap().unwrap();
        assert!(!dana.is_available);
    }

    #[tokio::test]
    async fn test_cancel_accepted_ride_releases_driver() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let ride = pending_ride(&store, alice.id).await;
        store.accept_ride(ride.id, dana.id).await.unwrap();

        let cancelled = store.cancel_ride(ride.id, alice.id).await.unwrap();
        assert_eq!(cancelled.status, RideStatus::Cancelled);
        assert!(cancelled.driver_id.is_none());
        assert!(store.get_driver(dana.id).await.unwrap().unwrap().is_available);
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let bob = rider(&store, "bob").await;
        let dana = driver(&store, "dana").await;

        let ride = pending_ride(&store, alice.id).await;
        let err = store.cancel_ride(ride.id, bob.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let done = completed_ride(&store, alice.id, dana.id).await;
        let err = store.cancel_ride(done.id, alice.id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn test_driver_with_active_ride_cannot_become_available() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let ride = pending_ride(&store, alice.id).await;
        store.accept_ride(ride.id, dana.id).await.unwrap();

        let err = store
            .set_driver_availability(dana.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        store.set_driver_availability(dana.id, false).await.unwrap();

        store.start_ride(ride.id, dana.id).await.unwrap();
        store.complete_ride(ride.id, dana.id).await.unwrap();
        let dana = store.set_driver_availability(dana.id, true).await.unwrap();
        assert!(dana.is_available);
    }

    #[tokio::test]
    async fn test_review_updates_driver_aggregate() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;

        for rating in [4, 4, 4, 5] {
            let ride = completed_ride(&store, alice.id, dana.id).await;
            store.set_driver_availability(dana.id, true).await.unwrap();
            store
                .create_review(ReviewSubmission {
                    ride_id: ride.id,
                    rider_id: alice.id,
                    rating: Rating::new(rating).unwrap(),
                    comment: None,
                })
                .await
                .unwrap();
        }

        let dana = store.get_driver(dana.id).await.unwrap().unwrap();
        assert_eq!(dana.rating, Decimal::new(425, 2));
        assert_eq!(dana.total_rides, 4);
    }

    #[tokio::test]
    async fn test_duplicate_review_is_rejected() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let ride = completed_ride(&store, alice.id, dana.id).await;

        let submission = ReviewSubmission {
            ride_id: ride.id,
            rider_id: alice.id,
            rating: Rating::new(5).unwrap(),
            comment: Some("Smooth ride".to_string()),
        };
        let first = store.create_review(submission.clone()).await.unwrap();
        let err = store
            .create_review(ReviewSubmission {
                rating: Rating::new(1).unwrap(),
                ..submission
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let stored = store.get_review_by_ride(ride.id).await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.rating.get(), 5);
        let dana = store.get_driver(dana.id).await.unwrap().unwrap();
        assert_eq!(dana.total_rides, 1);
    }

    #[tokio::test]
    async fn test_review_requires_completed_ride() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let ride = pending_ride(&store, alice.id).await;

        let submission = ReviewSubmission {
            ride_id: ride.id,
            rider_id: alice.id,
            rating: Rating::new(5).unwrap(),
            comment: None,
        };
        let err = store.create_review(submission.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.accept_ride(ride.id, dana.id).await.unwrap();
        let err = store.create_review(submission).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ride_listings_page_newest_first() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(pending_ride(&store, alice.id).await.id);
        }

        let first = store
            .list_rides_for_rider(alice.id, PageRequest::bounded(Some(3), 50))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 3);
        let token = first.next_cursor.clone().unwrap();

        let second = store
            .list_rides_for_rider(
                alice.id,
                PageRequest::bounded(Some(3), 50)
                    .after_token(Some(&token))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
        assert!(second.next_cursor.is_none());

        let listed: HashSet<Uuid> = first
            .items
            .iter()
            .chain(second.items.iter())
            .map(|r| r.id)
            .collect();
        assert_eq!(listed.len(), 5);
        assert!(first.items[0].created_at >= first.items[2].created_at);
    }

    #[tokio::test]
    async fn test_pending_listing_excludes_accepted_rides() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let dana = driver(&store, "dana").await;
        let taken = pending_ride(&store, alice.id).await;
        let open = pending_ride(&store, alice.id).await;
        store.accept_ride(taken.id, dana.id).await.unwrap();

        let page = store
            .list_pending_rides(PageRequest::bounded(None, 20))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, open.id);
    }

    #[tokio::test]
    async fn test_workspace_creation_adds_owner() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let bob = rider(&store, "bob").await;
        let workspace = store
            .create_workspace(Workspace::new("Platform", alice.id))
            .await
            .unwrap();

        let owner = store
            .get_workspace_member(workspace.id, alice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.role, MemberRole::Owner);

        store
            .add_workspace_member(WorkspaceMember::new(workspace.id, bob.id, MemberRole::Member))
            .await
            .unwrap();
        let err = store
            .add_workspace_member(WorkspaceMember::new(workspace.id, bob.id, MemberRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let members = store.list_workspace_members(workspace.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(store.list_workspaces_for_user(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_board_positions_and_reorder() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let workspace = store
            .create_workspace(Workspace::new("Platform", alice.id))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            let task = store
                .create_board_task(BoardTask::new(workspace.id, alice.id, title))
                .await
                .unwrap();
            ids.push(task.id);
        }
        let c = store.get_board_task(ids[2]).await.unwrap().unwrap();
        assert_eq!(c.position, 2);

        let moved = store
            .update_board_task(
                ids[0],
                TaskPatch {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.position, 0);

        let d = store
            .create_board_task(BoardTask::new(workspace.id, alice.id, "d"))
            .await
            .unwrap();
        assert_eq!(d.position, 3);

        let board = store
            .reorder_board_tasks(workspace.id, TaskStatus::InProgress, &[d.id, ids[1]])
            .await
            .unwrap();
        let in_progress: Vec<Uuid> = board
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| t.id)
            .collect();
        assert_eq!(in_progress, vec![d.id, ids[1]]);
        assert_eq!(board[0].id, ids[2]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_foreign_and_duplicate_ids() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let workspace = store
            .create_workspace(Workspace::new("Platform", alice.id))
            .await
            .unwrap();
        let task = store
            .create_board_task(BoardTask::new(workspace.id, alice.id, "a"))
            .await
            .unwrap();

        let err = store
            .reorder_board_tasks(workspace.id, TaskStatus::Done, &[task.id, task.id])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = store
            .reorder_board_tasks(workspace.id, TaskStatus::Done, &[task.id, Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let task = store.get_board_task(task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn test_messages_page_oldest_first_with_author() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let workspace = store
            .create_workspace(Workspace::new("Platform", alice.id))
            .await
            .unwrap();

        let first = store
            .create_message(Message::new(workspace.id, alice.id, "hello"))
            .await
            .unwrap();
        assert_eq!(first.user_name, "alice");

        let cursor = Cursor::new(first.message.created_at, first.message.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store
            .create_message(Message::new(workspace.id, alice.id, "anyone here?"))
            .await
            .unwrap();

        let newer = store
            .list_messages(workspace.id, PageRequest::bounded(None, 100).after(cursor))
            .await
            .unwrap();
        assert_eq!(newer.items.len(), 1);
        assert_eq!(newer.items[0].message.content, "anyone here?");
    }

    #[tokio::test]
    async fn test_late_commit_is_not_skipped_by_pollers() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let workspace = store
            .create_workspace(Workspace::new("Platform", alice.id))
            .await
            .unwrap();

        // Built first, stored second.
        let slow = Message::new(workspace.id, alice.id, "slow");
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let fast = store
            .create_message(Message::new(workspace.id, alice.id, "fast"))
            .await
            .unwrap();

        let seen = store
            .list_messages(workspace.id, PageRequest::bounded(None, 100))
            .await
            .unwrap();
        assert_eq!(seen.items.len(), 1);
        let cursor = Cursor::new(fast.message.created_at, fast.message.id);

        let stored = store.create_message(slow).await.unwrap();
        assert!(stored.message.created_at > fast.message.created_at);

        let next = store
            .list_messages(workspace.id, PageRequest::bounded(None, 100).after(cursor))
            .await
            .unwrap();
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.items[0].message.content, "slow");
    }

    #[tokio::test]
    async fn test_documents_listed_by_last_update() {
        let store = MemoryStore::new();
        let alice = rider(&store, "alice").await;
        let workspace = store
            .create_workspace(Workspace::new("Platform", alice.id))
            .await
            .unwrap();

        let older = store
            .create_document(Document::new(workspace.id, alice.id, "Runbook"))
            .await
            .unwrap();
        store
            .create_document(Document::new(workspace.id, alice.id, "Roadmap"))
            .await
            .unwrap();
        store
            .update_document(
                older.id,
                DocumentPatch {
                    content: Some("Page the on-call".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let documents = store.list_documents(workspace.id).await.unwrap();
        assert_eq!(documents[0].id, older.id);

        store.delete_document(older.id).await.unwrap();
        assert!(store.get_document(older.id).await.unwrap().is_none());
    }
}
