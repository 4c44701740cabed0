//! Database rows and their conversion into entities.

use chrono::{DateTime, Utc};
use entities::{
    BoardTask, Document, Driver, GeoPoint, MemberRole, Message, MessageWithAuthor, Place, Rating,
    Review, Ride, RideStatus, TaskPriority, TaskStatus, User, UserRole, Workspace,
    WorkspaceMember,
};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{MemberWithUser, StoreError};

pub(crate) const USER_COLUMNS: &str =
    "id, external_id, email, name, role, phone, avatar_url, created_at, updated_at";

pub(crate) const DRIVER_COLUMNS: &str = "id, user_id, license_number, vehicle_model, \
     vehicle_color, vehicle_plate, is_available, current_lat, current_lng, rating, \
     total_rides, created_at, updated_at";

pub(crate) const RIDE_COLUMNS: &str = "id, rider_id, driver_id, pickup_lat, pickup_lng, \
     pickup_address, dropoff_lat, dropoff_lng, dropoff_address, status, fare, distance_km, \
     duration_minutes, created_at, updated_at";

pub(crate) const REVIEW_COLUMNS: &str =
    "id, ride_id, rider_id, driver_id, rating, comment, created_at";

pub(crate) const WORKSPACE_COLUMNS: &str =
    "id, name, description, owner_id, created_at, updated_at";

pub(crate) const MEMBER_COLUMNS: &str = "id, workspace_id, user_id, role, joined_at";

pub(crate) const TASK_COLUMNS: &str = "id, workspace_id, title, description, status, priority, \
     assignee_id, created_by_id, due_date, position, created_at, updated_at";

pub(crate) const DOCUMENT_COLUMNS: &str =
    "id, workspace_id, title, content, created_by_id, created_at, updated_at";

fn invalid(column: &str, value: &str) -> StoreError {
    StoreError::InvalidData(format!("unexpected {column} value {value:?}"))
}

/// Database row for User
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            external_id: row.external_id,
            email: row.email,
            name: row.name,
            role: UserRole::parse(&row.role).ok_or_else(|| invalid("users.role", &row.role))?,
            phone: row.phone,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for Driver
#[derive(Debug, FromRow)]
pub(crate) struct DriverRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_number: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_plate: String,
    pub is_available: bool,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
    pub rating: Decimal,
    pub total_rides: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        let current_location = match (row.current_lat, row.current_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };
        Driver {
            id: row.id,
            user_id: row.user_id,
            license_number: row.license_number,
            vehicle_model: row.vehicle_model,
            vehicle_color: row.vehicle_color,
            vehicle_plate: row.vehicle_plate,
            is_available: row.is_available,
            current_location,
            rating: row.rating,
            total_rides: row.total_rides,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for Ride
#[derive(Debug, FromRow)]
pub(crate) struct RideRow {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_address: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub dropoff_address: String,
    pub status: String,
    pub fare: Decimal,
    pub distance_km: Decimal,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = StoreError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        Ok(Ride {
            id: row.id,
            rider_id: row.rider_id,
            driver_id: row.driver_id,
            pickup: Place::new(row.pickup_lat, row.pickup_lng, row.pickup_address),
            dropoff: Place::new(row.dropoff_lat, row.dropoff_lng, row.dropoff_address),
            status: RideStatus::parse(&row.status)
                .ok_or_else(|| invalid("rides.status", &row.status))?,
            fare: row.fare,
            distance_km: row.distance_km,
            duration_minutes: row.duration_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for Review
#[derive(Debug, FromRow)]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            ride_id: row.ride_id,
            rider_id: row.rider_id,
            driver_id: row.driver_id,
            rating: Rating::new(i64::from(row.rating))
                .ok_or_else(|| invalid("reviews.rating", &row.rating.to_string()))?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

/// Database row for Workspace
#[derive(Debug, FromRow)]
pub(crate) struct WorkspaceRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Workspace {
            id: row.id,
            name: row.name,
            description: row.description,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for WorkspaceMember
#[derive(Debug, FromRow)]
pub(crate) struct MemberRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for WorkspaceMember {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(WorkspaceMember {
            id: row.id,
            workspace_id: row.workspace_id,
            user_id: row.user_id,
            role: MemberRole::parse(&row.role)
                .ok_or_else(|| invalid("workspace_members.role", &row.role))?,
            joined_at: row.joined_at,
        })
    }
}

/// A membership joined with its user.
#[derive(Debug, FromRow)]
pub(crate) struct MemberUserRow {
    #[sqlx(flatten)]
    pub member: MemberRow,
    pub user_external_id: String,
    pub user_email: String,
    pub user_name: String,
    pub user_role: String,
    pub user_phone: Option<String>,
    pub user_avatar_url: Option<String>,
    pub user_created_at: DateTime<Utc>,
    pub user_updated_at: DateTime<Utc>,
}

impl TryFrom<MemberUserRow> for MemberWithUser {
    type Error = StoreError;

    fn try_from(row: MemberUserRow) -> Result<Self, Self::Error> {
        let user = User::try_from(UserRow {
            id: row.member.user_id,
            external_id: row.user_external_id,
            email: row.user_email,
            name: row.user_name,
            role: row.user_role,
            phone: row.user_phone,
            avatar_url: row.user_avatar_url,
            created_at: row.user_created_at,
            updated_at: row.user_updated_at,
        })?;
        Ok(MemberWithUser {
            member: row.member.try_into()?,
            user,
        })
    }
}

/// Database row for BoardTask
#[derive(Debug, FromRow)]
pub(crate) struct BoardTaskRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BoardTaskRow> for BoardTask {
    type Error = StoreError;

    fn try_from(row: BoardTaskRow) -> Result<Self, Self::Error> {
        Ok(BoardTask {
            id: row.id,
            workspace_id: row.workspace_id,
            title: row.title,
            description: row.description,
            status: TaskStatus::parse(&row.status)
                .ok_or_else(|| invalid("board_tasks.status", &row.status))?,
            priority: TaskPriority::parse(&row.priority)
                .ok_or_else(|| invalid("board_tasks.priority", &row.priority))?,
            assignee_id: row.assignee_id,
            created_by_id: row.created_by_id,
            due_date: row.due_date,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A chat message joined with its author's display name.
#[derive(Debug, FromRow)]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
}

impl From<MessageRow> for MessageWithAuthor {
    fn from(row: MessageRow) -> Self {
        MessageWithAuthor {
            message: Message {
                id: row.id,
                workspace_id: row.workspace_id,
                user_id: row.user_id,
                content: row.content,
                created_at: row.created_at,
            },
            user_name: row.user_name,
        }
    }
}

/// Database row for Document
#[derive(Debug, FromRow)]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            workspace_id: row.workspace_id,
            title: row.title,
            content: row.content,
            created_by_id: row.created_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Converts fetched rows, failing on the first row that does not map.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
