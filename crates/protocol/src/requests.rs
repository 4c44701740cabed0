//! Request bodies.

use chrono::{DateTime, Utc};
use entities::{MemberRole, Place, RideStatus, TaskPriority, TaskStatus};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Paging parameters shared by list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    /// Requested page size; clamped by each endpoint.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Cursor returned by the previous page.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Empty body for endpoints that take no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyRequest {}

// ========== Users ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePhoneRequest {
    pub phone: Option<String>,
}

// ========== Drivers ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDriverRequest {
    pub license_number: String,
    pub vehicle_model: String,
    pub vehicle_color: String,
    pub vehicle_plate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

// ========== Rides ==========

/// Pickup and dropoff with optional client-side routing figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateFareRequest {
    pub pickup: Place,
    pub dropoff: Place,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// Same shape as an estimate; any client-submitted fare is ignored.
pub type CreateRideRequest = EstimateFareRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideIdRequest {
    pub ride_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRideStatusRequest {
    pub ride_id: Uuid,
    pub status: RideStatus,
}

// ========== Reviews ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub ride_id: Uuid,
    /// Checked against 1..=5 by the handler so out-of-range values get a
    /// validation error rather than a decode failure.
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDriverReviewsRequest {
    pub driver_id: Uuid,
    #[serde(flatten)]
    pub page: PageParams,
}

// ========== Workspaces ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceIdRequest {
    pub workspace_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub workspace_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

// ========== Board ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub workspace_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update; an explicit `null` clears a nullable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub task_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderTasksRequest {
    pub workspace_id: Uuid,
    pub status: TaskStatus,
    pub task_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIdRequest {
    pub task_id: Uuid,
}

// ========== Chat ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub workspace_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesRequest {
    pub workspace_id: Uuid,
    /// Cursor from a previous call; only newer messages are returned.
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

// ========== Documents ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub workspace_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIdRequest {
    pub document_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    pub document_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_task_distinguishes_null_from_absent() {
        let id = Uuid::new_v4();
        let request: UpdateTaskRequest = serde_json::from_value(json!({
            "task_id": id,
            "description": null,
            "status": "done",
        }))
        .unwrap();

        assert_eq!(request.description, Some(None));
        assert_eq!(request.assignee_id, None);
        assert_eq!(request.due_date, None);
        assert_eq!(request.status, Some(TaskStatus::Done));
    }

    #[test]
    fn test_page_params_flatten() {
        let driver_id = Uuid::new_v4();
        let request: ListDriverReviewsRequest = serde_json::from_value(json!({
            "driver_id": driver_id,
            "limit": 5,
        }))
        .unwrap();

        assert_eq!(request.driver_id, driver_id);
        assert_eq!(request.page.limit, Some(5));
        assert!(request.page.cursor.is_none());
    }

    #[test]
    fn test_estimate_routing_figures_are_optional() {
        let request: EstimateFareRequest = serde_json::from_value(json!({
            "pickup": {"lat": 1.0, "lng": 2.0, "address": "A"},
            "dropoff": {"lat": 1.1, "lng": 2.1, "address": "B"},
        }))
        .unwrap();

        assert!(request.distance_km.is_none());
        assert!(request.duration_minutes.is_none());
        assert_eq!(request.dropoff.address, "B");
    }
}
