//! Endpoint paths.

pub const HEALTH: &str = "/health";

// Users
pub const USER_SYNC: &str = "/api/user/sync";
pub const USER_ME: &str = "/api/user/me";
pub const USER_UPDATE_PHONE: &str = "/api/user/update-phone";

// Drivers
pub const DRIVER_REGISTER: &str = "/api/driver/register";
pub const DRIVER_ME: &str = "/api/driver/me";
pub const DRIVER_SET_AVAILABILITY: &str = "/api/driver/set-availability";
pub const DRIVER_UPDATE_LOCATION: &str = "/api/driver/update-location";
pub const DRIVER_LIST_AVAILABLE: &str = "/api/driver/list-available";
pub const DRIVER_PENDING_RIDES: &str = "/api/driver/pending-rides";
pub const DRIVER_ACCEPT: &str = "/api/driver/accept";
pub const DRIVER_START: &str = "/api/driver/start";
pub const DRIVER_COMPLETE: &str = "/api/driver/complete";
pub const DRIVER_RIDES: &str = "/api/driver/rides";

// Rides
pub const RIDE_ESTIMATE: &str = "/api/ride/estimate";
pub const RIDE_CREATE: &str = "/api/ride/create";
pub const RIDE_GET: &str = "/api/ride/get";
pub const RIDE_LIST_MINE: &str = "/api/ride/list-mine";
pub const RIDE_CANCEL: &str = "/api/ride/cancel";
pub const RIDE_UPDATE_STATUS: &str = "/api/ride/update-status";

// Reviews
pub const REVIEW_SUBMIT: &str = "/api/review/submit";
pub const REVIEW_GET: &str = "/api/review/get";
pub const REVIEW_LIST_FOR_DRIVER: &str = "/api/review/list-for-driver";

// Workspaces
pub const WORKSPACE_CREATE: &str = "/api/workspace/create";
pub const WORKSPACE_LIST: &str = "/api/workspace/list";
pub const WORKSPACE_ADD_MEMBER: &str = "/api/workspace/add-member";
pub const WORKSPACE_MEMBERS: &str = "/api/workspace/members";

// Board
pub const TASK_CREATE: &str = "/api/task/create";
pub const TASK_UPDATE: &str = "/api/task/update";
pub const TASK_REORDER: &str = "/api/task/reorder";
pub const TASK_LIST: &str = "/api/task/list";
pub const TASK_DELETE: &str = "/api/task/delete";

// Chat
pub const CHAT_SEND: &str = "/api/chat/send";
pub const CHAT_LIST: &str = "/api/chat/list";

// Documents
pub const DOCUMENT_CREATE: &str = "/api/document/create";
pub const DOCUMENT_LIST: &str = "/api/document/list";
pub const DOCUMENT_GET: &str = "/api/document/get";
pub const DOCUMENT_UPDATE: &str = "/api/document/update";
pub const DOCUMENT_DELETE: &str = "/api/document/delete";
