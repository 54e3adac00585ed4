use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an emergency request.
///
/// `pending` requests are picked up by the dispatch worker; a request
/// ends as `dispatched` (at least one provider notified), `no_match`
/// (no eligible provider) or `failed` (retries exhausted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "emergency_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    Pending,
    Dispatched,
    NoMatch,
    Failed,
}

/// Database model for an emergency request
#[derive(Debug, Clone, FromRow)]
pub struct EmergencyRequest {
    pub id: Uuid,
    pub requester_id: String,
    pub service_id: String,
    pub requester_latitude: f64,
    pub requester_longitude: f64,
    pub description: Option<String>,
    pub status: EmergencyStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for one notified provider on a request
#[derive(Debug, Clone, FromRow)]
pub struct EmergencyDispatch {
    pub id: Uuid,
    pub request_id: Uuid,
    pub provider_id: String,
    pub distance_km: f64,
    pub notified_at: DateTime<Utc>,
}
