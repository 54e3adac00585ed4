use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::emergencies::models::{EmergencyDispatch, EmergencyRequest, EmergencyStatus};

/// Request DTO for creating an emergency request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmergencyDto {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be in [-90, 90]"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be in [-180, 180]"))]
    pub longitude: f64,

    /// Skill/category required for this emergency
    #[validate(length(min = 1, max = 100, message = "Service id must be 1-100 characters"))]
    pub service_id: String,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,
}

/// Response DTO for an emergency request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyResponseDto {
    pub id: Uuid,
    pub requester_id: String,
    pub service_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: EmergencyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmergencyRequest> for EmergencyResponseDto {
    fn from(request: EmergencyRequest) -> Self {
        Self {
            id: request.id,
            requester_id: request.requester_id,
            service_id: request.service_id,
            latitude: request.requester_latitude,
            longitude: request.requester_longitude,
            description: request.description,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// Response DTO for one notified provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponseDto {
    pub provider_id: String,
    pub distance_km: f64,
    pub notified_at: DateTime<Utc>,
}

impl From<EmergencyDispatch> for DispatchResponseDto {
    fn from(dispatch: EmergencyDispatch) -> Self {
        Self {
            provider_id: dispatch.provider_id,
            distance_km: dispatch.distance_km,
            notified_at: dispatch.notified_at,
        }
    }
}

/// Detail response: the request plus its dispatch fan-out
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyDetailResponseDto {
    #[serde(flatten)]
    pub request: EmergencyResponseDto,
    pub dispatches: Vec<DispatchResponseDto>,
}
