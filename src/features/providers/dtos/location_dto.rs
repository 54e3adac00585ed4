use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::providers::models::ProviderLocation;

/// Heartbeat payload: the provider's current position
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationDto {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be in [-90, 90]"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be in [-180, 180]"))]
    pub longitude: f64,
}

/// Availability toggle, optionally updating dispatch settings in the same call
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailabilityDto {
    pub is_online: bool,

    /// New service radius in km; omit to keep the stored value.
    /// Zero is valid and means "on-site only".
    #[validate(range(min = 0.0, message = "Service radius must not be negative"))]
    pub service_radius_km: Option<f64>,

    /// Advertised service ids; omit to keep the stored set
    pub service_ids: Option<Vec<String>>,
}

/// Response DTO for a provider location record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponseDto {
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_radius_km: Option<f64>,
    pub is_online: bool,
    pub service_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProviderLocation> for LocationResponseDto {
    fn from(record: ProviderLocation) -> Self {
        Self {
            provider_id: record.provider_id,
            latitude: record.latitude,
            longitude: record.longitude,
            service_radius_km: record.service_radius_km,
            is_online: record.is_online,
            service_ids: record.service_ids,
            updated_at: record.updated_at,
        }
    }
}
