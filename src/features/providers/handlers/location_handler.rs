use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::providers::dtos::{
    LocationResponseDto, UpdateAvailabilityDto, UpdateLocationDto,
};
use crate::features::providers::services::LocationService;
use crate::shared::geo::GeoPoint;
use crate::shared::types::ApiResponse;

/// Report the provider's current location (heartbeat)
///
/// Idempotent upsert keyed by the authenticated provider's id. Clients
/// call this once when going online and then every 30 seconds while the
/// provider stays online.
#[utoipa::path(
    put,
    path = "/api/providers/me/location",
    request_body = UpdateLocationDto,
    responses(
        (status = 200, description = "Location recorded", body = ApiResponse<LocationResponseDto>),
        (status = 400, description = "Coordinates out of range"),
        (status = 403, description = "Caller is not a provider")
    ),
    security(("bearer_auth" = [])),
    tag = "providers"
)]
pub async fn upsert_location(
    State(service): State<Arc<LocationService>>,
    user: AuthenticatedUser,
    AppJson(dto): AppJson<UpdateLocationDto>,
) -> Result<Json<ApiResponse<LocationResponseDto>>> {
    require_provider(&user)?;

    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let position = GeoPoint::new(dto.latitude, dto.longitude)?;

    let record = service.upsert_location(&user.account_id, position).await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Toggle the provider's online flag
///
/// Going online makes the provider a candidate for emergency dispatch;
/// going offline removes them from candidate queries immediately. The
/// service radius and advertised service ids can be updated in the same
/// call.
#[utoipa::path(
    put,
    path = "/api/providers/me/availability",
    request_body = UpdateAvailabilityDto,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<LocationResponseDto>),
        (status = 403, description = "Caller is not a provider")
    ),
    security(("bearer_auth" = [])),
    tag = "providers"
)]
pub async fn set_availability(
    State(service): State<Arc<LocationService>>,
    user: AuthenticatedUser,
    AppJson(dto): AppJson<UpdateAvailabilityDto>,
) -> Result<Json<ApiResponse<LocationResponseDto>>> {
    require_provider(&user)?;

    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = service
        .set_availability(
            &user.account_id,
            dto.is_online,
            dto.service_radius_km,
            dto.service_ids,
        )
        .await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

/// Get the provider's own location record
#[utoipa::path(
    get,
    path = "/api/providers/me/location",
    responses(
        (status = 200, description = "Current location record", body = ApiResponse<LocationResponseDto>),
        (status = 404, description = "Provider never reported a location or availability")
    ),
    security(("bearer_auth" = [])),
    tag = "providers"
)]
pub async fn get_my_location(
    State(service): State<Arc<LocationService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<LocationResponseDto>>> {
    require_provider(&user)?;

    let record = service.get_by_provider_id(&user.account_id).await?;
    Ok(Json(ApiResponse::success(Some(record.into()), None, None)))
}

fn require_provider(user: &AuthenticatedUser) -> Result<()> {
    if !user.is_provider() {
        return Err(AppError::Forbidden(
            "Only providers can manage location and availability".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::providers::routes;
    use crate::shared::test_helpers::with_provider_auth;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    // A lazy pool never connects; validation failures reject the request
    // before any query runs.
    fn test_router() -> axum::Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        with_provider_auth(routes::routes(Arc::new(LocationService::new(pool))))
    }

    #[tokio::test]
    async fn heartbeat_rejects_out_of_range_latitude() {
        let server = TestServer::new(test_router()).unwrap();

        let response = server
            .put("/api/providers/me/location")
            .json(&json!({ "latitude": 91.0, "longitude": -9.1 }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn heartbeat_rejects_missing_coordinates() {
        let server = TestServer::new(test_router()).unwrap();

        let response = server
            .put("/api/providers/me/location")
            .json(&json!({ "latitude": 38.7 }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn availability_rejects_negative_radius() {
        let server = TestServer::new(test_router()).unwrap();

        let response = server
            .put("/api/providers/me/availability")
            .json(&json!({ "isOnline": true, "serviceRadiusKm": -5.0 }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let router = routes::routes(Arc::new(LocationService::new(pool)));
        let server = TestServer::new(router).unwrap();

        let response = server
            .put("/api/providers/me/location")
            .json(&json!({ "latitude": 38.7, "longitude": -9.1 }))
            .await;

        response.assert_status_unauthorized();
    }
}
