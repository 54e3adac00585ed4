use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::emergencies::dtos::{
    CreateEmergencyDto, DispatchResponseDto, EmergencyDetailResponseDto, EmergencyResponseDto,
};
use crate::features::emergencies::services::EmergencyService;
use crate::shared::geo::GeoPoint;
use crate::shared::types::{ApiResponse, Meta};

/// Create an emergency request
///
/// The request is stored as `pending` and picked up by the dispatch
/// worker, which locates nearby online providers and notifies them.
#[utoipa::path(
    post,
    path = "/api/emergencies",
    request_body = CreateEmergencyDto,
    responses(
        (status = 201, description = "Emergency request created", body = ApiResponse<EmergencyResponseDto>),
        (status = 400, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "emergencies"
)]
pub async fn create_emergency(
    State(service): State<Arc<EmergencyService>>,
    user: AuthenticatedUser,
    AppJson(dto): AppJson<CreateEmergencyDto>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<EmergencyResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let position = GeoPoint::new(dto.latitude, dto.longitude)?;

    let request = service
        .create(
            &user.account_id,
            position,
            &dto.service_id,
            dto.description.as_deref(),
        )
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(request.into()),
            Some("Emergency request received, locating nearby providers".to_string()),
            None,
        )),
    ))
}

/// Get an emergency request with its dispatch fan-out
#[utoipa::path(
    get,
    path = "/api/emergencies/{id}",
    params(
        ("id" = Uuid, Path, description = "Emergency request id")
    ),
    responses(
        (status = 200, description = "Emergency request found", body = ApiResponse<EmergencyDetailResponseDto>),
        (status = 404, description = "Emergency request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "emergencies"
)]
pub async fn get_emergency(
    State(service): State<Arc<EmergencyService>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EmergencyDetailResponseDto>>> {
    let request = service.get_by_id(id).await?;
    authorize_read(&user, &request.requester_id)?;

    let dispatches = service.list_dispatches(id).await?;

    let detail = EmergencyDetailResponseDto {
        request: request.into(),
        dispatches: dispatches.into_iter().map(|d| d.into()).collect(),
    };

    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

/// List the providers notified for an emergency request
#[utoipa::path(
    get,
    path = "/api/emergencies/{id}/dispatches",
    params(
        ("id" = Uuid, Path, description = "Emergency request id")
    ),
    responses(
        (status = 200, description = "Notified providers, nearest first", body = ApiResponse<Vec<DispatchResponseDto>>),
        (status = 404, description = "Emergency request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "emergencies"
)]
pub async fn list_dispatches(
    State(service): State<Arc<EmergencyService>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<DispatchResponseDto>>>> {
    let request = service.get_by_id(id).await?;
    authorize_read(&user, &request.requester_id)?;

    let dispatches = service.list_dispatches(id).await?;
    let total = dispatches.len() as i64;
    let dtos: Vec<DispatchResponseDto> = dispatches.into_iter().map(|d| d.into()).collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

fn authorize_read(user: &AuthenticatedUser, requester_id: &str) -> Result<()> {
    if user.account_id != requester_id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Emergency requests are only visible to their requester".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::emergencies::routes;
    use crate::shared::test_helpers::with_provider_auth;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    fn test_router() -> axum::Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        with_provider_auth(routes::routes(Arc::new(EmergencyService::new(pool))))
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_coordinates() {
        let server = TestServer::new(test_router()).unwrap();

        let response = server
            .post("/api/emergencies")
            .json(&json!({
                "latitude": 38.8,
                "longitude": 200.0,
                "serviceId": "plumbing"
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_rejects_empty_service_id() {
        let server = TestServer::new(test_router()).unwrap();

        let response = server
            .post("/api/emergencies")
            .json(&json!({
                "latitude": 38.8,
                "longitude": -9.1,
                "serviceId": ""
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn unauthenticated_create_is_rejected() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let router = routes::routes(Arc::new(EmergencyService::new(pool)));
        let server = TestServer::new(router).unwrap();

        let response = server
            .post("/api/emergencies")
            .json(&json!({
                "latitude": 38.8,
                "longitude": -9.1,
                "serviceId": "plumbing"
            }))
            .await;

        response.assert_status_unauthorized();
    }
}
