use std::sync::Arc;

use axum::{routing::put, Router};

use crate::features::providers::handlers;
use crate::features::providers::services::LocationService;

/// Create routes for the providers feature (requires provider JWT)
pub fn routes(service: Arc<LocationService>) -> Router {
    Router::new()
        .route(
            "/api/providers/me/location",
            put(handlers::upsert_location).get(handlers::get_my_location),
        )
        .route(
            "/api/providers/me/availability",
            put(handlers::set_availability),
        )
        .with_state(service)
}
