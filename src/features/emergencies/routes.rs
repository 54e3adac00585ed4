use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::emergencies::handlers;
use crate::features::emergencies::services::EmergencyService;

/// Create routes for the emergencies feature (requires JWT)
pub fn routes(service: Arc<EmergencyService>) -> Router {
    Router::new()
        .route("/api/emergencies", post(handlers::create_emergency))
        .route("/api/emergencies/{id}", get(handlers::get_emergency))
        .route(
            "/api/emergencies/{id}/dispatches",
            get(handlers::list_dispatches),
        )
        .with_state(service)
}
