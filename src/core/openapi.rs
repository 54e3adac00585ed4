use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::emergencies::{dtos as emergencies_dtos, handlers as emergencies_handlers};
use crate::features::emergencies::models as emergencies_models;
use crate::features::providers::{dtos as providers_dtos, handlers as providers_handlers};
use crate::shared::geo::EligibilityCheck;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Providers
        providers_handlers::location_handler::upsert_location,
        providers_handlers::location_handler::get_my_location,
        providers_handlers::location_handler::set_availability,
        // Emergencies
        emergencies_handlers::emergency_handler::create_emergency,
        emergencies_handlers::emergency_handler::get_emergency,
        emergencies_handlers::emergency_handler::list_dispatches,
    ),
    components(
        schemas(
            // Shared
            Meta,
            EligibilityCheck,
            auth::model::AuthenticatedUser,
            // Providers
            providers_dtos::UpdateLocationDto,
            providers_dtos::UpdateAvailabilityDto,
            providers_dtos::LocationResponseDto,
            ApiResponse<providers_dtos::LocationResponseDto>,
            // Emergencies
            emergencies_models::EmergencyStatus,
            emergencies_dtos::CreateEmergencyDto,
            emergencies_dtos::EmergencyResponseDto,
            emergencies_dtos::EmergencyDetailResponseDto,
            emergencies_dtos::DispatchResponseDto,
            ApiResponse<emergencies_dtos::EmergencyResponseDto>,
            ApiResponse<emergencies_dtos::EmergencyDetailResponseDto>,
            ApiResponse<Vec<emergencies_dtos::DispatchResponseDto>>,
        )
    ),
    tags(
        (name = "providers", description = "Provider location heartbeat and availability"),
        (name = "emergencies", description = "Emergency requests and dispatch fan-out"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "GigHub Dispatch API",
        version = "0.1.0",
        description = "API documentation for the GigHub emergency dispatch service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
