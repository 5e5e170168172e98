use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Store Directory API",
        version = "0.1.0",
        description = "JSON endpoints of the store directory.\n\n**Authentication:** the heart endpoint needs a session, sent either as the `session` cookie set at login or as a Bearer token."
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Stores
        crate::api::store_api::search,
        crate::api::store_api::near,
        crate::api::store_api::heart,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::Location,
            crate::models::StoreView,
            crate::models::StoreSummaryView,
            crate::models::TagCount,
            crate::models::UserView,
        )
    ),
    tags(
        (name = "Health", description = "Service and database status."),
        (name = "Stores", description = "Full text search, nearby stores and hearts."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token issued at login"))
                        .build(),
                ),
            );
        }
    }
}
