use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;
use crate::handlers::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::handlers::inventory::{
    AdjustStockRequest, CreateItemRequest, ItemResponse, UpdateItemRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventoria API",
        version = "0.1.0",
        description = "Multi-tenant inventory tracking API. Register an account, \
then manage named items with stock balances, minimum-stock thresholds, and \
monthly trend counts. All inventory endpoints require a bearer token and only \
ever operate on the calling user's items."
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::create_item,
        crate::handlers::inventory::update_item,
        crate::handlers::inventory::delete_item,
        crate::handlers::inventory::search_items,
        crate::handlers::inventory::low_stock_items,
        crate::handlers::inventory::adjust_stock,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        CreateItemRequest,
        UpdateItemRequest,
        AdjustStockRequest,
        ItemResponse,
        ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login, and token invalidation"),
        (name = "inventory", description = "Per-user inventory items"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
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

/// Swagger UI mounted at `/docs`, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
