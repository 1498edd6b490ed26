//! REST API layer: read-only route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`. With the `swagger-ui`
//! feature the OpenAPI document is served at `/api-docs/openapi.json` and
//! browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of the HTTP surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "meeting-relay",
        description = "Signaling relay for peer-to-peer meeting rooms. Signaling itself runs over the `/ws` WebSocket."
    ),
    paths(handlers::system::health_handler, handlers::meeting::list_participants),
    tags(
        (name = "System", description = "Service health"),
        (name = "Meetings", description = "Meeting membership"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());
    with_docs(router)
}

#[cfg(feature = "swagger-ui")]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router
}
