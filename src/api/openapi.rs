//! OpenAPI documentation

use axum::Router;
use utoipa::{openapi::server::ServerBuilder, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libreria API",
        version = "1.0.0",
        description = "Library Catalog REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::list_books,
        books::get_book,
        books::update_book,
        books::check_in_book,
        books::check_out_book,
        books::rate_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookRequest,
            crate::models::book::BookResponse,
            crate::models::book::BookStatus,
            crate::models::book::RateRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FieldError,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management")
    )
)]
pub struct ApiDoc;

/// OpenAPI document whose server points at the mounted API base, e.g. `/api/v1`
pub fn api_doc(api_base: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![ServerBuilder::new()
        .url(api_base)
        .description(Some("API v1"))
        .build()]);
    doc
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router(api_base: &str) -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(api_base)))
}
