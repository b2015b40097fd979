//! API handlers for Libreria REST endpoints

pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    error_handling::HandleErrorLayer,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    routing::{get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// Book identifier taken from the `{id}` path segment.
///
/// Anything that is not an integer is a bad request, never a not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for BookId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::invalid_book_id())?;

        raw.parse::<i32>()
            .map(BookId)
            .map_err(|_| AppError::invalid_book_id())
    }
}

/// JSON body whose rejections render as the API error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Query string whose rejections render as the API error envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Render failures of the timeout middleware as the API error envelope
async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Unavailable("request timed out".to_string())
    } else {
        AppError::Internal(format!("unhandled middleware error: {}", err))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_base = state.config.server.api_base();
    let request_timeout = state.config.server.request_timeout();

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", post(books::create_book).get(books::list_books))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/:id/in", patch(books::check_in_book))
        .route("/books/:id/out", patch(books::check_out_book))
        .route("/books/:id/rate", patch(books::rate_book))
        .with_state(state);

    Router::new()
        .nest(&api_base, api_v1)
        .merge(openapi::create_openapi_router(&api_base))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
