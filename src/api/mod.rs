//! API handlers and routing for the Bookshelf REST endpoints

pub mod books;
pub mod health;
pub mod openapi;

use std::any::Any;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::CorsConfig,
    error::{ErrorResponse, MSG_INTERNAL_ERROR, MSG_RESOURCE_NOT_FOUND},
    AppState,
};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check).fallback(not_found))
        .route("/ready", get(health::readiness_check).fallback(not_found))
        // Books
        .route(
            "/api/books",
            get(books::list_books)
                .post(books::create_book)
                .fallback(not_found),
        )
        .route(
            "/api/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book)
                .fallback(not_found),
        )
        .with_state(state);

    let router = Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Catch-all for unmatched routes, including unsupported methods on known paths
async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(MSG_RESOURCE_NOT_FOUND)),
    )
}

/// Turn a panicking handler into a generic 500, keeping the detail in the logs
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(MSG_INTERNAL_ERROR)),
    )
        .into_response()
}

/// CORS restricted to the single configured origin, if enabled
fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    match config.origin.parse::<HeaderValue>() {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list([origin]))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([CONTENT_TYPE]),
        ),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, CORS disabled", config.origin);
            None
        }
    }
}
