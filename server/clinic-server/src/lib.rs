//! Physiotherapy clinic server
//!
//! HTTP API for a small practice: doctor accounts with bearer tokens,
//! patients and their visit notes (anamneses), printable PDF opinions,
//! practice branding and PostgreSQL backup/restore. The same process
//! serves uploaded branding assets and the single-page frontend.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod report;
pub mod repositories;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::ClinicServer;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use routes::paths;

/// Create the main application router with all routes and middleware
pub fn create_app(server: ClinicServer) -> Router {
    let protected = routes::protected_routes().route_layer(from_fn_with_state(
        server.clone(),
        middleware::require_bearer_auth,
    ));
    let api = routes::public_routes()
        .route(paths::OPENAPI_JSON, get(openapi::openapi_json))
        .merge(protected)
        .fallback(api_not_found);

    let frontend = &server.config.frontend_dir;
    let spa = ServeDir::new(frontend).fallback(ServeFile::new(frontend.join("index.html")));
    let uploads = ServeDir::new(server.storage.uploads_dir());

    let app = Router::new()
        .nest(paths::API, api)
        .nest_service(paths::STATIC, uploads)
        .fallback_service(spa);
    with_middleware(app).with_state(server)
}

/// Panic recovery, tracing, CORS and request timing around every route
pub fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(middleware::handle_panic))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::create_cors_layer())
            .layer(from_fn(middleware::request_timing_middleware)),
    )
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("route not found")
}
