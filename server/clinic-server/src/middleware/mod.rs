//! Request pipeline middleware: timing, CORS, panic recovery and bearer auth

pub mod auth_context;

pub use auth_context::{bearer_token, AuthDoctor};

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::time::{Duration, Instant};
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

use crate::error::ApiError;
use crate::server::ClinicServer;

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = start.elapsed().as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );
    response
}

/// Resolve the bearer token and attach an [`AuthDoctor`] to the request
pub async fn require_bearer_auth(
    State(server): State<ClinicServer>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return ApiError::unauthorized("unauthorized").into_response();
    };
    match server.auth.authenticate(&token).await {
        Ok(doctor_uuid) => {
            request.extensions_mut().insert(AuthDoctor::new(doctor_uuid));
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Convert a handler panic into a JSON 500
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    // the payload is all that survives unwinding; the location was
    // already reported by the panic hook
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::internal("internal server error").into_response()
}

/// Create CORS layer for the application
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600))
}
