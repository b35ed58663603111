use axum::{extract::State, http::StatusCode};

use crate::server::ClinicServer;

/// Liveness check; also pings PostgreSQL when the server owns a pool
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is up", body = String),
        (status = 503, description = "Database unreachable", body = String)
    ),
    tag = "health"
)]
pub async fn health_check(State(server): State<ClinicServer>) -> (StatusCode, &'static str) {
    if let Some(db) = &server.database {
        if !db.is_healthy().await {
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
        }
    }
    (StatusCode::OK, "ok")
}
