use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::error::{ApiError, ApiErrorResponse, ApiJson, ApiResult};
use crate::middleware::{bearer_token, AuthDoctor};
use crate::models::{
    AuthSession, ChangePasswordRequest, Doctor, LoginRequest, LogoutRequest, RegisterRequest,
};
use crate::server::ClinicServer;

/// Register a doctor and open a session
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Doctor registered", body = AuthSession),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 409, description = "Email or username already taken", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(server): State<ClinicServer>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthSession>)> {
    let session = server.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Exchange an email or username and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 401, description = "Invalid credentials", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(server): State<ClinicServer>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    Ok(Json(server.auth.login(req).await?))
}

/// Revoke the token from the body, or the bearer token when the body has none
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body(content = LogoutRequest, description = "Optional; the bearer token is used when absent"),
    responses(
        (status = 204, description = "Token revoked"),
        (status = 400, description = "No token supplied", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(server): State<ClinicServer>,
    headers: HeaderMap,
    body: Option<ApiJson<LogoutRequest>>,
) -> ApiResult<StatusCode> {
    let from_body = body
        .and_then(|ApiJson(req)| req.token)
        .filter(|t| !t.trim().is_empty());
    let token = from_body
        .or_else(|| bearer_token(&headers).map(str::to_owned))
        .ok_or_else(|| ApiError::invalid_request("logout: token is required"))?;

    server.auth.logout(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The doctor behind the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current doctor", body = Doctor),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn me(State(server): State<ClinicServer>, auth: AuthDoctor) -> ApiResult<Json<Doctor>> {
    Ok(Json(server.auth.current_doctor(auth.doctor_uuid).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 401, description = "Current password does not match", body = ApiErrorResponse)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    server.auth.change_password(auth.doctor_uuid, req).await?;
    Ok(StatusCode::NO_CONTENT)
}
