use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiErrorResponse, ApiJson, ApiResult};
use crate::middleware::AuthDoctor;
use crate::models::{DoctorProfile, UpsertDoctorProfileRequest};
use crate::server::ClinicServer;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub profile: DoctorProfile,
}

/// The caller's practice profile
#[utoipa::path(
    get,
    path = "/api/doctor/profile",
    responses(
        (status = 200, description = "Profile retrieved", body = ProfileResponse),
        (status = 404, description = "No profile saved yet", body = ApiErrorResponse)
    ),
    tag = "profile",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = server.profiles.get(auth.doctor_uuid).await?;
    Ok(Json(ProfileResponse { profile }))
}

/// Create or replace the caller's profile. Also bound to POST and PATCH.
#[utoipa::path(
    put,
    path = "/api/doctor/profile",
    request_body = UpsertDoctorProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = ApiErrorResponse)
    ),
    tag = "profile",
    security(("bearer_auth" = []))
)]
pub async fn upsert_profile(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiJson(req): ApiJson<UpsertDoctorProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = server.profiles.upsert(auth.doctor_uuid, req).await?;
    Ok(Json(ProfileResponse { profile }))
}
