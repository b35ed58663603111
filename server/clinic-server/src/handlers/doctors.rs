use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiErrorResponse, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::models::{CreateDoctorRequest, Doctor, UpdateDoctorRequest};
use crate::server::ClinicServer;
use crate::types::pagination::{ListParams, DOCTOR_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorListResponse {
    pub doctors: Vec<Doctor>,
}

/// Add a doctor to the directory; no login credentials are created
#[utoipa::path(
    post,
    path = "/api/doctors",
    request_body = CreateDoctorRequest,
    responses(
        (status = 201, description = "Doctor created", body = Doctor),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 409, description = "Email or username already taken", body = ApiErrorResponse)
    ),
    tag = "doctors",
    security(("bearer_auth" = []))
)]
pub async fn create_doctor(
    State(server): State<ClinicServer>,
    ApiJson(req): ApiJson<CreateDoctorRequest>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    let doctor = server.doctors.create(req).await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[utoipa::path(
    get,
    path = "/api/doctors",
    params(ListParams),
    responses(
        (status = 200, description = "Doctors retrieved", body = DoctorListResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse)
    ),
    tag = "doctors",
    security(("bearer_auth" = []))
)]
pub async fn list_doctors(
    State(server): State<ClinicServer>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<DoctorListResponse>> {
    let doctors = server
        .doctors
        .list(params.query(), params.page(DOCTOR_PAGE_SIZE))
        .await?;
    Ok(Json(DoctorListResponse { doctors }))
}

#[utoipa::path(
    get,
    path = "/api/doctors/{uuid}",
    params(("uuid" = Uuid, Path, description = "Doctor ID")),
    responses(
        (status = 200, description = "Doctor retrieved", body = Doctor),
        (status = 404, description = "Doctor not found", body = ApiErrorResponse)
    ),
    tag = "doctors",
    security(("bearer_auth" = []))
)]
pub async fn get_doctor(
    State(server): State<ClinicServer>,
    ApiPath(uuid): ApiPath<Uuid>,
) -> ApiResult<Json<Doctor>> {
    Ok(Json(server.doctors.get(uuid).await?))
}

#[utoipa::path(
    patch,
    path = "/api/doctors/{uuid}",
    params(("uuid" = Uuid, Path, description = "Doctor ID")),
    request_body = UpdateDoctorRequest,
    responses(
        (status = 200, description = "Doctor updated", body = Doctor),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 404, description = "Doctor not found", body = ApiErrorResponse),
        (status = 409, description = "Email or username already taken", body = ApiErrorResponse)
    ),
    tag = "doctors",
    security(("bearer_auth" = []))
)]
pub async fn update_doctor(
    State(server): State<ClinicServer>,
    ApiPath(uuid): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateDoctorRequest>,
) -> ApiResult<Json<Doctor>> {
    Ok(Json(server.doctors.update(uuid, req).await?))
}

/// Delete a doctor; patients, notes, tokens and profile cascade
#[utoipa::path(
    delete,
    path = "/api/doctors/{uuid}",
    params(("uuid" = Uuid, Path, description = "Doctor ID")),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "Doctor not found", body = ApiErrorResponse)
    ),
    tag = "doctors",
    security(("bearer_auth" = []))
)]
pub async fn delete_doctor(
    State(server): State<ClinicServer>,
    ApiPath(uuid): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    server.doctors.delete(uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}
