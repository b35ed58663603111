use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiErrorResponse, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::middleware::AuthDoctor;
use crate::models::{CreatePatientRequest, Patient, UpdatePatientRequest};
use crate::server::ClinicServer;
use crate::types::pagination::{ListParams, PATIENT_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientListResponse {
    pub patients: Vec<Patient>,
}

/// Create a patient owned by the caller
#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn create_patient(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiJson(req): ApiJson<CreatePatientRequest>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let patient = server.patients.create(auth.doctor_uuid, req).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// The caller's patients, newest first
#[utoipa::path(
    get,
    path = "/api/patients",
    params(ListParams),
    responses(
        (status = 200, description = "Patients retrieved", body = PatientListResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn list_patients(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<PatientListResponse>> {
    let patients = server
        .patients
        .list(auth.doctor_uuid, params.query(), params.page(PATIENT_PAGE_SIZE))
        .await?;
    Ok(Json(PatientListResponse { patients }))
}

#[utoipa::path(
    get,
    path = "/api/patients/{patient_uuid}",
    params(("patient_uuid" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient retrieved", body = Patient),
        (status = 400, description = "Patient belongs to another doctor", body = ApiErrorResponse),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn get_patient(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath(uuid): ApiPath<Uuid>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(server.patients.get(auth.doctor_uuid, uuid).await?))
}

#[utoipa::path(
    patch,
    path = "/api/patients/{patient_uuid}",
    params(("patient_uuid" = Uuid, Path, description = "Patient ID")),
    request_body = UpdatePatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn update_patient(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath(uuid): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdatePatientRequest>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(server.patients.update(auth.doctor_uuid, uuid, req).await?))
}

/// Delete a patient together with its visit notes
#[utoipa::path(
    delete,
    path = "/api/patients/{patient_uuid}",
    params(("patient_uuid" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 400, description = "Patient belongs to another doctor", body = ApiErrorResponse),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn delete_patient(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath(uuid): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    server.patients.delete(auth.doctor_uuid, uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}
