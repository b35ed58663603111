use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiErrorResponse, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::middleware::AuthDoctor;
use crate::models::{Anamnesis, CreateAnamnesisRequest, GeneratePdfRequest, UpdateAnamnesisRequest};
use crate::server::ClinicServer;
use crate::types::pagination::{ListParams, ANAMNESIS_PAGE_SIZE};

pub const PDF_CONTENT_DISPOSITION: &str = "attachment; filename=\"anamnesis.pdf\"";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnamnesisListResponse {
    pub anamneses: Vec<Anamnesis>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PdfParams {
    /// `true` prints the selected visit alone
    pub only_current: Option<String>,
}

impl PdfParams {
    pub fn only_current(&self) -> bool {
        self.only_current.as_deref() == Some("true")
    }
}

/// Visit notes of one patient, newest first, filtered by diagnosis
#[utoipa::path(
    get,
    path = "/api/patients/{patient_uuid}/anamneses",
    params(
        ("patient_uuid" = Uuid, Path, description = "Patient ID"),
        ListParams
    ),
    responses(
        (status = 200, description = "Visit notes retrieved", body = AnamnesisListResponse),
        (status = 400, description = "Patient belongs to another doctor", body = ApiErrorResponse),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "anamneses",
    security(("bearer_auth" = []))
)]
pub async fn list_anamneses(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath(patient_uuid): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<AnamnesisListResponse>> {
    let anamneses = server
        .anamneses
        .list(
            auth.doctor_uuid,
            patient_uuid,
            params.query(),
            params.page(ANAMNESIS_PAGE_SIZE),
        )
        .await?;
    Ok(Json(AnamnesisListResponse { anamneses }))
}

#[utoipa::path(
    post,
    path = "/api/patients/{patient_uuid}/anamneses",
    params(("patient_uuid" = Uuid, Path, description = "Patient ID")),
    request_body = CreateAnamnesisRequest,
    responses(
        (status = 201, description = "Visit note created", body = Anamnesis),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "anamneses",
    security(("bearer_auth" = []))
)]
pub async fn create_anamnesis(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath(patient_uuid): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateAnamnesisRequest>,
) -> ApiResult<(StatusCode, Json<Anamnesis>)> {
    let record = server
        .anamneses
        .create(auth.doctor_uuid, patient_uuid, req)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/patients/{patient_uuid}/anamneses/{uuid}",
    params(
        ("patient_uuid" = Uuid, Path, description = "Patient ID"),
        ("uuid" = Uuid, Path, description = "Visit note ID")
    ),
    responses(
        (status = 200, description = "Visit note retrieved", body = Anamnesis),
        (status = 400, description = "Ownership mismatch", body = ApiErrorResponse),
        (status = 404, description = "Visit note not found", body = ApiErrorResponse)
    ),
    tag = "anamneses",
    security(("bearer_auth" = []))
)]
pub async fn get_anamnesis(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath((patient_uuid, uuid)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Anamnesis>> {
    Ok(Json(
        server.anamneses.get(auth.doctor_uuid, patient_uuid, uuid).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/patients/{patient_uuid}/anamneses/{uuid}",
    params(
        ("patient_uuid" = Uuid, Path, description = "Patient ID"),
        ("uuid" = Uuid, Path, description = "Visit note ID")
    ),
    request_body = UpdateAnamnesisRequest,
    responses(
        (status = 200, description = "Visit note updated", body = Anamnesis),
        (status = 400, description = "Invalid request", body = ApiErrorResponse),
        (status = 404, description = "Visit note not found", body = ApiErrorResponse)
    ),
    tag = "anamneses",
    security(("bearer_auth" = []))
)]
pub async fn update_anamnesis(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath((patient_uuid, uuid)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateAnamnesisRequest>,
) -> ApiResult<Json<Anamnesis>> {
    Ok(Json(
        server
            .anamneses
            .update(auth.doctor_uuid, patient_uuid, uuid, req)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{patient_uuid}/anamneses/{uuid}",
    params(
        ("patient_uuid" = Uuid, Path, description = "Patient ID"),
        ("uuid" = Uuid, Path, description = "Visit note ID")
    ),
    responses(
        (status = 204, description = "Visit note deleted"),
        (status = 400, description = "Ownership mismatch", body = ApiErrorResponse),
        (status = 404, description = "Visit note not found", body = ApiErrorResponse)
    ),
    tag = "anamneses",
    security(("bearer_auth" = []))
)]
pub async fn delete_anamnesis(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath((patient_uuid, uuid)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    server
        .anamneses
        .delete(auth.doctor_uuid, patient_uuid, uuid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Render the physiotherapist opinion for a visit.
///
/// The body is optional; an unreadable body is treated as empty so the
/// stored include list applies.
#[utoipa::path(
    post,
    path = "/api/patients/{patient_uuid}/anamneses/{uuid}/pdf",
    params(
        ("patient_uuid" = Uuid, Path, description = "Patient ID"),
        ("uuid" = Uuid, Path, description = "Visit note ID"),
        PdfParams
    ),
    request_body(content = GeneratePdfRequest, description = "Earlier visits to print alongside"),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Ownership mismatch", body = ApiErrorResponse),
        (status = 404, description = "Visit note not found", body = ApiErrorResponse),
        (status = 500, description = "Rendering failed", body = ApiErrorResponse)
    ),
    tag = "anamneses",
    security(("bearer_auth" = []))
)]
pub async fn generate_pdf(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    ApiPath((patient_uuid, uuid)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(params): ApiQuery<PdfParams>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let include = parse_pdf_body(&body).map(|req| req.include_visit_uuids);
    let pdf = server
        .anamneses
        .generate_pdf(
            auth.doctor_uuid,
            patient_uuid,
            uuid,
            include,
            params.only_current(),
        )
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, PDF_CONTENT_DISPOSITION),
        ],
        pdf,
    ))
}

fn parse_pdf_body(body: &[u8]) -> Option<GeneratePdfRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(req) => Some(req),
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable report body");
            None
        }
    }
}
