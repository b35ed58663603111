use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use error_common::ClinicError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::files::UploadForm;
use super::read_upload;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::middleware::AuthDoctor;
use crate::server::ClinicServer;

pub const RESTORE_COMPLETED: &str = "restore completed";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestoreResponse {
    #[schema(example = "restore completed")]
    pub message: String,
    /// Base name of the uploaded dump
    pub file: String,
}

/// Download a fresh custom-format dump; the server copy is deleted afterwards
#[utoipa::path(
    get,
    path = "/api/backup",
    responses(
        (status = 200, description = "Database dump", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 500, description = "pg_dump failed", body = ApiErrorResponse)
    ),
    tag = "backup",
    security(("bearer_auth" = []))
)]
pub async fn download_backup(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
) -> ApiResult<impl IntoResponse> {
    let artifact = server.backup.create_backup().await.map_err(ClinicError::from)?;
    let bytes = server
        .backup
        .take_artifact(&artifact)
        .await
        .map_err(ClinicError::from)?;
    tracing::info!(doctor_uuid = %auth.doctor_uuid, file = %artifact.file_name, size = bytes.len(), "Backup downloaded");

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Replace the database contents with an uploaded dump
#[utoipa::path(
    post,
    path = "/api/backup/restore",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Restore finished", body = RestoreResponse),
        (status = 400, description = "Missing file", body = ApiErrorResponse),
        (status = 500, description = "pg_restore failed", body = ApiErrorResponse)
    ),
    tag = "backup",
    security(("bearer_auth" = []))
)]
pub async fn restore_backup(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    mut multipart: Multipart,
) -> ApiResult<Json<RestoreResponse>> {
    let upload = read_upload(&mut multipart).await?;
    if upload.bytes.is_empty() {
        return Err(ClinicError::invalid_request("restore", "file is empty").into());
    }
    tracing::warn!(doctor_uuid = %auth.doctor_uuid, size = upload.bytes.len(), "Restoring database from upload");

    let file = server
        .backup
        .restore_upload(&upload.file_name, &upload.bytes)
        .await
        .map_err(ClinicError::from)?;
    Ok(Json(RestoreResponse {
        message: RESTORE_COMPLETED.to_string(),
        file,
    }))
}
