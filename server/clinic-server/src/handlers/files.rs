use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use error_common::ClinicError;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::read_upload;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::middleware::AuthDoctor;
use crate::server::ClinicServer;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "/static/branding/1718000000000000000.png")]
    pub url: String,
}

/// Multipart body with a single `file` part
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Store a branding image (`.png`, `.jpg`, `.jpeg`, at most 5 MiB)
#[utoipa::path(
    post,
    path = "/api/files/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, empty, oversized or unsupported file", body = ApiErrorResponse)
    ),
    tag = "files",
    security(("bearer_auth" = []))
)]
pub async fn upload_branding(
    State(server): State<ClinicServer>,
    auth: AuthDoctor,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let upload = read_upload(&mut multipart).await?;
    let url = server
        .storage
        .save_image(&upload.file_name, &upload.bytes)
        .await
        .map_err(ClinicError::from)?;
    info!(doctor_uuid = %auth.doctor_uuid, url = %url, size = upload.bytes.len(), "Stored branding image");
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
