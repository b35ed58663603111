//! HTTP handlers. Each module covers one resource; request bodies go
//! through [`crate::error::ApiJson`] so rejections share the error envelope.

pub mod anamneses;
pub mod auth;
pub mod backup;
pub mod doctor_profile;
pub mod doctors;
pub mod files;
pub mod health;
pub mod patients;

use axum::extract::multipart::Field;
use axum::extract::Multipart;

use crate::error::{ApiError, ApiResult};

/// Name of the multipart field carrying uploads
pub const UPLOAD_FIELD: &str = "file";

/// An uploaded file read fully into memory
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Find the `file` part of a multipart body; other parts are skipped
pub async fn read_upload(multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return collect(field).await;
        }
    }
    Err(ApiError::invalid_request("missing multipart field \"file\""))
}

async fn collect(field: Field<'_>) -> ApiResult<UploadedFile> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await?;
    Ok(UploadedFile {
        file_name,
        bytes: bytes.to_vec(),
    })
}
