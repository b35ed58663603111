use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ApiErrorResponse;
use crate::handlers;
use crate::models;

/// OpenAPI description of the `/api` surface
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Physiotherapy Clinic API",
        description = "Patients, visit notes, PDF reports and database backups for a physiotherapy practice"
    ),
    paths(
        handlers::health::health_check,

        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::auth::change_password,

        handlers::patients::create_patient,
        handlers::patients::list_patients,
        handlers::patients::get_patient,
        handlers::patients::update_patient,
        handlers::patients::delete_patient,

        handlers::doctors::create_doctor,
        handlers::doctors::list_doctors,
        handlers::doctors::get_doctor,
        handlers::doctors::update_doctor,
        handlers::doctors::delete_doctor,

        handlers::anamneses::list_anamneses,
        handlers::anamneses::create_anamnesis,
        handlers::anamneses::get_anamnesis,
        handlers::anamneses::update_anamnesis,
        handlers::anamneses::delete_anamnesis,
        handlers::anamneses::generate_pdf,

        handlers::doctor_profile::get_profile,
        handlers::doctor_profile::upsert_profile,
        handlers::files::upload_branding,

        handlers::backup::download_backup,
        handlers::backup::restore_backup,
    ),
    components(
        schemas(
            ApiErrorResponse,
            models::AuthSession,
            models::RegisterRequest,
            models::LoginRequest,
            models::LogoutRequest,
            models::ChangePasswordRequest,
            models::Doctor,
            models::CreateDoctorRequest,
            models::UpdateDoctorRequest,
            models::Patient,
            models::CreatePatientRequest,
            models::UpdatePatientRequest,
            models::Anamnesis,
            models::CreateAnamnesisRequest,
            models::UpdateAnamnesisRequest,
            models::GeneratePdfRequest,
            models::DoctorProfile,
            models::UpsertDoctorProfileRequest,
            handlers::patients::PatientListResponse,
            handlers::doctors::DoctorListResponse,
            handlers::anamneses::AnamnesisListResponse,
            handlers::doctor_profile::ProfileResponse,
            handlers::files::UploadResponse,
            handlers::files::UploadForm,
            handlers::backup::RestoreResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration, login and sessions"),
        (name = "patients", description = "Patients of the signed-in doctor"),
        (name = "doctors", description = "Doctor directory"),
        (name = "anamneses", description = "Visit notes and PDF reports"),
        (name = "profile", description = "Practice branding"),
        (name = "files", description = "Branding uploads"),
        (name = "backup", description = "Database dump and restore"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serve the generated document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
