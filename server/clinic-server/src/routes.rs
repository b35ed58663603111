//! Router assembly per resource. Routes here are relative to `/api`.

pub mod paths;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::handlers::{anamneses, auth, backup, doctor_profile, doctors, files, health, patients};
use crate::server::ClinicServer;
use crate::storage::MAX_IMAGE_BYTES;

/// Restore uploads may be large; everything else keeps axum's default limit
pub const MAX_RESTORE_BYTES: usize = 64 * 1024 * 1024;
/// Room for multipart framing around a maximum-size image
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Routes reachable without a bearer token
pub fn public_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::auth::REGISTER, post(auth::register))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::LOGOUT, post(auth::logout))
}

/// Create account routes for the signed-in doctor
pub fn account_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::auth::ME, get(auth::me))
        .route(paths::auth::CHANGE_PASSWORD, post(auth::change_password))
}

/// Create patient routes
pub fn patient_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::patients::CREATE, post(patients::create_patient))
        .route(
            paths::patients::PATIENTS,
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            paths::patients::PATIENT_BY_ID,
            get(patients::get_patient)
                .patch(patients::update_patient)
                .delete(patients::delete_patient),
        )
}

/// Create doctor directory routes
pub fn doctor_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::doctors::CREATE, post(doctors::create_doctor))
        .route(
            paths::doctors::DOCTORS,
            get(doctors::list_doctors).post(doctors::create_doctor),
        )
        .route(
            paths::doctors::DOCTOR_BY_ID,
            get(doctors::get_doctor)
                .patch(doctors::update_doctor)
                .delete(doctors::delete_doctor),
        )
}

/// Create visit note routes, nested under a patient
pub fn anamnesis_routes() -> Router<ClinicServer> {
    Router::new()
        .route(
            paths::anamneses::ANAMNESES,
            get(anamneses::list_anamneses).post(anamneses::create_anamnesis),
        )
        .route(
            paths::anamneses::ANAMNESIS_BY_ID,
            get(anamneses::get_anamnesis)
                .patch(anamneses::update_anamnesis)
                .delete(anamneses::delete_anamnesis),
        )
        .route(paths::anamneses::PDF, post(anamneses::generate_pdf))
}

/// Create practice profile and branding upload routes
pub fn profile_routes() -> Router<ClinicServer> {
    Router::new()
        .route(
            paths::profile::PROFILE,
            get(doctor_profile::get_profile)
                .put(doctor_profile::upsert_profile)
                .post(doctor_profile::upsert_profile)
                .patch(doctor_profile::upsert_profile),
        )
        .route(
            paths::files::UPLOAD,
            post(files::upload_branding).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Create backup and restore routes
pub fn backup_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::backup::BACKUP, get(backup::download_backup))
        .route(
            paths::backup::RESTORE,
            post(backup::restore_backup).layer(DefaultBodyLimit::max(MAX_RESTORE_BYTES)),
        )
}

/// Every route that requires a bearer token
pub fn protected_routes() -> Router<ClinicServer> {
    Router::new()
        .merge(account_routes())
        .merge(patient_routes())
        .merge(doctor_routes())
        .merge(anamnesis_routes())
        .merge(profile_routes())
        .merge(backup_routes())
}
