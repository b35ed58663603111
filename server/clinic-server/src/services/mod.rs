//! Business logic between the HTTP handlers and the repositories.
//!
//! Services own validation, identifier and timestamp generation, ownership
//! rules and the translation of storage failures into [`ClinicError`].

pub mod anamneses;
pub mod auth;
pub mod backup;
pub mod doctor_profiles;
pub mod doctors;
pub mod patients;

pub use anamneses::AnamnesisService;
pub use auth::{AuthService, AuthSettings};
pub use backup::{BackupArtifact, BackupError, BackupService, BackupSettings};
pub use doctor_profiles::DoctorProfileService;
pub use doctors::DoctorService;
pub use patients::PatientService;

use database_layer::DatabaseError;
use error_common::ClinicError;

/// Classify a repository failure for the operation named by `context`
pub(crate) fn db_error(context: &str, err: DatabaseError) -> ClinicError {
    if err.is_not_found() {
        ClinicError::not_found(context)
    } else if err.is_unique_violation() {
        ClinicError::conflict(context)
    } else if err.is_foreign_key_violation() {
        ClinicError::not_found(&format!("{context}: referenced record"))
    } else {
        ClinicError::internal(context, err)
    }
}
