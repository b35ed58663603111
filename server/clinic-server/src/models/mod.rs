//! Domain entities and the request payloads that create or change them

pub mod anamnesis;
pub mod auth;
pub mod doctor;
pub mod patient;
pub mod profile;

pub use anamnesis::{dedupe_visit_uuids, Anamnesis, CreateAnamnesisRequest, GeneratePdfRequest, UpdateAnamnesisRequest};
pub use auth::{AuthSession, AuthToken, ChangePasswordRequest, DoctorCredentials, LoginRequest, LogoutRequest, RegisterRequest};
pub use doctor::{CreateDoctorRequest, Doctor, UpdateDoctorRequest};
pub use patient::{search_terms, CreatePatientRequest, Patient, UpdatePatientRequest};
pub use profile::{DoctorProfile, UpsertDoctorProfileRequest};

/// Trim an optional text field, collapsing blank values to `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim an optional text field, treating absence as the empty string
pub fn trimmed_or_empty(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}
