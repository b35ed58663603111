//! Request validation utilities for consistent validation across handlers
//!
//! Every create/update payload implements [`RequestValidation`]. Services call
//! `validate()` on entry, so handlers pass payloads through untouched and the
//! rules hold for callers outside the HTTP layer too.

use error_common::ClinicError;

use crate::models::{
    ChangePasswordRequest, CreateDoctorRequest, CreatePatientRequest, LoginRequest,
    RegisterRequest, UpdateDoctorRequest, UpdatePatientRequest, UpsertDoctorProfileRequest,
};

/// Trait for validating request payloads
pub trait RequestValidation {
    /// Returns `Err(ClinicError::InvalidRequest)` describing the first failure
    fn validate(&self) -> Result<(), ClinicError>;
}

/// Macro for validating fields with custom predicates
///
/// # Usage
///
/// ```rust,ignore
/// validate_field!(self.email, self.email.contains('@'), "email is invalid");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err(::error_common::ClinicError::InvalidRequest($message.to_string()));
        }
    };
}

/// Macro for validating required fields (non-blank strings)
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for optional fields that must not be blank when present
#[macro_export]
macro_rules! validate_not_blank_if_present {
    ($field:expr, $message:expr) => {
        $crate::validate_field!(
            $field,
            $field.as_deref().map_or(true, |v: &str| !v.trim().is_empty()),
            $message
        );
    };
}

/// Macro for validating email format (basic check)
#[macro_export]
macro_rules! validate_email {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, $field.contains('@'), $message);
    };
}

impl RequestValidation for RegisterRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_required!(self.email, "email is required");
        validate_required!(self.username, "username is required");
        validate_required!(self.password, "password is required");
        validate_required!(self.first_name, "first_name is required");
        validate_required!(self.last_name, "last_name is required");
        validate_email!(self.email, "email is invalid");
        Ok(())
    }
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_required!(self.identifier, "identifier is required");
        validate_required!(self.password, "password is required");
        Ok(())
    }
}

impl RequestValidation for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_required!(self.current_password, "current_password is required");
        validate_required!(self.new_password, "new_password is required");
        Ok(())
    }
}

impl RequestValidation for CreateDoctorRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_required!(self.email, "email is required");
        validate_required!(self.username, "username is required");
        validate_required!(self.first_name, "first_name is required");
        validate_required!(self.last_name, "last_name is required");
        validate_email!(self.email, "email is invalid");
        Ok(())
    }
}

impl RequestValidation for UpdateDoctorRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_not_blank_if_present!(self.email, "email must not be blank");
        validate_not_blank_if_present!(self.username, "username must not be blank");
        validate_not_blank_if_present!(self.first_name, "first_name must not be blank");
        validate_not_blank_if_present!(self.last_name, "last_name must not be blank");
        if let Some(email) = &self.email {
            validate_email!(email, "email is invalid");
        }
        Ok(())
    }
}

impl RequestValidation for CreatePatientRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_required!(self.first_name, "first_name is required");
        validate_required!(self.last_name, "last_name is required");
        Ok(())
    }
}

impl RequestValidation for UpdatePatientRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_not_blank_if_present!(self.first_name, "first_name must not be blank");
        validate_not_blank_if_present!(self.last_name, "last_name must not be blank");
        Ok(())
    }
}

impl RequestValidation for UpsertDoctorProfileRequest {
    fn validate(&self) -> Result<(), ClinicError> {
        validate_required!(self.practice_name, "practice_name is required");
        validate_required!(self.address, "address is required");
        validate_required!(self.phone, "phone is required");
        Ok(())
    }
}
