//! Patient records scoped to the owning doctor

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use error_common::{ClinicError, Result};

use super::db_error;
use crate::models::{normalize_optional, search_terms, CreatePatientRequest, Patient, UpdatePatientRequest};
use crate::repositories::{PatientRepository, Repositories};
use crate::types::PageRequest;
use crate::validation::RequestValidation;

pub struct PatientService {
    patients: Arc<dyn PatientRepository>,
}

impl PatientService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            patients: repos.patients.clone(),
        }
    }

    pub async fn create(&self, doctor_uuid: Uuid, req: CreatePatientRequest) -> Result<Patient> {
        const OP: &str = "create patient";
        req.validate().map_err(|e| e.context(OP))?;

        let patient = Patient {
            uuid: Uuid::new_v4(),
            doctor_uuid,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone: normalize_optional(req.phone),
            address: normalize_optional(req.address),
            date_of_birth: normalize_optional(req.date_of_birth),
            sex: normalize_optional(req.sex),
            created_at: Utc::now(),
            updated_at: None,
        };
        let created = self
            .patients
            .create(&patient)
            .await
            .map_err(|e| db_error(OP, e))?;
        info!(patient_uuid = %created.uuid, doctor_uuid = %doctor_uuid, "Created patient");
        Ok(created)
    }

    /// Load a patient and check that `doctor_uuid` owns it
    pub async fn get(&self, doctor_uuid: Uuid, uuid: Uuid) -> Result<Patient> {
        owned_patient(self.patients.as_ref(), doctor_uuid, uuid, "get patient").await
    }

    pub async fn update(&self, doctor_uuid: Uuid, uuid: Uuid, req: UpdatePatientRequest) -> Result<Patient> {
        const OP: &str = "update patient";
        req.validate().map_err(|e| e.context(OP))?;

        let mut patient = owned_patient(self.patients.as_ref(), doctor_uuid, uuid, OP).await?;
        req.apply_to(&mut patient);
        patient.updated_at = Some(Utc::now());
        self.patients
            .update(&patient)
            .await
            .map_err(|e| db_error(OP, e))
    }

    pub async fn delete(&self, doctor_uuid: Uuid, uuid: Uuid) -> Result<()> {
        const OP: &str = "delete patient";
        owned_patient(self.patients.as_ref(), doctor_uuid, uuid, OP).await?;
        self.patients.delete(uuid).await.map_err(|e| db_error(OP, e))?;
        info!(patient_uuid = %uuid, "Deleted patient");
        Ok(())
    }

    pub async fn list(&self, doctor_uuid: Uuid, query: &str, page: PageRequest) -> Result<Vec<Patient>> {
        self.patients
            .list(doctor_uuid, &search_terms(query), page)
            .await
            .map_err(|e| db_error("list patients", e))
    }
}

/// Shared ownership rule: another doctor's patient is an invalid request
pub(crate) async fn owned_patient(
    patients: &dyn PatientRepository,
    doctor_uuid: Uuid,
    patient_uuid: Uuid,
    op: &str,
) -> Result<Patient> {
    let patient = patients
        .get(patient_uuid)
        .await
        .map_err(|e| db_error(op, e))?;
    if !patient.is_owned_by(doctor_uuid) {
        return Err(ClinicError::invalid_request(op, "patient belongs to another doctor"));
    }
    Ok(patient)
}
