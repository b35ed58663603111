//! Visit notes and the printable physiotherapist opinion

use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use error_common::{ClinicError, Result};

use super::db_error;
use super::patients::owned_patient;
use crate::models::{
    dedupe_visit_uuids, Anamnesis, CreateAnamnesisRequest, Patient, UpdateAnamnesisRequest,
};
use crate::report::{ReportRenderer, ReportSources, VisitReport};
use crate::repositories::{
    AnamnesisRepository, DoctorProfileRepository, DoctorRepository, PatientRepository,
    Repositories,
};
use crate::storage::BrandingStorage;
use crate::types::PageRequest;

pub struct AnamnesisService {
    anamneses: Arc<dyn AnamnesisRepository>,
    patients: Arc<dyn PatientRepository>,
    profiles: Arc<dyn DoctorProfileRepository>,
    doctors: Arc<dyn DoctorRepository>,
    renderer: Arc<dyn ReportRenderer>,
    storage: BrandingStorage,
}

impl AnamnesisService {
    pub fn new(
        repos: &Repositories,
        renderer: Arc<dyn ReportRenderer>,
        storage: BrandingStorage,
    ) -> Self {
        Self {
            anamneses: repos.anamneses.clone(),
            patients: repos.patients.clone(),
            profiles: repos.profiles.clone(),
            doctors: repos.doctors.clone(),
            renderer,
            storage,
        }
    }

    pub async fn create(
        &self,
        doctor_uuid: Uuid,
        patient_uuid: Uuid,
        req: CreateAnamnesisRequest,
    ) -> Result<Anamnesis> {
        const OP: &str = "create anamnesis";
        owned_patient(self.patients.as_ref(), doctor_uuid, patient_uuid, OP).await?;

        let record = req.into_record(patient_uuid, Utc::now());
        let created = self
            .anamneses
            .create(&record)
            .await
            .map_err(|e| db_error(OP, e))?;
        info!(anamnesis_uuid = %created.uuid, patient_uuid = %patient_uuid, "Created anamnesis");
        Ok(created)
    }

    pub async fn get(&self, doctor_uuid: Uuid, patient_uuid: Uuid, uuid: Uuid) -> Result<Anamnesis> {
        const OP: &str = "get anamnesis";
        owned_patient(self.patients.as_ref(), doctor_uuid, patient_uuid, OP).await?;
        self.load_for_patient(patient_uuid, uuid, OP).await
    }

    pub async fn update(
        &self,
        doctor_uuid: Uuid,
        patient_uuid: Uuid,
        uuid: Uuid,
        req: UpdateAnamnesisRequest,
    ) -> Result<Anamnesis> {
        const OP: &str = "update anamnesis";
        owned_patient(self.patients.as_ref(), doctor_uuid, patient_uuid, OP).await?;

        let mut record = self.load_for_patient(patient_uuid, uuid, OP).await?;
        req.apply_to(&mut record, Utc::now());
        self.anamneses
            .update(&record)
            .await
            .map_err(|e| db_error(OP, e))
    }

    pub async fn delete(&self, doctor_uuid: Uuid, patient_uuid: Uuid, uuid: Uuid) -> Result<()> {
        const OP: &str = "delete anamnesis";
        owned_patient(self.patients.as_ref(), doctor_uuid, patient_uuid, OP).await?;
        self.load_for_patient(patient_uuid, uuid, OP).await?;
        self.anamneses.delete(uuid).await.map_err(|e| db_error(OP, e))?;
        info!(anamnesis_uuid = %uuid, "Deleted anamnesis");
        Ok(())
    }

    /// Visits of one patient, newest first, filtered by diagnosis
    pub async fn list(
        &self,
        doctor_uuid: Uuid,
        patient_uuid: Uuid,
        query: &str,
        page: PageRequest,
    ) -> Result<Vec<Anamnesis>> {
        const OP: &str = "list anamneses";
        owned_patient(self.patients.as_ref(), doctor_uuid, patient_uuid, OP).await?;
        self.anamneses
            .list(doctor_uuid, patient_uuid, query, page)
            .await
            .map_err(|e| db_error(OP, e))
    }

    /// Render the visit report for `uuid`.
    ///
    /// Prior visits come from `include` when non-empty, else from the
    /// record's stored list; `only_current` suppresses them entirely.
    /// Visits of other patients are dropped. Missing profile or doctor
    /// data only thins out the letterhead and signature.
    pub async fn generate_pdf(
        &self,
        doctor_uuid: Uuid,
        patient_uuid: Uuid,
        uuid: Uuid,
        include: Option<Vec<Uuid>>,
        only_current: bool,
    ) -> Result<Vec<u8>> {
        const OP: &str = "generate pdf";
        let patient = owned_patient(self.patients.as_ref(), doctor_uuid, patient_uuid, OP).await?;
        let current = self.load_for_patient(patient_uuid, uuid, OP).await?;

        let prior = if only_current {
            Vec::new()
        } else {
            let requested = include.filter(|ids| !ids.is_empty());
            let ids = dedupe_visit_uuids(requested.as_deref().unwrap_or(current.include_visit_uuids.as_slice()));
            self.prior_visits(&patient, &current, &ids).await?
        };

        let profile = match self.profiles.get_by_doctor(doctor_uuid).await {
            Ok(p) => Some(p),
            Err(e) => {
                debug!(doctor_uuid = %doctor_uuid, error = %e, "Report without profile");
                None
            }
        };
        let doctor = match self.doctors.get(doctor_uuid).await {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(doctor_uuid = %doctor_uuid, error = %e, "Report without signature");
                None
            }
        };
        let logo = profile
            .as_ref()
            .and_then(|p| self.storage.local_path(&p.logo_path))
            .filter(|path| path.is_file());

        let report = VisitReport::assemble(ReportSources {
            patient: &patient,
            current: &current,
            prior,
            profile: profile.as_ref(),
            doctor: doctor.as_ref(),
            logo,
            printed_on: Local::now().date_naive(),
        });
        let visits = report.visits.len();

        let renderer = self.renderer.clone();
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&report))
            .await
            .map_err(|e| ClinicError::internal(OP, e))?
            .map_err(|e| ClinicError::internal(OP, e))?;
        info!(anamnesis_uuid = %uuid, visits, size = bytes.len(), "Rendered visit report");
        Ok(bytes)
    }

    async fn prior_visits(&self, patient: &Patient, current: &Anamnesis, ids: &[Uuid]) -> Result<Vec<Anamnesis>> {
        let ids: Vec<Uuid> = ids.iter().copied().filter(|id| *id != current.uuid).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self
            .anamneses
            .list_by_uuids(&ids)
            .await
            .map_err(|e| db_error("generate pdf: load included visits", e))?;
        let total = found.len();
        let same_patient: Vec<Anamnesis> = found.into_iter().filter(|v| v.belongs_to(patient.uuid)).collect();
        if same_patient.len() != total {
            debug!(
                dropped = total - same_patient.len(),
                "Ignored included visits of other patients"
            );
        }
        Ok(same_patient)
    }

    async fn load_for_patient(&self, patient_uuid: Uuid, uuid: Uuid, op: &str) -> Result<Anamnesis> {
        let record = self.anamneses.get(uuid).await.map_err(|e| db_error(op, e))?;
        if !record.belongs_to(patient_uuid) {
            return Err(ClinicError::invalid_request(op, "anamnesis belongs to another patient"));
        }
        Ok(record)
    }
}
