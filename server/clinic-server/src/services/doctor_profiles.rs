//! Practice branding for the caller's reports

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use error_common::{ClinicError, Result};

use super::db_error;
use crate::models::{DoctorProfile, UpsertDoctorProfileRequest};
use crate::repositories::{DoctorProfileRepository, Repositories};
use crate::storage::BrandingStorage;
use crate::validation::RequestValidation;

pub struct DoctorProfileService {
    profiles: Arc<dyn DoctorProfileRepository>,
    storage: BrandingStorage,
}

impl DoctorProfileService {
    pub fn new(repos: &Repositories, storage: BrandingStorage) -> Self {
        Self {
            profiles: repos.profiles.clone(),
            storage,
        }
    }

    pub async fn get(&self, doctor_uuid: Uuid) -> Result<DoctorProfile> {
        self.profiles
            .get_by_doctor(doctor_uuid)
            .await
            .map_err(|e| db_error("get doctor profile", e))
    }

    /// Create or replace the caller's profile.
    ///
    /// A blank `logo_path` keeps the stored logo. When a different logo is
    /// saved, the old local file is removed after the write succeeds.
    pub async fn upsert(&self, doctor_uuid: Uuid, req: UpsertDoctorProfileRequest) -> Result<DoctorProfile> {
        const OP: &str = "upsert doctor profile";
        req.validate().map_err(|e| e.context(OP))?;

        let existing = match self.profiles.get_by_doctor(doctor_uuid).await {
            Ok(p) => Some(p),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(ClinicError::internal(OP, e)),
        };
        let profile = req.into_profile(doctor_uuid, existing.as_ref(), Utc::now());
        let saved = self
            .profiles
            .upsert(&profile)
            .await
            .map_err(|e| db_error(OP, e))?;
        info!(doctor_uuid = %doctor_uuid, "Saved doctor profile");

        if let Some(previous) = existing {
            if !previous.logo_path.is_empty() && previous.logo_path != saved.logo_path {
                self.storage.remove(&previous.logo_path).await;
            }
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Doctor;
    use crate::repositories::DoctorRepository;
    use error_common::ErrorKind;

    async fn setup(storage: BrandingStorage) -> (DoctorProfileService, Uuid) {
        let repos = Repositories::in_memory();
        let doctor = Doctor {
            uuid: Uuid::new_v4(),
            email: "ana@clinic.hr".into(),
            username: "ana".into(),
            first_name: "Ana".into(),
            last_name: "Kovač".into(),
            created_at: Utc::now(),
            updated_at: None,
        };
        repos.doctors.create(&doctor).await.unwrap();
        (DoctorProfileService::new(&repos, storage), doctor.uuid)
    }

    fn req(logo: Option<&str>) -> UpsertDoctorProfileRequest {
        UpsertDoctorProfileRequest {
            practice_name: "Fizio Centar".into(),
            address: "Ilica 1".into(),
            phone: "01 234 567".into(),
            logo_path: logo.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let (service, doctor) = setup(BrandingStorage::new("unused")).await;
        assert_eq!(service.get(doctor).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn required_fields_are_enforced() {
        let (service, doctor) = setup(BrandingStorage::new("unused")).await;
        let mut bad = req(None);
        bad.phone = " ".into();
        assert_eq!(
            service.upsert(doctor, bad).await.unwrap_err().kind(),
            ErrorKind::InvalidRequest
        );
    }

    #[tokio::test]
    async fn upsert_keeps_identity_and_replaces_logo_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BrandingStorage::new(dir.path());
        let old_url = storage.save_image("old.png", b"old").await.unwrap();
        let old_file = storage.local_path(&old_url).unwrap();
        let (service, doctor) = setup(storage.clone()).await;

        let first = service.upsert(doctor, req(Some(&old_url))).await.unwrap();
        let kept = service.upsert(doctor, req(None)).await.unwrap();
        assert_eq!(kept.uuid, first.uuid);
        assert_eq!(kept.created_at, first.created_at);
        assert_eq!(kept.logo_path, old_url);
        assert!(old_file.exists());

        let new_url = storage.save_image("new.png", b"new").await.unwrap();
        let replaced = service.upsert(doctor, req(Some(&new_url))).await.unwrap();
        assert_eq!(replaced.logo_path, new_url);
        assert!(!old_file.exists());
        assert_eq!(service.get(doctor).await.unwrap(), replaced);
    }
}
