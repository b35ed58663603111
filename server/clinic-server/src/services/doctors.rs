//! Doctor directory; not scoped to the caller

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use error_common::Result;

use super::db_error;
use crate::models::{CreateDoctorRequest, Doctor, UpdateDoctorRequest};
use crate::repositories::{DoctorRepository, Repositories};
use crate::types::PageRequest;
use crate::validation::RequestValidation;

pub struct DoctorService {
    doctors: Arc<dyn DoctorRepository>,
}

impl DoctorService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            doctors: repos.doctors.clone(),
        }
    }

    /// Directory entry without credentials; the doctor cannot log in
    pub async fn create(&self, req: CreateDoctorRequest) -> Result<Doctor> {
        const OP: &str = "create doctor";
        req.validate().map_err(|e| e.context(OP))?;

        let doctor = Doctor {
            uuid: Uuid::new_v4(),
            email: req.email.trim().to_string(),
            username: req.username.trim().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let created = self.doctors.create(&doctor).await.map_err(|e| db_error(OP, e))?;
        info!(doctor_uuid = %created.uuid, "Created doctor");
        Ok(created)
    }

    pub async fn get(&self, uuid: Uuid) -> Result<Doctor> {
        self.doctors.get(uuid).await.map_err(|e| db_error("get doctor", e))
    }

    pub async fn update(&self, uuid: Uuid, req: UpdateDoctorRequest) -> Result<Doctor> {
        const OP: &str = "update doctor";
        req.validate().map_err(|e| e.context(OP))?;

        let mut doctor = self.doctors.get(uuid).await.map_err(|e| db_error(OP, e))?;
        req.apply_to(&mut doctor);
        doctor.updated_at = Some(Utc::now());
        self.doctors.update(&doctor).await.map_err(|e| db_error(OP, e))
    }

    pub async fn delete(&self, uuid: Uuid) -> Result<()> {
        self.doctors
            .delete(uuid)
            .await
            .map_err(|e| db_error("delete doctor", e))?;
        info!(doctor_uuid = %uuid, "Deleted doctor");
        Ok(())
    }

    pub async fn list(&self, query: &str, page: PageRequest) -> Result<Vec<Doctor>> {
        self.doctors
            .list(query, page)
            .await
            .map_err(|e| db_error("list doctors", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_common::ErrorKind;

    fn req(email: &str, username: &str) -> CreateDoctorRequest {
        CreateDoctorRequest {
            email: email.into(),
            username: username.into(),
            first_name: "Iva".into(),
            last_name: "Horvat".into(),
        }
    }

    #[tokio::test]
    async fn create_validates_and_detects_duplicates() {
        let service = DoctorService::new(&Repositories::in_memory());
        let blank = service.create(req(" ", "iva")).await.unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::InvalidRequest);

        service.create(req("iva@clinic.hr", "iva")).await.unwrap();
        let dup = service.create(req("IVA@clinic.hr", "iva2")).await.unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn update_is_partial_and_rejects_blank() {
        let service = DoctorService::new(&Repositories::in_memory());
        let d = service.create(req("iva@clinic.hr", "iva")).await.unwrap();

        let renamed = service
            .update(
                d.uuid,
                UpdateDoctorRequest {
                    last_name: Some(" Kovač ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.last_name, "Kovač");
        assert_eq!(renamed.email, "iva@clinic.hr");
        assert!(renamed.updated_at.is_some());

        let blank = UpdateDoctorRequest {
            username: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            service.update(d.uuid, blank).await.unwrap_err().kind(),
            ErrorKind::InvalidRequest
        );
    }

    #[tokio::test]
    async fn delete_and_missing() {
        let service = DoctorService::new(&Repositories::in_memory());
        let d = service.create(req("iva@clinic.hr", "iva")).await.unwrap();
        service.delete(d.uuid).await.unwrap();
        assert_eq!(service.get(d.uuid).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(service.delete(d.uuid).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list_filters_by_any_identity_field() {
        let service = DoctorService::new(&Repositories::in_memory());
        service.create(req("iva@clinic.hr", "iva")).await.unwrap();
        service.create(req("marko@clinic.hr", "marko")).await.unwrap();
        let page = PageRequest::new(20, 1);
        assert_eq!(service.list("MARKO", page).await.unwrap().len(), 1);
        assert_eq!(service.list("horvat", page).await.unwrap().len(), 2);
    }
}
