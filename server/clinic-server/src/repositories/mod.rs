//! Persistence seams.
//!
//! Each entity has an `async_trait` repository. [`postgres`] holds the sqlx
//! implementations; [`memory`] holds an in-process store with the same
//! uniqueness and not-found semantics, used by tests and local tooling.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_layer::{DatabasePool, DatabaseResult};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Anamnesis, AuthToken, Doctor, DoctorCredentials, DoctorProfile, Patient};
use crate::types::PageRequest;

#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn create(&self, doctor: &Doctor) -> DatabaseResult<Doctor>;
    /// Insert a doctor and its credentials atomically
    async fn create_with_credentials(
        &self,
        doctor: &Doctor,
        credentials: &DoctorCredentials,
    ) -> DatabaseResult<Doctor>;
    async fn get(&self, uuid: Uuid) -> DatabaseResult<Doctor>;
    /// Case-insensitive lookup by email or username
    async fn find_by_identifier(&self, identifier: &str) -> DatabaseResult<Doctor>;
    async fn update(&self, doctor: &Doctor) -> DatabaseResult<Doctor>;
    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()>;
    async fn list(&self, query: &str, page: PageRequest) -> DatabaseResult<Vec<Doctor>>;
}

#[async_trait]
pub trait CredentialsRepository: Send + Sync {
    async fn get_by_doctor(&self, doctor_uuid: Uuid) -> DatabaseResult<DoctorCredentials>;
    async fn update_password(
        &self,
        doctor_uuid: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<()>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: &AuthToken) -> DatabaseResult<AuthToken>;
    async fn find_by_token(&self, token: &str) -> DatabaseResult<AuthToken>;
    async fn delete_by_token(&self, token: &str) -> DatabaseResult<()>;
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn create(&self, patient: &Patient) -> DatabaseResult<Patient>;
    async fn get(&self, uuid: Uuid) -> DatabaseResult<Patient>;
    async fn update(&self, patient: &Patient) -> DatabaseResult<Patient>;
    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()>;
    /// Patients of one doctor where every term matches name or phone
    async fn list(
        &self,
        doctor_uuid: Uuid,
        terms: &[String],
        page: PageRequest,
    ) -> DatabaseResult<Vec<Patient>>;
}

#[async_trait]
pub trait AnamnesisRepository: Send + Sync {
    async fn create(&self, anamnesis: &Anamnesis) -> DatabaseResult<Anamnesis>;
    async fn get(&self, uuid: Uuid) -> DatabaseResult<Anamnesis>;
    async fn update(&self, anamnesis: &Anamnesis) -> DatabaseResult<Anamnesis>;
    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()>;
    /// Visits of one patient owned by `doctor_uuid`, filtered by diagnosis
    async fn list(
        &self,
        doctor_uuid: Uuid,
        patient_uuid: Uuid,
        query: &str,
        page: PageRequest,
    ) -> DatabaseResult<Vec<Anamnesis>>;
    /// Missing ids are skipped
    async fn list_by_uuids(&self, uuids: &[Uuid]) -> DatabaseResult<Vec<Anamnesis>>;
}

#[async_trait]
pub trait DoctorProfileRepository: Send + Sync {
    async fn get_by_doctor(&self, doctor_uuid: Uuid) -> DatabaseResult<DoctorProfile>;
    /// Insert or replace the profile keyed by `doctor_uuid`
    async fn upsert(&self, profile: &DoctorProfile) -> DatabaseResult<DoctorProfile>;
}

/// Bundle of every repository the services need
#[derive(Clone)]
pub struct Repositories {
    pub doctors: Arc<dyn DoctorRepository>,
    pub credentials: Arc<dyn CredentialsRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub patients: Arc<dyn PatientRepository>,
    pub anamneses: Arc<dyn AnamnesisRepository>,
    pub profiles: Arc<dyn DoctorProfileRepository>,
}

impl Repositories {
    pub fn postgres(db: &DatabasePool) -> Self {
        Self {
            doctors: Arc::new(postgres::DoctorsRepository::new(db.clone())),
            credentials: Arc::new(postgres::CredentialsRepository::new(db.pool().clone())),
            tokens: Arc::new(postgres::TokensRepository::new(db.pool().clone())),
            patients: Arc::new(postgres::PatientsRepository::new(db.pool().clone())),
            anamneses: Arc::new(postgres::AnamnesesRepository::new(db.pool().clone())),
            profiles: Arc::new(postgres::DoctorProfilesRepository::new(db.pool().clone())),
        }
    }

    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            doctors: Arc::new(store.clone()),
            credentials: Arc::new(store.clone()),
            tokens: Arc::new(store.clone()),
            patients: Arc::new(store.clone()),
            anamneses: Arc::new(store.clone()),
            profiles: Arc::new(store),
        }
    }
}
