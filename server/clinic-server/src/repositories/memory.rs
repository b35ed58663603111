//! In-process repository implementations.
//!
//! A single [`MemoryStore`] backs every repository trait so that joins
//! (anamneses scoped by the owning doctor) and cascades behave like the
//! PostgreSQL schema: unique email/username, foreign keys to doctors and
//! patients, and `ON DELETE CASCADE`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_layer::{DatabaseError, DatabaseResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AnamnesisRepository, CredentialsRepository, DoctorProfileRepository, DoctorRepository,
    PatientRepository, TokenRepository,
};
use crate::models::{Anamnesis, AuthToken, Doctor, DoctorCredentials, DoctorProfile, Patient};
use crate::types::PageRequest;

#[derive(Default)]
struct Tables {
    doctors: Vec<Doctor>,
    credentials: Vec<DoctorCredentials>,
    tokens: Vec<AuthToken>,
    patients: Vec<Patient>,
    anamneses: Vec<Anamnesis>,
    profiles: Vec<DoctorProfile>,
}

impl Tables {
    fn check_doctor_unique(&self, doctor: &Doctor) -> DatabaseResult<()> {
        let email = doctor.email.to_lowercase();
        let username = doctor.username.to_lowercase();
        for other in self.doctors.iter().filter(|d| d.uuid != doctor.uuid) {
            if other.email.to_lowercase() == email {
                return Err(unique("doctors_email_key"));
            }
            if other.username.to_lowercase() == username {
                return Err(unique("doctors_username_key"));
            }
        }
        Ok(())
    }

    fn require_doctor(&self, uuid: Uuid, constraint: &str) -> DatabaseResult<()> {
        if self.doctors.iter().any(|d| d.uuid == uuid) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKeyViolation {
                constraint: constraint.to_string(),
            })
        }
    }

    fn remove_patient_cascade(&mut self, uuid: Uuid) {
        self.patients.retain(|p| p.uuid != uuid);
        self.anamneses.retain(|a| a.patient_uuid != uuid);
    }
}

fn unique(constraint: &str) -> DatabaseError {
    DatabaseError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

/// Newest first; later insertions win ties
fn newest_first<T>(mut rows: Vec<T>, created: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.reverse();
    rows.sort_by(|a, b| created(b).cmp(&created(a)));
    rows
}

/// Shared in-memory tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DoctorRepository for MemoryStore {
    async fn create(&self, doctor: &Doctor) -> DatabaseResult<Doctor> {
        let mut t = self.tables.write().await;
        if t.doctors.iter().any(|d| d.uuid == doctor.uuid) {
            return Err(unique("doctors_pkey"));
        }
        t.check_doctor_unique(doctor)?;
        t.doctors.push(doctor.clone());
        Ok(doctor.clone())
    }

    async fn create_with_credentials(
        &self,
        doctor: &Doctor,
        credentials: &DoctorCredentials,
    ) -> DatabaseResult<Doctor> {
        let mut t = self.tables.write().await;
        if t.doctors.iter().any(|d| d.uuid == doctor.uuid) {
            return Err(unique("doctors_pkey"));
        }
        t.check_doctor_unique(doctor)?;
        if credentials.doctor_uuid != doctor.uuid {
            return Err(DatabaseError::ForeignKeyViolation {
                constraint: "doctor_credentials_doctor_uuid_fkey".into(),
            });
        }
        if t.credentials.iter().any(|c| c.doctor_uuid == doctor.uuid) {
            return Err(unique("doctor_credentials_doctor_uuid_key"));
        }
        t.doctors.push(doctor.clone());
        t.credentials.push(credentials.clone());
        Ok(doctor.clone())
    }

    async fn get(&self, uuid: Uuid) -> DatabaseResult<Doctor> {
        let t = self.tables.read().await;
        t.doctors
            .iter()
            .find(|d| d.uuid == uuid)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn find_by_identifier(&self, identifier: &str) -> DatabaseResult<Doctor> {
        let term = identifier.trim().to_lowercase();
        if term.is_empty() {
            return Err(DatabaseError::NotFound);
        }
        let t = self.tables.read().await;
        t.doctors
            .iter()
            .find(|d| d.email.to_lowercase() == term || d.username.to_lowercase() == term)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn update(&self, doctor: &Doctor) -> DatabaseResult<Doctor> {
        let mut t = self.tables.write().await;
        t.check_doctor_unique(doctor)?;
        let row = t
            .doctors
            .iter_mut()
            .find(|d| d.uuid == doctor.uuid)
            .ok_or(DatabaseError::NotFound)?;
        let created_at = row.created_at;
        *row = doctor.clone();
        row.created_at = created_at;
        Ok(row.clone())
    }

    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()> {
        let mut t = self.tables.write().await;
        let before = t.doctors.len();
        t.doctors.retain(|d| d.uuid != uuid);
        if t.doctors.len() == before {
            return Err(DatabaseError::NotFound);
        }
        t.credentials.retain(|c| c.doctor_uuid != uuid);
        t.tokens.retain(|k| k.doctor_uuid != uuid);
        t.profiles.retain(|p| p.doctor_uuid != uuid);
        let owned: Vec<Uuid> = t
            .patients
            .iter()
            .filter(|p| p.doctor_uuid == uuid)
            .map(|p| p.uuid)
            .collect();
        for patient in owned {
            t.remove_patient_cascade(patient);
        }
        Ok(())
    }

    async fn list(&self, query: &str, page: PageRequest) -> DatabaseResult<Vec<Doctor>> {
        let needle = query.trim().to_lowercase();
        let t = self.tables.read().await;
        let matching: Vec<Doctor> = t
            .doctors
            .iter()
            .filter(|d| {
                needle.is_empty()
                    || [&d.email, &d.username, &d.first_name, &d.last_name]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |d: &Doctor| d.created_at)))
    }
}

#[async_trait]
impl CredentialsRepository for MemoryStore {
    async fn get_by_doctor(&self, doctor_uuid: Uuid) -> DatabaseResult<DoctorCredentials> {
        let t = self.tables.read().await;
        t.credentials
            .iter()
            .find(|c| c.doctor_uuid == doctor_uuid)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn update_password(
        &self,
        doctor_uuid: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        let mut t = self.tables.write().await;
        let row = t
            .credentials
            .iter_mut()
            .find(|c| c.doctor_uuid == doctor_uuid)
            .ok_or(DatabaseError::NotFound)?;
        row.password_hash = password_hash.to_string();
        row.password_updated_at = updated_at;
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn create(&self, token: &AuthToken) -> DatabaseResult<AuthToken> {
        let mut t = self.tables.write().await;
        t.require_doctor(token.doctor_uuid, "auth_tokens_doctor_uuid_fkey")?;
        if t.tokens.iter().any(|k| k.token == token.token) {
            return Err(unique("auth_tokens_token_key"));
        }
        t.tokens.push(token.clone());
        Ok(token.clone())
    }

    async fn find_by_token(&self, token: &str) -> DatabaseResult<AuthToken> {
        let t = self.tables.read().await;
        t.tokens
            .iter()
            .find(|k| k.token == token)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn delete_by_token(&self, token: &str) -> DatabaseResult<()> {
        let mut t = self.tables.write().await;
        t.tokens.retain(|k| k.token != token);
        Ok(())
    }
}

#[async_trait]
impl PatientRepository for MemoryStore {
    async fn create(&self, patient: &Patient) -> DatabaseResult<Patient> {
        let mut t = self.tables.write().await;
        t.require_doctor(patient.doctor_uuid, "patients_doctor_uuid_fkey")?;
        if t.patients.iter().any(|p| p.uuid == patient.uuid) {
            return Err(unique("patients_pkey"));
        }
        t.patients.push(patient.clone());
        Ok(patient.clone())
    }

    async fn get(&self, uuid: Uuid) -> DatabaseResult<Patient> {
        let t = self.tables.read().await;
        t.patients
            .iter()
            .find(|p| p.uuid == uuid)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn update(&self, patient: &Patient) -> DatabaseResult<Patient> {
        let mut t = self.tables.write().await;
        let row = t
            .patients
            .iter_mut()
            .find(|p| p.uuid == patient.uuid)
            .ok_or(DatabaseError::NotFound)?;
        let (doctor_uuid, created_at) = (row.doctor_uuid, row.created_at);
        *row = patient.clone();
        row.doctor_uuid = doctor_uuid;
        row.created_at = created_at;
        Ok(row.clone())
    }

    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()> {
        let mut t = self.tables.write().await;
        if !t.patients.iter().any(|p| p.uuid == uuid) {
            return Err(DatabaseError::NotFound);
        }
        t.remove_patient_cascade(uuid);
        Ok(())
    }

    async fn list(
        &self,
        doctor_uuid: Uuid,
        terms: &[String],
        page: PageRequest,
    ) -> DatabaseResult<Vec<Patient>> {
        let t = self.tables.read().await;
        let matching: Vec<Patient> = t
            .patients
            .iter()
            .filter(|p| p.doctor_uuid == doctor_uuid && p.matches_terms(terms))
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |p: &Patient| p.created_at)))
    }
}

#[async_trait]
impl AnamnesisRepository for MemoryStore {
    async fn create(&self, anamnesis: &Anamnesis) -> DatabaseResult<Anamnesis> {
        let mut t = self.tables.write().await;
        if !t.patients.iter().any(|p| p.uuid == anamnesis.patient_uuid) {
            return Err(DatabaseError::ForeignKeyViolation {
                constraint: "anamneses_patient_uuid_fkey".into(),
            });
        }
        if t.anamneses.iter().any(|a| a.uuid == anamnesis.uuid) {
            return Err(unique("anamneses_pkey"));
        }
        t.anamneses.push(anamnesis.clone());
        Ok(anamnesis.clone())
    }

    async fn get(&self, uuid: Uuid) -> DatabaseResult<Anamnesis> {
        let t = self.tables.read().await;
        t.anamneses
            .iter()
            .find(|a| a.uuid == uuid)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn update(&self, anamnesis: &Anamnesis) -> DatabaseResult<Anamnesis> {
        let mut t = self.tables.write().await;
        let row = t
            .anamneses
            .iter_mut()
            .find(|a| a.uuid == anamnesis.uuid)
            .ok_or(DatabaseError::NotFound)?;
        let (patient_uuid, created_at) = (row.patient_uuid, row.created_at);
        *row = anamnesis.clone();
        row.patient_uuid = patient_uuid;
        row.created_at = created_at;
        Ok(row.clone())
    }

    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()> {
        let mut t = self.tables.write().await;
        let before = t.anamneses.len();
        t.anamneses.retain(|a| a.uuid != uuid);
        if t.anamneses.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        doctor_uuid: Uuid,
        patient_uuid: Uuid,
        query: &str,
        page: PageRequest,
    ) -> DatabaseResult<Vec<Anamnesis>> {
        let t = self.tables.read().await;
        let owned = t
            .patients
            .iter()
            .any(|p| p.uuid == patient_uuid && p.doctor_uuid == doctor_uuid);
        if !owned {
            return Ok(Vec::new());
        }
        let matching: Vec<Anamnesis> = t
            .anamneses
            .iter()
            .filter(|a| a.patient_uuid == patient_uuid && a.matches_diagnosis(query))
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |a: &Anamnesis| a.created_at)))
    }

    async fn list_by_uuids(&self, uuids: &[Uuid]) -> DatabaseResult<Vec<Anamnesis>> {
        let t = self.tables.read().await;
        Ok(t.anamneses
            .iter()
            .filter(|a| uuids.contains(&a.uuid))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DoctorProfileRepository for MemoryStore {
    async fn get_by_doctor(&self, doctor_uuid: Uuid) -> DatabaseResult<DoctorProfile> {
        let t = self.tables.read().await;
        t.profiles
            .iter()
            .find(|p| p.doctor_uuid == doctor_uuid)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn upsert(&self, profile: &DoctorProfile) -> DatabaseResult<DoctorProfile> {
        let mut t = self.tables.write().await;
        t.require_doctor(profile.doctor_uuid, "doctor_profiles_doctor_uuid_fkey")?;
        if let Some(row) = t
            .profiles
            .iter_mut()
            .find(|p| p.doctor_uuid == profile.doctor_uuid)
        {
            let (uuid, created_at) = (row.uuid, row.created_at);
            *row = profile.clone();
            row.uuid = uuid;
            row.created_at = created_at;
            return Ok(row.clone());
        }
        t.profiles.push(profile.clone());
        Ok(profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn doctor(email: &str, username: &str) -> Doctor {
        Doctor {
            uuid: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            first_name: "Ana".into(),
            last_name: "Kovač".into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn patient(doctor_uuid: Uuid, first: &str, created_at: DateTime<Utc>) -> Patient {
        Patient {
            uuid: Uuid::new_v4(),
            doctor_uuid,
            first_name: first.into(),
            last_name: "Test".into(),
            phone: None,
            address: None,
            date_of_birth: None,
            sex: None,
            created_at,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_unique_violation() {
        let store = MemoryStore::new();
        DoctorRepository::create(&store, &doctor("a@x.hr", "a")).await.unwrap();
        let err = DoctorRepository::create(&store, &doctor("A@X.HR", "b"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn identifier_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let d = doctor("ana@clinic.hr", "AnaK");
        DoctorRepository::create(&store, &d).await.unwrap();
        assert_eq!(store.find_by_identifier("anak").await.unwrap().uuid, d.uuid);
        assert_eq!(store.find_by_identifier(" ANA@clinic.hr ").await.unwrap().uuid, d.uuid);
        assert!(store.find_by_identifier("nobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn patient_list_is_newest_first_and_paged() {
        let store = MemoryStore::new();
        let d = doctor("a@x.hr", "a");
        DoctorRepository::create(&store, &d).await.unwrap();
        let base = Utc::now();
        for i in 0..5 {
            let p = patient(d.uuid, &format!("p{i}"), base + Duration::seconds(i));
            PatientRepository::create(&store, &p).await.unwrap();
        }
        let page = PatientRepository::list(&store, d.uuid, &[], PageRequest::new(2, 2))
            .await
            .unwrap();
        let names: Vec<_> = page.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, ["p2", "p1"]);
    }

    #[tokio::test]
    async fn deleting_patient_cascades_to_visits() {
        let store = MemoryStore::new();
        let d = doctor("a@x.hr", "a");
        DoctorRepository::create(&store, &d).await.unwrap();
        let p = patient(d.uuid, "Ana", Utc::now());
        PatientRepository::create(&store, &p).await.unwrap();
        let visit = crate::models::CreateAnamnesisRequest::default().into_record(p.uuid, Utc::now());
        AnamnesisRepository::create(&store, &visit).await.unwrap();

        PatientRepository::delete(&store, p.uuid).await.unwrap();
        assert!(AnamnesisRepository::get(&store, visit.uuid)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(PatientRepository::delete(&store, p.uuid)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
