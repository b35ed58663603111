use async_trait::async_trait;
use database_layer::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::like_pattern;
use crate::models::Patient;
use crate::repositories;
use crate::types::PageRequest;

const PATIENT_COLUMNS: &str = "uuid, doctor_uuid, first_name, last_name, phone, address, \
                               date_of_birth, sex, created_at, updated_at";

pub struct PatientsRepository {
    pool: PgPool,
}

impl PatientsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl repositories::PatientRepository for PatientsRepository {
    async fn create(&self, patient: &Patient) -> DatabaseResult<Patient> {
        let sql = format!(
            "INSERT INTO patients ({PATIENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {PATIENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Patient>(&sql)
            .bind(patient.uuid)
            .bind(patient.doctor_uuid)
            .bind(&patient.first_name)
            .bind(&patient.last_name)
            .bind(&patient.phone)
            .bind(&patient.address)
            .bind(&patient.date_of_birth)
            .bind(&patient.sex)
            .bind(patient.created_at)
            .bind(patient.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get(&self, uuid: Uuid) -> DatabaseResult<Patient> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE uuid = $1");
        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(uuid)
            .fetch_one(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn update(&self, patient: &Patient) -> DatabaseResult<Patient> {
        let sql = format!(
            "UPDATE patients SET first_name = $2, last_name = $3, phone = $4, address = $5, \
             date_of_birth = $6, sex = $7, updated_at = $8 WHERE uuid = $1 RETURNING {PATIENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Patient>(&sql)
            .bind(patient.uuid)
            .bind(&patient.first_name)
            .bind(&patient.last_name)
            .bind(&patient.phone)
            .bind(&patient.address)
            .bind(&patient.date_of_birth)
            .bind(&patient.sex)
            .bind(patient.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM patients WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn list(
        &self,
        doctor_uuid: Uuid,
        terms: &[String],
        page: PageRequest,
    ) -> DatabaseResult<Vec<Patient>> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE doctor_uuid = "
        ));
        qb.push_bind(doctor_uuid);
        for term in terms {
            let pattern = like_pattern(term);
            qb.push(" AND (LOWER(first_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(last_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(COALESCE(phone, '')) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let patients = qb.build_query_as::<Patient>().fetch_all(&self.pool).await?;
        Ok(patients)
    }
}
