use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_layer::{DatabaseError, DatabasePool, DatabaseResult, TransactionManager};
use sqlx::{PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use super::like_pattern;
use crate::models::{Doctor, DoctorCredentials};
use crate::repositories;
use crate::types::PageRequest;

const DOCTOR_COLUMNS: &str = "uuid, email, username, first_name, last_name, created_at, updated_at";

/// Doctor accounts
pub struct DoctorsRepository {
    db: DatabasePool,
    transactions: TransactionManager,
}

impl DoctorsRepository {
    pub fn new(db: DatabasePool) -> Self {
        let transactions = TransactionManager::new(db.clone());
        Self { db, transactions }
    }

    fn pool(&self) -> &PgPool {
        self.db.pool()
    }

    async fn insert_doctor<'e, E>(executor: E, doctor: &Doctor) -> DatabaseResult<Doctor>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO doctors ({DOCTOR_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {DOCTOR_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Doctor>(&sql)
            .bind(doctor.uuid)
            .bind(&doctor.email)
            .bind(&doctor.username)
            .bind(&doctor.first_name)
            .bind(&doctor.last_name)
            .bind(doctor.created_at)
            .bind(doctor.updated_at)
            .fetch_one(executor)
            .await?;
        Ok(created)
    }
}

#[async_trait]
impl repositories::DoctorRepository for DoctorsRepository {
    async fn create(&self, doctor: &Doctor) -> DatabaseResult<Doctor> {
        Self::insert_doctor(self.pool(), doctor).await
    }

    async fn create_with_credentials(
        &self,
        doctor: &Doctor,
        credentials: &DoctorCredentials,
    ) -> DatabaseResult<Doctor> {
        let mut tx = self.transactions.begin().await?;

        let created = Self::insert_doctor(&mut *tx, doctor).await?;
        sqlx::query(
            "INSERT INTO doctor_credentials (uuid, doctor_uuid, password_hash, password_updated_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(credentials.uuid)
        .bind(credentials.doctor_uuid)
        .bind(&credentials.password_hash)
        .bind(credentials.password_updated_at)
        .execute(&mut *tx)
        .await?;

        self.transactions.commit(tx).await?;
        debug!(doctor_uuid = %created.uuid, "doctor registered with credentials");
        Ok(created)
    }

    async fn get(&self, uuid: Uuid) -> DatabaseResult<Doctor> {
        let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE uuid = $1");
        let doctor = sqlx::query_as::<_, Doctor>(&sql)
            .bind(uuid)
            .fetch_one(self.pool())
            .await?;
        Ok(doctor)
    }

    async fn find_by_identifier(&self, identifier: &str) -> DatabaseResult<Doctor> {
        let term = identifier.trim().to_lowercase();
        if term.is_empty() {
            return Err(DatabaseError::NotFound);
        }
        let sql = format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE LOWER(email) = $1 OR LOWER(username) = $1 LIMIT 1"
        );
        let doctor = sqlx::query_as::<_, Doctor>(&sql)
            .bind(term)
            .fetch_one(self.pool())
            .await?;
        Ok(doctor)
    }

    async fn update(&self, doctor: &Doctor) -> DatabaseResult<Doctor> {
        let sql = format!(
            "UPDATE doctors SET email = $2, username = $3, first_name = $4, last_name = $5, updated_at = $6 \
             WHERE uuid = $1 RETURNING {DOCTOR_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Doctor>(&sql)
            .bind(doctor.uuid)
            .bind(&doctor.email)
            .bind(&doctor.username)
            .bind(&doctor.first_name)
            .bind(&doctor.last_name)
            .bind(doctor.updated_at)
            .fetch_one(self.pool())
            .await?;
        Ok(updated)
    }

    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM doctors WHERE uuid = $1")
            .bind(uuid)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, query: &str, page: PageRequest) -> DatabaseResult<Vec<Doctor>> {
        let sql = format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors \
             WHERE $1 = '' OR LOWER(email) LIKE $2 ESCAPE '\\' OR LOWER(username) LIKE $2 ESCAPE '\\' \
                OR LOWER(first_name) LIKE $2 ESCAPE '\\' OR LOWER(last_name) LIKE $2 ESCAPE '\\' \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let doctors = sqlx::query_as::<_, Doctor>(&sql)
            .bind(query.trim())
            .bind(like_pattern(query))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;
        Ok(doctors)
    }
}

/// Password hashes, one row per doctor
pub struct CredentialsRepository {
    pool: PgPool,
}

impl CredentialsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl repositories::CredentialsRepository for CredentialsRepository {
    async fn get_by_doctor(&self, doctor_uuid: Uuid) -> DatabaseResult<DoctorCredentials> {
        let creds = sqlx::query_as::<_, DoctorCredentials>(
            "SELECT uuid, doctor_uuid, password_hash, password_updated_at \
             FROM doctor_credentials WHERE doctor_uuid = $1",
        )
        .bind(doctor_uuid)
        .fetch_one(&self.pool)
        .await?;
        Ok(creds)
    }

    async fn update_password(
        &self,
        doctor_uuid: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE doctor_credentials SET password_hash = $2, password_updated_at = $3 \
             WHERE doctor_uuid = $1",
        )
        .bind(doctor_uuid)
        .bind(password_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
