use async_trait::async_trait;
use database_layer::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::like_pattern;
use crate::models::Anamnesis;
use crate::repositories;
use crate::types::PageRequest;

const ANAMNESIS_COLUMNS: &str = "uuid, patient_uuid, anamnesis, status, diagnosis, therapy, \
                                 other_info, include_visit_uuids, created_at, updated_at";

pub struct AnamnesesRepository {
    pool: PgPool,
}

impl AnamnesesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl repositories::AnamnesisRepository for AnamnesesRepository {
    async fn create(&self, anamnesis: &Anamnesis) -> DatabaseResult<Anamnesis> {
        let sql = format!(
            "INSERT INTO anamneses ({ANAMNESIS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {ANAMNESIS_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Anamnesis>(&sql)
            .bind(anamnesis.uuid)
            .bind(anamnesis.patient_uuid)
            .bind(&anamnesis.anamnesis)
            .bind(&anamnesis.status)
            .bind(&anamnesis.diagnosis)
            .bind(&anamnesis.therapy)
            .bind(&anamnesis.other_info)
            .bind(&anamnesis.include_visit_uuids)
            .bind(anamnesis.created_at)
            .bind(anamnesis.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get(&self, uuid: Uuid) -> DatabaseResult<Anamnesis> {
        let sql = format!("SELECT {ANAMNESIS_COLUMNS} FROM anamneses WHERE uuid = $1");
        let found = sqlx::query_as::<_, Anamnesis>(&sql)
            .bind(uuid)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    async fn update(&self, anamnesis: &Anamnesis) -> DatabaseResult<Anamnesis> {
        let sql = format!(
            "UPDATE anamneses SET anamnesis = $2, status = $3, diagnosis = $4, therapy = $5, \
             other_info = $6, include_visit_uuids = $7, updated_at = $8 \
             WHERE uuid = $1 RETURNING {ANAMNESIS_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Anamnesis>(&sql)
            .bind(anamnesis.uuid)
            .bind(&anamnesis.anamnesis)
            .bind(&anamnesis.status)
            .bind(&anamnesis.diagnosis)
            .bind(&anamnesis.therapy)
            .bind(&anamnesis.other_info)
            .bind(&anamnesis.include_visit_uuids)
            .bind(anamnesis.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, uuid: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM anamneses WHERE uuid = $1")
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
        patient_uuid: Uuid,
        query: &str,
        page: PageRequest,
    ) -> DatabaseResult<Vec<Anamnesis>> {
        let columns = ANAMNESIS_COLUMNS
            .split(',')
            .map(|c| format!("a.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {columns} FROM anamneses a \
             JOIN patients p ON p.uuid = a.patient_uuid \
             WHERE p.doctor_uuid = $1 AND a.patient_uuid = $2 \
               AND ($3 = '' OR LOWER(a.diagnosis) LIKE $4 ESCAPE '\\') \
             ORDER BY a.created_at DESC LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, Anamnesis>(&sql)
            .bind(doctor_uuid)
            .bind(patient_uuid)
            .bind(query.trim())
            .bind(like_pattern(query))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_uuids(&self, uuids: &[Uuid]) -> DatabaseResult<Vec<Anamnesis>> {
        if uuids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {ANAMNESIS_COLUMNS} FROM anamneses WHERE uuid = ANY($1)");
        let rows = sqlx::query_as::<_, Anamnesis>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
