use async_trait::async_trait;
use database_layer::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::DoctorProfile;
use crate::repositories;

const PROFILE_COLUMNS: &str = "uuid, doctor_uuid, practice_name, department, role_title, address, \
                               phone, email, website, logo_path, protocol_prefix, header_note, \
                               footer_note, created_at, updated_at";

pub struct DoctorProfilesRepository {
    pool: PgPool,
}

impl DoctorProfilesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl repositories::DoctorProfileRepository for DoctorProfilesRepository {
    async fn get_by_doctor(&self, doctor_uuid: Uuid) -> DatabaseResult<DoctorProfile> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM doctor_profiles WHERE doctor_uuid = $1");
        let profile = sqlx::query_as::<_, DoctorProfile>(&sql)
            .bind(doctor_uuid)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }

    // created_at is never overwritten on conflict
    async fn upsert(&self, profile: &DoctorProfile) -> DatabaseResult<DoctorProfile> {
        let sql = format!(
            "INSERT INTO doctor_profiles ({PROFILE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (doctor_uuid) DO UPDATE SET \
                practice_name = EXCLUDED.practice_name, \
                department = EXCLUDED.department, \
                role_title = EXCLUDED.role_title, \
                address = EXCLUDED.address, \
                phone = EXCLUDED.phone, \
                email = EXCLUDED.email, \
                website = EXCLUDED.website, \
                logo_path = EXCLUDED.logo_path, \
                protocol_prefix = EXCLUDED.protocol_prefix, \
                header_note = EXCLUDED.header_note, \
                footer_note = EXCLUDED.footer_note, \
                updated_at = EXCLUDED.updated_at \
             RETURNING {PROFILE_COLUMNS}"
        );
        let saved = sqlx::query_as::<_, DoctorProfile>(&sql)
            .bind(profile.uuid)
            .bind(profile.doctor_uuid)
            .bind(&profile.practice_name)
            .bind(&profile.department)
            .bind(&profile.role_title)
            .bind(&profile.address)
            .bind(&profile.phone)
            .bind(&profile.email)
            .bind(&profile.website)
            .bind(&profile.logo_path)
            .bind(&profile.protocol_prefix)
            .bind(&profile.header_note)
            .bind(&profile.footer_note)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }
}
