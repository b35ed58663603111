use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A practitioner account; owns patients, a profile and credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Doctor {
    pub uuid: Uuid,
    #[schema(example = "ana@clinic.hr")]
    pub email: String,
    #[schema(example = "ana")]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateDoctorRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDoctorRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateDoctorRequest {
    pub fn apply_to(&self, doctor: &mut Doctor) {
        if let Some(email) = &self.email {
            doctor.email = email.trim().to_string();
        }
        if let Some(username) = &self.username {
            doctor.username = username.trim().to_string();
        }
        if let Some(first_name) = &self.first_name {
            doctor.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &self.last_name {
            doctor.last_name = last_name.trim().to_string();
        }
    }
}
