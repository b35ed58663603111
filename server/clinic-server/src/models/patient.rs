use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::normalize_optional;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Patient {
    pub uuid: Uuid,
    /// Owning doctor
    pub doctor_uuid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Free-form; usually `YYYY-MM-DD`
    #[schema(example = "1990-04-12")]
    pub date_of_birth: Option<String>,
    pub sex: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn is_owned_by(&self, doctor_uuid: Uuid) -> bool {
        self.doctor_uuid == doctor_uuid
    }

    /// Whether every search term matches first name, last name or phone
    pub fn matches_terms(&self, terms: &[String]) -> bool {
        let first = self.first_name.to_lowercase();
        let last = self.last_name.to_lowercase();
        let phone = self.phone.as_deref().unwrap_or_default().to_lowercase();
        terms.iter().all(|term| {
            first.contains(term.as_str()) || last.contains(term.as_str()) || phone.contains(term.as_str())
        })
    }
}

/// Split a free-text query into lowercase whitespace-separated terms
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub sex: Option<String>,
}

/// Partial update.
///
/// `None` leaves a field untouched. For optional fields an empty string
/// clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub sex: Option<String>,
}

impl UpdatePatientRequest {
    pub fn apply_to(&self, patient: &mut Patient) {
        if let Some(first_name) = &self.first_name {
            patient.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &self.last_name {
            patient.last_name = last_name.trim().to_string();
        }
        if self.phone.is_some() {
            patient.phone = normalize_optional(self.phone.clone());
        }
        if self.address.is_some() {
            patient.address = normalize_optional(self.address.clone());
        }
        if self.date_of_birth.is_some() {
            patient.date_of_birth = normalize_optional(self.date_of_birth.clone());
        }
        if self.sex.is_some() {
            patient.sex = normalize_optional(self.sex.clone());
        }
    }
}
