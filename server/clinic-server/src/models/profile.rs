use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::trimmed_or_empty;

/// Practice branding printed on generated reports; one per doctor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DoctorProfile {
    pub uuid: Uuid,
    pub doctor_uuid: Uuid,
    pub practice_name: String,
    pub department: String,
    pub role_title: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    /// `/static/...` URL of an uploaded logo, or empty
    pub logo_path: String,
    pub protocol_prefix: String,
    pub header_note: String,
    pub footer_note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpsertDoctorProfileRequest {
    #[serde(default)]
    pub practice_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub department: Option<String>,
    pub role_title: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_path: Option<String>,
    pub protocol_prefix: Option<String>,
    pub header_note: Option<String>,
    pub footer_note: Option<String>,
}

impl UpsertDoctorProfileRequest {
    /// Build the record to persist.
    ///
    /// With an existing profile its uuid and `created_at` are kept, and an
    /// empty `logo_path` keeps the stored logo.
    pub fn into_profile(
        self,
        doctor_uuid: Uuid,
        existing: Option<&DoctorProfile>,
        now: DateTime<Utc>,
    ) -> DoctorProfile {
        let mut logo_path = trimmed_or_empty(self.logo_path.as_deref());
        if logo_path.is_empty() {
            if let Some(prev) = existing {
                logo_path = prev.logo_path.clone();
            }
        }
        DoctorProfile {
            uuid: existing.map_or_else(Uuid::new_v4, |p| p.uuid),
            doctor_uuid,
            practice_name: self.practice_name.trim().to_string(),
            department: trimmed_or_empty(self.department.as_deref()),
            role_title: trimmed_or_empty(self.role_title.as_deref()),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: trimmed_or_empty(self.email.as_deref()),
            website: trimmed_or_empty(self.website.as_deref()),
            logo_path,
            protocol_prefix: trimmed_or_empty(self.protocol_prefix.as_deref()),
            header_note: trimmed_or_empty(self.header_note.as_deref()),
            footer_note: trimmed_or_empty(self.footer_note.as_deref()),
            created_at: existing.map_or(now, |p| p.created_at),
            updated_at: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(logo: Option<&str>) -> UpsertDoctorProfileRequest {
        UpsertDoctorProfileRequest {
            practice_name: " Physio Centar ".into(),
            address: "Ilica 1".into(),
            phone: "01 234".into(),
            logo_path: logo.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn new_profile_gets_fresh_identity() {
        let doctor = Uuid::new_v4();
        let now = Utc::now();
        let profile = request(None).into_profile(doctor, None, now);
        assert_eq!(profile.doctor_uuid, doctor);
        assert_eq!(profile.practice_name, "Physio Centar");
        assert_eq!(profile.created_at, now);
        assert_eq!(profile.logo_path, "");
    }

    #[test]
    fn update_keeps_identity_and_logo() {
        let doctor = Uuid::new_v4();
        let earlier = Utc::now() - Duration::days(3);
        let first = request(Some("/static/branding/1.png")).into_profile(doctor, None, earlier);

        let now = Utc::now();
        let second = request(Some("  ")).into_profile(doctor, Some(&first), now);
        assert_eq!(second.uuid, first.uuid);
        assert_eq!(second.created_at, earlier);
        assert_eq!(second.updated_at, Some(now));
        assert_eq!(second.logo_path, "/static/branding/1.png");
    }
}
