use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::trimmed_or_empty;

/// One clinical visit record for a patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Anamnesis {
    pub uuid: Uuid,
    pub patient_uuid: Uuid,
    pub anamnesis: String,
    pub status: String,
    pub diagnosis: String,
    pub therapy: String,
    pub other_info: String,
    /// Earlier visits of the same patient to print alongside this one
    pub include_visit_uuids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Anamnesis {
    pub fn belongs_to(&self, patient_uuid: Uuid) -> bool {
        self.patient_uuid == patient_uuid
    }

    pub fn matches_diagnosis(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty() || self.diagnosis.to_lowercase().contains(&needle)
    }
}

/// Drop nil ids and duplicates, keeping first-seen order
pub fn dedupe_visit_uuids(uuids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(uuids.len());
    for id in uuids {
        if !id.is_nil() && !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateAnamnesisRequest {
    pub anamnesis: Option<String>,
    pub status: Option<String>,
    pub diagnosis: Option<String>,
    pub therapy: Option<String>,
    pub other_info: Option<String>,
    #[serde(default)]
    pub include_visit_uuids: Vec<Uuid>,
}

impl CreateAnamnesisRequest {
    pub fn into_record(self, patient_uuid: Uuid, now: DateTime<Utc>) -> Anamnesis {
        Anamnesis {
            uuid: Uuid::new_v4(),
            patient_uuid,
            anamnesis: trimmed_or_empty(self.anamnesis.as_deref()),
            status: trimmed_or_empty(self.status.as_deref()),
            diagnosis: trimmed_or_empty(self.diagnosis.as_deref()),
            therapy: trimmed_or_empty(self.therapy.as_deref()),
            other_info: trimmed_or_empty(self.other_info.as_deref()),
            include_visit_uuids: dedupe_visit_uuids(&self.include_visit_uuids),
            created_at: now,
            updated_at: None,
        }
    }
}

/// Partial update; `include_visit_uuids` replaces the stored list when present
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAnamnesisRequest {
    pub anamnesis: Option<String>,
    pub status: Option<String>,
    pub diagnosis: Option<String>,
    pub therapy: Option<String>,
    pub other_info: Option<String>,
    pub include_visit_uuids: Option<Vec<Uuid>>,
}

impl UpdateAnamnesisRequest {
    pub fn apply_to(&self, record: &mut Anamnesis, now: DateTime<Utc>) {
        let fields = [
            (&self.anamnesis, &mut record.anamnesis),
            (&self.status, &mut record.status),
            (&self.diagnosis, &mut record.diagnosis),
            (&self.therapy, &mut record.therapy),
            (&self.other_info, &mut record.other_info),
        ];
        for (incoming, stored) in fields {
            if let Some(value) = incoming {
                *stored = value.trim().to_string();
            }
        }
        if let Some(include) = &self.include_visit_uuids {
            record.include_visit_uuids = dedupe_visit_uuids(include);
        }
        record.updated_at = Some(now);
    }
}

/// Optional body of the report endpoint
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GeneratePdfRequest {
    #[serde(default)]
    pub include_visit_uuids: Vec<Uuid>,
}
