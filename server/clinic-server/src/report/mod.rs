//! Visit report assembly.
//!
//! [`VisitReport`] is the layout-independent content of a printed
//! physiotherapist opinion: letterhead, patient block, one section per
//! visit in chronological order and an optional signature. A
//! [`ReportRenderer`] turns it into bytes; [`pdf::PdfRenderer`] is the
//! production implementation.

pub mod pdf;

use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Anamnesis, Doctor, DoctorProfile, Patient};

pub use pdf::PdfRenderer;

/// Display format used for every date in a report
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y.";

pub const TITLE: &str = "MIŠLJENJE FIZIOTERAPEUTA";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("load fonts from {dir}: {reason}")]
    Font { dir: String, reason: String },

    #[error("render: {0}")]
    Render(String),
}

/// Renders an assembled report into a document
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &VisitReport) -> Result<Vec<u8>, ReportError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Letterhead {
    pub practice_name: String,
    /// Role title and department on one line
    pub role_line: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    /// Local file of the practice logo
    pub logo: Option<PathBuf>,
}

impl Letterhead {
    fn from_profile(profile: &DoctorProfile, logo: Option<PathBuf>) -> Self {
        let role_line = format!("{} {}", profile.role_title.trim(), profile.department.trim())
            .trim()
            .to_string();
        Self {
            practice_name: profile.practice_name.trim().to_string(),
            role_line,
            address: profile.address.trim().to_string(),
            phone: profile.phone.trim().to_string(),
            email: profile.email.trim().to_string(),
            website: profile.website.trim().to_string(),
            logo,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientSummary {
    pub name: String,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitSection {
    /// `N. posjet - dd.mm.yyyy.`
    pub heading: String,
    /// Labelled non-empty fields in print order
    pub fields: Vec<(&'static str, String)>,
}

impl VisitSection {
    fn new(number: usize, visit: &Anamnesis) -> Self {
        let fields = [
            ("Anamneza", &visit.anamnesis),
            ("Status", &visit.status),
            ("Dijagnoza", &visit.diagnosis),
            ("Terapija", &visit.therapy),
            ("Ostalo", &visit.other_info),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| (label, value.trim().to_string()))
        .collect();

        Self {
            heading: format!(
                "{number}. posjet - {}",
                visit.created_at.format(DISPLAY_DATE_FORMAT)
            ),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReport {
    /// `Datum ispisa` value, already formatted
    pub printed_on: String,
    /// Absent when the doctor has no profile
    pub letterhead: Option<Letterhead>,
    pub patient: PatientSummary,
    pub visits: Vec<VisitSection>,
    /// Treating doctor's full name
    pub signature: Option<String>,
}

/// Inputs gathered by the anamnesis service
pub struct ReportSources<'a> {
    pub patient: &'a Patient,
    pub current: &'a Anamnesis,
    /// Already restricted to the same patient
    pub prior: Vec<Anamnesis>,
    pub profile: Option<&'a DoctorProfile>,
    pub doctor: Option<&'a Doctor>,
    pub logo: Option<PathBuf>,
    pub printed_on: NaiveDate,
}

impl VisitReport {
    pub fn assemble(sources: ReportSources<'_>) -> Self {
        let ReportSources {
            patient,
            current,
            mut prior,
            profile,
            doctor,
            logo,
            printed_on,
        } = sources;

        // on equal timestamps the current visit prints last
        prior.sort_by_key(|v| v.created_at);
        let mut visits: Vec<&Anamnesis> = prior.iter().filter(|v| v.uuid != current.uuid).collect();
        visits.push(current);
        visits.sort_by_key(|v| v.created_at);

        let signature = doctor
            .map(|d| d.full_name().trim().to_string())
            .filter(|name| !name.is_empty());

        Self {
            printed_on: printed_on.format(DISPLAY_DATE_FORMAT).to_string(),
            letterhead: profile.map(|p| Letterhead::from_profile(p, logo)),
            patient: PatientSummary {
                name: patient.full_name().trim().to_string(),
                date_of_birth: patient
                    .date_of_birth
                    .as_deref()
                    .map(format_plain_date)
                    .filter(|s| !s.is_empty()),
                phone: patient.phone.clone(),
                address: patient.address.clone(),
            },
            visits: visits
                .into_iter()
                .enumerate()
                .map(|(i, v)| VisitSection::new(i + 1, v))
                .collect(),
            signature,
        }
    }
}

/// Reformat `YYYY-MM-DD` or RFC 3339 input as `dd.mm.yyyy.`; anything
/// else is returned trimmed but otherwise unchanged.
pub fn format_plain_date(value: &str) -> String {
    let s = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.format(DISPLAY_DATE_FORMAT).to_string();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return ts.with_timezone(&Utc).format(DISPLAY_DATE_FORMAT).to_string();
    }
    s.to_string()
}
