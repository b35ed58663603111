//! PostgreSQL repositories built on the sqlx runtime query API

mod anamneses;
mod doctors;
mod profiles;
mod patients;
mod tokens;

pub use anamneses::AnamnesesRepository;
pub use doctors::{CredentialsRepository, DoctorsRepository};
pub use patients::PatientsRepository;
pub use profiles::DoctorProfilesRepository;
pub use tokens::TokensRepository;

/// `%term%` pattern for a lowercase substring match.
///
/// `%`, `_` and the escape character itself match literally; every `LIKE`
/// using it must carry `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::from("%");
    for c in term.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
