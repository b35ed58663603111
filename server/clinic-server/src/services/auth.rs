//! Doctor registration, login and bearer token lifecycle

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use error_common::{ClinicError, Result};

use super::db_error;
use crate::models::{
    AuthSession, AuthToken, ChangePasswordRequest, Doctor, DoctorCredentials, LoginRequest,
    RegisterRequest,
};
use crate::repositories::{CredentialsRepository, DoctorRepository, Repositories, TokenRepository};
use crate::validation::RequestValidation;

/// Length of generated bearer tokens
pub const TOKEN_LENGTH: usize = 48;

#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl: Duration::hours(24),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

pub struct AuthService {
    doctors: Arc<dyn DoctorRepository>,
    credentials: Arc<dyn CredentialsRepository>,
    tokens: Arc<dyn TokenRepository>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(repos: &Repositories, settings: AuthSettings) -> Self {
        Self {
            doctors: repos.doctors.clone(),
            credentials: repos.credentials.clone(),
            tokens: repos.tokens.clone(),
            settings,
        }
    }

    /// Create a doctor with credentials and open a first session
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthSession> {
        const OP: &str = "register";
        req.validate().map_err(|e| e.context(OP))?;

        let now = Utc::now();
        let doctor = Doctor {
            uuid: Uuid::new_v4(),
            email: req.email.trim().to_string(),
            username: req.username.trim().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            created_at: now,
            updated_at: None,
        };
        let credentials = DoctorCredentials {
            uuid: Uuid::new_v4(),
            doctor_uuid: doctor.uuid,
            password_hash: self.hash_password(req.password).await?,
            password_updated_at: now,
        };

        let doctor = self
            .doctors
            .create_with_credentials(&doctor, &credentials)
            .await
            .map_err(|e| db_error(OP, e))?;
        info!(doctor_uuid = %doctor.uuid, "Registered doctor");

        self.issue_token(doctor.uuid).await
    }

    /// Unknown identifiers and wrong passwords are both `Unauthorized`
    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession> {
        const OP: &str = "login";
        req.validate().map_err(|e| e.context(OP))?;

        let doctor = match self.doctors.find_by_identifier(&req.identifier).await {
            Ok(d) => d,
            Err(e) if e.is_not_found() => return Err(ClinicError::unauthorized(OP)),
            Err(e) => return Err(ClinicError::internal(OP, e)),
        };
        let credentials = match self.credentials.get_by_doctor(doctor.uuid).await {
            Ok(c) => c,
            Err(e) if e.is_not_found() => {
                warn!(doctor_uuid = %doctor.uuid, "Login for doctor without credentials");
                return Err(ClinicError::unauthorized(OP));
            }
            Err(e) => return Err(ClinicError::internal(OP, e)),
        };

        if !verify_password(req.password, credentials.password_hash).await? {
            debug!(doctor_uuid = %doctor.uuid, "Password mismatch");
            return Err(ClinicError::unauthorized(OP));
        }

        self.issue_token(doctor.uuid).await
    }

    /// Revoke a token; unknown tokens are not an error
    pub async fn logout(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClinicError::invalid_request("logout", "token is required"));
        }
        self.tokens
            .delete_by_token(token)
            .await
            .map_err(|e| ClinicError::internal("logout", e))
    }

    pub async fn change_password(&self, doctor_uuid: Uuid, req: ChangePasswordRequest) -> Result<()> {
        const OP: &str = "change password";
        req.validate().map_err(|e| e.context(OP))?;

        let credentials = self
            .credentials
            .get_by_doctor(doctor_uuid)
            .await
            .map_err(|e| db_error(OP, e))?;
        if !verify_password(req.current_password, credentials.password_hash).await? {
            return Err(ClinicError::unauthorized(OP));
        }

        let hash = self.hash_password(req.new_password).await?;
        self.credentials
            .update_password(doctor_uuid, &hash, Utc::now())
            .await
            .map_err(|e| db_error(OP, e))?;
        info!(doctor_uuid = %doctor_uuid, "Password changed");
        Ok(())
    }

    /// Resolve a bearer token to its doctor; expired tokens are rejected
    pub async fn authenticate(&self, token: &str) -> Result<Uuid> {
        const OP: &str = "authenticate";
        let token = token.trim();
        if token.is_empty() {
            return Err(ClinicError::unauthorized(OP));
        }
        let record = match self.tokens.find_by_token(token).await {
            Ok(t) => t,
            Err(e) if e.is_not_found() => return Err(ClinicError::unauthorized(OP)),
            Err(e) => return Err(ClinicError::internal(OP, e)),
        };
        if !record.is_valid_at(Utc::now()) {
            debug!(token_uuid = %record.uuid, "Rejected expired token");
            return Err(ClinicError::unauthorized(OP));
        }
        Ok(record.doctor_uuid)
    }

    pub async fn current_doctor(&self, doctor_uuid: Uuid) -> Result<Doctor> {
        self.doctors
            .get(doctor_uuid)
            .await
            .map_err(|e| db_error("current doctor", e))
    }

    async fn issue_token(&self, doctor_uuid: Uuid) -> Result<AuthSession> {
        let now = Utc::now();
        let token = AuthToken {
            uuid: Uuid::new_v4(),
            doctor_uuid,
            token: generate_token(),
            expires_at: now + self.settings.token_ttl,
            created_at: now,
        };
        let stored = self
            .tokens
            .create(&token)
            .await
            .map_err(|e| ClinicError::internal("issue token", e))?;
        Ok(AuthSession::from(&stored))
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let cost = self.settings.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ClinicError::internal("hash password", e))?
            .map_err(|e| ClinicError::internal("hash password", e))
    }
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ClinicError::internal("verify password", e))?
        .map_err(|e| ClinicError::internal("verify password", e))
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_common::ErrorKind;

    fn service(repos: &Repositories) -> AuthService {
        AuthService::new(
            repos,
            AuthSettings {
                token_ttl: Duration::hours(24),
                bcrypt_cost: 4,
            },
        )
    }

    fn register_request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            username: username.into(),
            password: "lozinka123".into(),
            first_name: "Ana".into(),
            last_name: "Kovač".into(),
        }
    }

    fn login(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_by_either_identifier() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let session = auth.register(register_request("ana@clinic.hr", "ana")).await.unwrap();
        assert_eq!(session.token.len(), TOKEN_LENGTH);
        assert_eq!(auth.authenticate(&session.token).await.unwrap(), session.doctor_uuid);

        let by_email = auth.login(login("ANA@clinic.hr", "lozinka123")).await.unwrap();
        let by_name = auth.login(login("ana", "lozinka123")).await.unwrap();
        assert_ne!(by_email.token, by_name.token);
        assert_eq!(by_email.doctor_uuid, session.doctor_uuid);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        auth.register(register_request("ana@clinic.hr", "ana")).await.unwrap();

        let same_email = auth.register(register_request("ana@clinic.hr", "other")).await;
        assert_eq!(same_email.unwrap_err().kind(), ErrorKind::Conflict);
        let same_username = auth.register(register_request("other@clinic.hr", "ana")).await;
        assert_eq!(same_username.unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn login_failures_are_unauthorized() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        auth.register(register_request("ana@clinic.hr", "ana")).await.unwrap();

        let unknown = auth.login(login("nobody", "lozinka123")).await.unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::Unauthorized);
        let wrong = auth.login(login("ana", "wrong")).await.unwrap_err();
        assert_eq!(wrong.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn logout_revokes_only_that_token() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let first = auth.register(register_request("ana@clinic.hr", "ana")).await.unwrap();
        let second = auth.login(login("ana", "lozinka123")).await.unwrap();

        auth.logout(&first.token).await.unwrap();
        auth.logout(&first.token).await.unwrap();
        let err = auth.authenticate(&first.token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(auth.authenticate(&second.token).await.is_ok());
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let repos = Repositories::in_memory();
        let auth = AuthService::new(
            &repos,
            AuthSettings {
                token_ttl: Duration::seconds(-1),
                bcrypt_cost: 4,
            },
        );
        let session = auth.register(register_request("ana@clinic.hr", "ana")).await.unwrap();
        let err = auth.authenticate(&session.token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn change_password_requires_current() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let session = auth.register(register_request("ana@clinic.hr", "ana")).await.unwrap();

        let wrong = ChangePasswordRequest {
            current_password: "nope".into(),
            new_password: "nova-lozinka".into(),
        };
        let err = auth.change_password(session.doctor_uuid, wrong).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let ok = ChangePasswordRequest {
            current_password: "lozinka123".into(),
            new_password: "nova-lozinka".into(),
        };
        auth.change_password(session.doctor_uuid, ok).await.unwrap();
        assert!(auth.login(login("ana", "nova-lozinka")).await.is_ok());
        assert!(auth.login(login("ana", "lozinka123")).await.is_err());

        let missing = ChangePasswordRequest {
            current_password: "x".into(),
            new_password: "y".into(),
        };
        let err = auth.change_password(Uuid::new_v4(), missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
