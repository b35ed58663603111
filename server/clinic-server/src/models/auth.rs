use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

const REDACTED: &str = "[REDACTED]";

/// Password hash for a doctor (1:1)
#[derive(Clone, sqlx::FromRow)]
pub struct DoctorCredentials {
    pub uuid: Uuid,
    pub doctor_uuid: Uuid,
    pub password_hash: String,
    pub password_updated_at: DateTime<Utc>,
}

impl fmt::Debug for DoctorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoctorCredentials")
            .field("uuid", &self.uuid)
            .field("doctor_uuid", &self.doctor_uuid)
            .field("password_hash", &REDACTED)
            .field("password_updated_at", &self.password_updated_at)
            .finish()
    }
}

/// Opaque bearer token; many per doctor
#[derive(Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub uuid: Uuid,
    pub doctor_uuid: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Valid only while `now < expires_at`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("uuid", &self.uuid)
            .field("doctor_uuid", &self.doctor_uuid)
            .field("token", &REDACTED)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSession {
    pub token: String,
    pub token_uuid: Uuid,
    pub doctor_uuid: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl From<&AuthToken> for AuthSession {
    fn from(token: &AuthToken) -> Self {
        Self {
            token: token.token.clone(),
            token_uuid: token.uuid,
            doctor_uuid: token.doctor_uuid,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// `identifier` is an email or a username
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default, alias = "email", alias = "username")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub token: Option<String>,
}

impl fmt::Debug for LogoutRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoutRequest")
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("current_password", &REDACTED)
            .field("new_password", &REDACTED)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_expiry_is_exclusive() {
        let now = Utc::now();
        let token = AuthToken {
            uuid: Uuid::new_v4(),
            doctor_uuid: Uuid::new_v4(),
            token: "secret".into(),
            expires_at: now,
            created_at: now - Duration::hours(24),
        };
        assert!(!token.is_valid_at(now));
        assert!(token.is_valid_at(now - Duration::seconds(1)));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let req = LoginRequest {
            identifier: "ana".into(),
            password: "hunter2".into(),
        };
        let text = format!("{req:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("ana"));
    }

    #[test]
    fn login_accepts_email_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"ana@clinic.hr","password":"x"}"#).unwrap();
        assert_eq!(req.identifier, "ana@clinic.hr");
    }
}
