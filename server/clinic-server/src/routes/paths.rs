//! Route path constants, relative to the `/api` nest.
//!
//! utoipa `#[path(...)]` attributes need string literals, so handler
//! attributes repeat these paths with the `/api` prefix and `{param}` syntax.

pub const API: &str = "/api";
pub const STATIC: &str = "/static";
pub const OPENAPI_JSON: &str = "/openapi.json";

pub mod health {
    pub const HEALTH: &str = "/health";
}

pub mod auth {
    pub const REGISTER: &str = "/auth/register";
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const ME: &str = "/auth/me";
    pub const CHANGE_PASSWORD: &str = "/auth/change-password";
}

pub mod patients {
    pub const PATIENTS: &str = "/patients";
    pub const CREATE: &str = "/patients/create";
    pub const PATIENT_BY_ID: &str = "/patients/:patient_uuid";
}

pub mod doctors {
    pub const DOCTORS: &str = "/doctors";
    pub const CREATE: &str = "/doctors/create";
    pub const DOCTOR_BY_ID: &str = "/doctors/:uuid";
}

pub mod anamneses {
    pub const ANAMNESES: &str = "/patients/:patient_uuid/anamneses";
    pub const ANAMNESIS_BY_ID: &str = "/patients/:patient_uuid/anamneses/:uuid";
    pub const PDF: &str = "/patients/:patient_uuid/anamneses/:uuid/pdf";
}

pub mod profile {
    pub const PROFILE: &str = "/doctor/profile";
}

pub mod files {
    pub const UPLOAD: &str = "/files/upload";
}

pub mod backup {
    pub const BACKUP: &str = "/backup";
    pub const RESTORE: &str = "/backup/restore";
}
