use anyhow::{Context, Result};
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

use database_layer::{DatabasePool, PoolSettings};

use crate::config::ServerConfig;
use crate::report::{PdfRenderer, ReportRenderer};
use crate::repositories::Repositories;
use crate::services::{
    AnamnesisService, AuthService, AuthSettings, BackupService, BackupSettings,
    DoctorProfileService, DoctorService, PatientService,
};
use crate::storage::BrandingStorage;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct ClinicServer {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    pub auth: Arc<AuthService>,
    pub doctors: Arc<DoctorService>,
    pub patients: Arc<PatientService>,
    pub anamneses: Arc<AnamnesisService>,
    pub profiles: Arc<DoctorProfileService>,
    pub backup: Arc<BackupService>,
    /// Uploaded branding assets
    pub storage: BrandingStorage,
    /// Present when backed by PostgreSQL
    pub database: Option<DatabasePool>,
}

impl ClinicServer {
    /// Wire services over the given repositories
    pub fn new(config: ServerConfig, repos: &Repositories, renderer: Arc<dyn ReportRenderer>) -> Self {
        let storage = BrandingStorage::new(config.uploads_dir.clone());
        let auth_settings = AuthSettings {
            token_ttl: Duration::hours(config.token_ttl_hours),
            bcrypt_cost: config.bcrypt_cost,
        };
        let backup_settings = BackupSettings {
            database_url: config.database_url.clone(),
            pg_dump: config.pg_dump_path.clone(),
            pg_restore: config.pg_restore_path.clone(),
            work_dir: config.backup_dir.clone().unwrap_or_else(std::env::temp_dir),
        };

        Self {
            auth: Arc::new(AuthService::new(repos, auth_settings)),
            doctors: Arc::new(DoctorService::new(repos)),
            patients: Arc::new(PatientService::new(repos)),
            anamneses: Arc::new(AnamnesisService::new(repos, renderer, storage.clone())),
            profiles: Arc::new(DoctorProfileService::new(repos, storage.clone())),
            backup: Arc::new(BackupService::new(backup_settings)),
            storage,
            database: None,
            config: Arc::new(config),
        }
    }

    /// Connect to PostgreSQL, run migrations and build the production state
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        let settings = PoolSettings {
            max_connections: config.database_max_connections,
            ..PoolSettings::default()
        };
        let db = DatabasePool::new(&config.database_url, settings)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to run database migrations")?;
        info!(max_connections = config.database_max_connections, "Database ready");

        let repos = Repositories::postgres(&db);
        let renderer = Arc::new(PdfRenderer::new(config.font_dir.clone()));
        let mut server = Self::new(config, &repos, renderer);
        server.database = Some(db);
        Ok(server)
    }
}
