//! Database dump and restore through the PostgreSQL client tools

use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

use error_common::ClinicError;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("missing DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Non-zero exit; carries the tool's combined output verbatim
    #[error("{program} failed: {status} ({output})")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        output: String,
    },

    #[error("backup file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackupError> for ClinicError {
    fn from(err: BackupError) -> Self {
        ClinicError::internal("backup", err)
    }
}

#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub database_url: String,
    pub pg_dump: PathBuf,
    pub pg_restore: PathBuf,
    /// Where dump files are written before download
    pub work_dir: PathBuf,
}

/// A finished dump waiting to be streamed to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub file_name: String,
    pub path: PathBuf,
}

pub struct BackupService {
    settings: BackupSettings,
}

impl BackupService {
    pub fn new(settings: BackupSettings) -> Self {
        Self { settings }
    }

    /// `pg_dump -Fc` into `physio_<YYYYMMDD_HHMMSS>.dump`
    pub async fn create_backup(&self) -> Result<BackupArtifact, BackupError> {
        let dsn = self.dsn()?;
        let file_name = format!("physio_{}.dump", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.settings.work_dir.join(&file_name);

        let mut cmd = Command::new(&self.settings.pg_dump);
        cmd.arg("-Fc").arg("-f").arg(&path).arg(dsn);
        if let Err(e) = run(&self.settings.pg_dump, cmd).await {
            // pg_dump may have written part of the file before failing
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                discard(&path).await;
            }
            return Err(e);
        }

        info!(file = %file_name, "Database backup created");
        Ok(BackupArtifact { file_name, path })
    }

    /// Destructive restore: `pg_restore --clean --if-exists`
    pub async fn restore_backup(&self, path: &Path) -> Result<(), BackupError> {
        let dsn = self.dsn()?;
        let mut cmd = Command::new(&self.settings.pg_restore);
        cmd.arg("--clean").arg("--if-exists").arg("-d").arg(dsn).arg(path);
        run(&self.settings.pg_restore, cmd).await?;

        info!(file = %path.display(), "Database restored");
        Ok(())
    }

    /// Read a finished dump and delete it; a failed delete is only logged
    pub async fn take_artifact(&self, artifact: &BackupArtifact) -> Result<Vec<u8>, BackupError> {
        let bytes = tokio::fs::read(&artifact.path).await;
        discard(&artifact.path).await;
        Ok(bytes?)
    }

    /// Restore from an uploaded dump and return its base name.
    ///
    /// The upload is staged in the work directory and removed whatever the
    /// outcome of the restore.
    pub async fn restore_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, BackupError> {
        let file = upload_basename(original_name);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let staged = self.settings.work_dir.join(format!("restore_{nanos}.dump"));
        tokio::fs::write(&staged, bytes).await?;

        let result = self.restore_backup(&staged).await;
        discard(&staged).await;
        result.map(|()| file)
    }

    fn dsn(&self) -> Result<&str, BackupError> {
        let dsn = self.settings.database_url.trim();
        if dsn.is_empty() {
            return Err(BackupError::MissingDatabaseUrl);
        }
        Ok(dsn)
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(file = %path.display(), error = %e, "Failed to remove backup file");
    }
}

fn upload_basename(name: &str) -> String {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload.dump")
        .to_string()
}

async fn run(program: &Path, mut cmd: Command) -> Result<Output, BackupError> {
    let program = program.display().to_string();
    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| BackupError::Spawn {
            program: program.clone(),
            source,
        })?;
    if output.status.success() {
        return Ok(output);
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    error!(program = %program, status = %output.status, "Backup tool failed");
    Err(BackupError::Failed {
        program,
        status: output.status,
        output: combined.trim().to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn settings(dir: &Path, dump: &str, restore: &str) -> BackupSettings {
        BackupSettings {
            database_url: "postgres://localhost/physio".into(),
            pg_dump: PathBuf::from(dump),
            pg_restore: PathBuf::from(restore),
            work_dir: dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn dump_names_file_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let service = BackupService::new(settings(dir.path(), "true", "true"));
        let artifact = service.create_backup().await.unwrap();
        assert!(artifact.file_name.starts_with("physio_"));
        assert!(artifact.file_name.ends_with(".dump"));
        assert_eq!(artifact.path, dir.path().join(&artifact.file_name));
    }

    #[tokio::test]
    async fn tool_output_is_reported_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        // `ls` rejects the restore flags and explains why on stderr
        let service = BackupService::new(settings(dir.path(), "false", "ls"));

        let err = service.restore_backup(&dir.path().join("x.dump")).await.unwrap_err();
        assert!(matches!(err, BackupError::Failed { .. }));
        assert!(err.to_string().contains("clean"));

        let clinic: ClinicError = service.create_backup().await.unwrap_err().into();
        assert_eq!(clinic.kind(), error_common::ErrorKind::Internal);
        assert!(clinic.message().starts_with("backup: false failed"));
    }

    #[tokio::test]
    async fn downloaded_dump_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let service = BackupService::new(settings(dir.path(), "true", "true"));
        let path = dir.path().join("physio_20240101_000000.dump");
        std::fs::write(&path, b"PGDMP").unwrap();
        let artifact = BackupArtifact {
            file_name: "physio_20240101_000000.dump".into(),
            path: path.clone(),
        };

        assert_eq!(service.take_artifact(&artifact).await.unwrap(), b"PGDMP");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn staged_upload_removed_after_restore() {
        let dir = tempfile::tempdir().unwrap();
        let ok = BackupService::new(settings(dir.path(), "true", "true"));
        let file = ok.restore_upload("../nightly/physio.dump", b"PGDMP").await.unwrap();
        assert_eq!(file, "physio.dump");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let failing = BackupService::new(settings(dir.path(), "true", "false"));
        assert!(failing.restore_upload("x.dump", b"PGDMP").await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_dump_leaves_no_partial_file() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        // writes the -f target then exits non-zero, like pg_dump losing its connection
        let script = bin.path().join("pg_dump");
        std::fs::write(&script, "#!/bin/sh\nprintf PGDMP > \"$3\"\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let service = BackupService::new(settings(work.path(), script.to_str().unwrap(), "true"));
        assert!(matches!(
            service.create_backup().await,
            Err(BackupError::Failed { .. })
        ));
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn upload_basename_strips_directories() {
        assert_eq!(upload_basename("/tmp/a/b.dump"), "b.dump");
        assert_eq!(upload_basename(""), "upload.dump");
    }

    #[tokio::test]
    async fn missing_binary_and_dsn() {
        let dir = tempfile::tempdir().unwrap();
        let service = BackupService::new(settings(dir.path(), "/nonexistent/pg_dump", "true"));
        assert!(matches!(
            service.create_backup().await,
            Err(BackupError::Spawn { .. })
        ));

        let mut no_dsn = settings(dir.path(), "true", "true");
        no_dsn.database_url = " ".into();
        assert!(matches!(
            BackupService::new(no_dsn).create_backup().await,
            Err(BackupError::MissingDatabaseUrl)
        ));
    }
}
