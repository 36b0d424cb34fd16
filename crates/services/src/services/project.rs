use std::path::{Path, PathBuf};

use db::models::project::{CreateProject, Project, ProjectError, DEFAULT_CODE_SEQUENCE};
use db::{DbErr, DbPool};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::codegen::{is_valid_code, CodeGenerator, CodegenError};
use super::drive::DriveService;
use super::vault::{VaultError, VaultService};

#[derive(Debug, Error)]
pub enum ProjectCreationError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error("Project code '{0}' does not match the NNNN.AAA.slug format")]
    InvalidCode(String),
    #[error("End date must not precede the start date")]
    InvalidDates,
    #[error("Name and client must not be empty")]
    MissingFields,
}

pub type Result<T> = std::result::Result<T, ProjectCreationError>;

/// Outcome of the best-effort Drive mirroring step. Deliberately not a
/// boolean: "skipped" and "failed" mean different things to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteSync {
    Synced { url: String },
    Skipped { reason: String },
    Failed { warning: String },
}

impl RemoteSync {
    pub fn warning(&self) -> Option<&str> {
        match self {
            RemoteSync::Failed { warning } => Some(warning),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectCreationOutcome {
    pub project: Project,
    pub local_path: PathBuf,
    pub remote_sync: RemoteSync,
}

/// Drives one project-creation action end to end: store record, local
/// folder skeleton, best-effort Drive mirror. Each step blocks until it
/// finishes; only the Drive step is allowed to fail without aborting.
pub struct ProjectCreationService {
    codegen: CodeGenerator,
    vault: VaultService,
    drive: Option<DriveService>,
}

impl ProjectCreationService {
    pub fn new(codegen: CodeGenerator, vault: VaultService, drive: Option<DriveService>) -> Self {
        Self {
            codegen,
            vault,
            drive,
        }
    }

    /// Ask the generation service for the next code, seeded with the highest
    /// sequence already stored.
    pub async fn generate_code(&self, db: &DbPool, client_name: &str) -> Result<String> {
        let last_sequence = Project::last_code_sequence(db)
            .await?
            .unwrap_or(DEFAULT_CODE_SEQUENCE);
        Ok(self.codegen.generate(client_name, last_sequence).await?)
    }

    pub async fn create_project(
        &self,
        db: &DbPool,
        payload: CreateProject,
    ) -> Result<ProjectCreationOutcome> {
        if payload.name.trim().is_empty() || payload.client.trim().is_empty() {
            return Err(ProjectCreationError::MissingFields);
        }
        if payload.end_date < payload.start_date {
            return Err(ProjectCreationError::InvalidDates);
        }
        if !is_valid_code(&payload.code) {
            return Err(ProjectCreationError::InvalidCode(payload.code));
        }

        let mut project = Project::create(db, &payload, Uuid::new_v4()).await?;
        tracing::info!(code = %project.code, id = %project.id, "created project record");

        let local_path = self
            .vault
            .provision(&project.code, &project.name, &project.client)?;

        let remote_sync = self.sync_to_drive(db, &project, &local_path).await;
        if let RemoteSync::Synced { url } = &remote_sync {
            project.drive_folder_url = Some(url.clone());
        }

        Ok(ProjectCreationOutcome {
            project,
            local_path,
            remote_sync,
        })
    }

    /// Re-run the Drive mirror for an existing project; the local skeleton
    /// is re-provisioned first (idempotent) so there is something to upload.
    pub async fn sync_project(&self, db: &DbPool, project: &Project) -> Result<RemoteSync> {
        let local_path = self
            .vault
            .provision(&project.code, &project.name, &project.client)?;
        Ok(self.sync_to_drive(db, project, &local_path).await)
    }

    async fn sync_to_drive(&self, db: &DbPool, project: &Project, local_path: &Path) -> RemoteSync {
        let Some(drive) = &self.drive else {
            return RemoteSync::Skipped {
                reason: "Google Drive is not configured".to_string(),
            };
        };

        match drive
            .mirror_project(&project.code, &project.client, project.group, local_path)
            .await
        {
            Ok(folder) => {
                let url = folder
                    .url
                    .unwrap_or_else(|| format!("https://drive.google.com/drive/folders/{}", folder.id));
                if let Err(err) = Project::set_drive_folder_url(db, project.id, &url).await {
                    tracing::warn!(code = %project.code, error = %err, "failed to store Drive folder link");
                    return RemoteSync::Failed {
                        warning: format!("Folder was mirrored but the link was not stored: {err}"),
                    };
                }
                RemoteSync::Synced { url }
            }
            Err(err) => {
                tracing::warn!(
                    code = %project.code,
                    error = %err,
                    "Drive sync failed; project creation continues without a remote folder"
                );
                RemoteSync::Failed {
                    warning: format!("Google Drive sync failed: {err}"),
                }
            }
        }
    }
}
