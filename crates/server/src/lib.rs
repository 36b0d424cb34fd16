use std::sync::Arc;

use db::DBService;
use services::services::{
    codegen::CodeGenerator,
    config::{load_config_from_file, save_config_to_file, Config},
    drive::DriveService,
    project::ProjectCreationService,
    vault::VaultService,
};
use tokio::sync::RwLock;
use utils::assets::config_path;

pub mod error;
pub mod http;
pub mod routes;

#[cfg(test)]
mod test_support;

#[derive(Clone)]
pub struct AppState {
    config: Arc<RwLock<Config>>,
    db: DBService,
    creation: Arc<ProjectCreationService>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = load_config_from_file(&config_path()).await;
        // Write the merged config back so a fresh install gets a config file
        // with the documented defaults filled in.
        save_config_to_file(&config, &config_path()).await?;
        Self::with_config(config).await
    }

    pub async fn with_config(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let api_key = config.anthropic.resolved_api_key().unwrap_or_default();

        let db = DBService::new().await?;

        let codegen = CodeGenerator::new(api_key, config.anthropic.model.clone());
        let vault = VaultService::new(config.vault_root.clone());
        let drive = if config.google_drive.is_configured() {
            Some(DriveService::new(&config.google_drive))
        } else {
            tracing::info!("Google Drive credentials not found; remote folder sync disabled");
            None
        };
        let creation = Arc::new(ProjectCreationService::new(codegen, vault, drive));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            db,
            creation,
        })
    }

    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn creation(&self) -> &ProjectCreationService {
        &self.creation
    }
}
