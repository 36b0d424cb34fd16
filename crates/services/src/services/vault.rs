use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fixed skeleton every project gets, locally and in Drive.
pub const PROJECT_SUBFOLDERS: [&str; 5] = [
    "01-inbox",
    "02-research",
    "03-meetings",
    "04-project-docs",
    "05-deliverables",
];

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault root {0} is not usable: {1}")]
    RootUnavailable(PathBuf, #[source] io::Error),
    #[error("Failed to create {0}: {1}")]
    CreateFailed(PathBuf, #[source] io::Error),
    #[error("Failed to write {0}: {1}")]
    WriteFailed(PathBuf, #[source] io::Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;

/// Creates the per-project folder skeleton under the configured vault root.
#[derive(Clone)]
pub struct VaultService {
    root: PathBuf,
}

impl VaultService {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, code: &str) -> PathBuf {
        self.root.join(code)
    }

    /// Idempotent: existing folders are left untouched, missing ones are
    /// created. Returns the project root directory.
    pub fn provision(&self, code: &str, name: &str, client: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)
            .map_err(|err| VaultError::RootUnavailable(self.root.clone(), err))?;

        let project_dir = self.project_dir(code);
        for subfolder in PROJECT_SUBFOLDERS {
            let path = project_dir.join(subfolder);
            std::fs::create_dir_all(&path).map_err(|err| VaultError::CreateFailed(path, err))?;
        }

        let readme = project_dir.join("README.md");
        if !readme.exists() {
            std::fs::write(&readme, Self::readme_contents(code, name, client))
                .map_err(|err| VaultError::WriteFailed(readme, err))?;
        }

        tracing::info!(code, path = %project_dir.display(), "provisioned project folders");
        Ok(project_dir)
    }

    fn readme_contents(code: &str, name: &str, client: &str) -> String {
        format!(
            "# {code}: {name}\n\n\
             **Client:** {client}\n\n\
             ## Structure\n\n\
             - `01-inbox/` — incoming documents and materials\n\
             - `02-research/` — research and analysis\n\
             - `03-meetings/` — meeting notes\n\
             - `04-project-docs/` — project documents\n\
             - `05-deliverables/` — final deliverables\n"
        )
    }
}
