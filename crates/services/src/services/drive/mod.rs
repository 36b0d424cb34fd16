use std::path::{Path, PathBuf};
use std::time::Duration;

use db::types::ProjectGroup;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::config::GoogleDriveConfig;
use super::vault::PROJECT_SUBFOLDERS;

pub mod auth;

pub use auth::{AuthError, DriveAuthenticator};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
/// Fixed Drive root all engagements live under.
const ENGAGEMENT_ROOT: &str = "04-Engagement";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("Drive API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to read local file {0}: {1}")]
    LocalFile(PathBuf, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DriveError>;

#[derive(Debug, Clone)]
pub struct DriveFolder {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileResource {
    id: String,
    #[serde(rename = "webViewLink")]
    web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub fn group_folder_name(group: ProjectGroup) -> &'static str {
    match group {
        ProjectGroup::Left => "Левая группа",
        ProjectGroup::Right => "Правая группа",
    }
}

/// Mirrors project folder skeletons into Google Drive and uploads the local
/// files. Top-level folders are reused when they already exist.
pub struct DriveService {
    http: reqwest::Client,
    auth: DriveAuthenticator,
    shared_drive_id: Option<String>,
}

impl DriveService {
    pub fn new(config: &GoogleDriveConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            auth: DriveAuthenticator::new(
                config.credentials_path.clone(),
                config.token_path.clone(),
            ),
            shared_drive_id: config.shared_drive_id.clone(),
        }
    }

    /// Builds `04-Engagement/<group>/<CODE> <client>/{five subfolders}` and
    /// uploads the contents of `local_root`. Returns the project folder.
    pub async fn mirror_project(
        &self,
        code: &str,
        client: &str,
        group: ProjectGroup,
        local_root: &Path,
    ) -> Result<DriveFolder> {
        let token = self.auth.access_token().await?;

        let root = self.get_or_create_folder(&token, ENGAGEMENT_ROOT, None).await?;
        let group_folder = self
            .get_or_create_folder(&token, group_folder_name(group), Some(&root.id))
            .await?;

        let project_name = format!("{} {}", code.to_uppercase(), client);
        let project = self
            .get_or_create_folder(&token, &project_name, Some(&group_folder.id))
            .await?;

        self.upload_dir_files(&token, local_root, &project.id).await?;

        for subfolder in PROJECT_SUBFOLDERS {
            let remote = self
                .get_or_create_folder(&token, subfolder, Some(&project.id))
                .await?;
            self.upload_dir_files(&token, &local_root.join(subfolder), &remote.id)
                .await?;
        }

        tracing::info!(code, folder_id = %project.id, "mirrored project to Google Drive");
        Ok(project)
    }

    async fn get_or_create_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder> {
        if let Some(existing) = self.find_folder(token, name, parent_id).await? {
            return Ok(existing);
        }
        self.create_folder(token, name, parent_id).await
    }

    async fn find_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<DriveFolder>> {
        let parent_id = parent_id.or(self.shared_drive_id.as_deref());

        let mut query = format!(
            "name='{}' and mimeType='{FOLDER_MIME}' and trashed=false",
            name.replace('\'', "\\'")
        );
        if let Some(parent) = parent_id {
            query.push_str(&format!(" and '{parent}' in parents"));
        }

        let mut request = self
            .http
            .get(FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name, webViewLink)"),
            ]);
        if let Some(drive_id) = self.shared_drive_id.as_deref() {
            request = request.query(&[
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
                ("corpora", "drive"),
                ("driveId", drive_id),
            ]);
        }

        let list: FileList = Self::parse_response(request.send().await?).await?;
        Ok(list.files.into_iter().next().map(|file| DriveFolder {
            id: file.id,
            url: file.web_view_link,
        }))
    }

    async fn create_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder> {
        let parent_id = parent_id.or(self.shared_drive_id.as_deref());

        let mut metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME,
        });
        if let Some(parent) = parent_id {
            metadata["parents"] = json!([parent]);
        }

        let mut request = self
            .http
            .post(FILES_URL)
            .bearer_auth(token)
            .query(&[("fields", "id, webViewLink")])
            .json(&metadata);
        if self.shared_drive_id.is_some() {
            request = request.query(&[("supportsAllDrives", "true")]);
        }

        let file: FileResource = Self::parse_response(request.send().await?).await?;
        Ok(DriveFolder {
            id: file.id,
            url: file.web_view_link,
        })
    }

    /// Uploads every regular file directly inside `dir` (no recursion; the
    /// skeleton is only one level deep). A missing directory is fine.
    async fn upload_dir_files(&self, token: &str, dir: &Path, parent_id: &str) -> Result<()> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(DriveError::LocalFile(dir.to_path_buf(), err)),
        };

        for entry in entries {
            let entry = entry.map_err(|err| DriveError::LocalFile(dir.to_path_buf(), err))?;
            let path = entry.path();
            if path.is_file() {
                self.upload_file(token, &path, parent_id).await?;
            }
        }
        Ok(())
    }

    async fn upload_file(&self, token: &str, path: &Path, parent_id: &str) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let bytes =
            std::fs::read(path).map_err(|err| DriveError::LocalFile(path.to_path_buf(), err))?;

        let metadata = json!({
            "name": file_name,
            "parents": [parent_id],
        });

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .expect("valid mime"),
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name.clone())
                    .mime_str(mime_for(path))
                    .expect("valid mime"),
            );

        let mut request = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .multipart(form);
        if self.shared_drive_id.is_some() {
            request = request.query(&[("supportsAllDrives", "true")]);
        }

        let file: FileResource = Self::parse_response(request.send().await?).await?;
        tracing::debug!(name = %file_name, id = %file.id, "uploaded file to Drive");
        Ok(file.id)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|parsed| parsed.error.message)
                .unwrap_or(text);
            return Err(DriveError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("md") => "text/markdown",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}
