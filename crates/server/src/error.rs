use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use db::{models::project::ProjectError, DbErr};
use services::services::{
    codegen::CodegenError, config::ConfigError, drive::DriveError, project::ProjectCreationError,
    vault::VaultError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Vault(#[from] VaultError),
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ProjectCreationError> for ApiError {
    fn from(err: ProjectCreationError) -> Self {
        match err {
            ProjectCreationError::Database(e) => ApiError::Database(e),
            ProjectCreationError::Project(e) => ApiError::Project(e),
            ProjectCreationError::Codegen(e) => ApiError::Codegen(e),
            ProjectCreationError::Vault(e) => ApiError::Vault(e),
            ProjectCreationError::InvalidCode(code) => ApiError::BadRequest(format!(
                "Project code '{code}' does not match the NNNN.AAA.slug format"
            )),
            ProjectCreationError::InvalidDates => {
                ApiError::BadRequest("End date must not precede the start date".to_string())
            }
            ProjectCreationError::MissingFields => {
                ApiError::BadRequest("Name and client must not be empty".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Project(err) => match err {
                ProjectError::NotFound => (StatusCode::NOT_FOUND, "ProjectError"),
                ProjectError::DuplicateCode(_) => (StatusCode::CONFLICT, "ProjectError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ProjectError"),
            },
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            // The generation service is upstream of us: malformed or failed
            // replies surface as a bad gateway, the user simply retries.
            ApiError::Codegen(_) => (StatusCode::BAD_GATEWAY, "CodegenError"),
            ApiError::Vault(_) => (StatusCode::INTERNAL_SERVER_ERROR, "VaultError"),
            ApiError::Drive(_) => (StatusCode::BAD_GATEWAY, "DriveError"),
            ApiError::Config(err) => match err {
                ConfigError::ValidationError(_) => (StatusCode::BAD_REQUEST, "ConfigError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigError"),
            },
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IoError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        let error_message = match &self {
            ApiError::Project(ProjectError::DuplicateCode(code)) => format!(
                "A project with code '{code}' already exists. Generate a new code and retry."
            ),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
