use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
    Json, Router,
};
use db::models::project::{CreateProject, Project, ProjectFilter};
use db::types::ProjectStatus;
use serde::{Deserialize, Serialize};
use services::services::project::RemoteSync;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

pub async fn get_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&state.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::find_by_uuid(&state.db().pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

#[derive(Debug, Deserialize)]
pub struct GenerateCodeRequest {
    pub client_name: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateCodeResponse {
    pub code: String,
}

pub async fn generate_code(
    State(state): State<AppState>,
    Json(payload): Json<GenerateCodeRequest>,
) -> Result<ResponseJson<ApiResponse<GenerateCodeResponse>>, ApiError> {
    if payload.client_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "client_name must not be empty".to_string(),
        ));
    }

    let code = state
        .creation()
        .generate_code(&state.db().pool, &payload.client_name)
        .await?;
    Ok(ResponseJson(ApiResponse::success(GenerateCodeResponse {
        code,
    })))
}

#[derive(Debug, Serialize)]
pub struct CreateProjectResponse {
    pub project: Project,
    pub local_path: PathBuf,
    pub remote_sync: RemoteSync,
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<CreateProjectResponse>>, ApiError> {
    tracing::debug!("Creating project '{}' with code {}", payload.name, payload.code);

    let outcome = state
        .creation()
        .create_project(&state.db().pool, payload)
        .await?;

    let warning = outcome.remote_sync.warning().map(|w| w.to_string());
    let response = CreateProjectResponse {
        project: outcome.project,
        local_path: outcome.local_path,
        remote_sync: outcome.remote_sync,
    };

    // A failed Drive mirror is a warning, never a failed creation.
    let envelope = match warning {
        Some(warning) => ApiResponse::success_with_message(response, warning),
        None => ApiResponse::success(response),
    };
    Ok(ResponseJson(envelope))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ProjectStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = Project::update_status(&state.db().pool, id, payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn sync_drive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<RemoteSync>>, ApiError> {
    let project = Project::find_by_uuid(&state.db().pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let remote_sync = state
        .creation()
        .sync_project(&state.db().pool, &project)
        .await?;

    let envelope = match remote_sync.warning().map(|w| w.to_string()) {
        Some(warning) => ApiResponse::success_with_message(remote_sync, warning),
        None => ApiResponse::success(remote_sync),
    };
    Ok(ResponseJson(envelope))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(get_projects).post(create_project))
        .route("/projects/generate-code", post(generate_code))
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/status", put(update_status))
        .route("/projects/{id}/drive-sync", post(sync_drive))
}
