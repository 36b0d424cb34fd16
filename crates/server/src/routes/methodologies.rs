use axum::{extract::State, response::Json as ResponseJson, routing::get, Router};
use db::models::methodology::Methodology;
use utils::response::ApiResponse;

use crate::{error::ApiError, AppState};

pub async fn get_methodologies(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Methodology>>>, ApiError> {
    let methodologies = Methodology::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(methodologies)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/methodologies", get(get_methodologies))
}
