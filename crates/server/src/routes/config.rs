use axum::{extract::State, response::Json as ResponseJson, routing::get, Router};
use services::services::config::Config;
use utils::response::ApiResponse;

use crate::AppState;

/// The effective configuration, for the settings screen. Edits happen in the
/// config file itself and take effect on restart.
pub async fn get_config(State(state): State<AppState>) -> ResponseJson<ApiResponse<Config>> {
    let config = state.config().read().await.clone();
    ResponseJson(ApiResponse::success(config))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/config", get(get_config))
}
