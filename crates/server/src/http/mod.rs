use axum::{routing::get, Router};

use crate::{routes, AppState};

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::projects::router())
        .merge(routes::methodologies::router())
        .merge(routes::config::router());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{test_support::TestEnvGuard, AppState};
    use services::services::config::Config;

    async fn setup_state() -> (TestEnvGuard, AppState) {
        let temp_root = std::env::temp_dir().join(format!("pp-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&temp_root).unwrap();

        let db_path = temp_root.join("db.sqlite");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let env_guard = TestEnvGuard::new(&temp_root, db_url);

        let state = AppState::with_config(Config::default()).await.unwrap();
        (env_guard, state)
    }

    fn create_body(code: &str, name: &str, client: &str) -> String {
        serde_json::json!({
            "code": code,
            "name": name,
            "client": client,
            "group": "left",
            "start_date": "2025-09-01",
            "end_date": "2025-12-01",
        })
        .to_string()
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_project_without_drive_reports_skipped_sync() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let response = app
            .oneshot(post_json(
                "/api/projects",
                create_body("2168.MED.mediq", "МедIQ", "МедIQ Clinic"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["project"]["code"], "2168.MED.mediq");
        assert_eq!(json["data"]["remote_sync"]["status"], "skipped");
        assert!(json["data"]["project"]["drive_folder_url"].is_null());

        let local_path = json["data"]["local_path"].as_str().unwrap();
        assert!(std::path::Path::new(local_path).join("01-inbox").is_dir());
    }

    #[tokio::test]
    async fn duplicate_code_returns_conflict() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let first = app
            .clone()
            .oneshot(post_json(
                "/api/projects",
                create_body("2169.ACM.acme", "Acme rollout", "Acme Corp"),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(post_json(
                "/api/projects",
                create_body("2169.ACM.acme", "Other", "Other Co"),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let json = body_json(second).await;
        assert_eq!(json["success"], false);
        let message = json["message"].as_str().unwrap_or_default();
        assert!(message.contains("already exists"));
    }

    #[tokio::test]
    async fn malformed_code_returns_bad_request() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let response = app
            .oneshot(post_json(
                "/api/projects",
                create_body("not-a-code", "Acme", "Acme Corp"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_text() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        for (code, name, client) in [
            ("2170.ACM.acme", "Acme rollout", "Acme Corp"),
            ("2171.GLB.globex", "Globex audit", "Globex"),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/api/projects", create_body(code, name, client)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/projects?status=draft&q=acme")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let projects = json["data"].as_array().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["code"], "2170.ACM.acme");
    }

    #[tokio::test]
    async fn status_update_is_visible_in_the_active_filter() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let created = app
            .clone()
            .oneshot(post_json(
                "/api/projects",
                create_body("2172.ACM.acme-crm", "CRM rollout", "Acme Corp"),
            ))
            .await
            .unwrap();
        let created_json = body_json(created).await;
        let id = created_json["data"]["project"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/projects/{id}/status"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"active"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let listed = app
            .oneshot(
                Request::builder()
                    .uri("/api/projects?status=active")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(listed).await;
        let projects = json["data"].as_array().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["status"], "active");
    }

    #[tokio::test]
    async fn unknown_project_returns_not_found() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/projects/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn config_endpoint_reports_effective_settings() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["data"]["vault_root"].is_string());
        assert!(json["data"]["anthropic"]["model"].is_string());
    }

    #[tokio::test]
    async fn methodology_catalog_is_seeded_once() {
        let (_guard, state) = setup_state().await;
        let app = super::router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/methodologies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 36);
    }
}
