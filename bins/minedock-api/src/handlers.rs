// HTTP route handlers for the minedock API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use minedock_common::{ServerConfig, ServerRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    pub message: String,
    pub container_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub servers: Vec<ServerRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(name: &str, action: &str) -> Json<Self> {
        Json(Self {
            message: format!("Server {} {} successfully", name, action),
        })
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /create-server/ - Create and start a server
pub async fn create_server(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ServerConfig>,
) -> Result<Json<CreateResponse>, ApiError> {
    let created = state.orchestrator.create(&config).await?;
    Ok(Json(CreateResponse {
        message: format!("Server {} created successfully", created.name),
        container_id: created.container_id,
    }))
}

/// GET /list-servers/ - All containers known to the runtime
pub async fn list_servers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListResponse>, ApiError> {
    let servers = state.orchestrator.list().await?;
    Ok(Json(ListResponse { servers }))
}

/// POST /stop-server/:name
pub async fn stop_server(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.stop(&name).await?;
    Ok(MessageResponse::new(&name, "stopped"))
}

/// POST /restart-server/:name
pub async fn restart_server(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.restart(&name).await?;
    Ok(MessageResponse::new(&name, "restarted"))
}

/// POST /delete-server/:name - Remove the container and its data directory
pub async fn delete_server(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.delete(&name).await?;
    Ok(MessageResponse::new(&name, "deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::Response;
    use minedock_common::runtime::FakeRuntime;
    use minedock_common::{Orchestrator, Settings};
    use serde_json::Value;
    use tempfile::TempDir;

    fn test_state() -> (Arc<AppState>, TempDir) {
        let root = TempDir::new().unwrap();
        let runtime = Arc::new(FakeRuntime::with_images(["itzg/minecraft-server:latest"]));
        let settings = Settings::new(root.path().join("ServerData"));
        let state = Arc::new(AppState {
            orchestrator: Orchestrator::new(runtime, settings),
        });
        (state, root)
    }

    fn request(json: Value) -> Json<ServerConfig> {
        Json(serde_json::from_value(json).unwrap())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(state: &Arc<AppState>, json: Value) -> Response {
        create_server(State(state.clone()), request(json))
            .await
            .into_response()
    }

    #[tokio::test]
    async fn test_create_list_delete_scenario() {
        let (state, _root) = test_state();

        let response = create(&state, serde_json::json!({ "server_name": "t1" })).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Server t1 created successfully");
        assert!(!body["container_id"].as_str().unwrap().is_empty());
        let data_dir = state.orchestrator.settings().data_dir("t1");
        assert!(data_dir.is_dir());

        let response = delete_server(State(state.clone()), Path("t1".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Server t1 deleted successfully" })
        );
        assert!(!data_dir.exists());

        let response = list_servers(State(state.clone())).await.into_response();
        let body = body_json(response).await;
        assert_eq!(body["servers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_missing_image_is_404_without_residue() {
        let (state, _root) = test_state();

        let response = create(
            &state,
            serde_json::json!({ "server_name": "t2", "version": "nonexistent-tag" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(
            body["detail"],
            "Minecraft server image itzg/minecraft-server:nonexistent-tag not found"
        );
        assert!(!state.orchestrator.settings().data_dir("t2").exists());
    }

    #[tokio::test]
    async fn test_list_reports_ports() {
        let (state, _root) = test_state();
        create(
            &state,
            serde_json::json!({ "server_name": "test_server_basic", "port": 25565 }),
        )
        .await;
        create(
            &state,
            serde_json::json!({
                "server_name": "test_server_mods",
                "port": 25567,
                "mods": ["mod1.jar", "mod2.jar"],
                "whitelist": "player1,player2"
            }),
        )
        .await;

        let response = list_servers(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let servers = body["servers"].as_array().unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0]["name"], "test_server_basic");
        assert_eq!(servers[0]["port"], 25565);
        assert_eq!(servers[0]["status"], "running");
        assert_eq!(servers[1]["name"], "test_server_mods");
        assert_eq!(servers[1]["port"], 25567);
    }

    #[tokio::test]
    async fn test_restart_and_stop() {
        let (state, _root) = test_state();
        create(&state, serde_json::json!({ "server_name": "test_server_basic" })).await;

        let response = restart_server(State(state.clone()), Path("test_server_basic".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "message": "Server test_server_basic restarted successfully" })
        );

        let response = stop_server(State(state.clone()), Path("test_server_basic".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Server test_server_basic stopped successfully"
        );
    }

    #[tokio::test]
    async fn test_unknown_server_is_404() {
        let (state, _root) = test_state();
        let name = || Path("nonexistent_server".to_string());

        for response in [
            restart_server(State(state.clone()), name()).await.into_response(),
            stop_server(State(state.clone()), name()).await.into_response(),
            delete_server(State(state.clone()), name()).await.into_response(),
        ] {
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(
                body_json(response).await,
                serde_json::json!({ "detail": "Server nonexistent_server not found" })
            );
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_is_409() {
        let (state, _root) = test_state();
        create(&state, serde_json::json!({ "server_name": "lobby" })).await;

        let response = create(&state, serde_json::json!({ "server_name": "lobby" })).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_name_is_400_on_create_only() {
        let (state, root) = test_state();
        let sibling = root.path().join("keep");
        std::fs::create_dir_all(&sibling).unwrap();

        let response = create(&state, serde_json::json!({ "server_name": "../keep" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = delete_server(State(state.clone()), Path("..".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "detail": "Server .. not found" })
        );
        assert!(sibling.is_dir());
        assert!(!root.path().join("ServerData").exists());
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
