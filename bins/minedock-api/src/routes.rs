use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/create-server/", post(handlers::create_server))
        .route("/list-servers/", get(handlers::list_servers))
        .route("/stop-server/:name", post(handlers::stop_server))
        .route("/restart-server/:name", post(handlers::restart_server))
        .route("/delete-server/:name", post(handlers::delete_server))
}
