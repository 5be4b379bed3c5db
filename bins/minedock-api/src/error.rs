// Maps lifecycle failures to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use minedock_common::ServerError;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError(pub ServerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ServerError::NotFound(_) | ServerError::ImageNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::AlreadyExists(_) => StatusCode::CONFLICT,
            ServerError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            ServerError::Runtime(_) | ServerError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.0.to_string();

        if status.is_server_error() {
            error!(status = %status, detail = %detail, "Request failed");
        } else {
            warn!(status = %status, detail = %detail, "Request rejected");
        }

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
