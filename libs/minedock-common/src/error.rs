use thiserror::Error;

use crate::runtime::RuntimeError;

/// Failure of a lifecycle operation.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Server {0} not found")]
    NotFound(String),

    #[error("Minecraft server image {0} not found")]
    ImageNotFound(String),

    #[error("Server {0} already exists")]
    AlreadyExists(String),

    #[error("Invalid server name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("{0}")]
    Runtime(String),

    #[error("{0}")]
    Unexpected(String),
}

impl ServerError {
    /// Maps a runtime failure for an operation addressed by server name.
    pub fn from_runtime(name: &str, err: RuntimeError) -> Self {
        match err {
            RuntimeError::NotFound(_) => ServerError::NotFound(name.to_string()),
            RuntimeError::ImageNotFound(image) => ServerError::ImageNotFound(image),
            RuntimeError::Api(message) => ServerError::Runtime(message),
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Unexpected(err.to_string())
    }
}
