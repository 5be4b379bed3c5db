pub mod config;
pub mod error;
pub mod orchestrator;
pub mod runtime;
pub mod translate;
pub mod types;

pub use config::Settings;
pub use error::ServerError;
pub use orchestrator::{CreatedServer, Orchestrator};
pub use types::{ServerConfig, ServerRecord};
