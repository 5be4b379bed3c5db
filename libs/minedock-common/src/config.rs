// Process-wide settings, read from the environment

use std::path::PathBuf;

pub const DEFAULT_IMAGE: &str = "itzg/minecraft-server";
pub const DEFAULT_DATA_DIR: &str = "ServerData";

/// Port the server listens on inside the container.
pub const GAME_PORT: u16 = 25565;

/// Mount point of the data directory inside the container.
pub const CONTAINER_DATA_PATH: &str = "/data";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Parent of all per-server data directories
    pub data_root: PathBuf,
    /// Image repository, tagged with the requested version
    pub image: String,
    /// Host port used when a request does not name one
    pub default_host_port: u16,
}

impl Settings {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            image: DEFAULT_IMAGE.to_string(),
            default_host_port: GAME_PORT,
        }
    }

    /// `SERVER_DATA_DIR`, `SERVER_IMAGE` and `DEFAULT_HOST_PORT`, each with a
    /// fallback. A relative data directory is resolved against the working
    /// directory.
    pub fn from_env() -> Self {
        let data_root = std::env::var("SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let data_root = if data_root.is_relative() {
            std::env::current_dir()
                .map(|cwd| cwd.join(&data_root))
                .unwrap_or(data_root)
        } else {
            data_root
        };

        let image = std::env::var("SERVER_IMAGE")
            .unwrap_or_else(|_| DEFAULT_IMAGE.to_string());

        let default_host_port = std::env::var("DEFAULT_HOST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(GAME_PORT);

        Self {
            data_root,
            image,
            default_host_port,
        }
    }

    pub fn data_dir(&self, server_name: &str) -> PathBuf {
        self.data_root.join(server_name)
    }
}
