//! Configuration Translator
//!
//! Turns a [`ServerConfig`] into everything the runtime needs to start the
//! server: environment, image reference, port binding, name and data path.
//! Pure; touches neither the filesystem nor the runtime.

use crate::config::{Settings, CONTAINER_DATA_PATH, GAME_PORT};
use crate::error::ServerError;
use crate::runtime::{ContainerSpec, VolumeBind, SERVER_LABEL};
use crate::types::{ServerConfig, SERVER_FIELDS};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_TAG: &str = "latest";
const MAX_NAME_LEN: usize = 128;

pub type EnvironmentMap = BTreeMap<String, String>;

/// Container port of the game, in Docker's `port/proto` form.
pub fn game_port_key() -> String {
    format!("{}/tcp", GAME_PORT)
}

/// Checks that `name` is usable both as a Docker container name and as a
/// single path segment.
pub fn validate_name(name: &str) -> Result<(), ServerError> {
    let invalid = |reason: &'static str| -> Result<(), ServerError> {
        Err(ServerError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return invalid("name must not be empty");
    };
    if name.len() > MAX_NAME_LEN {
        return invalid("name must be at most 128 characters");
    }
    if !first.is_ascii_alphanumeric() {
        return invalid("name must start with a letter or digit");
    }
    if name.len() < 2 {
        return invalid("name must be at least 2 characters");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return invalid("only letters, digits, '_', '.' and '-' are allowed");
    }
    Ok(())
}

/// Environment for the server image: one entry per present field of the
/// table. `server_name` and `port` are not part of the table.
pub fn environment(config: &ServerConfig) -> EnvironmentMap {
    SERVER_FIELDS
        .iter()
        .filter_map(|field| {
            field
                .value(config)
                .map(|value| (field.env_key.to_string(), value))
        })
        .collect()
}

/// `<repository>:<version>`, `latest` when no version is requested.
pub fn image_reference(repository: &str, version: Option<&str>) -> String {
    let tag = version
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_TAG);
    format!("{}:{}", repository, tag)
}

/// Translated form of one create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub name: String,
    pub image: String,
    pub env: EnvironmentMap,
    pub host_port: u16,
    pub data_dir: PathBuf,
}

impl LaunchPlan {
    pub fn from_config(config: &ServerConfig, settings: &Settings) -> Result<Self, ServerError> {
        validate_name(&config.server_name)?;

        // One version drives both the tag and VERSION; blank means latest.
        let version = config
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let mut env = environment(config);
        match version {
            Some(version) => env.insert("VERSION".to_string(), version.to_string()),
            None => env.remove("VERSION"),
        };

        Ok(Self {
            name: config.server_name.clone(),
            image: image_reference(&settings.image, version),
            env,
            host_port: config.port.unwrap_or(settings.default_host_port),
            data_dir: settings.data_dir(&config.server_name),
        })
    }

    /// Container definition: game port published, data directory bound
    /// read-write, tty and stdin attached, always restarted.
    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            name: self.name.clone(),
            image: self.image.clone(),
            env: self.env.clone(),
            port_bindings: BTreeMap::from([(game_port_key(), self.host_port)]),
            binds: vec![VolumeBind {
                host_path: self.data_dir.to_string_lossy().into_owned(),
                container_path: CONTAINER_DATA_PATH.to_string(),
            }],
            tty: true,
            open_stdin: true,
            restart_always: true,
            labels: BTreeMap::from([(SERVER_LABEL.to_string(), self.name.clone())]),
        }
    }
}
