//! Lifecycle Orchestrator
//!
//! **Responsibility:**
//! Drive create/list/stop/restart/delete against the container runtime and
//! keep the per-server data directory in step with the container.
//!
//! **State:**
//! None of its own. Every call re-queries the runtime, which stays the
//! authority on what exists. Nothing here serialises concurrent calls for the
//! same name.
//!
//! **Rollback:**
//! - create: a container that was created but not started is force-removed,
//!   and a data directory created by the failed call is removed
//! - delete: the data directory goes only after the container is gone
//!
//! Rollback failures are logged and never replace the original error.

use crate::config::Settings;
use crate::error::ServerError;
use crate::runtime::{ContainerInfo, ContainerRuntime, RuntimeError};
use crate::translate::{game_port_key, validate_name, LaunchPlan};
use crate::types::{ServerConfig, ServerRecord};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedServer {
    pub name: String,
    pub container_id: String,
}

#[derive(Clone)]
pub struct Orchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    settings: Settings,
}

impl Orchestrator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, settings: Settings) -> Self {
        Self { runtime, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create the data directory and start a container bound to it.
    #[instrument(skip(self, config), fields(server = %config.server_name))]
    pub async fn create(&self, config: &ServerConfig) -> Result<CreatedServer, ServerError> {
        let plan = LaunchPlan::from_config(config, &self.settings)?;

        // Fail before touching the filesystem, so an existing server's
        // directory is never rolled back.
        if self.find(&plan.name).await?.is_some() {
            return Err(ServerError::AlreadyExists(plan.name));
        }

        fs::create_dir_all(&self.settings.data_root).await?;

        let dir_existed = fs::try_exists(&plan.data_dir).await?;
        fs::create_dir_all(&plan.data_dir).await?;

        match self.launch(&plan).await {
            Ok(container_id) => {
                info!(
                    container_id = %container_id,
                    image = %plan.image,
                    host_port = plan.host_port,
                    env_vars = plan.env.len(),
                    "Server created"
                );
                Ok(CreatedServer {
                    name: plan.name,
                    container_id,
                })
            }
            Err(e) => {
                warn!(error = %e, "Create failed, rolling back");
                if !dir_existed {
                    remove_data_dir(&plan.data_dir).await;
                }
                Err(e)
            }
        }
    }

    async fn launch(&self, plan: &LaunchPlan) -> Result<String, ServerError> {
        self.runtime
            .ensure_image(&plan.image)
            .await
            .map_err(|e| ServerError::from_runtime(&plan.name, e))?;

        let container_id = self
            .runtime
            .create(&plan.container_spec())
            .await
            .map_err(|e| ServerError::from_runtime(&plan.name, e))?;

        if let Err(e) = self.runtime.start(&container_id).await {
            if let Err(cleanup) = self.runtime.remove(&container_id, true, true).await {
                warn!(
                    container_id = %container_id,
                    error = %cleanup,
                    "Failed to remove container that did not start"
                );
            }
            return Err(ServerError::from_runtime(&plan.name, e));
        }

        Ok(container_id)
    }

    /// Every container the runtime knows about, stopped ones included, in the
    /// runtime's order.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ServerRecord>, ServerError> {
        let game_port = game_port_key();
        let containers = self
            .runtime
            .list()
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| ServerRecord {
                port: c.host_port(&game_port),
                status: if c.status.is_empty() {
                    "unknown".to_string()
                } else {
                    c.status
                },
                name: c.name,
                id: c.id,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn stop(&self, name: &str) -> Result<(), ServerError> {
        let id = self.lookup(name).await?;
        self.runtime
            .stop(&id)
            .await
            .map_err(|e| ServerError::from_runtime(name, e))?;
        info!("Server stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn restart(&self, name: &str) -> Result<(), ServerError> {
        let id = self.lookup(name).await?;
        self.runtime
            .restart(&id)
            .await
            .map_err(|e| ServerError::from_runtime(name, e))?;
        info!("Server restarted");
        Ok(())
    }

    /// Stop and remove the container with its volumes, then its data
    /// directory.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), ServerError> {
        let id = self.lookup(name).await?;
        self.runtime
            .stop(&id)
            .await
            .map_err(|e| ServerError::from_runtime(name, e))?;
        self.runtime
            .remove(&id, true, false)
            .await
            .map_err(|e| ServerError::from_runtime(name, e))?;

        let data_dir = self.settings.data_dir(name);
        if fs::try_exists(&data_dir).await? {
            fs::remove_dir_all(&data_dir).await?;
        }

        info!("Server deleted");
        Ok(())
    }

    /// The container named exactly `name`. The runtime also resolves ids
    /// and id prefixes, so a hit under another name is treated as absent.
    async fn find(&self, name: &str) -> Result<Option<ContainerInfo>, ServerError> {
        match self.runtime.inspect(name).await {
            Ok(info) if info.name == name => Ok(Some(info)),
            Ok(info) => {
                debug!(container = %info.name, "Reference resolved to another container");
                Ok(None)
            }
            Err(RuntimeError::NotFound(_)) => Ok(None),
            Err(e) => Err(ServerError::from_runtime(name, e)),
        }
    }

    /// Id of the existing server `name`. A name the runtime could never have
    /// accepted is simply not found.
    async fn lookup(&self, name: &str) -> Result<String, ServerError> {
        if validate_name(name).is_err() {
            return Err(ServerError::NotFound(name.to_string()));
        }
        self.find(name)
            .await?
            .map(|info| info.id)
            .ok_or_else(|| ServerError::NotFound(name.to_string()))
    }
}

async fn remove_data_dir(path: &Path) {
    match fs::remove_dir_all(path).await {
        Ok(()) => info!(path = %path.display(), "Removed data directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove data directory"),
    }
}
