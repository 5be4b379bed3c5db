// Container runtime seam
//
// The orchestrator only talks to `ContainerRuntime`; production uses the
// bollard-backed `DockerRuntime`, tests use `FakeRuntime`.

mod docker;
#[cfg(any(test, feature = "testing"))]
mod fake;

pub use docker::DockerRuntime;
#[cfg(any(test, feature = "testing"))]
pub use fake::FakeRuntime;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Label attached to every container this system creates.
pub const SERVER_LABEL: &str = "minedock.server";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("No such container: {0}")]
    NotFound(String),

    #[error("No such image: {0}")]
    ImageNotFound(String),

    #[error("{0}")]
    Api(String),
}

/// Read-write bind of a host directory into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBind {
    pub host_path: String,
    pub container_path: String,
}

impl VolumeBind {
    /// `host:container:rw`, the Docker `Binds` syntax
    pub fn to_bind_string(&self) -> String {
        format!("{}:{}:rw", self.host_path, self.container_path)
    }
}

/// Everything needed to create one server container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: BTreeMap<String, String>,
    /// Container port (`25565/tcp`) to host port
    pub port_bindings: BTreeMap<String, u16>,
    pub binds: Vec<VolumeBind>,
    pub tty: bool,
    pub open_stdin: bool,
    /// Restart policy `always` when set, `no` otherwise
    pub restart_always: bool,
    pub labels: BTreeMap<String, String>,
}

/// Runtime view of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    /// Container port to the host ports bound to it, in runtime order
    pub port_bindings: HashMap<String, Vec<String>>,
    /// Host-side sources of the container's mounts
    pub mounts: Vec<String>,
}

impl ContainerInfo {
    /// First host port bound to `container_port`, if any.
    pub fn host_port(&self, container_port: &str) -> Option<u16> {
        self.port_bindings
            .get(container_port)?
            .first()?
            .parse()
            .ok()
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Makes `image` available locally, pulling it when missing.
    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError>;

    /// Creates (without starting) a container and returns its id.
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    async fn start(&self, id: &str) -> Result<(), RuntimeError>;

    /// All containers, stopped ones included.
    async fn list(&self) -> Result<Vec<ContainerInfo>, RuntimeError>;

    /// Resolves `name` the way the runtime does: full id, exact name, then
    /// id prefix. Callers that address by name must check `ContainerInfo::name`.
    async fn inspect(&self, name: &str) -> Result<ContainerInfo, RuntimeError>;

    async fn stop(&self, name: &str) -> Result<(), RuntimeError>;

    async fn restart(&self, name: &str) -> Result<(), RuntimeError>;

    async fn remove(&self, name: &str, volumes: bool, force: bool) -> Result<(), RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_takes_first_binding() {
        let mut info = ContainerInfo::default();
        info.port_bindings.insert(
            "25565/tcp".to_string(),
            vec!["25570".to_string(), "25571".to_string()],
        );
        assert_eq!(info.host_port("25565/tcp"), Some(25570));
        assert_eq!(info.host_port("25575/tcp"), None);
    }

    #[test]
    fn test_host_port_ignores_unparsable() {
        let mut info = ContainerInfo::default();
        info.port_bindings.insert("25565/tcp".to_string(), vec![String::new()]);
        assert_eq!(info.host_port("25565/tcp"), None);
    }

    #[test]
    fn test_bind_string() {
        let bind = VolumeBind {
            host_path: "/srv/ServerData/lobby".to_string(),
            container_path: "/data".to_string(),
        };
        assert_eq!(bind.to_bind_string(), "/srv/ServerData/lobby:/data:rw");
    }
}
