// Docker container runtime using Bollard

use super::{ContainerInfo, ContainerRuntime, ContainerSpec, RuntimeError};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerInspectResponse, HostConfig, PortBinding, RestartPolicyNameEnum};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Status code Docker answers with when the container is already in the
/// requested state.
const NOT_MODIFIED: u16 = 304;
const NOT_FOUND: u16 = 404;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects using `DOCKER_HOST` or the platform's local socket.
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(api_error)?;
        Ok(Self { docker })
    }

    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(progress) => {
                    if let Some(status) = progress.status {
                        debug!(image = %image, status = %status, "Pulling image");
                    }
                }
                Err(e) => {
                    warn!(image = %image, error = %e, "Image pull failed");
                    return Err(image_error(image, e));
                }
            }
        }

        info!(image = %image, "Image pulled");
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => {
                debug!(image = %image, "Image cache hit");
                Ok(())
            }
            Err(Error::DockerResponseServerError { status_code: NOT_FOUND, .. }) => {
                info!(image = %image, "Image cache miss, pulling");
                self.pull_image(image).await
            }
            Err(e) => Err(api_error(e)),
        }
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();

        let mut port_bindings = HashMap::new();
        let mut exposed_ports = HashMap::new();
        for (container_port, host_port) in &spec.port_bindings {
            port_bindings.insert(
                container_port.clone(),
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(host_port.to_string()),
                }]),
            );
            exposed_ports.insert(container_port.clone(), HashMap::new());
        }

        let restart_policy = if spec.restart_always {
            RestartPolicyNameEnum::ALWAYS
        } else {
            RestartPolicyNameEnum::NO
        };

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            binds: Some(spec.binds.iter().map(|b| b.to_bind_string()).collect()),
            restart_policy: Some(bollard::models::RestartPolicy {
                name: Some(restart_policy),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(env),
            exposed_ports: Some(exposed_ports),
            labels: Some(
                spec.labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            tty: Some(spec.tty),
            open_stdin: Some(spec.open_stdin),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = Some(CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        });

        let response = self
            .docker
            .create_container(options, config)
            .await
            .map_err(|e| match e {
                Error::DockerResponseServerError { status_code: NOT_FOUND, .. } => {
                    RuntimeError::ImageNotFound(spec.image.clone())
                }
                e => api_error(e),
            })?;

        for warning in &response.warnings {
            warn!(container = %spec.name, warning = %warning, "Docker warning on create");
        }

        Ok(response.id)
    }

    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| container_error(id, e))
    }

    async fn list(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        let options = Some(ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        });
        let summaries = self.docker.list_containers(options).await.map_err(api_error)?;

        let mut containers = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else { continue };
            match self.docker.inspect_container(&id, None::<InspectContainerOptions>).await {
                Ok(details) => {
                    let mut info = container_info(details);
                    if info.status.is_empty() {
                        info.status = summary.state.unwrap_or_default();
                    }
                    containers.push(info);
                }
                // Removed between list and inspect
                Err(Error::DockerResponseServerError { status_code: NOT_FOUND, .. }) => {
                    debug!(container = %id, "Container vanished while listing");
                }
                Err(e) => return Err(api_error(e)),
            }
        }

        Ok(containers)
    }

    async fn inspect(&self, name: &str) -> Result<ContainerInfo, RuntimeError> {
        self.docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map(container_info)
            .map_err(|e| container_error(name, e))
    }

    async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        match self.docker.stop_container(name, None::<StopContainerOptions>).await {
            Err(Error::DockerResponseServerError { status_code: NOT_MODIFIED, .. }) => {
                debug!(container = %name, "Container already stopped");
                Ok(())
            }
            other => other.map_err(|e| container_error(name, e)),
        }
    }

    async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        match self.docker.restart_container(name, None::<RestartContainerOptions>).await {
            Err(Error::DockerResponseServerError { status_code: NOT_MODIFIED, .. }) => Ok(()),
            other => other.map_err(|e| container_error(name, e)),
        }
    }

    async fn remove(&self, name: &str, volumes: bool, force: bool) -> Result<(), RuntimeError> {
        let options = Some(RemoveContainerOptions {
            v: volumes,
            force,
            ..Default::default()
        });
        self.docker
            .remove_container(name, options)
            .await
            .map_err(|e| container_error(name, e))
    }
}

fn container_info(details: ContainerInspectResponse) -> ContainerInfo {
    let name = details
        .name
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();

    let status = details
        .state
        .and_then(|state| state.status)
        .map(|status| status.to_string())
        .unwrap_or_default();

    let port_bindings = details
        .host_config
        .and_then(|host| host.port_bindings)
        .unwrap_or_default()
        .into_iter()
        .map(|(container_port, bindings)| {
            let host_ports = bindings
                .unwrap_or_default()
                .into_iter()
                .filter_map(|binding| binding.host_port)
                .collect();
            (container_port, host_ports)
        })
        .collect();

    let mounts = details
        .mounts
        .unwrap_or_default()
        .into_iter()
        .filter_map(|mount| mount.source)
        .collect();

    ContainerInfo {
        id: details.id.unwrap_or_default(),
        name,
        status,
        port_bindings,
        mounts,
    }
}

fn container_error(name: &str, err: Error) -> RuntimeError {
    match err {
        Error::DockerResponseServerError { status_code: NOT_FOUND, .. } => {
            RuntimeError::NotFound(name.to_string())
        }
        e => api_error(e),
    }
}

fn image_error(image: &str, err: Error) -> RuntimeError {
    match err {
        Error::DockerResponseServerError { status_code: NOT_FOUND, .. } => {
            RuntimeError::ImageNotFound(image.to_string())
        }
        Error::DockerStreamError { ref error } if is_missing_image(error) => {
            RuntimeError::ImageNotFound(image.to_string())
        }
        e => api_error(e),
    }
}

fn is_missing_image(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("not found")
        || message.contains("manifest unknown")
        || message.contains("does not exist")
        || message.contains("pull access denied")
}

fn api_error(err: Error) -> RuntimeError {
    match err {
        Error::DockerResponseServerError { message, .. } => RuntimeError::Api(message),
        e => RuntimeError::Api(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status_code: u16, message: &str) -> Error {
        Error::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_missing_container_maps_to_not_found() {
        let err = container_error("lobby", server_error(404, "No such container: lobby"));
        assert_eq!(err, RuntimeError::NotFound("lobby".to_string()));
    }

    #[test]
    fn test_conflict_passes_message_through() {
        let err = container_error("lobby", server_error(409, "name already in use"));
        assert_eq!(err, RuntimeError::Api("name already in use".to_string()));
    }

    #[test]
    fn test_pull_stream_errors_detect_missing_tags() {
        let err = image_error(
            "itzg/minecraft-server:nope",
            Error::DockerStreamError {
                error: "manifest for itzg/minecraft-server:nope not found: manifest unknown"
                    .into(),
            },
        );
        assert_eq!(err, RuntimeError::ImageNotFound("itzg/minecraft-server:nope".into()));

        let err = image_error(
            "itzg/minecraft-server:latest",
            Error::DockerStreamError { error: "connection reset".into() },
        );
        assert!(matches!(err, RuntimeError::Api(_)));
    }

    #[test]
    fn test_container_info_from_inspect() {
        let details: ContainerInspectResponse = serde_json::from_value(serde_json::json!({
            "Id": "abc123",
            "Name": "/lobby",
            "State": { "Status": "running" },
            "HostConfig": {
                "PortBindings": { "25565/tcp": [{ "HostIp": "", "HostPort": "25567" }] }
            },
            "Mounts": [{
                "Type": "bind",
                "Source": "/srv/ServerData/lobby",
                "Destination": "/data"
            }]
        }))
        .unwrap();

        let info = container_info(details);
        assert_eq!(info.id, "abc123");
        assert_eq!(info.name, "lobby");
        assert_eq!(info.status, "running");
        assert_eq!(info.host_port("25565/tcp"), Some(25567));
        assert_eq!(info.mounts, vec!["/srv/ServerData/lobby".to_string()]);
    }

    #[tokio::test]
    #[ignore] // Requires Docker
    async fn test_inspect_missing_container() {
        let runtime = DockerRuntime::connect().expect("Failed to connect to Docker");
        let err = runtime.inspect("minedock-does-not-exist").await.unwrap_err();
        assert!(matches!(err, RuntimeError::NotFound(_)));
    }
}
