// In-memory container runtime for tests

use super::{ContainerInfo, ContainerRuntime, ContainerSpec, RuntimeError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct FakeContainer {
    info: ContainerInfo,
    spec: ContainerSpec,
}

#[derive(Default)]
struct Failures {
    start: Option<String>,
    remove: Option<String>,
}

/// Behaves like a Docker daemon with a fixed set of pullable images.
/// Containers are kept in creation order.
pub struct FakeRuntime {
    images: Mutex<HashSet<String>>,
    containers: Mutex<Vec<FakeContainer>>,
    failures: Mutex<Failures>,
}

impl FakeRuntime {
    /// A runtime that can pull every tag in `images`.
    pub fn with_images<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: Mutex::new(images.into_iter().map(Into::into).collect()),
            containers: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
        }
    }

    /// Makes every later `start` fail with `message`.
    pub fn fail_start(&self, message: &str) {
        self.failures.lock().unwrap().start = Some(message.to_string());
    }

    /// Makes every later `remove` fail with `message`.
    pub fn fail_remove(&self, message: &str) {
        self.failures.lock().unwrap().remove = Some(message.to_string());
    }

    /// Definition the container named `name` was created from.
    pub fn spec_of(&self, name: &str) -> Option<ContainerSpec> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.info.name == name)
            .map(|c| c.spec.clone())
    }

    pub fn id_of(&self, name: &str) -> Option<String> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.info.name == name)
            .map(|c| c.info.id.clone())
    }

    pub fn status_of(&self, name: &str) -> Option<String> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.info.name == name)
            .map(|c| c.info.status.clone())
    }

    fn with_container<T>(
        &self,
        reference: &str,
        f: impl FnOnce(&mut FakeContainer) -> T,
    ) -> Result<T, RuntimeError> {
        let mut containers = self.containers.lock().unwrap();
        let index = resolve(&containers, reference)?;
        Ok(f(&mut containers[index]))
    }
}

/// Docker's lookup order: full id, exact name, then a unique id prefix.
fn resolve(containers: &[FakeContainer], reference: &str) -> Result<usize, RuntimeError> {
    let not_found = || RuntimeError::NotFound(reference.to_string());
    if reference.is_empty() {
        return Err(not_found());
    }
    if let Some(index) = containers.iter().position(|c| c.info.id == reference) {
        return Ok(index);
    }
    if let Some(index) = containers.iter().position(|c| c.info.name == reference) {
        return Ok(index);
    }

    let mut prefixed = containers
        .iter()
        .enumerate()
        .filter(|(_, c)| c.info.id.starts_with(reference));
    match (prefixed.next(), prefixed.next()) {
        (Some((index, _)), None) => Ok(index),
        _ => Err(not_found()),
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.images.lock().unwrap().contains(image) {
            Ok(())
        } else {
            Err(RuntimeError::ImageNotFound(image.to_string()))
        }
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        if !self.images.lock().unwrap().contains(&spec.image) {
            return Err(RuntimeError::ImageNotFound(spec.image.clone()));
        }

        let mut containers = self.containers.lock().unwrap();
        if containers.iter().any(|c| c.info.name == spec.name) {
            return Err(RuntimeError::Api(format!(
                "Conflict. The container name \"/{}\" is already in use",
                spec.name
            )));
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let port_bindings = spec
            .port_bindings
            .iter()
            .map(|(port, host_port)| (port.clone(), vec![host_port.to_string()]))
            .collect();

        containers.push(FakeContainer {
            info: ContainerInfo {
                id: id.clone(),
                name: spec.name.clone(),
                status: "created".to_string(),
                port_bindings,
                mounts: spec.binds.iter().map(|b| b.host_path.clone()).collect(),
            },
            spec: spec.clone(),
        });

        Ok(id)
    }

    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        if let Some(message) = self.failures.lock().unwrap().start.clone() {
            return Err(RuntimeError::Api(message));
        }
        self.with_container(id, |c| c.info.status = "running".to_string())
    }

    async fn list(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        Ok(self
            .containers
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.info.clone())
            .collect())
    }

    async fn inspect(&self, name: &str) -> Result<ContainerInfo, RuntimeError> {
        self.with_container(name, |c| c.info.clone())
    }

    async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.with_container(name, |c| c.info.status = "exited".to_string())
    }

    async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        self.with_container(name, |c| c.info.status = "running".to_string())
    }

    async fn remove(&self, name: &str, _volumes: bool, force: bool) -> Result<(), RuntimeError> {
        if let Some(message) = self.failures.lock().unwrap().remove.clone() {
            return Err(RuntimeError::Api(message));
        }

        let mut containers = self.containers.lock().unwrap();
        let index = resolve(&containers, name)?;

        if containers[index].info.status == "running" && !force {
            return Err(RuntimeError::Api(format!(
                "cannot remove container \"/{}\": container is running",
                name
            )));
        }

        containers.remove(index);
        Ok(())
    }
}
