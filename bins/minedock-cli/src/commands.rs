// CLI commands for managing servers
use anyhow::{Context, Result};
use minedock_common::{Orchestrator, ServerConfig};
use std::fs;
use std::path::Path;

/// Assemble a server configuration from an optional JSON file plus flags.
/// Flags win over the file; the positional name always wins.
pub fn build_config(
    name: &str,
    config_file: Option<&Path>,
    version: Option<String>,
    port: Option<u16>,
    memory: Option<String>,
    mods: Vec<String>,
) -> Result<ServerConfig> {
    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let fields = value
                .as_object_mut()
                .with_context(|| format!("{} must hold a JSON object", path.display()))?;
            // The positional name replaces any name in the file
            fields.remove("name");
            fields.insert("server_name".to_string(), name.into());
            serde_json::from_value(value)
                .with_context(|| format!("Invalid server configuration in {}", path.display()))?
        }
        None => ServerConfig::new(name),
    };

    config.server_name = name.to_string();
    if version.is_some() {
        config.version = version;
    }
    if port.is_some() {
        config.port = port;
    }
    if memory.is_some() {
        config.memory = memory;
    }
    if !mods.is_empty() {
        config.mods = Some(mods);
    }

    Ok(config)
}

pub async fn create_server(orchestrator: &Orchestrator, config: &ServerConfig) -> Result<()> {
    println!("🚀 Creating server: {}", config.server_name);

    let created = orchestrator
        .create(config)
        .await
        .with_context(|| format!("Failed to create server '{}'", config.server_name))?;

    println!("✅ Server {} created successfully", created.name);
    println!("  Container: {}", created.container_id);
    println!(
        "  Data:      {}",
        orchestrator.settings().data_dir(&created.name).display()
    );
    Ok(())
}

pub async fn list_servers(orchestrator: &Orchestrator) -> Result<()> {
    let servers = orchestrator.list().await.context("Failed to list servers")?;

    if servers.is_empty() {
        println!("No servers found");
        return Ok(());
    }

    println!("{:<32} {:<12} {:<7} {}", "NAME", "STATUS", "PORT", "ID");
    for server in servers {
        let port = server
            .port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let id = server.id.get(..12).unwrap_or(&server.id);
        println!("{:<32} {:<12} {:<7} {}", server.name, server.status, port, id);
    }
    Ok(())
}

pub async fn stop_server(orchestrator: &Orchestrator, name: &str) -> Result<()> {
    orchestrator
        .stop(name)
        .await
        .with_context(|| format!("Failed to stop server '{}'", name))?;
    println!("✅ Server {} stopped successfully", name);
    Ok(())
}

pub async fn restart_server(orchestrator: &Orchestrator, name: &str) -> Result<()> {
    orchestrator
        .restart(name)
        .await
        .with_context(|| format!("Failed to restart server '{}'", name))?;
    println!("✅ Server {} restarted successfully", name);
    Ok(())
}

pub async fn delete_server(orchestrator: &Orchestrator, name: &str) -> Result<()> {
    println!("🗑  Deleting server: {}", name);
    orchestrator
        .delete(name)
        .await
        .with_context(|| format!("Failed to delete server '{}'", name))?;
    println!("✅ Server {} deleted successfully", name);
    Ok(())
}
