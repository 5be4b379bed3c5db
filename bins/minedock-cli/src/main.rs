mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use minedock_common::runtime::DockerRuntime;
use minedock_common::{Orchestrator, Settings};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "minedock-cli")]
#[command(about = "minedock CLI - Manage Minecraft server containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and start a server
    Create {
        /// Server name (container and data directory name)
        name: String,

        /// Image tag / Minecraft version (e.g., latest, 1.20.4, java17)
        #[arg(short, long)]
        version: Option<String>,

        /// Host port bound to the game port
        #[arg(short, long)]
        port: Option<u16>,

        /// JVM memory (e.g., 4G)
        #[arg(short, long)]
        memory: Option<String>,

        /// Mod jar to install, may be repeated
        #[arg(long = "mod", value_name = "JAR")]
        mods: Vec<String>,

        /// JSON file with the full server configuration; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List all containers, including stopped ones
    List,

    /// Stop a running server
    Stop { name: String },

    /// Restart a server
    Restart { name: String },

    /// Stop and remove a server together with its data directory
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let runtime = DockerRuntime::connect().context("Failed to connect to Docker daemon")?;
    let orchestrator = Orchestrator::new(Arc::new(runtime), Settings::from_env());

    match cli.command {
        Commands::Create {
            name,
            version,
            port,
            memory,
            mods,
            config,
        } => {
            let server = commands::build_config(
                &name,
                config.as_deref(),
                version,
                port,
                memory,
                mods,
            )?;
            commands::create_server(&orchestrator, &server).await?;
        }
        Commands::List => {
            commands::list_servers(&orchestrator).await?;
        }
        Commands::Stop { name } => {
            commands::stop_server(&orchestrator, &name).await?;
        }
        Commands::Restart { name } => {
            commands::restart_server(&orchestrator, &name).await?;
        }
        Commands::Delete { name } => {
            commands::delete_server(&orchestrator, &name).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "minedock-cli",
            "create",
            "lobby",
            "--port",
            "25567",
            "--mod",
            "a.jar",
            "--mod",
            "b.jar",
        ])
        .unwrap();

        match cli.command {
            Commands::Create { name, port, mods, version, .. } => {
                assert_eq!(name, "lobby");
                assert_eq!(port, Some(25567));
                assert_eq!(mods, vec!["a.jar", "b.jar"]);
                assert_eq!(version, None);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_parse_lifecycle_commands() {
        assert!(matches!(
            Cli::try_parse_from(["minedock-cli", "delete", "lobby"]).unwrap().command,
            Commands::Delete { name } if name == "lobby"
        ));
        assert!(matches!(
            Cli::try_parse_from(["minedock-cli", "list"]).unwrap().command,
            Commands::List
        ));
        assert!(Cli::try_parse_from(["minedock-cli", "stop"]).is_err());
    }
}
