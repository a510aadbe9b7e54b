mod bootstrap;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use medbuddy_config::{config_dir, config_file_path, MedBuddyConfig};
use medbuddy_gateway::{build_router, start_server, AppState, RouterOptions};
use medbuddy_logging::{init_logger, LoggerOptions};
use medbuddy_media::decode_image_blocking;

#[derive(Parser)]
#[command(name = "medbuddy")]
#[command(about = "MedBuddy: reads medication schedules from prescription sticker photos")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.medbuddy/config.yaml)
    #[arg(short, long, global = true, env = "MEDBUDDY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the pipeline on a local photo and print the full record
    Process {
        /// Sticker photo (png, jpg, jpeg or gif)
        image: PathBuf,
    },
    /// Query a running server's health endpoint
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));

    let config = medbuddy_config::load_with_overrides(&config_path).await?;
    init_logger(&LoggerOptions {
        level: config.logging.level.clone(),
        log_dir: config.logging.dir.clone(),
        json_console: config.logging.json_console,
    })?;

    match cli.command {
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            medbuddy_config::ensure_valid(&config)?;
            run_server(config).await?;
        }
        Commands::Process { image } => {
            medbuddy_config::ensure_valid(&config)?;
            process_file(&config, &image).await?;
        }
        Commands::Status { port } => {
            let port = port.unwrap_or(config.server.port);
            let url = format!("http://{}:{}/health", client_host(&config.server.bind_address), port);
            match reqwest::get(&url).await {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("MedBuddy is not running at {url}");
                }
            }
        }
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            medbuddy_config::write_config(&MedBuddyConfig::default(), &config_path).await?;
            println!("Wrote default config to {}", config_path.display());
        }
    }

    Ok(())
}

async fn run_server(config: MedBuddyConfig) -> Result<()> {
    info!(
        port = config.server.port,
        bind = %config.server.bind_address,
        provider = config.model.provider.as_str(),
        model = %config.model.model,
        "Starting MedBuddy server"
    );

    let pipeline = Arc::new(bootstrap::build_pipeline(&config)?);
    let state = AppState::new(
        pipeline,
        config.server.upload_dir.clone(),
        config.server.allowed_extensions.clone(),
    );
    let app = build_router(
        state,
        &RouterOptions {
            max_upload_bytes: config.server.max_upload_bytes,
            cors_permissive: config.server.cors_permissive,
        },
    );

    let ip: IpAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind_address))?;
    start_server(SocketAddr::new(ip, config.server.port), app).await
}

async fn process_file(config: &MedBuddyConfig, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let image = Arc::new(decode_image_blocking(bytes).await?);

    let pipeline = bootstrap::build_pipeline(config)?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let record = pipeline.run(image, &label).await?;

    if record.is_fallback() {
        info!("No medication schedule detected in the image");
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Address a local client should use to reach a server bound to `bind`.
fn client_host(bind: &str) -> &str {
    match bind {
        "0.0.0.0" | "::" | "" => "127.0.0.1",
        other => other,
    }
}
