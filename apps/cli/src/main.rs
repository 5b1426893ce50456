//! IronBox command-line client.

mod config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use ironbox_client::{ApiClient, TracingLog, TransferOrchestrator};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "ironbox", version, about = "Encrypt files and upload them to IronBox")]
struct Cli {
    /// Configuration file (defaults to ~/.config/ironbox/client.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log failed response bodies and per-block progress.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encrypt a file and upload it into a container.
    Upload {
        #[arg(long)]
        container: String,
        #[arg(long)]
        file: PathBuf,
        /// Blob name (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Check that the API is reachable.
    Ping {
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Decrypt a file encrypted with a known session key.
    Decrypt {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Session key, base64.
        #[arg(long)]
        key: String,
        /// Session IV, base64.
        #[arg(long)]
        iv: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    config.verbose |= cli.verbose;

    match cli.command {
        Command::Upload {
            container,
            file,
            name,
            entity,
            api_url,
        } => {
            if let Some(entity) = entity {
                config.entity = entity;
            }
            if let Some(url) = api_url {
                config.api_url = url;
            }
            let blob_name = match name {
                Some(name) => name,
                None => default_blob_name(&file)?,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(upload(&config, &container, &file, &blob_name))
        }
        Command::Ping { api_url } => {
            if let Some(url) = api_url {
                config.api_url = url;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(ping(&config))
        }
        Command::Decrypt { input, output, key, iv } => decrypt(&input, &output, &key, &iv),
    }
}

async fn upload(config: &Config, container: &str, file: &Path, blob_name: &str) -> anyhow::Result<()> {
    let credential = config.credential()?;
    let api = ApiClient::with_http(config.client_config())?;
    let log = TracingLog;

    tracing::info!(file = %file.display(), container, blob = blob_name, "starting upload");
    let report = TransferOrchestrator::new(&api, &log)
        .upload(credential, container, file, blob_name)
        .await
        .with_context(|| format!("uploading {}", file.display()))?;

    println!(
        "uploaded {} as {} ({} bytes, {} blocks)",
        file.display(),
        report.blob_id_name,
        report.plaintext_size,
        report.block_count
    );
    Ok(())
}

async fn ping(config: &Config) -> anyhow::Result<()> {
    let api = ApiClient::with_http(config.client_config())?;
    api.ping().await?;
    println!("{} is reachable", config.api_url);
    Ok(())
}

fn decrypt(input: &Path, output: &Path, key: &str, iv: &str) -> anyhow::Result<()> {
    let key = STANDARD.decode(key.trim()).context("key is not valid base64")?;
    let iv = STANDARD.decode(iv.trim()).context("IV is not valid base64")?;
    let written = ironbox_cipher::decrypt_file(input, output, &key, &iv)
        .with_context(|| format!("decrypting {}", input.display()))?;
    println!("wrote {written} bytes to {}", output.display());
    Ok(())
}

fn default_blob_name(file: &Path) -> anyhow::Result<String> {
    file.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .with_context(|| format!("cannot derive a blob name from {}", file.display()))
}
