//! CLI configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/ironbox/client.toml`
//! - Windows: `%APPDATA%/ironbox/client.toml`
//!
//! `IRONBOX_ENTITY`, `IRONBOX_PASSWORD` and `IRONBOX_API_URL` override the
//! file; command-line flags override both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use ironbox_client::{ClientConfig, Credential, UploadOptions};
use ironbox_protocol::constants::{DEFAULT_API_URL, DEFAULT_API_VERSION};
use ironbox_transport::RequestConfig;
use serde::{Deserialize, Serialize};

/// Client configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account identifier, usually an email address.
    pub entity: String,

    /// Account password. Prefer `IRONBOX_PASSWORD` over storing it here.
    pub entity_password: String,

    pub entity_type: i32,

    pub api_url: String,

    pub api_version: String,

    /// Log failed response bodies and per-block progress.
    pub verbose: bool,

    /// Where temporary ciphertext is written (system temp dir if unset).
    pub temp_dir: Option<PathBuf>,

    /// Concurrent block uploads.
    pub concurrency: usize,

    pub connect_timeout_secs: u64,

    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let request = RequestConfig::default();
        Self {
            entity: String::new(),
            entity_password: String::new(),
            entity_type: 0,
            api_url: DEFAULT_API_URL.into(),
            api_version: DEFAULT_API_VERSION.into(),
            verbose: false,
            temp_dir: None,
            concurrency: UploadOptions::default().concurrency,
            connect_timeout_secs: request.connect_timeout.as_secs(),
            timeout_secs: request.timeout.as_secs(),
        }
    }
}

impl Config {
    /// Loads the file at `path` (or the default location) and applies
    /// environment overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            config
        } else {
            Config::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies `IRONBOX_*` overrides resolved through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(entity) = lookup("IRONBOX_ENTITY") {
            self.entity = entity;
        }
        if let Some(password) = lookup("IRONBOX_PASSWORD") {
            self.entity_password = password;
        }
        if let Some(url) = lookup("IRONBOX_API_URL") {
            self.api_url = url;
        }
    }

    pub fn credential(&self) -> anyhow::Result<Credential> {
        if self.entity.is_empty() {
            bail!("no entity configured; set `entity` in the config file or IRONBOX_ENTITY");
        }
        if self.entity_password.is_empty() {
            bail!("no password configured; set IRONBOX_PASSWORD");
        }
        Ok(Credential::new(&self.entity, &self.entity_password).with_entity_type(self.entity_type))
    }

    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            api_url: self.api_url.clone(),
            api_version: self.api_version.clone(),
            verbose: self.verbose,
            temp_dir: self.temp_dir.clone().unwrap_or(defaults.temp_dir),
            upload: UploadOptions {
                concurrency: self.concurrency,
                ..defaults.upload
            },
            request: RequestConfig::default()
                .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
                .with_timeout(Duration::from_secs(self.timeout_secs)),
            ..defaults
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("ironbox").join("client.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config").join("ironbox").join("client.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.goironcloud.com");
        assert_eq!(config.api_version, "latest");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.timeout_secs, 600);
        assert!(config.credential().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(r#"entity = "you@example.com""#).unwrap();
        assert_eq!(config.entity, "you@example.com");
        assert_eq!(config.api_version, "latest");
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn env_overrides_file() {
        let mut config: Config = toml::from_str(
            r#"
            entity = "file@example.com"
            api_url = "https://file.test"
            "#,
        )
        .unwrap();
        config.apply_env(|name| match name {
            "IRONBOX_ENTITY" => Some("env@example.com".into()),
            "IRONBOX_PASSWORD" => Some("hunter2".into()),
            _ => None,
        });

        assert_eq!(config.entity, "env@example.com");
        assert_eq!(config.api_url, "https://file.test");
        let credential = config.credential().unwrap();
        assert_eq!(credential.entity_password, "hunter2");
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("client.toml");
        std::fs::write(&path, "verbose = true\nconcurrency = 2\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.verbose);
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn client_config_carries_settings() {
        let config = Config {
            api_url: "https://api.test".into(),
            temp_dir: Some(PathBuf::from("/var/tmp/ironbox")),
            concurrency: 8,
            timeout_secs: 60,
            ..Default::default()
        };
        let client = config.client_config();
        assert_eq!(client.api_url, "https://api.test");
        assert_eq!(client.temp_dir, PathBuf::from("/var/tmp/ironbox"));
        assert_eq!(client.upload.concurrency, 8);
        assert_eq!(client.upload.block_size, 4 * 1024 * 1024);
        assert_eq!(client.request.timeout, Duration::from_secs(60));
    }
}
