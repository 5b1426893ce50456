use std::path::PathBuf;

use ironbox_cipher::DEFAULT_READ_SIZE;
use ironbox_protocol::Endpoint;
use ironbox_protocol::constants::{DEFAULT_API_URL, DEFAULT_API_VERSION, DEFAULT_RESPONSE_FORMAT};
use ironbox_transfer::UploadOptions;
use ironbox_transport::RequestConfig;

/// Settings shared by every call of one [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host, without the version segment.
    pub api_url: String,
    /// Version path segment, `latest` unless pinned.
    pub api_version: String,
    /// Value of the `Accept` header on API calls.
    pub accept: String,
    /// Log response bodies of failed calls and per-block progress.
    pub verbose: bool,
    /// Directory the temporary ciphertext is written to.
    pub temp_dir: PathBuf,
    pub cipher_read_size: usize,
    pub upload: UploadOptions,
    pub request: RequestConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            api_version: DEFAULT_API_VERSION.into(),
            accept: DEFAULT_RESPONSE_FORMAT.into(),
            verbose: false,
            temp_dir: std::env::temp_dir(),
            cipher_read_size: DEFAULT_READ_SIZE,
            upload: UploadOptions::default(),
            request: RequestConfig::default(),
        }
    }
}

impl ClientConfig {
    /// `{api_url}/{api_version}/{endpoint}`.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/'),
            endpoint.path()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint_url(Endpoint::ContainerKeyData),
            "https://api.goironcloud.com/latest/ContainerKeyData"
        );
        assert_eq!(config.accept, "application/json");
        assert_eq!(config.cipher_read_size, 1024);
        assert_eq!(config.upload.block_size, 4 * 1024 * 1024);
        assert!(!config.verbose);
    }

    #[test]
    fn endpoint_url_tolerates_slashes() {
        let config = ClientConfig {
            api_url: "https://api.test/".into(),
            api_version: "/v1/".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(Endpoint::Ping), "https://api.test/v1/Ping");
    }
}
