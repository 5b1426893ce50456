use std::fmt;
use std::time::Duration;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default total timeout for one request, body transfer included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Immutable request settings.
///
/// Built once by the caller and attached to every [`Request`](crate::Request)
/// it issues. `connect_timeout` and `user_agent` are applied when an
/// [`HttpTransport`](crate::HttpTransport) is built from the config; `timeout`
/// and `auth` are applied per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub auth: Option<BasicAuth>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("ironbox-rs/{}", env!("CARGO_PKG_VERSION")),
            auth: None,
        }
    }
}

impl RequestConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

/// HTTP basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
