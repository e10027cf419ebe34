use std::fmt;
use std::time::Duration;

// HTTP endpoint paths
pub const API_PATH: &str = "/api/v1/";
pub const API_QUERY_PATH: &str = "/api/v1/query";

pub const DEFAULT_HOST: &str = "http://localhost:19090";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// Scheme prefix Istio puts in front of pod UIDs
pub const K8S_PREFIX: &str = "kubernetes://";

// Get the path listing all values of a label, relative to the host
pub fn label_values_path(label: &str) -> String {
    format!("{}label/{}/values", API_PATH, label)
}

/// Static basic-auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for the metrics REST client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base address of the Prometheus server, e.g. `http://localhost:19090`
    pub host: String,

    /// Basic-auth credentials; no Authorization header is sent when unset
    pub credentials: Option<Credentials>,

    /// Overall request timeout
    pub timeout: Duration,

    /// Skip certificate verification for `https` hosts.
    ///
    /// This accepts any certificate the server presents, including self-signed
    /// and expired ones. Only enable it for internal servers you already trust.
    pub insecure_skip_tls_verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_string(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            insecure_skip_tls_verify: false,
        }
    }
}

impl ClientConfig {
    /// Create a new config for the given host
    pub fn new(host: impl Into<String>) -> Self {
        ClientConfig {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set basic-auth credentials; an empty username leaves auth disabled
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        self.credentials = if username.is_empty() {
            None
        } else {
            Some(Credentials {
                username,
                password: password.into(),
            })
        };
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Turn off certificate verification for `https` hosts
    pub fn with_insecure_skip_tls_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_tls_verify = skip;
        self
    }
}
