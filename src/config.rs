use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialSource, EnvCredentials, StateDbCredentials};
use crate::cloudcode::constants::{
    CLOUDCODE_ENDPOINTS, CONNECT_TIMEOUT, DEFAULT_PROJECT_ID, DEFAULT_STREAM_CHUNK_SIZE,
    REQUEST_TIMEOUT,
};
use crate::cloudcode::convert::ModelMap;
use crate::cloudcode::{CloudCodeClient, ProjectCache};

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Records which settings were taken from `CCGATE_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Whether a setting key (e.g. "server.host") came from the environment.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Hosts in priority order.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Project used when discovery yields nothing.
    #[serde(default = "default_project")]
    pub default_project: String,
    /// Extra frontend-model to backend-model mappings.
    #[serde(default)]
    pub model_aliases: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            default_project: default_project(),
            model_aliases: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Characters per synthesized text delta. 0 is treated as 1.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSourceKind {
    #[default]
    StateDb,
    Env,
    Keyring,
}

impl std::fmt::Display for CredentialSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StateDb => write!(f, "state_db"),
            Self::Env => write!(f, "env"),
            Self::Keyring => write!(f, "keyring"),
        }
    }
}

impl FromStr for CredentialSourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "state_db" | "statedb" => Ok(Self::StateDb),
            "env" => Ok(Self::Env),
            "keyring" => Ok(Self::Keyring),
            _ => Err(format!("Unknown credential source: {s}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub source: CredentialSourceKind,
    /// Desktop client state database.
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,
    /// Variable holding the token for the `env` source.
    #[serde(default = "default_token_env_var")]
    pub env_var: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            source: CredentialSourceKind::default(),
            state_db_path: default_state_db_path(),
            env_var: default_token_env_var(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Log request and response bodies at debug level.
    #[serde(default)]
    pub log_content: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_content: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_endpoints() -> Vec<String> {
    CLOUDCODE_ENDPOINTS.iter().map(|s| s.to_string()).collect()
}
const fn default_connect_timeout_secs() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}
const fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT.as_secs()
}
fn default_project() -> String {
    DEFAULT_PROJECT_ID.to_string()
}
const fn default_chunk_size() -> usize {
    DEFAULT_STREAM_CHUNK_SIZE
}
fn default_state_db_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Antigravity")
        .join("User")
        .join("globalStorage")
        .join("state.vscdb")
}
fn default_token_env_var() -> String {
    "CCGATE_ACCESS_TOKEN".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Config loading, env overrides, and component wiring
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides. Any `CCGATE_*` setting takes precedence over the file value
    /// and is tracked in `env_overrides`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend.endpoints.is_empty() {
            anyhow::bail!("backend.endpoints must list at least one host");
        }
        for endpoint in &self.backend.endpoints {
            let url = url::Url::parse(endpoint)
                .map_err(|e| anyhow::anyhow!("invalid backend endpoint {endpoint:?}: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("backend endpoint {endpoint:?} must be http or https");
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn apply_env_overrides(&mut self) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }
        macro_rules! env_path {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = PathBuf::from(val);
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_list {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    ov.record($key, $env);
                }
            };
        }

        // -- Server --
        env_str!("server.host", "CCGATE_SERVER_HOST", self.server.host);
        env_parse!("server.port", "CCGATE_SERVER_PORT", self.server.port);
        env_list!("server.cors_origins", "CCGATE_SERVER_CORS_ORIGINS", self.server.cors_origins);

        // -- Backend --
        env_list!("backend.endpoints", "CCGATE_BACKEND_ENDPOINTS", self.backend.endpoints);
        env_parse!(
            "backend.connect_timeout_secs",
            "CCGATE_BACKEND_CONNECT_TIMEOUT",
            self.backend.connect_timeout_secs
        );
        env_parse!(
            "backend.request_timeout_secs",
            "CCGATE_BACKEND_REQUEST_TIMEOUT",
            self.backend.request_timeout_secs
        );
        env_str!(
            "backend.default_project",
            "CCGATE_BACKEND_DEFAULT_PROJECT",
            self.backend.default_project
        );

        // -- Stream --
        env_parse!("stream.chunk_size", "CCGATE_STREAM_CHUNK_SIZE", self.stream.chunk_size);

        // -- Credentials --
        env_parse!("credentials.source", "CCGATE_CREDENTIALS_SOURCE", self.credentials.source);
        env_path!(
            "credentials.state_db_path",
            "CCGATE_CREDENTIALS_STATE_DB",
            self.credentials.state_db_path
        );
        env_str!("credentials.env_var", "CCGATE_CREDENTIALS_ENV_VAR", self.credentials.env_var);

        // -- Logging --
        env_str!("logging.level", "CCGATE_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "CCGATE_LOG_JSON", self.logging.json);
        env_bool!("logging.log_content", "CCGATE_LOG_CONTENT", self.logging.log_content);

        self.env_overrides = ov;
    }

    /// Instantiate the configured credential source.
    pub fn credential_source(&self) -> anyhow::Result<Arc<dyn CredentialSource>> {
        let source: Arc<dyn CredentialSource> = match self.credentials.source {
            CredentialSourceKind::StateDb => {
                Arc::new(StateDbCredentials::new(self.credentials.state_db_path.clone()))
            }
            CredentialSourceKind::Env => Arc::new(EnvCredentials::new(self.credentials.env_var.clone())),
            #[cfg(feature = "system-keyring")]
            CredentialSourceKind::Keyring => Arc::new(crate::auth::KeyringCredentials::default()),
            #[cfg(not(feature = "system-keyring"))]
            CredentialSourceKind::Keyring => {
                anyhow::bail!("credential source 'keyring' requires the system-keyring feature")
            }
        };
        Ok(source)
    }

    /// Build the Cloud Code client described by this configuration.
    pub fn build_client(
        &self,
        credentials: Arc<dyn CredentialSource>,
        cache: ProjectCache,
    ) -> anyhow::Result<CloudCodeClient> {
        let client = CloudCodeClient::builder()
            .credentials(credentials)
            .hosts(self.backend.endpoints.clone())
            .default_project(self.backend.default_project.clone())
            .models(ModelMap::with_aliases(self.backend.model_aliases.clone()))
            .chunk_size(self.stream.chunk_size)
            .project_cache(cache)
            .connect_timeout(Duration::from_secs(self.backend.connect_timeout_secs))
            .request_timeout(Duration::from_secs(self.backend.request_timeout_secs))
            .build()?;
        Ok(client)
    }
}

// Helper for default paths
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "macos") {
            return std::env::var_os("HOME")
                .map(|h| PathBuf::from(h).join("Library").join("Application Support"));
        }
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
