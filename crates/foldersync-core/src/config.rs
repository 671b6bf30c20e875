//! Configuration module for foldersync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::usecases::DEFAULT_MAX_CHANGE_PAGES;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for foldersync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Mail server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// URL of the JMAP session resource, e.g. `https://mail.example.com/.well-known/jmap`.
    pub session_url: String,
    /// Account to synchronize. `None` selects the server's primary mail account.
    pub account_id: Option<String>,
}

/// Credential settings.
///
/// Secrets are never stored in the file; only the names of the environment
/// variables holding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// User name for basic authentication.
    pub username: Option<String>,
    /// Environment variable holding the basic-auth password.
    pub password_env: String,
    /// Environment variable holding a bearer token. Takes precedence over basic auth.
    pub token_env: Option<String>,
}

/// Local storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database holding the folder mirror.
    pub database: PathBuf,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Timeout for a single HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum number of change pages followed in one refresh.
    pub max_change_pages: u32,
    /// Attempts the CLI makes after a transient failure.
    pub max_retries: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/foldersync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("foldersync")
            .join("config.yaml")
    }

    /// Serialize the configuration back to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default environment variable for the basic-auth password.
pub const DEFAULT_PASSWORD_ENV: &str = "FOLDERSYNC_PASSWORD";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            password_env: DEFAULT_PASSWORD_ENV.to_string(),
            token_env: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("foldersync")
                .join("folders.db"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_change_pages: DEFAULT_MAX_CHANGE_PAGES,
            max_retries: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.max_change_pages"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- server ---
        if self.server.session_url.trim().is_empty() {
            errors.push(ValidationError {
                field: "server.session_url".into(),
                message: "must be set".into(),
            });
        } else if !self.server.session_url.starts_with("https://")
            && !self.server.session_url.starts_with("http://")
        {
            errors.push(ValidationError {
                field: "server.session_url".into(),
                message: format!(
                    "must be an http(s) URL: {}",
                    self.server.session_url
                ),
            });
        }
        if matches!(&self.server.account_id, Some(id) if id.trim().is_empty()) {
            errors.push(ValidationError {
                field: "server.account_id".into(),
                message: "must not be empty when set".into(),
            });
        }

        // --- auth ---
        if self.auth.token_env.is_none() && self.auth.username.is_none() {
            errors.push(ValidationError {
                field: "auth.username".into(),
                message: "required unless auth.token_env is set".into(),
            });
        }
        if self.auth.password_env.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.password_env".into(),
                message: "must not be empty".into(),
            });
        }
        if matches!(&self.auth.token_env, Some(name) if name.trim().is_empty()) {
            errors.push(ValidationError {
                field: "auth.token_env".into(),
                message: "must not be empty when set".into(),
            });
        }

        // --- storage ---
        if self.storage.database.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.database".into(),
                message: "must be set".into(),
            });
        }

        // --- sync ---
        if self.sync.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "sync.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.max_change_pages == 0 {
            errors.push(ValidationError {
                field: "sync.max_change_pages".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.max_retries > 10 {
            errors.push(ValidationError {
                field: "sync.max_retries".into(),
                message: "must be in range 0..=10".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use foldersync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .server_session_url("https://mail.example.com/.well-known/jmap")
///     .auth_username("alice")
///     .sync_max_change_pages(16)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- server ---

    pub fn server_session_url(mut self, url: impl Into<String>) -> Self {
        self.config.server.session_url = url.into();
        self
    }

    pub fn server_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.config.server.account_id = Some(account_id.into());
        self
    }

    // --- auth ---

    pub fn auth_username(mut self, username: impl Into<String>) -> Self {
        self.config.auth.username = Some(username.into());
        self
    }

    pub fn auth_password_env(mut self, name: impl Into<String>) -> Self {
        self.config.auth.password_env = name.into();
        self
    }

    pub fn auth_token_env(mut self, name: impl Into<String>) -> Self {
        self.config.auth.token_env = Some(name.into());
        self
    }

    // --- storage ---

    pub fn storage_database(mut self, path: PathBuf) -> Self {
        self.config.storage.database = path;
        self
    }

    // --- sync ---

    pub fn sync_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.sync.request_timeout_secs = seconds;
        self
    }

    pub fn sync_max_change_pages(mut self, pages: u32) -> Self {
        self.config.sync.max_change_pages = pages;
        self
    }

    pub fn sync_max_retries(mut self, retries: u32) -> Self {
        self.config.sync.max_retries = retries;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
