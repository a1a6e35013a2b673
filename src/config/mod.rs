//! Configuration management
//!
//! Configuration is loaded from `config.yml` and can be overridden with
//! `YAMDB_*` environment variables. Missing optional values fall back to
//! defaults, so an absent or empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Access token configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outbound email configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Superuser created at startup when missing
    #[serde(default)]
    pub admin: Option<AdminBootstrap>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/yamdb.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Access token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of an issued access token, in days
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

fn default_token_ttl_days() -> i64 {
    1
}

/// How confirmation emails leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    /// Write messages to the log instead of sending them (default)
    #[default]
    Console,
    /// Relay through an SMTP server
    Smtp,
}

/// Outbound email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub transport: EmailTransport,
    /// Sender address for confirmation codes
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransport::default(),
            from_email: default_from_email(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

fn default_from_email() -> String {
    "noreply@yamdb.local".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

/// Superuser account ensured at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration. Invalid YAML
    /// is reported with its location.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - YAMDB_SERVER_HOST, YAMDB_SERVER_PORT, YAMDB_SERVER_CORS_ORIGIN
    /// - YAMDB_DATABASE_DRIVER, YAMDB_DATABASE_URL
    /// - YAMDB_CACHE_TTL_SECONDS
    /// - YAMDB_AUTH_TOKEN_TTL_DAYS
    /// - YAMDB_EMAIL_TRANSPORT, YAMDB_EMAIL_FROM, YAMDB_SMTP_HOST,
    ///   YAMDB_SMTP_PORT, YAMDB_SMTP_USERNAME, YAMDB_SMTP_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_days <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_days must be positive".to_string(),
            ));
        }
        if self.email.transport == EmailTransport::Smtp && self.email.smtp_host.is_none() {
            return Err(ConfigError::ValidationError(
                "email.smtp_host is required when email.transport is smtp".to_string(),
            ));
        }
        if !self.email.from_email.contains('@') {
            return Err(ConfigError::ValidationError(format!(
                "email.from_email is not an address: {}",
                self.email.from_email
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("YAMDB_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("YAMDB_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("YAMDB_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("YAMDB_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("YAMDB_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("YAMDB_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(days) = std::env::var("YAMDB_AUTH_TOKEN_TTL_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.auth.token_ttl_days = days;
            }
        }

        if let Ok(transport) = std::env::var("YAMDB_EMAIL_TRANSPORT") {
            match transport.to_lowercase().as_str() {
                "console" => self.email.transport = EmailTransport::Console,
                "smtp" => self.email.transport = EmailTransport::Smtp,
                _ => {}
            }
        }
        if let Ok(from) = std::env::var("YAMDB_EMAIL_FROM") {
            self.email.from_email = from;
        }
        if let Ok(host) = std::env::var("YAMDB_SMTP_HOST") {
            self.email.smtp_host = Some(host);
        }
        if let Ok(port) = std::env::var("YAMDB_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.email.smtp_port = port;
            }
        }
        if let Ok(username) = std::env::var("YAMDB_SMTP_USERNAME") {
            self.email.smtp_username = Some(username);
        }
        if let Ok(password) = std::env::var("YAMDB_SMTP_PASSWORD") {
            self.email.smtp_password = Some(password);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Tests that touch the process environment share this lock.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
