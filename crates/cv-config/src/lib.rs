//! # cv-config
//!
//! Layered configuration: built-in defaults, then an optional TOML file
//! (`config/crownvote.toml`, or the path in `CROWNVOTE_CONFIG`), then
//! `CROWNVOTE_*` environment variables. Nested keys use `__`, e.g.
//! `CROWNVOTE_SERVER__PORT=8080`.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, File};
use cv_core::FingerprintPolicy;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

pub const ENV_PREFIX: &str = "CROWNVOTE";
pub const CONFIG_PATH_VAR: &str = "CROWNVOTE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/crownvote.toml";
pub const DEV_JWT_SECRET: &str = "crownvote-dev-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub voting: VotingConfig,
    pub media: MediaConfig,
    pub cors: CorsConfig,
    pub log: LogConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    pub fingerprint: FingerprintPolicy,
    /// Take the first `X-Forwarded-For` entry as the client address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub upload_dir: PathBuf,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub admin_email: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub admin_password: SecretString,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl AppConfig {
    /// Reads `.env`, then the layered sources from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_sources(Some(path), None)
    }

    /// `env` replaces the process environment when given.
    pub fn from_sources(
        file: Option<PathBuf>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite:crownvote.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("voting.fingerprint", "required")?
            .set_default("voting.trust_forwarded_for", true)?
            .set_default("media.upload_dir", "./public/uploads/candidates")?
            .set_default("media.url_prefix", "/uploads/candidates")?
            .set_default("media.max_upload_bytes", 8 * 1024 * 1024)?
            .set_default(
                "cors.allowed_origins",
                vec!["http://localhost:5173", "http://127.0.0.1:5173"],
            )?
            .set_default("log.filter", "info")?
            .set_default("log.format", "pretty")?
            .set_default("seed.admin_email", "admin@crownvote.local")?
            .set_default("seed.admin_password", "admin123")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let cfg: AppConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_hours must be positive".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        if !self.media.url_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("media.url_prefix must start with '/'".into()));
        }
        Ok(())
    }

    /// Built-in credentials still in use. Logged at startup; fatal nowhere.
    pub fn insecure_defaults(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.auth.jwt_secret.expose_secret() == DEV_JWT_SECRET {
            found.push("auth.jwt_secret");
        }
        if self.seed.admin_password.expose_secret() == "admin123" {
            found.push("seed.admin_password");
        }
        found
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
