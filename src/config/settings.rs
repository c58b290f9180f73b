//! TOML-based configuration for starschema.
//!
//! Supports a config file (starschema.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! path = "${DATA_DIR}/insurance.db"
//! dialect = "sqlite"
//!
//! [ingest]
//! archive = "./agencyperformance.zip"
//! member = "finalapi.csv"
//! raw_table = "agency_performance"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::agency;
use crate::logging::LogFormat;
use crate::sql::Dialect;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "STARSCHEMA_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub ingest: IngestSettings,
    pub logging: LoggingSettings,
}

/// Where the star schema lives.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file (supports ${ENV_VAR} expansion).
    pub path: String,

    /// SQL dialect statements are rendered in.
    pub dialect: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "insurance.db".to_string(),
            dialect: "sqlite".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// The database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.path).map(PathBuf::from)
    }

    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        self.dialect
            .parse()
            .map_err(|_| SettingsError::UnsupportedDialect(self.dialect.clone()))
    }
}

/// Where the raw extract comes from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestSettings {
    /// ZIP archive holding the extract (supports ${ENV_VAR} expansion).
    pub archive: String,

    /// CSV member inside the archive.
    pub member: String,

    /// Table the raw rows are appended to.
    pub raw_table: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            archive: "agencyperformance.zip".to_string(),
            member: "finalapi.csv".to_string(),
            raw_table: agency::RAW_TABLE.to_string(),
        }
    }
}

impl IngestSettings {
    pub fn resolved_archive(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.archive).map(PathBuf::from)
    }
}

/// Log output defaults; `-v` flags and `RUST_LOG` take precedence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `STARSCHEMA_CONFIG`
    /// 2. `./starschema.toml`
    /// 3. `<config dir>/starschema/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("starschema.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("starschema").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name = std::iter::from_fn(|| chars.next_if(|&ch| ch != '}')).collect();
            chars.next(); // closing '}'
            name
        } else {
            std::iter::from_fn(|| chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_')).collect()
        };

        if var_name.is_empty() {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
