//! Configuration module for starschema.
//!
//! Handles the config file, environment variable expansion, and defaults.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, IngestSettings, LoggingSettings, Settings, SettingsError,
    CONFIG_ENV_VAR,
};
