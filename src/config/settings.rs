//! TOML-based configuration for quarry.
//!
//! Supports a config file (quarry.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [source]
//! path = "${DATA_DIR}/app.db"
//! busy_timeout_ms = 5000
//! foreign_keys = true
//!
//! [query]
//! log_sql = true
//!
//! [logging]
//! filter = "quarry=debug,info"
//! ansi = false
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

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

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Data source configuration.
    pub source: SourceSettings,

    /// Query execution configuration.
    pub query: QuerySettings,

    /// Log output configuration.
    pub logging: LoggingSettings,
}

/// Data source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Database file (supports ${ENV_VAR} expansion); `:memory:` for a
    /// private in-memory database.
    pub path: String,

    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            busy_timeout_ms: 5000,
            foreign_keys: true,
        }
    }
}

impl SourceSettings {
    /// Get the database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<String, SettingsError> {
        let path = expand_env_vars(&self.path)?;
        if path.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "source.path must not be empty".to_string(),
            ));
        }
        Ok(path)
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

/// Query execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Include statement text in debug logs.
    pub log_sql: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { log_sql: true }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, e.g. `"quarry=debug,info"`.
    pub filter: String,

    /// Colored output.
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
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
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `QUARRY_CONFIG`
    /// 2. `./quarry.toml`
    ///
    /// Falls back to defaults when neither exists.
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("QUARRY_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("quarry.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Return defaults if no config file found
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

        let var_name = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                name.push(ch);
            }
            name
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
