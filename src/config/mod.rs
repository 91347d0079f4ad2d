//! Configuration module for quarry.
//!
//! Handles data source, query and logging settings plus environment variables.

mod settings;

pub use settings::{
    expand_env_vars, LoggingSettings, QuerySettings, Settings, SettingsError, SourceSettings,
};
