//! Log output.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LoggingSettings, SettingsError};

/// Install a `tracing` fmt subscriber filtered by `settings.filter`.
///
/// Fails when the filter does not parse or a global subscriber is already
/// installed.
pub fn init(settings: &LoggingSettings) -> Result<(), SettingsError> {
    let filter = EnvFilter::try_new(&settings.filter).map_err(|e| {
        SettingsError::InvalidConfig(format!("invalid log filter `{}`: {e}", settings.filter))
    })?;

    fmt()
        .with_env_filter(filter)
        .with_ansi(settings.ansi)
        .with_target(true)
        .try_init()
        .map_err(|e| SettingsError::InvalidConfig(format!("logging already initialized: {e}")))
}
