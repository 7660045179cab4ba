use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_RECURRENCE_MARGIN_DAYS, DEFAULT_RECURRENCE_MAX_INSTANCES};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceConfig {
    /// Days added on each side of a query interval when the expansion cache
    /// has to be rebuilt.
    pub margin_days: u32,
    /// Hard stop for a single expansion pass.
    pub max_instances: u32,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            margin_days: DEFAULT_RECURRENCE_MARGIN_DAYS,
            max_instances: DEFAULT_RECURRENCE_MAX_INSTANCES,
        }
    }
}

impl RecurrenceConfig {
    /// ## Summary
    /// Checks that an expansion can produce at least one instance.
    ///
    /// ## Errors
    /// Returns `ConfigError` if `max_instances` is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_instances == 0 {
            return Err(CoreError::ConfigError(
                "recurrence.max_instances must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `calvault.toml`, `.env` and `CALVAULT__*`
    /// environment variables into a `Settings`.
    ///
    /// ## Errors
    /// Returns an error if building, deserializing or validating the
    /// configuration fails.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("recurrence.margin_days", i64::from(DEFAULT_RECURRENCE_MARGIN_DAYS))?
            .set_default("recurrence.max_instances", i64::from(DEFAULT_RECURRENCE_MAX_INSTANCES))?
            .add_source(
                config::Environment::with_prefix("CALVAULT")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("calvault.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.recurrence.validate()?;
        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(
        level = %settings.logging.level,
        margin_days = settings.recurrence.margin_days,
        "Configuration loaded"
    );
    Ok(settings)
}
