//! Merge rules: built-in defaults that every other source layers on top of.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("batch.delay_ms", 3_000i64)?
        .set_default("batch.auto_download", false)?
        .set_default("batch.output_dir", "models")?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
