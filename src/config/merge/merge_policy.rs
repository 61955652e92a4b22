//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

use crate::logging::{default_format, default_log_level, default_output};

/// Create a Config builder with merge policy defaults applied.
///
/// Only the logging section has builder-level defaults. The `tracing.*` sections
/// must stay absent unless a file provides them, since their absence is meaningful
/// to the settings resolver.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("logging.level", default_log_level())?
        .set_default("logging.format", default_format())?
        .set_default("logging.output", default_output())
}
