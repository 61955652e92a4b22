//! Configuration System
//!
//! Layered configuration built on the `config` crate: merge-policy defaults, then the
//! global config file, then the workspace files (or a single explicit file). Subsystems
//! read their own section through [`InsightsConfig::section`] and resolve it with the
//! [`SettingsResolver`].

use crate::error::ConfigurationError;
use crate::logging::LoggingConfig;
use serde::de::DeserializeOwned;
use std::path::Path;

mod merge {
    pub mod merge_policy;
}

pub mod sources {
    pub mod env_override;
    pub mod global_file;
    pub mod workspace_file;
}

pub mod settings;

pub use settings::{
    AvailabilitySettings, HostInfo, ProbeTarget, RequestMonitorSettings, SettingsResolver,
    TelemetryIdentity, AVAILABILITY_SECTION, IDENTITY_SECTION,
};
pub use sources::env_override::{EnvSource, ProcessEnv, INSTRUMENTATION_KEY_ENV};

/// Loaded configuration tree. Read-only once built.
#[derive(Debug, Clone)]
pub struct InsightsConfig {
    raw: config::Config,
}

impl InsightsConfig {
    /// Wrap an already built `config::Config`.
    pub fn from_raw(raw: config::Config) -> Self {
        Self { raw }
    }

    /// Deserialize the section at `key`, or `None` when the section is absent.
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigurationError> {
        match self.raw.get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(err) => Err(ConfigurationError::Load(err)),
        }
    }

    /// Whether a section is present at all.
    pub fn has_section(&self, key: &str) -> bool {
        self.raw.get::<config::Value>(key).is_ok()
    }

    /// Logging settings, defaulted when the section is missing or malformed.
    pub fn logging(&self) -> LoggingConfig {
        self.section::<LoggingConfig>("logging")
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

/// Builds [`InsightsConfig`] from files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the global file and the workspace files under `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<InsightsConfig, ConfigurationError> {
        let global = sources::global_file::global_config_path();
        Self::load_with_global(workspace_root, global.as_deref())
    }

    /// Like [`ConfigLoader::load`], with the global file taken from `global_path`
    /// (`None` skips the global layer).
    pub fn load_with_global(
        workspace_root: &Path,
        global_path: Option<&Path>,
    ) -> Result<InsightsConfig, ConfigurationError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder, global_path)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        Ok(InsightsConfig::from_raw(builder.build()?))
    }

    /// Load defaults plus exactly one file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<InsightsConfig, ConfigurationError> {
        let raw = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true))
            .build()?;
        Ok(InsightsConfig::from_raw(raw))
    }

    /// Load defaults plus an inline TOML document.
    pub fn from_toml_str(contents: &str) -> Result<InsightsConfig, ConfigurationError> {
        let raw = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        Ok(InsightsConfig::from_raw(raw))
    }

    /// Defaults only.
    pub fn defaults() -> Result<InsightsConfig, ConfigurationError> {
        let raw = merge::merge_policy::builder_with_defaults()?.build()?;
        Ok(InsightsConfig::from_raw(raw))
    }
}
