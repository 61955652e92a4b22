//! Settings resolution: built-in defaults, then the config-file section, then the
//! environment override for the instrumentation key.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::sources::env_override::{self, EnvSource};
use super::InsightsConfig;
use crate::error::ConfigurationError;
use crate::runtime::schedule::ScheduleSpec;

/// Section holding the telemetry identity.
pub const IDENTITY_SECTION: &str = "tracing.azure";
/// Section holding the availability probe settings.
pub const AVAILABILITY_SECTION: &str = "tracing.available";

pub const DEFAULT_AVAILABILITY_CRON: &str = "@every 5m";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TARGET_NAME: &str = "local";
pub const DEFAULT_TARGET_URL: &str = "http://127.0.0.1:5000/healthz";

/// Name and version of the hosting application. Used as identity defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub app_name: String,
    pub version: String,
}

impl HostInfo {
    pub fn new(app_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            version: version.into(),
        }
    }
}

impl Default for HostInfo {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

/// Who is reporting, and how much detail to send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryIdentity {
    pub key: String,
    pub role: String,
    pub version: String,
    #[serde(rename = "details")]
    pub verbose_details: bool,
}

impl TelemetryIdentity {
    /// Copy with the key masked, for display.
    pub fn redacted(&self) -> Self {
        let key = match self.key.chars().count() {
            0 => String::new(),
            n if n <= 4 => "****".to_string(),
            _ => format!("{}****", self.key.chars().take(4).collect::<String>()),
        };
        Self {
            key,
            ..self.clone()
        }
    }
}

/// One configured availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub name: String,
    #[serde(alias = "target")]
    pub url: String,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Settings of the request/error/job monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMonitorSettings {
    pub identity: TelemetryIdentity,
}

/// Settings of the availability prober.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilitySettings {
    pub identity: TelemetryIdentity,
    pub cron: String,
    pub targets: Vec<ProbeTarget>,
    #[serde(with = "duration_text")]
    pub timeout: Duration,
    /// When set, a completed request with a 4xx/5xx status also fails the probe.
    pub fail_on_error_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_location: Option<String>,
}

/// Field-level overlay of `[tracing.azure]`. Only present fields override.
#[derive(Debug, Default, Deserialize)]
struct IdentityOverlay {
    key: Option<String>,
    role: Option<String>,
    version: Option<String>,
    details: Option<bool>,
}

/// Field-level overlay of `[tracing.available]`.
#[derive(Debug, Default, Deserialize)]
struct AvailabilityOverlay {
    cron: Option<String>,
    #[serde(alias = "targets")]
    tests: Option<Vec<ProbeTarget>>,
    timeout: Option<String>,
    fail_on_error_status: Option<bool>,
    run_location: Option<String>,
}

/// Resolves subsystem settings from the three layers.
pub struct SettingsResolver<'a> {
    config: &'a InsightsConfig,
    env: &'a dyn EnvSource,
    host: &'a HostInfo,
}

impl<'a> SettingsResolver<'a> {
    pub fn new(config: &'a InsightsConfig, env: &'a dyn EnvSource, host: &'a HostInfo) -> Self {
        Self { config, env, host }
    }

    /// Resolve the telemetry identity. Fails when no layer provides a key.
    pub fn resolve_identity(&self) -> Result<TelemetryIdentity, ConfigurationError> {
        let mut identity = TelemetryIdentity {
            key: String::new(),
            role: self.host.app_name.clone(),
            version: self.host.version.clone(),
            verbose_details: false,
        };

        if let Some(overlay) = self.config.section::<IdentityOverlay>(IDENTITY_SECTION)? {
            if let Some(key) = overlay.key {
                identity.key = key.trim().to_string();
            }
            if let Some(role) = overlay.role {
                identity.role = role;
            }
            if let Some(version) = overlay.version {
                identity.version = version;
            }
            if let Some(details) = overlay.details {
                identity.verbose_details = details;
            }
        }

        if let Some(key) = env_override::instrumentation_key(self.env) {
            identity.key = key;
            info!(
                env = env_override::INSTRUMENTATION_KEY_ENV,
                "read instrumentation key from environment"
            );
        }

        if identity.key.is_empty() {
            return Err(ConfigurationError::MissingKey {
                section: IDENTITY_SECTION.to_string(),
            });
        }
        Ok(identity)
    }

    pub fn resolve_request_monitor(&self) -> Result<RequestMonitorSettings, ConfigurationError> {
        Ok(RequestMonitorSettings {
            identity: self.resolve_identity()?,
        })
    }

    /// Resolve availability settings. The identity must resolve too.
    pub fn resolve_availability(&self) -> Result<AvailabilitySettings, ConfigurationError> {
        let mut settings = AvailabilitySettings {
            identity: TelemetryIdentity::default(),
            cron: DEFAULT_AVAILABILITY_CRON.to_string(),
            targets: Vec::new(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            fail_on_error_status: false,
            run_location: None,
        };

        if let Some(overlay) = self
            .config
            .section::<AvailabilityOverlay>(AVAILABILITY_SECTION)?
        {
            if let Some(cron) = overlay.cron {
                settings.cron = cron;
            }
            if let Some(targets) = overlay.tests {
                settings.targets = targets;
            }
            if let Some(timeout) = overlay.timeout {
                settings.timeout = humantime::parse_duration(timeout.trim()).map_err(|e| {
                    ConfigurationError::InvalidValue {
                        key: format!("{}.timeout", AVAILABILITY_SECTION),
                        reason: e.to_string(),
                    }
                })?;
            }
            if let Some(flag) = overlay.fail_on_error_status {
                settings.fail_on_error_status = flag;
            }
            settings.run_location = overlay.run_location.filter(|s| !s.is_empty());
        }

        settings.identity = self.resolve_identity()?;

        if settings.targets.is_empty() {
            settings.targets = vec![ProbeTarget::new(DEFAULT_TARGET_NAME, DEFAULT_TARGET_URL)];
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl AvailabilitySettings {
    /// Check schedule syntax, target URLs and target name uniqueness.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ScheduleSpec::parse(&self.cron)?;

        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidValue {
                key: format!("{}.timeout", AVAILABILITY_SECTION),
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(ConfigurationError::InvalidTarget {
                    name: target.url.clone(),
                    reason: "name cannot be empty".to_string(),
                });
            }
            let url = reqwest::Url::parse(&target.url).map_err(|e| {
                ConfigurationError::InvalidTarget {
                    name: target.name.clone(),
                    reason: e.to_string(),
                }
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigurationError::InvalidTarget {
                    name: target.name.clone(),
                    reason: format!("unsupported scheme `{}`", url.scheme()),
                });
            }
            if !seen.insert(target.name.as_str()) {
                return Err(ConfigurationError::DuplicateTarget(target.name.clone()));
            }
        }
        Ok(())
    }
}

mod duration_text {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }
}
