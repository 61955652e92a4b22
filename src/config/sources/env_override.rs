//! Environment source for the instrumentation key override.

use std::collections::HashMap;

/// Environment variable that overrides the configured instrumentation key.
pub const INSTRUMENTATION_KEY_ENV: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";

/// Read access to environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// The key override, if the variable is set to a non-empty value.
pub fn instrumentation_key(env: &dyn EnvSource) -> Option<String> {
    env.var(INSTRUMENTATION_KEY_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
