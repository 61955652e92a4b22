//! CLI route: run context and command dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::activation;
use crate::availability::AvailabilityMonitor;
use crate::cli::output::{format_probe_results, format_settings};
use crate::cli::parse::{Cli, Commands};
use crate::config::{ConfigLoader, EnvSource, HostInfo, InsightsConfig, ProcessEnv, SettingsResolver};
use crate::error::InsightsError;
use crate::runtime::RuntimeContext;
use crate::telemetry::{HttpTransport, LogTransport, TelemetryTransport};

/// Everything a command needs: loaded config, environment and the runtime context.
pub struct RunContext {
    config: InsightsConfig,
    env: Box<dyn EnvSource>,
    runtime: RuntimeContext,
}

impl RunContext {
    /// Load configuration and build the runtime context. Must be called inside a tokio runtime.
    pub fn new(cli: &Cli) -> Result<Self, InsightsError> {
        let config = load_config(cli.config.clone(), &cli.workspace)?;
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| InsightsError::Runtime(format!("no tokio runtime available: {}", e)))?;
        let transport: Arc<dyn TelemetryTransport> = if cli.dry_run {
            Arc::new(LogTransport)
        } else {
            Arc::new(HttpTransport::new(cli.endpoint.clone(), handle)?)
        };
        let runtime = RuntimeContext::new(HostInfo::default(), transport)?;
        Ok(Self {
            config,
            env: Box::new(ProcessEnv),
            runtime,
        })
    }

    pub fn runtime(&self) -> &RuntimeContext {
        &self.runtime
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, InsightsError> {
        match command {
            Commands::Run => self.run().await,
            Commands::Probe => self.probe().await,
            Commands::Settings => self.settings(),
        }
    }

    async fn run(&self) -> Result<String, InsightsError> {
        let activation = activation::enable(&self.runtime, &self.config, self.env.as_ref());
        if activation.is_empty() {
            return Err(InsightsError::Runtime(
                "nothing to run: both request monitoring and availability probing are disabled"
                    .to_string(),
            ));
        }
        info!("insights relay running, press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| InsightsError::Runtime(format!("failed to wait for Ctrl-C: {}", e)))?;
        self.runtime.transport().flush().await;
        Ok("stopped".to_string())
    }

    async fn probe(&self) -> Result<String, InsightsError> {
        let settings = self.resolver().resolve_availability()?;
        let monitor = AvailabilityMonitor::new(settings, self.runtime.transport())?;
        let results = monitor.run_cycle().await;
        self.runtime.transport().flush().await;
        Ok(format_probe_results(&results, true))
    }

    fn settings(&self) -> Result<String, InsightsError> {
        let resolver = self.resolver();
        let mut disabled = Vec::new();
        let monitor = match resolver.resolve_request_monitor() {
            Ok(mut settings) => {
                settings.identity = settings.identity.redacted();
                Some(settings)
            }
            Err(err) => {
                disabled.push(format!("monitor: {}", err));
                None
            }
        };
        let availability = match resolver.resolve_availability() {
            Ok(mut settings) => {
                settings.identity = settings.identity.redacted();
                Some(settings)
            }
            Err(err) => {
                disabled.push(format!("availability: {}", err));
                None
            }
        };
        format_settings(monitor.as_ref(), availability.as_ref(), disabled)
    }

    fn resolver(&self) -> SettingsResolver<'_> {
        SettingsResolver::new(&self.config, self.env.as_ref(), self.runtime.host())
    }
}

/// Load from an explicit file when given, otherwise from the workspace.
pub fn load_config(
    config_path: Option<PathBuf>,
    workspace: &std::path::Path,
) -> Result<InsightsConfig, InsightsError> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(&path)?,
        None => ConfigLoader::load(workspace)?,
    };
    Ok(config)
}
