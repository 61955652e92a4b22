//! Availability cycle and its schedule binding.

use std::sync::Arc;

use tracing::info;

use crate::availability::probe::{AvailabilityResult, HttpProbe, Probe};
use crate::config::AvailabilitySettings;
use crate::error::InsightsError;
use crate::runtime::Scheduler;
use crate::telemetry::sinks::client::TelemetrySink;
use crate::telemetry::sinks::transport::TelemetryTransport;

/// Name the availability cycle is scheduled under.
pub const AVAILABILITY_JOB: &str = "availability-monitor";

pub struct AvailabilityMonitor {
    settings: AvailabilitySettings,
    probe: Arc<dyn Probe>,
    sink: TelemetrySink,
}

impl AvailabilityMonitor {
    /// Monitor with an HTTP probe built from the settings.
    pub fn new(settings: AvailabilitySettings, transport: Arc<dyn TelemetryTransport>) -> Result<Self, InsightsError> {
        let probe = HttpProbe::new(settings.timeout, settings.fail_on_error_status)?;
        Ok(Self::with_probe(settings, Arc::new(probe), transport))
    }

    pub fn with_probe(
        settings: AvailabilitySettings,
        probe: Arc<dyn Probe>,
        transport: Arc<dyn TelemetryTransport>,
    ) -> Self {
        let sink = TelemetrySink::new(settings.identity.clone(), transport);
        Self {
            settings,
            probe,
            sink,
        }
    }

    pub fn settings(&self) -> &AvailabilitySettings {
        &self.settings
    }

    /// Probe every target in order, one at a time, submitting each result.
    pub async fn run_cycle(&self) -> Vec<AvailabilityResult> {
        let mut results = Vec::with_capacity(self.settings.targets.len());
        for target in &self.settings.targets {
            let result = self.probe.run(target).await;
            self.sink
                .submit(result.to_telemetry(self.settings.run_location.as_deref()));
            results.push(result);
        }
        results
    }

    /// Register the cycle with the scheduler.
    pub fn start(self: &Arc<Self>, scheduler: &Scheduler) -> Result<(), InsightsError> {
        let monitor = Arc::clone(self);
        scheduler.create_schedule(AVAILABILITY_JOB, &self.settings.cron, move || {
            let monitor = Arc::clone(&monitor);
            async move {
                monitor.run_cycle().await;
                Ok(())
            }
        })?;
        info!(
            schedule = %self.settings.cron,
            targets = self.settings.targets.len(),
            "availability monitor started"
        );
        Ok(())
    }
}
