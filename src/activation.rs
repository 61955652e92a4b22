//! Host entry points. Each subsystem activates independently; a subsystem whose
//! settings do not resolve stays off without affecting the other or the host.

use std::sync::Arc;

use tracing::{info, warn};

use crate::availability::AvailabilityMonitor;
use crate::config::{EnvSource, InsightsConfig, SettingsResolver};
use crate::error::InsightsError;
use crate::runtime::RuntimeContext;
use crate::telemetry::RequestMonitor;

/// What [`enable`] managed to switch on.
#[derive(Default)]
pub struct Activation {
    pub monitor: Option<Arc<RequestMonitor>>,
    pub availability: Option<Arc<AvailabilityMonitor>>,
}

impl Activation {
    pub fn is_empty(&self) -> bool {
        self.monitor.is_none() && self.availability.is_none()
    }
}

/// Subscribe request/error/job telemetry on the context's bus.
pub fn enable_monitor(
    ctx: &RuntimeContext,
    config: &InsightsConfig,
    env: &dyn EnvSource,
) -> Result<Arc<RequestMonitor>, InsightsError> {
    let settings = SettingsResolver::new(config, env, ctx.host()).resolve_request_monitor()?;
    let monitor = Arc::new(RequestMonitor::new(settings, ctx.transport()));
    monitor.subscribe(ctx.bus())?;
    Ok(monitor)
}

/// Schedule the availability cycle on the context's scheduler.
pub fn enable_availability(
    ctx: &RuntimeContext,
    config: &InsightsConfig,
    env: &dyn EnvSource,
) -> Result<Arc<AvailabilityMonitor>, InsightsError> {
    let settings = SettingsResolver::new(config, env, ctx.host()).resolve_availability()?;
    let monitor = Arc::new(AvailabilityMonitor::new(settings, ctx.transport())?);
    monitor.start(ctx.scheduler())?;
    Ok(monitor)
}

/// Enable both subsystems. Failures are logged once each and leave that subsystem off.
pub fn enable(ctx: &RuntimeContext, config: &InsightsConfig, env: &dyn EnvSource) -> Activation {
    let monitor = match enable_monitor(ctx, config, env) {
        Ok(monitor) => Some(monitor),
        Err(err) if err.is_missing_key() => {
            warn!("no instrumentation key provided, request monitoring disabled");
            None
        }
        Err(err) => {
            warn!(error = %err, "request monitoring disabled");
            None
        }
    };

    let availability = match enable_availability(ctx, config, env) {
        Ok(monitor) => Some(monitor),
        Err(err) if err.is_missing_key() => {
            warn!("no instrumentation key provided, availability probing disabled");
            None
        }
        Err(err) => {
            warn!(error = %err, "availability probing disabled");
            None
        }
    };

    info!(
        monitor = monitor.is_some(),
        availability = availability.is_some(),
        "insights activation finished"
    );
    Activation {
        monitor,
        availability,
    }
}
