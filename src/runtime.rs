//! Runtime context: the explicitly owned bus, scheduler and transport shared by the
//! subsystems of one host process.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::HostInfo;
use crate::error::InsightsError;
use crate::telemetry::routing::bus::EventBus;
use crate::telemetry::sinks::transport::TelemetryTransport;

pub mod schedule;

pub use schedule::{ScheduleSpec, Scheduler};

pub struct RuntimeContext {
    host: HostInfo,
    bus: Arc<EventBus>,
    scheduler: Scheduler,
    transport: Arc<dyn TelemetryTransport>,
}

impl RuntimeContext {
    /// Build a context on the current tokio runtime.
    pub fn new(host: HostInfo, transport: Arc<dyn TelemetryTransport>) -> Result<Self, InsightsError> {
        let handle = Handle::try_current()
            .map_err(|e| InsightsError::Runtime(format!("no tokio runtime available: {}", e)))?;
        Ok(Self::with_handle(handle, host, transport))
    }

    pub fn with_handle(handle: Handle, host: HostInfo, transport: Arc<dyn TelemetryTransport>) -> Self {
        let bus = Arc::new(EventBus::new(handle.clone()));
        let scheduler = Scheduler::new(handle, bus.clone());
        Self {
            host,
            bus,
            scheduler,
            transport,
        }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn transport(&self) -> Arc<dyn TelemetryTransport> {
        self.transport.clone()
    }
}
