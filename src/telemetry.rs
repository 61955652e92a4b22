//! Telemetry domain: host events, records, routing, sinks, and emission.

mod types;

pub mod events;
pub mod records;

pub mod emission {
    pub mod request_monitor;
}

pub mod routing {
    pub mod bus;
}

pub mod sinks {
    pub mod client;
    pub mod envelope;
    pub mod transport;
}

pub use emission::request_monitor::{RequestMonitor, REQUEST_MONITOR_SUBSCRIBER};
pub use events::{EventKind, HostEvent, JobHistory, TracingDetails};
pub use records::{
    AvailabilityTelemetry, RequestTelemetry, SeverityLevel, TelemetryRecord, TraceTelemetry,
};
pub use routing::bus::EventBus;
pub use sinks::client::{TelemetryClient, TelemetrySink};
pub use sinks::envelope::{Envelope, TelemetryTags};
pub use sinks::transport::{
    HttpTransport, LogTransport, MemoryTransport, TelemetryTransport, DEFAULT_INGESTION_ENDPOINT,
};
pub use types::{format_duration, new_record_id, now_millis};
