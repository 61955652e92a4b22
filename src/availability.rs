//! Availability probing: scheduled HTTP checks reported as availability telemetry.

pub mod monitor;
pub mod probe;

pub use monitor::{AvailabilityMonitor, AVAILABILITY_JOB};
pub use probe::{AvailabilityResult, HttpProbe, Probe};
