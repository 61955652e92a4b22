//! Insights Relay: availability probing and request telemetry forwarding
//!
//! Periodically probes configured HTTP endpoints and reports availability results, and
//! forwards in-process request, error and job-finished events as structured telemetry
//! to a remote ingestion backend.

pub mod activation;
pub mod availability;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod telemetry;

pub use activation::{enable, enable_availability, enable_monitor, Activation};
pub use error::{ConfigurationError, InsightsError, ProbeTransportError};
pub use runtime::RuntimeContext;
