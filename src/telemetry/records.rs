//! Telemetry record kinds: availability, trace and request.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::types::now_rfc3339;

/// Trace severity, numbered as the ingestion backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityLevel {
    Verbose = 0,
    Information = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityTelemetry {
    pub timestamp: String,
    pub name: String,
    pub duration: Duration,
    pub success: bool,
    pub message: String,
    pub run_location: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl AvailabilityTelemetry {
    pub fn new(name: impl Into<String>, duration: Duration, success: bool) -> Self {
        Self {
            timestamp: now_rfc3339(),
            name: name.into(),
            duration,
            success,
            message: String::new(),
            run_location: None,
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceTelemetry {
    pub timestamp: String,
    pub message: String,
    pub severity: SeverityLevel,
    pub properties: BTreeMap<String, String>,
}

impl TraceTelemetry {
    pub fn new(message: impl Into<String>, severity: SeverityLevel) -> Self {
        Self {
            timestamp: now_rfc3339(),
            message: message.into(),
            severity,
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestTelemetry {
    pub timestamp: String,
    pub name: String,
    pub url: String,
    pub duration: Duration,
    pub response_code: String,
    pub success: bool,
    pub source: String,
    pub properties: BTreeMap<String, String>,
    pub measurements: BTreeMap<String, f64>,
}

impl RequestTelemetry {
    /// Name is `"{method} {url}"`; success follows the response code.
    pub fn new(method: &str, url: impl Into<String>, duration: Duration, status: u16) -> Self {
        let url = url.into();
        Self {
            timestamp: now_rfc3339(),
            name: format!("{} {}", method, url),
            url,
            duration,
            response_code: status.to_string(),
            success: status_is_success(status),
            source: String::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }
}

/// 401 counts as success: an auth challenge is a working endpoint.
pub fn status_is_success(status: u16) -> bool {
    status < 400 || status == 401
}

/// Any record the sink can submit.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryRecord {
    Availability(AvailabilityTelemetry),
    Trace(TraceTelemetry),
    Request(RequestTelemetry),
}

impl TelemetryRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryRecord::Availability(_) => "availability",
            TelemetryRecord::Trace(_) => "trace",
            TelemetryRecord::Request(_) => "request",
        }
    }
}

impl From<AvailabilityTelemetry> for TelemetryRecord {
    fn from(value: AvailabilityTelemetry) -> Self {
        TelemetryRecord::Availability(value)
    }
}

impl From<TraceTelemetry> for TelemetryRecord {
    fn from(value: TraceTelemetry) -> Self {
        TelemetryRecord::Trace(value)
    }
}

impl From<RequestTelemetry> for TelemetryRecord {
    fn from(value: RequestTelemetry) -> Self {
        TelemetryRecord::Request(value)
    }
}
