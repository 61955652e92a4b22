//! Host events consumed by the reporting pipeline.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Method recorded for telemetry synthesized from a finished scheduled job.
pub const CRON_METHOD: &str = "Cron";

/// One completed request, as reported by the host's HTTP server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingDetails {
    pub method: String,
    pub uri: String,
    /// Route template or operation name, used instead of `uri` for the operation tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub duration: Duration,
    pub status: u16,
    #[serde(default)]
    pub client_ip: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl TracingDetails {
    pub fn new(method: impl Into<String>, uri: impl Into<String>, duration: Duration, status: u16) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            duration,
            status,
            ..Self::default()
        }
    }

    /// Synthesize request details for a finished scheduled job.
    pub fn from_job(history: &JobHistory) -> Self {
        let status = if history.succeeded { 200 } else { 500 };
        Self::new(CRON_METHOD, history.job_name.clone(), history.duration, status)
    }

    /// `"{method} {operation}"`, where operation falls back to the uri.
    pub fn operation(&self) -> String {
        let name = self.operation_name.as_deref().unwrap_or(&self.uri);
        format!("{} {}", self.method, name)
    }
}

/// Outcome of one scheduled job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHistory {
    pub job_name: String,
    pub duration: Duration,
    pub succeeded: bool,
}

/// The kinds of events the bus routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    Tracing,
    JobFinished,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Error => "event.error",
            EventKind::Tracing => "event.tracing",
            EventKind::JobFinished => "event.job.finished",
        }
    }
}

pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// An event published on the host bus.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Error(SharedError),
    Tracing(Arc<TracingDetails>),
    JobFinished(JobHistory),
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Error(_) => EventKind::Error,
            HostEvent::Tracing(_) => EventKind::Tracing,
            HostEvent::JobFinished(_) => EventKind::JobFinished,
        }
    }

    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        HostEvent::Error(Arc::new(error))
    }

    pub fn error_message(message: impl Into<String>) -> Self {
        HostEvent::error(ReportedError(message.into()))
    }

    pub fn tracing(details: TracingDetails) -> Self {
        HostEvent::Tracing(Arc::new(details))
    }
}

/// Plain-text error for hosts that only have a message.
#[derive(Debug, Clone)]
pub struct ReportedError(pub String);

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for ReportedError {}
