//! Probe runner: one bounded HTTP GET per target.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ProbeTarget;
use crate::error::{InsightsError, ProbeTransportError};
use crate::telemetry::records::AvailabilityTelemetry;

const GENERIC_FAILURE: &str = "probe failed";

/// Outcome of one probe. `succeeded` is true exactly when `message` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityResult {
    name: String,
    target: String,
    duration: Duration,
    succeeded: bool,
    message: String,
}

impl AvailabilityResult {
    pub fn success(target: &ProbeTarget, duration: Duration) -> Self {
        Self {
            name: target.name.clone(),
            target: target.url.clone(),
            duration,
            succeeded: true,
            message: String::new(),
        }
    }

    /// A failed probe. An empty cause is replaced by a generic one.
    pub fn failure(target: &ProbeTarget, duration: Duration, cause: impl Into<String>) -> Self {
        let mut message = cause.into();
        if message.trim().is_empty() {
            message = GENERIC_FAILURE.to_string();
        }
        Self {
            name: target.name.clone(),
            target: target.url.clone(),
            duration,
            succeeded: false,
            message,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn to_telemetry(&self, run_location: Option<&str>) -> AvailabilityTelemetry {
        let mut record = AvailabilityTelemetry::new(self.name.clone(), self.duration, self.succeeded);
        record.message = self.message.clone();
        record.run_location = run_location.map(str::to_string);
        record
            .properties
            .insert("target".to_string(), self.target.clone());
        record
    }
}

/// Executes one availability check.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn run(&self, target: &ProbeTarget) -> AvailabilityResult;
}

/// HTTP GET probe. Only transport failures (connect, DNS, timeout) fail a probe unless
/// `fail_on_error_status` is set.
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
    fail_on_error_status: bool,
}

impl HttpProbe {
    pub fn new(timeout: Duration, fail_on_error_status: bool) -> Result<Self, InsightsError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| InsightsError::Http(format!("Failed to create probe client: {}", e)))?;
        Ok(Self {
            client,
            timeout,
            fail_on_error_status,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn check(&self, url: &str) -> Result<(), ProbeTransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeTransportError::from_reqwest(e, self.timeout))?;
        let status = response.status();
        drop(response);

        if self.fail_on_error_status && (status.is_client_error() || status.is_server_error()) {
            return Err(ProbeTransportError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn run(&self, target: &ProbeTarget) -> AvailabilityResult {
        let start = Instant::now();
        let outcome = self.check(&target.url).await;
        let duration = start.elapsed();

        match outcome {
            Ok(()) => {
                debug!(
                    name = %target.name,
                    target = %target.url,
                    duration = ?duration,
                    "target return OK"
                );
                AvailabilityResult::success(target, duration)
            }
            Err(err) => {
                warn!(
                    name = %target.name,
                    target = %target.url,
                    error = %err,
                    "target return error"
                );
                AvailabilityResult::failure(target, duration, err.to_string())
            }
        }
    }
}
