//! Telemetry transports. Delivery is fire-and-forget: nothing is returned, retried or buffered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::error::InsightsError;
use crate::telemetry::sinks::envelope::Envelope;

pub const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com/v2/track";

const INGESTION_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INGESTION_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hands one envelope to the backend.
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    fn send(&self, envelope: Envelope);

    /// Wait until every envelope handed to `send` so far has left the process.
    async fn flush(&self) {}
}

/// Count of spawned submissions that have not finished yet.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when a submission task ends, however it ends.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn new(in_flight: Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Posts each envelope to the ingestion endpoint on its own task.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    handle: Handle,
    in_flight: Arc<InFlight>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, handle: Handle) -> Result<Self, InsightsError> {
        let client = Client::builder()
            .connect_timeout(INGESTION_CONNECT_TIMEOUT)
            .timeout(INGESTION_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| InsightsError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            handle,
            in_flight: Arc::new(InFlight::default()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetryTransport for HttpTransport {
    fn send(&self, envelope: Envelope) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let guard = InFlightGuard::new(self.in_flight.clone());
        self.handle.spawn(async move {
            let _guard = guard;
            let base_type = envelope.data.base_type.clone();
            match client.post(&endpoint).json(&[envelope]).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(base_type = %base_type, "telemetry accepted");
                }
                Ok(response) => {
                    debug!(
                        base_type = %base_type,
                        status = response.status().as_u16(),
                        "telemetry rejected by ingestion endpoint"
                    );
                }
                Err(err) => {
                    debug!(base_type = %base_type, error = %err, "telemetry submission failed");
                }
            }
        });
    }

    /// Bounded by the client's request timeout.
    async fn flush(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            if self.in_flight.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Keeps envelopes in memory. For tests and dry runs.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    envelopes: Arc<Mutex<Vec<Envelope>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.envelopes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.envelopes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.envelopes.lock().clear();
    }
}

#[async_trait]
impl TelemetryTransport for MemoryTransport {
    fn send(&self, envelope: Envelope) {
        self.envelopes.lock().push(envelope);
    }
}

/// Writes each envelope to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl TelemetryTransport for LogTransport {
    fn send(&self, envelope: Envelope) {
        match serde_json::to_string(&envelope) {
            Ok(json) => info!(base_type = %envelope.data.base_type, envelope = %json, "telemetry (dry run)"),
            Err(err) => debug!(error = %err, "failed to serialize envelope"),
        }
    }
}
