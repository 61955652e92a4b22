//! Translates host error, request and job events into telemetry records.

use std::error::Error as StdError;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::RequestMonitorSettings;
use crate::error::{ConfigurationError, InsightsError};
use crate::telemetry::events::{EventKind, HostEvent, JobHistory, TracingDetails};
use crate::telemetry::records::{RequestTelemetry, SeverityLevel, TraceTelemetry};
use crate::telemetry::routing::bus::EventBus;
use crate::telemetry::sinks::client::TelemetrySink;
use crate::telemetry::sinks::transport::TelemetryTransport;

/// Name the monitor claims on the event bus.
pub const REQUEST_MONITOR_SUBSCRIBER: &str = "request-monitor";

pub const PROP_CLIENT_IP: &str = "client-ip";
pub const PROP_USER_AGENT: &str = "user-agent";
pub const PROP_DEVICE: &str = "device";
pub const PROP_REQUEST_BODY: &str = "req";
pub const PROP_RESPONSE_BODY: &str = "resp";
pub const MEASURE_REQUEST_SIZE: &str = "body-size";
pub const MEASURE_RESPONSE_SIZE: &str = "resp-size";

/// Stateless handlers over an immutable identity.
pub struct RequestMonitor {
    sink: TelemetrySink,
}

impl RequestMonitor {
    pub fn new(settings: RequestMonitorSettings, transport: Arc<dyn TelemetryTransport>) -> Self {
        Self {
            sink: TelemetrySink::new(settings.identity, transport),
        }
    }

    pub fn from_sink(sink: TelemetrySink) -> Self {
        Self { sink }
    }

    pub fn verbose_details(&self) -> bool {
        self.sink.identity().verbose_details
    }

    /// Bind the three handlers. Subscriptions live as long as the bus; a bus accepts one
    /// request monitor.
    pub fn subscribe(self: &Arc<Self>, bus: &EventBus) -> Result<(), InsightsError> {
        if !bus.register_subscriber(REQUEST_MONITOR_SUBSCRIBER) {
            warn!("request monitor already subscribed on this bus");
            return Err(
                ConfigurationError::DuplicateSubscription(REQUEST_MONITOR_SUBSCRIBER.to_string())
                    .into(),
            );
        }
        for kind in [EventKind::Error, EventKind::Tracing, EventKind::JobFinished] {
            let monitor = Arc::clone(self);
            bus.subscribe_async(kind, move |event| {
                let monitor = Arc::clone(&monitor);
                async move { monitor.handle(event) }
            });
        }
        info!(
            details = self.verbose_details(),
            "event subscribed for request telemetry"
        );
        Ok(())
    }

    pub fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::Error(err) => self.report_error(err.as_ref()),
            HostEvent::Tracing(details) => self.report_tracing(&details),
            HostEvent::JobFinished(history) => self.report_schedule_job(&history),
        }
    }

    pub fn report_error(&self, err: &(dyn StdError + Send + Sync + 'static)) {
        self.sink
            .submit(TraceTelemetry::new(err.to_string(), SeverityLevel::Error));
        debug!(error = %err, "tracing error done");
    }

    pub fn report_tracing(&self, details: &TracingDetails) {
        let record = self.request_telemetry(details);
        self.sink.submit_operation(details.operation(), record);
        debug!(operation = %details.operation(), "submit tracing done");
    }

    pub fn report_schedule_job(&self, history: &JobHistory) {
        self.report_tracing(&TracingDetails::from_job(history));
    }

    /// Build the request record. Body content is only attached when verbose details
    /// are enabled; otherwise only byte lengths leave the process.
    pub fn request_telemetry(&self, details: &TracingDetails) -> RequestTelemetry {
        let mut record = RequestTelemetry::new(
            &details.method,
            details.uri.clone(),
            details.duration,
            details.status,
        );
        record.source = details.client_ip.clone();
        record
            .properties
            .insert(PROP_CLIENT_IP.to_string(), details.client_ip.clone());
        record
            .properties
            .insert(PROP_USER_AGENT.to_string(), details.user_agent.clone());
        record
            .properties
            .insert(PROP_DEVICE.to_string(), details.device.clone());

        let verbose = self.verbose_details();
        let bodies = [
            (&details.request_body, PROP_REQUEST_BODY, MEASURE_REQUEST_SIZE),
            (&details.response_body, PROP_RESPONSE_BODY, MEASURE_RESPONSE_SIZE),
        ];
        for (body, property, measurement) in bodies {
            let Some(body) = body.as_deref().filter(|b| !b.is_empty()) else {
                continue;
            };
            if verbose {
                record.properties.insert(property.to_string(), body.to_string());
            }
            record
                .measurements
                .insert(measurement.to_string(), body.len() as f64);
        }
        record
    }
}
