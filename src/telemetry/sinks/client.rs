//! Telemetry clients and the sink that creates them.

use std::sync::Arc;

use crate::config::TelemetryIdentity;
use crate::telemetry::records::TelemetryRecord;
use crate::telemetry::sinks::envelope::{Envelope, TelemetryTags};
use crate::telemetry::sinks::transport::TelemetryTransport;

/// Transport-bound client for one instrumentation key.
pub struct TelemetryClient {
    key: String,
    tags: TelemetryTags,
    transport: Arc<dyn TelemetryTransport>,
}

impl TelemetryClient {
    pub fn new(key: impl Into<String>, transport: Arc<dyn TelemetryTransport>) -> Self {
        Self {
            key: key.into(),
            tags: TelemetryTags::default(),
            transport,
        }
    }

    pub fn tags(&self) -> &TelemetryTags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TelemetryTags {
        &mut self.tags
    }

    pub fn track(&self, record: impl Into<TelemetryRecord>) {
        self.transport
            .send(Envelope::new(&self.key, &self.tags, record.into()));
    }
}

/// Tags and submits records for one identity. Holds no per-call state.
#[derive(Clone)]
pub struct TelemetrySink {
    identity: TelemetryIdentity,
    transport: Arc<dyn TelemetryTransport>,
}

impl TelemetrySink {
    pub fn new(identity: TelemetryIdentity, transport: Arc<dyn TelemetryTransport>) -> Self {
        Self {
            identity,
            transport,
        }
    }

    pub fn identity(&self) -> &TelemetryIdentity {
        &self.identity
    }

    /// A fresh client tagged with role and version, each only when non-empty.
    pub fn client(&self) -> TelemetryClient {
        let mut client = TelemetryClient::new(self.identity.key.clone(), self.transport.clone());
        if !self.identity.role.is_empty() {
            client.tags_mut().set_cloud_role(self.identity.role.clone());
        }
        if !self.identity.version.is_empty() {
            client
                .tags_mut()
                .set_application_version(self.identity.version.clone());
        }
        client
    }

    pub fn submit(&self, record: impl Into<TelemetryRecord>) {
        self.client().track(record);
    }

    /// Submit with the operation name tag set.
    pub fn submit_operation(&self, operation_name: impl Into<String>, record: impl Into<TelemetryRecord>) {
        let mut client = self.client();
        client.tags_mut().set_operation_name(operation_name);
        client.track(record);
    }
}
