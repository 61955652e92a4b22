//! Wire envelope for the ingestion backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::telemetry::records::TelemetryRecord;
use crate::telemetry::types::{format_duration, new_record_id};

pub const TAG_CLOUD_ROLE: &str = "ai.cloud.role";
pub const TAG_APPLICATION_VERSION: &str = "ai.application.ver";
pub const TAG_OPERATION_NAME: &str = "ai.operation.name";

/// Context tags applied to every record a client tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryTags(BTreeMap<String, String>);

impl TelemetryTags {
    pub fn set(&mut self, tag: &str, value: impl Into<String>) {
        self.0.insert(tag.to_string(), value.into());
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn set_cloud_role(&mut self, role: impl Into<String>) {
        self.set(TAG_CLOUD_ROLE, role);
    }

    pub fn set_application_version(&mut self, version: impl Into<String>) {
        self.set(TAG_APPLICATION_VERSION, version);
    }

    pub fn set_operation_name(&mut self, name: impl Into<String>) {
        self.set(TAG_OPERATION_NAME, name);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeData {
    #[serde(rename = "baseType")]
    pub base_type: String,
    #[serde(rename = "baseData")]
    pub base_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub name: String,
    pub time: String,
    #[serde(rename = "iKey")]
    pub ikey: String,
    pub tags: BTreeMap<String, String>,
    pub data: EnvelopeData,
}

impl Envelope {
    pub fn new(key: &str, tags: &TelemetryTags, record: TelemetryRecord) -> Self {
        let (short_name, base_type, time, base_data) = match record {
            TelemetryRecord::Availability(a) => (
                "Availability",
                "AvailabilityData",
                a.timestamp,
                json!({
                    "ver": 2,
                    "id": new_record_id(),
                    "name": a.name,
                    "duration": format_duration(a.duration),
                    "success": a.success,
                    "runLocation": a.run_location,
                    "message": a.message,
                    "properties": a.properties,
                }),
            ),
            TelemetryRecord::Trace(t) => (
                "Message",
                "MessageData",
                t.timestamp,
                json!({
                    "ver": 2,
                    "message": t.message,
                    "severityLevel": t.severity as u8,
                    "properties": t.properties,
                }),
            ),
            TelemetryRecord::Request(r) => (
                "Request",
                "RequestData",
                r.timestamp,
                json!({
                    "ver": 2,
                    "id": new_record_id(),
                    "name": r.name,
                    "url": r.url,
                    "duration": format_duration(r.duration),
                    "responseCode": r.response_code,
                    "success": r.success,
                    "source": r.source,
                    "properties": r.properties,
                    "measurements": r.measurements,
                }),
            ),
        };

        Self {
            name: format!(
                "Microsoft.ApplicationInsights.{}.{}",
                key.replace('-', ""),
                short_name
            ),
            time,
            ikey: key.to_string(),
            tags: tags.0.clone(),
            data: EnvelopeData {
                base_type: base_type.to_string(),
                base_data,
            },
        }
    }

    pub fn base_type(&self) -> &str {
        &self.data.base_type
    }

    /// A `baseData.properties` entry.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.data.base_data.get("properties")?.get(name)?.as_str()
    }

    /// A `baseData.measurements` entry.
    pub fn measurement(&self, name: &str) -> Option<f64> {
        self.data.base_data.get("measurements")?.get(name)?.as_f64()
    }
}
