//! Integration tests for the event bus to request telemetry pipeline

use std::time::Duration;

use insights_relay::config::ConfigLoader;
use insights_relay::enable_monitor;
use insights_relay::telemetry::{HostEvent, JobHistory, TracingDetails};

use super::test_utils::{env_key, memory_context, no_env, wait_for};

fn tracing_details() -> TracingDetails {
    let mut details = TracingDetails::new("POST", "/orders", Duration::from_millis(42), 201);
    details.client_ip = "10.0.0.7".to_string();
    details.user_agent = "curl/8.4".to_string();
    details.device = "desktop".to_string();
    details.request_body = Some("{\"card\":\"4111\"}".to_string());
    details.response_body = Some("{\"id\":1}".to_string());
    details
}

#[tokio::test]
async fn test_tracing_event_becomes_request_envelope() {
    let (ctx, transport) = memory_context();
    let config = ConfigLoader::from_toml_str("[tracing.azure]\nkey = \"pipe-key\"\n").unwrap();
    enable_monitor(&ctx, &config, &no_env()).unwrap();

    ctx.bus().publish(HostEvent::tracing(tracing_details()));
    let envelopes = wait_for(&transport, Duration::from_secs(2), |e| !e.is_empty()).await;

    assert_eq!(envelopes.len(), 1);
    let envelope = &envelopes[0];
    assert_eq!(envelope.base_type(), "RequestData");
    assert_eq!(envelope.name, "Microsoft.ApplicationInsights.pipekey.Request");
    assert_eq!(envelope.data.base_data["name"], "POST /orders");
    assert_eq!(envelope.data.base_data["responseCode"], "201");
    assert_eq!(envelope.data.base_data["success"], true);
    assert_eq!(envelope.data.base_data["duration"], "0.00:00:00.0420000");
    assert_eq!(envelope.tags["ai.cloud.role"], "orders-api");
    assert_eq!(envelope.tags["ai.application.ver"], "3.1.0");
    assert_eq!(envelope.tags["ai.operation.name"], "POST /orders");
    assert_eq!(envelope.property("client-ip"), Some("10.0.0.7"));
    assert_eq!(envelope.property("user-agent"), Some("curl/8.4"));
}

#[tokio::test]
async fn test_bodies_stay_private_without_details() {
    let (ctx, transport) = memory_context();
    let config = ConfigLoader::from_toml_str("[tracing.azure]\nkey = \"k\"\n").unwrap();
    enable_monitor(&ctx, &config, &no_env()).unwrap();

    ctx.bus().publish(HostEvent::tracing(tracing_details()));
    let envelopes = wait_for(&transport, Duration::from_secs(2), |e| !e.is_empty()).await;

    let envelope = &envelopes[0];
    assert_eq!(envelope.property("req"), None);
    assert_eq!(envelope.property("resp"), None);
    assert_eq!(envelope.measurement("body-size"), Some(15.0));
    assert_eq!(envelope.measurement("resp-size"), Some(8.0));
}

#[tokio::test]
async fn test_bodies_attached_with_details() {
    let (ctx, transport) = memory_context();
    let config =
        ConfigLoader::from_toml_str("[tracing.azure]\nkey = \"k\"\ndetails = true\n").unwrap();
    enable_monitor(&ctx, &config, &no_env()).unwrap();

    ctx.bus().publish(HostEvent::tracing(tracing_details()));
    let envelopes = wait_for(&transport, Duration::from_secs(2), |e| !e.is_empty()).await;

    let envelope = &envelopes[0];
    assert_eq!(envelope.property("req"), Some("{\"card\":\"4111\"}"));
    assert_eq!(envelope.property("resp"), Some("{\"id\":1}"));
}

#[tokio::test]
async fn test_error_event_becomes_error_trace() {
    let (ctx, transport) = memory_context();
    let config = ConfigLoader::defaults().unwrap();
    enable_monitor(&ctx, &config, &env_key("env-key")).unwrap();

    let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
    ctx.bus().publish(HostEvent::error(io));
    let envelopes = wait_for(&transport, Duration::from_secs(2), |e| !e.is_empty()).await;

    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].ikey, "env-key");
    assert_eq!(envelopes[0].base_type(), "MessageData");
    assert_eq!(envelopes[0].data.base_data["message"], "connection reset");
    assert_eq!(envelopes[0].data.base_data["severityLevel"], 3);
}

#[tokio::test]
async fn test_failed_job_becomes_failed_cron_request() {
    let (ctx, transport) = memory_context();
    let config = ConfigLoader::from_toml_str("[tracing.azure]\nkey = \"k\"\n").unwrap();
    enable_monitor(&ctx, &config, &no_env()).unwrap();

    ctx.bus().publish(HostEvent::JobFinished(JobHistory {
        job_name: "nightly-sync".to_string(),
        duration: Duration::from_secs(12),
        succeeded: false,
    }));
    let envelopes = wait_for(&transport, Duration::from_secs(2), |e| !e.is_empty()).await;

    let envelope = &envelopes[0];
    assert_eq!(envelope.data.base_data["name"], "Cron nightly-sync");
    assert_eq!(envelope.data.base_data["responseCode"], "500");
    assert_eq!(envelope.data.base_data["success"], false);
    assert_eq!(envelope.data.base_data["duration"], "0.00:00:12.0000000");
}

#[tokio::test]
async fn test_many_events_all_reported() {
    let (ctx, transport) = memory_context();
    let config = ConfigLoader::from_toml_str("[tracing.azure]\nkey = \"k\"\n").unwrap();
    enable_monitor(&ctx, &config, &no_env()).unwrap();

    for i in 0..20 {
        let details = TracingDetails::new("GET", format!("/items/{}", i), Duration::from_millis(i), 200);
        ctx.bus().publish(HostEvent::tracing(details));
    }
    let envelopes = wait_for(&transport, Duration::from_secs(2), |e| e.len() >= 20).await;

    assert_eq!(envelopes.len(), 20);
    assert!(envelopes.iter().all(|e| e.base_type() == "RequestData"));
}
