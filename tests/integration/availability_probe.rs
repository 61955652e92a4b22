//! Integration tests for HTTP probing and the scheduled availability cycle

use std::sync::Arc;
use std::time::{Duration, Instant};

use insights_relay::availability::{AvailabilityMonitor, HttpProbe, Probe};
use insights_relay::config::{AvailabilitySettings, ConfigLoader, ProbeTarget, TelemetryIdentity};
use insights_relay::enable;
use insights_relay::telemetry::MemoryTransport;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::test_utils::{memory_context, no_env, wait_for};

async fn server_returning(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn settings_for(targets: Vec<ProbeTarget>) -> AvailabilitySettings {
    AvailabilitySettings {
        identity: TelemetryIdentity {
            key: "probe-key".to_string(),
            role: "orders-api".to_string(),
            version: "3.1.0".to_string(),
            verbose_details: false,
        },
        cron: "@every 5m".to_string(),
        targets,
        timeout: Duration::from_secs(2),
        fail_on_error_status: false,
        run_location: Some("ci".to_string()),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reachable_target_succeeds() {
    let server = server_returning(200).await;
    let target = ProbeTarget::new("local", format!("{}/healthz", server.uri()));

    let probe = HttpProbe::new(Duration::from_secs(2), false).unwrap();
    let result = probe.run(&target).await;

    assert!(result.succeeded());
    assert!(result.message().is_empty());
    assert_eq!(result.name(), "local");
    assert_eq!(result.target(), target.url);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_status_still_counts_as_available() {
    let server = server_returning(500).await;
    let target = ProbeTarget::new("local", format!("{}/healthz", server.uri()));

    let probe = HttpProbe::new(Duration::from_secs(2), false).unwrap();
    let result = probe.run(&target).await;

    assert!(result.succeeded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_status_fails_when_opted_in() {
    let server = server_returning(503).await;
    let target = ProbeTarget::new("local", format!("{}/healthz", server.uri()));

    let probe = HttpProbe::new(Duration::from_secs(2), true).unwrap();
    let result = probe.run(&target).await;

    assert!(!result.succeeded());
    assert!(result.message().contains("503"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_target_is_bounded_by_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let target = ProbeTarget::new("slow", format!("{}/healthz", server.uri()));

    let probe = HttpProbe::new(Duration::from_millis(300), false).unwrap();
    let started = Instant::now();
    let result = probe.run(&target).await;

    assert!(!result.succeeded());
    assert!(!result.message().is_empty());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_target_fails() {
    let target = ProbeTarget::new("gone", "http://127.0.0.1:1/healthz");

    let probe = HttpProbe::new(Duration::from_secs(2), false).unwrap();
    let result = probe.run(&target).await;

    assert!(!result.succeeded());
    assert!(!result.message().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cycle_reports_every_target_in_order() {
    let up = server_returning(200).await;
    let transport = MemoryTransport::new();
    let monitor = AvailabilityMonitor::new(
        settings_for(vec![
            ProbeTarget::new("up", format!("{}/healthz", up.uri())),
            ProbeTarget::new("down", "http://127.0.0.1:1/healthz"),
        ]),
        Arc::new(transport.clone()),
    )
    .unwrap();

    let results = monitor.run_cycle().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name(), "up");
    assert!(results[0].succeeded());
    assert_eq!(results[1].name(), "down");
    assert!(!results[1].succeeded());

    let envelopes = transport.envelopes();
    assert_eq!(envelopes.len(), 2);
    assert!(envelopes.iter().all(|e| e.base_type() == "AvailabilityData"));
    assert_eq!(envelopes[0].data.base_data["name"], "up");
    assert_eq!(envelopes[0].data.base_data["success"], true);
    assert_eq!(envelopes[0].data.base_data["runLocation"], "ci");
    assert_eq!(envelopes[1].data.base_data["success"], false);
    assert_eq!(envelopes[1].property("target"), Some("http://127.0.0.1:1/healthz"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scheduled_cycle_reports_availability_and_job_run() {
    let server = server_returning(200).await;
    let toml = format!(
        "[tracing.azure]\nkey = \"sched-key\"\nrole = \"orders-api\"\n\n\
         [tracing.available]\ncron = \"@every 200ms\"\ntimeout = \"1s\"\n\
         tests = [{{ name = \"local\", target = \"{}/healthz\" }}]\n",
        server.uri()
    );
    let config = ConfigLoader::from_toml_str(&toml).unwrap();
    let (ctx, transport) = memory_context();

    let activation = enable(&ctx, &config, &no_env());
    assert!(activation.monitor.is_some());
    assert!(activation.availability.is_some());

    let envelopes = wait_for(&transport, Duration::from_secs(5), |e| {
        e.iter().any(|e| e.base_type() == "AvailabilityData")
            && e.iter().any(|e| e.base_type() == "RequestData")
    })
    .await;

    let availability = envelopes
        .iter()
        .find(|e| e.base_type() == "AvailabilityData")
        .expect("availability record");
    assert_eq!(availability.data.base_data["name"], "local");
    assert_eq!(availability.data.base_data["success"], true);
    assert_eq!(availability.ikey, "sched-key");

    let job = envelopes
        .iter()
        .find(|e| e.base_type() == "RequestData")
        .expect("job request record");
    assert_eq!(job.data.base_data["responseCode"], "200");
    assert!(job.data.base_data["name"]
        .as_str()
        .unwrap()
        .starts_with("Cron "));
}
