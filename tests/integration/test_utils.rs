//! Shared test utilities for integration tests
//!
//! Builds runtime contexts over an in-memory transport and waits for the spawned
//! submissions that the bus and scheduler produce.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use insights_relay::config::{HostInfo, INSTRUMENTATION_KEY_ENV};
use insights_relay::telemetry::{Envelope, MemoryTransport};
use insights_relay::RuntimeContext;
use tokio::runtime::Handle;

pub fn host() -> HostInfo {
    HostInfo::new("orders-api", "3.1.0")
}

/// Runtime context on the current tokio runtime, recording into the returned transport.
pub fn memory_context() -> (RuntimeContext, MemoryTransport) {
    let transport = MemoryTransport::new();
    let ctx = RuntimeContext::with_handle(Handle::current(), host(), Arc::new(transport.clone()));
    (ctx, transport)
}

pub fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

pub fn env_key(key: &str) -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert(INSTRUMENTATION_KEY_ENV.to_string(), key.to_string());
    env
}

/// Poll until `predicate` holds over the recorded envelopes, or `timeout` passes.
pub async fn wait_for<F>(transport: &MemoryTransport, timeout: Duration, predicate: F) -> Vec<Envelope>
where
    F: Fn(&[Envelope]) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let envelopes = transport.envelopes();
        if predicate(&envelopes) || tokio::time::Instant::now() >= deadline {
            return envelopes;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
