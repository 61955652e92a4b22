//! Shared telemetry helpers: timestamps, record ids and duration formatting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};

static RECORD_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Current time as milliseconds since Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a unique record id.
pub fn new_record_id() -> String {
    let ts = now_millis();
    let pid = std::process::id();
    let seq = RECORD_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{ts:x}-{pid:x}-{seq:x}")
}

/// Format a duration as `d.hh:mm:ss.fffffff` (100ns ticks), the ingestion wire form.
pub fn format_duration(duration: Duration) -> String {
    let ticks = duration.as_nanos() / 100;
    let fraction = ticks % 10_000_000;
    let total_secs = duration.as_secs();
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = (total_secs / 3_600) % 24;
    let days = total_secs / 86_400;
    format!("{days}.{hours:02}:{mins:02}:{secs:02}.{fraction:07}")
}
