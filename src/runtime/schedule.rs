//! Recurring job scheduler.
//!
//! Each registered job gets one task that waits for the next fire time, runs the job to
//! completion, then waits again. Runs of the same job never overlap; fire times that pass
//! while a run is in progress are skipped. After every run a [`JobHistory`] is published
//! on the bus.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{ConfigurationError, InsightsError};
use crate::telemetry::events::{HostEvent, JobHistory};
use crate::telemetry::routing::bus::EventBus;

/// Parsed schedule expression.
#[derive(Debug, Clone)]
pub enum ScheduleSpec {
    /// Fixed period counted from registration.
    Every(Duration),
    /// Calendar schedule from cron fields, evaluated in UTC.
    Cron(Box<cron::Schedule>),
}

impl ScheduleSpec {
    /// Accepts `@every <duration>`, the descriptors `@hourly`, `@daily`, `@midnight`,
    /// `@weekly`, `@monthly`, `@yearly`, and cron expressions of five fields
    /// (minute first) or six and seven fields (second first, optional year).
    pub fn parse(expr: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidSchedule {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = expr.trim();
        if let Some(rest) = trimmed.strip_prefix("@every") {
            let period =
                humantime::parse_duration(rest.trim()).map_err(|e| invalid(&e.to_string()))?;
            if period.is_zero() {
                return Err(invalid("period must be greater than zero"));
            }
            return Ok(ScheduleSpec::Every(period));
        }

        let fields = match trimmed {
            "@hourly" => "0 0 * * * *".to_string(),
            "@daily" | "@midnight" => "0 0 0 * * *".to_string(),
            "@weekly" => "0 0 0 * * Sun".to_string(),
            "@monthly" => "0 0 0 1 * *".to_string(),
            "@yearly" | "@annually" => "0 0 0 1 1 *".to_string(),
            _ if trimmed.starts_with('@') => return Err(invalid("unknown descriptor")),
            _ => match trimmed.split_whitespace().count() {
                5 => format!("0 {}", trimmed),
                6 | 7 => trimmed.to_string(),
                _ => return Err(invalid("expected 5, 6 or 7 cron fields or `@every <duration>`")),
            },
        };

        let schedule = cron::Schedule::from_str(&fields).map_err(|e| invalid(&e.to_string()))?;
        if schedule.upcoming(Utc).next().is_none() {
            return Err(invalid("schedule never fires"));
        }
        Ok(ScheduleSpec::Cron(Box::new(schedule)))
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ScheduleSpec::Every(period) => chrono::Duration::from_std(*period)
                .ok()
                .and_then(|period| after.checked_add_signed(period)),
            ScheduleSpec::Cron(schedule) => schedule.after(&after).next(),
        }
    }
}

/// Registry of named recurring jobs. One registration per name.
pub struct Scheduler {
    handle: Handle,
    bus: Arc<EventBus>,
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(handle: Handle, bus: Arc<EventBus>) -> Self {
        Self {
            handle,
            bus,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Register `job` under `name` on the schedule `expr`.
    pub fn create_schedule<F, Fut>(&self, name: &str, expr: &str, job: F) -> Result<(), InsightsError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), InsightsError>> + Send + 'static,
    {
        let spec = ScheduleSpec::parse(expr)?;
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(name) {
            warn!(job = %name, "schedule already registered");
            return Err(ConfigurationError::DuplicateSchedule(name.to_string()).into());
        }

        let next = spec.next_after(Utc::now());
        let job_name = name.to_string();
        let bus = self.bus.clone();
        let task = self.handle.spawn(async move {
            match spec {
                ScheduleSpec::Every(period) => {
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    loop {
                        ticker.tick().await;
                        run_and_report(&job_name, &job, &bus).await;
                    }
                }
                ScheduleSpec::Cron(schedule) => {
                    let mut last = Utc::now();
                    loop {
                        let Some(next) = schedule.after(&last).next() else {
                            warn!(job = %job_name, "schedule has no further fire times");
                            return;
                        };
                        let delay = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                        tokio::time::sleep(delay).await;
                        run_and_report(&job_name, &job, &bus).await;
                        last = next.max(Utc::now());
                    }
                }
            }
        });
        jobs.insert(name.to_string(), task);
        info!(job = %name, schedule = %expr, next = ?next, "schedule created");
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.jobs.lock().contains_key(name)
    }

    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

async fn run_and_report<F, Fut>(name: &str, job: &F, bus: &EventBus)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), InsightsError>>,
{
    let history = run_job(name, job).await;
    bus.publish(HostEvent::JobFinished(history));
}

async fn run_job<F, Fut>(name: &str, job: &F) -> JobHistory
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), InsightsError>>,
{
    let started = Instant::now();
    let outcome = AssertUnwindSafe(async { job().await }).catch_unwind().await;
    let duration = started.elapsed();
    let succeeded = match outcome {
        Ok(Ok(())) => {
            debug!(job = %name, duration = ?duration, "scheduled job finished");
            true
        }
        Ok(Err(err)) => {
            warn!(job = %name, error = %err, "scheduled job failed");
            false
        }
        Err(_) => {
            error!(job = %name, "scheduled job panicked");
            false
        }
    };
    JobHistory {
        job_name: name.to_string(),
        duration,
        succeeded,
    }
}
