//! In-process event bus for host events.
//!
//! Each published event is delivered to every handler subscribed to its kind, one
//! spawned task per handler. Publishers never wait for handlers and no ordering is
//! kept between handlers or between events. Named subscribers register at most once
//! per bus.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::error;

use crate::telemetry::events::{EventKind, HostEvent};

type Handler = Arc<dyn Fn(HostEvent) -> BoxFuture<'static, ()> + Send + Sync>;

pub struct EventBus {
    handle: Handle,
    subscribers: RwLock<HashMap<EventKind, Vec<Handler>>>,
    names: Mutex<HashSet<String>>,
    published: AtomicU64,
}

impl EventBus {
    /// Handlers will be spawned on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            subscribers: RwLock::new(HashMap::new()),
            names: Mutex::new(HashSet::new()),
            published: AtomicU64::new(0),
        }
    }

    /// Claim `name` for a subscriber. Returns false when the name is already taken.
    pub fn register_subscriber(&self, name: &str) -> bool {
        self.names.lock().insert(name.to_string())
    }

    pub fn has_subscriber(&self, name: &str) -> bool {
        self.names.lock().contains(name)
    }

    /// Register an asynchronous handler for one event kind. Subscriptions last as long
    /// as the bus.
    pub fn subscribe_async<F, Fut>(&self, kind: EventKind, handler: F)
    where
        F: Fn(HostEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |event| handler(event).boxed());
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push(handler);
    }

    /// Deliver an event to every subscriber of its kind. Returns the number of handlers
    /// the event was handed to.
    pub fn publish(&self, event: HostEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .subscribers
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            let handler = handler.clone();
            let event = event.clone();
            self.handle.spawn(async move {
                let delivery = AssertUnwindSafe(async move { handler(event).await }).catch_unwind();
                if delivery.await.is_err() {
                    error!(event = kind.as_str(), "event handler panicked");
                }
            });
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Total number of events published since creation.
    pub fn total_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
