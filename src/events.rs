//! Per-query events and their consumers.
//!
//! Every completed query produces one [`QueryInfo`]. It is logged, handed to
//! the registered [`QuerySink`]s and pushed as JSON to live subscribers.

use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// How a single query was answered.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QueryInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub qtype: String,
    pub client: String,
    pub blocked: bool,
    pub cached: bool,
    pub forwarded: bool,
    /// Assigned when the event is emitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl QueryInfo {
    pub fn new(name: impl Into<String>, qtype: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qtype: qtype.into(),
            client: client.into(),
            blocked: false,
            cached: false,
            forwarded: false,
            timestamp: None,
        }
    }

    fn outcome(&self) -> &'static str {
        if self.blocked {
            "BLOCKED"
        } else if self.cached {
            "CACHED"
        } else if self.forwarded {
            "FORWARDED"
        } else {
            "LOCAL"
        }
    }
}

/// Consumer of completed query events (query history, statistics, ...).
pub trait QuerySink: Send + Sync {
    fn record(&self, info: &QueryInfo, elapsed: Duration);
}

#[derive(Serialize)]
struct QueryEvent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    query: &'a QueryInfo,
}

/// Handle returned by [`Subscribers::subscribe`].
pub type SubscriberId = u64;

/// Registry of live subscribers (e.g. dashboard connections).
///
/// Delivery is best-effort: a subscriber whose channel is closed is dropped
/// from the registry on the next broadcast.
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    senders: Mutex<FxHashMap<SubscriberId, mpsc::UnboundedSender<String>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> (SubscriberId, mpsc::UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded();
        if let Ok(mut senders) = self.senders.lock() {
            senders.insert(id, tx);
        }
        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.remove(&id);
        }
    }

    pub fn broadcast(&self, message: &str) {
        let Ok(mut senders) = self.senders.lock() else {
            return;
        };
        senders.retain(|_, tx| tx.unbounded_send(message.to_string()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fan-out point for query events, owned by the resolver.
#[derive(Clone, Default)]
pub struct Events {
    sinks: Vec<Arc<dyn QuerySink>>,
    subscribers: Arc<Subscribers>,
    log_queries: bool,
}

impl Events {
    pub fn new(subscribers: Arc<Subscribers>, log_queries: bool) -> Self {
        Self {
            sinks: Vec::new(),
            subscribers,
            log_queries,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn QuerySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn subscribers(&self) -> &Arc<Subscribers> {
        &self.subscribers
    }

    /// Stamp and deliver one event.
    pub fn emit(&self, mut info: QueryInfo, elapsed: Duration) {
        info.timestamp = Some(Utc::now());

        if self.log_queries {
            info!(
                client = %info.client,
                qtype = %info.qtype,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "{} {}",
                info.name,
                info.outcome()
            );
        }

        for sink in &self.sinks {
            sink.record(&info, elapsed);
        }

        if self.subscribers.is_empty() {
            return;
        }
        match serde_json::to_string(&QueryEvent {
            kind: "query",
            query: &info,
        }) {
            Ok(message) => self.subscribers.broadcast(&message),
            Err(err) => warn!(error = %err, "failed to serialize query event"),
        }
    }
}
