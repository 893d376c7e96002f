//! Query statistics, reported periodically by the proxy loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::events::{QueryInfo, QuerySink};

/// Index into [`Stats::outcomes`].
#[derive(Clone, Copy)]
enum Outcome {
    Blocked = 0,
    Cached = 1,
    Forwarded = 2,
    Local = 3,
}

impl Outcome {
    fn of(info: &QueryInfo) -> Outcome {
        if info.blocked {
            Outcome::Blocked
        } else if info.cached {
            Outcome::Cached
        } else if info.forwarded {
            Outcome::Forwarded
        } else {
            Outcome::Local
        }
    }
}

/// Interval counters fed by query events. Reading them resets the interval;
/// only the uptime clock survives.
pub struct Stats {
    outcomes: [AtomicU64; 4],
    /// Summed handling time in microseconds.
    elapsed_us: AtomicU64,
    started: Instant,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            outcomes: Default::default(),
            elapsed_us: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn snapshot_and_reset(&self) -> StatsSnapshot {
        let take = |outcome: Outcome| self.outcomes[outcome as usize].swap(0, Ordering::Relaxed);
        let blocked = take(Outcome::Blocked);
        let cached = take(Outcome::Cached);
        let forwarded = take(Outcome::Forwarded);
        let local = take(Outcome::Local);
        let requests = blocked + cached + forwarded + local;
        let elapsed_us = self.elapsed_us.swap(0, Ordering::Relaxed);

        StatsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            requests,
            blocked,
            cached,
            forwarded,
            local,
            avg_response_ms: match requests {
                0 => 0.0,
                n => elapsed_us as f64 / n as f64 / 1000.0,
            },
        }
    }
}

impl QuerySink for Stats {
    fn record(&self, info: &QueryInfo, elapsed: Duration) {
        self.outcomes[Outcome::of(info) as usize].fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_us.fetch_add(micros, Ordering::Relaxed);
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub blocked: u64,
    pub cached: u64,
    pub forwarded: u64,
    /// Answered from custom records, or rejected as malformed.
    pub local: u64,
    pub avg_response_ms: f64,
}
