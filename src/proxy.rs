//! DNS proxy orchestration.
//!
//! Wires configuration, resolver and transport together and runs the server.

use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::events::{Events, Subscribers};
use crate::resolver::Resolver;
use crate::stats::Stats;
use crate::transport::tcp::TcpTransport;

/// Interval between statistics lines.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Run the DNS proxy with the given configuration.
///
/// Starts the TCP transport on the configured address and answers queries
/// until the process exits.
pub async fn run(config: Config, subscribers: Arc<Subscribers>) -> io::Result<()> {
    let bind_addr = config.listen_addr().map_err(invalid_config)?;
    let stats = Arc::new(Stats::new());
    let events = Events::new(subscribers, config.logging.enabled).with_sink(stats.clone());
    let resolver = Arc::new(Resolver::from_config(&config, events).map_err(invalid_config)?);

    let tcp = TcpTransport::bind(bind_addr).await?;
    info!(
        addr = %tcp.local_addr()?,
        blocked = resolver.blocked_count(),
        cache = resolver.cache().is_some(),
        "DNS proxy listening"
    );
    let upstream_strs: Vec<_> = resolver
        .forwarder()
        .servers()
        .iter()
        .map(|a| a.to_string())
        .collect();
    info!("Forwarding to upstreams in order: {}", upstream_strs.join(", "));

    tcp.start(resolver.clone());

    let mut interval = tokio::time::interval(STATS_INTERVAL);
    interval.tick().await; // Skip first immediate tick
    loop {
        interval.tick().await;
        let snapshot = stats.snapshot_and_reset();
        let cache = resolver.cache().map(|c| c.stats());
        info!(
            uptime_secs = snapshot.uptime_secs,
            requests = snapshot.requests,
            forwarded = snapshot.forwarded,
            cached = snapshot.cached,
            blocked = snapshot.blocked,
            local = snapshot.local,
            avg_response_ms = %format!("{:.2}", snapshot.avg_response_ms),
            cache_size = cache.map(|c| c.size).unwrap_or(0),
            cache_hit_rate = cache.map(|c| c.hit_rate).unwrap_or(0),
            "stats"
        );
    }
}

fn invalid_config(err: crate::error::ConfigError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
}
