//! DNS query resolution logic.
//!
//! Handles the query processing pipeline, stopping at the first step that
//! produces an answer:
//! 1. Validate (no question gets `FORMERR`)
//! 2. Filter (blocklisted names get `NXDOMAIN`)
//! 3. Custom records
//! 4. Cache lookup
//! 5. Forward to upstream, caching answers
//!
//! Transports handle the actual I/O, the resolver handles decisions.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::cache::DnsCache;
use crate::config::Config;
use crate::dns::{Message, ResourceRecord, ResponseCode, set_message_id};
use crate::error::{ConfigError, ResolveError};
use crate::events::{Events, QueryInfo};
use crate::filter::{Blocklist, LocalRecords, filter_query, local_answer};
use crate::forward::Forwarder;

/// Resolver handles DNS query processing decisions.
///
/// Shared by every connection; all interior state (cache, subscribers,
/// statistics) is synchronized.
pub struct Resolver {
    blocklist: Blocklist,
    local: LocalRecords,
    cache: Option<Arc<DnsCache>>,
    /// Cache TTL for answers that carry a zero TTL.
    default_ttl: u32,
    forwarder: Forwarder,
    events: Events,
}

impl Resolver {
    /// Create a resolver without a cache.
    pub fn new(
        blocklist: Blocklist,
        local: LocalRecords,
        forwarder: Forwarder,
        events: Events,
    ) -> Self {
        Self {
            blocklist,
            local,
            cache: None,
            default_ttl: 300,
            forwarder,
            events,
        }
    }

    pub fn with_cache(mut self, cache: Arc<DnsCache>, default_ttl: u32) -> Self {
        self.cache = Some(cache);
        self.default_ttl = default_ttl;
        self
    }

    pub fn from_config(config: &Config, events: Events) -> Result<Self, ConfigError> {
        let resolver = Self::new(
            Blocklist::from_config(&config.blocklist),
            LocalRecords::new(config.custom_records.clone()),
            Forwarder::new(config.forwarder_addrs()?),
            events,
        );

        if config.cache.enabled {
            let cache = Arc::new(DnsCache::new(config.cache.max_entries));
            Ok(resolver.with_cache(cache, config.cache.ttl))
        } else {
            Ok(resolver)
        }
    }

    pub fn cache(&self) -> Option<&Arc<DnsCache>> {
        self.cache.as_ref()
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Returns the number of domains in the blocklist.
    pub fn blocked_count(&self) -> usize {
        self.blocklist.len()
    }

    /// Process one raw query (without TCP length prefix) from `client`.
    ///
    /// Returns the encoded reply. Internal failures turn into `SERVFAIL`; the
    /// only case without a reply is a query that cannot be decoded at all.
    pub async fn handle_query(&self, query: &[u8], client: &str) -> Option<Vec<u8>> {
        let started = Instant::now();

        match self.process_query(query, client, started).await {
            Ok(response) => Some(response),
            Err(err) => {
                warn!(client = %client, error = %err, "query failed");
                servfail(query)
            }
        }
    }

    async fn process_query(
        &self,
        query: &[u8],
        client: &str,
        started: Instant,
    ) -> Result<Vec<u8>, ResolveError> {
        let request = Message::decode(query)?;

        let Some(question) = request.questions.first() else {
            let mut response = Message::response_to(&request);
            response.header.rcode = ResponseCode::FormErr;
            return self.reply(&response, QueryInfo::new("", "", client), started);
        };
        let mut info = QueryInfo::new(&question.name, question.qtype.to_string(), client);

        if let Some(response) = filter_query(&self.blocklist, &request) {
            info.blocked = true;
            return self.reply(&response, info, started);
        }

        if let Some(response) = local_answer(&self.local, &request) {
            return self.reply(&response?, info, started);
        }

        let key = question.cache_key();
        if let Some(cache) = &self.cache {
            if let Some(mut cached) = cache.get(&key) {
                set_message_id(&mut cached, request.header.id);
                info.cached = true;
                self.events.emit(info, started.elapsed());
                return Ok(cached);
            }
        }

        info.forwarded = true;
        let mut response = self.forwarder.resolve(&request).await?;
        response.header.id = request.header.id;
        let encoded = response.encode()?;

        if let Some(cache) = &self.cache {
            if !response.answers.is_empty() {
                let ttl = cache_ttl(&response.answers, self.default_ttl);
                debug!(key = %key, ttl, "caching response");
                cache.set(&key, encoded.clone(), Duration::from_secs(ttl.into()));
            }
        }

        self.events.emit(info, started.elapsed());
        Ok(encoded)
    }

    fn reply(
        &self,
        response: &Message,
        info: QueryInfo,
        started: Instant,
    ) -> Result<Vec<u8>, ResolveError> {
        let encoded = response.encode()?;
        self.events.emit(info, started.elapsed());
        Ok(encoded)
    }
}

/// Smallest TTL among `answers`; a zero TTL counts as unset and falls back
/// to `default`.
fn cache_ttl(answers: &[ResourceRecord], default: u32) -> u32 {
    answers
        .iter()
        .map(|answer| if answer.ttl == 0 { default } else { answer.ttl })
        .min()
        .unwrap_or(default)
}

/// `SERVFAIL` for `query`, or `None` when the query itself is undecodable.
fn servfail(query: &[u8]) -> Option<Vec<u8>> {
    let request = Message::decode(query).ok()?;
    let mut response = Message::response_to(&request);
    response.header.rcode = ResponseCode::ServFail;
    response.encode().ok()
}
