//! pns - a local DNS proxy.
//!
//! Answers TCP DNS queries from a blocklist, static custom records or a
//! response cache, and forwards everything else to upstream resolvers.

pub mod cache;
pub mod config;
pub mod dns;
pub mod error;
pub mod events;
pub mod filter;
pub mod forward;
pub mod proxy;
pub mod resolver;
pub mod stats;
pub mod transport;
