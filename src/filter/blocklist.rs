//! Blocklist of unwanted domains.
//!
//! Matching is by substring: a query is blocked when its name contains any
//! configured entry, so `ads.example.com` also blocks `ads.example.com.evil`
//! and `myads.example.com`.

use crate::config::BlocklistConfig;

/// A list of blocked domain fragments, stored lowercase.
pub struct Blocklist {
    domains: Vec<String>,
}

impl Blocklist {
    /// Use every entry as given, lowercased. An empty entry matches every
    /// name.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|domain| domain.as_ref().to_lowercase())
            .collect();

        Self { domains }
    }

    /// Parse a blocklist file: one entry per line, blank lines and `#`
    /// comments skipped.
    pub fn from_lines(contents: &str) -> Self {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Build from configuration; a disabled blocklist blocks nothing.
    pub fn from_config(config: &BlocklistConfig) -> Self {
        if config.enabled {
            Self::new(&config.domains)
        } else {
            Self::new(std::iter::empty::<&str>())
        }
    }

    /// Check if a domain should be blocked.
    pub fn is_blocked(&self, domain: &str) -> bool {
        if self.domains.is_empty() {
            return false;
        }
        let domain = domain.to_lowercase();
        self.domains.iter().any(|blocked| domain.contains(blocked.as_str()))
    }

    /// Returns the number of domains in the blocklist.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocklist() -> Blocklist {
        Blocklist::from_lines("doubleclick.net\n# comment\n\n  Tracker.Example  \n")
    }

    #[test]
    fn from_lines_skips_comments_and_blank_lines() {
        assert_eq!(blocklist().len(), 2);
    }

    #[test]
    fn config_entries_are_used_verbatim() {
        let blocklist = Blocklist::new(["#ads"]);
        assert!(blocklist.is_blocked("cdn.#ads.example"));
        assert!(!blocklist.is_blocked("ads.example"));

        let everything = Blocklist::new([""]);
        assert_eq!(everything.len(), 1);
        assert!(everything.is_blocked("example.com"));
    }

    #[test]
    fn is_blocked_exact_match() {
        assert!(blocklist().is_blocked("doubleclick.net"));
    }

    #[test]
    fn is_blocked_substring_match() {
        let blocklist = blocklist();

        assert!(blocklist.is_blocked("ads.doubleclick.net"));
        assert!(blocklist.is_blocked("doubleclick.net.cdn.example"));
        assert!(blocklist.is_blocked("mytracker.example.org"));
    }

    #[test]
    fn is_blocked_case_insensitive() {
        let blocklist = blocklist();

        assert!(blocklist.is_blocked("DOUBLECLICK.NET"));
        assert!(blocklist.is_blocked("tracker.example"));
    }

    #[test]
    fn is_blocked_returns_false_for_safe_domains() {
        let blocklist = blocklist();

        assert!(!blocklist.is_blocked("google.com"));
        assert!(!blocklist.is_blocked("doubleclick.com"));
        assert!(!blocklist.is_blocked(""));
    }

    #[test]
    fn disabled_config_blocks_nothing() {
        let config = BlocklistConfig {
            enabled: false,
            domains: vec!["example.com".to_string()],
        };

        let blocklist = Blocklist::from_config(&config);

        assert!(blocklist.is_empty());
        assert!(!blocklist.is_blocked("example.com"));
    }
}
