//! # Feed client
//!
//! Blocking HTTP access to the two catalogs, built on a single reusable [`ureq::Agent`]
//! configured with a global timeout.
//!
//! The client does **not** retry: a failed request is returned as a [`FeedError`] and the
//! reconciler degrades the feed to an empty one.
//!
//! ## See also
//! * [`FeedSource`] – the seam used by the reconciler, implemented by [`FeedClient`].

use std::time::Duration;

use itertools::Itertools;
use tracing::info;
use ureq::Agent;

use super::{
    parse_primary, parse_secondary, FeedError, PrimaryFeed, SecondaryFeed, DEFAULT_PRIMARY_URL,
    DEFAULT_SECONDARY_URL, SECONDARY_COLUMNS, SECONDARY_FILTER, SECONDARY_TABLE,
};

/// Provider of the two feed documents, already parsed.
pub trait FeedSource {
    fn fetch_primary(&self) -> Result<PrimaryFeed, FeedError>;
    fn fetch_secondary(&self) -> Result<SecondaryFeed, FeedError>;
}

/// HTTP client for the primary JSON feed and the secondary TAP service.
#[derive(Debug, Clone)]
pub struct FeedClient {
    agent: Agent,
    primary_url: String,
    secondary_url: String,
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRIMARY_URL,
            DEFAULT_SECONDARY_URL,
            Duration::from_secs(30),
        )
    }
}

impl FeedClient {
    /// Create a client.
    ///
    /// Arguments
    /// ---------
    /// * `primary_url`: location of the primary JSON document.
    /// * `secondary_url`: TAP synchronous endpoint of the secondary archive.
    /// * `timeout`: global timeout applied to every request (connection and body).
    pub fn new(
        primary_url: impl Into<String>,
        secondary_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let agent: Agent = config.into();

        FeedClient {
            agent,
            primary_url: primary_url.into(),
            secondary_url: secondary_url.into(),
        }
    }

    /// ADQL query sent to the secondary archive.
    pub fn secondary_query() -> String {
        format!(
            "select {} from {SECONDARY_TABLE} where {SECONDARY_FILTER}",
            SECONDARY_COLUMNS.iter().join(",")
        )
    }

    fn get_from_url(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FeedError> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let body = request.call()?.body_mut().read_to_string()?;
        info!(url, bytes = body.len(), "feed downloaded");
        Ok(body)
    }
}

impl FeedSource for FeedClient {
    fn fetch_primary(&self) -> Result<PrimaryFeed, FeedError> {
        let body = self.get_from_url(&self.primary_url, &[])?;
        parse_primary(&body)
    }

    fn fetch_secondary(&self) -> Result<SecondaryFeed, FeedError> {
        let query = Self::secondary_query();
        let body = self.get_from_url(
            &self.secondary_url,
            &[("query", query.as_str()), ("format", "csv")],
        )?;
        parse_secondary(&body)
    }
}
