//! # Catalog feeds
//!
//! Two external catalogs feed the ephemeris store:
//!
//! | Feed | Transport | Shape | Parser |
//! |------|-----------|-------|--------|
//! | primary (curated transit ephemerides) | HTTPS GET, JSON | object keyed by catalog key | [`primary::parse_primary`] |
//! | secondary (exoplanet archive) | TAP sync query, CSV | one row per planet | [`secondary::parse_secondary`] |
//!
//! Parsing is two-level. A document that cannot be read at all is a [`FeedError`], which the
//! reconciler treats as an empty feed. Inside a readable document every record is parsed on
//! its own, so one malformed record yields one `Err` entry and never hides its neighbours.
//!
//! [`client::FeedClient`] performs the blocking HTTP fetches; the [`FeedSource`] trait lets
//! tests and offline runs provide feed documents from elsewhere.

pub mod client;
pub mod primary;
pub mod secondary;

use thiserror::Error;

use crate::exo_errors::ExoError;

pub use self::client::{FeedClient, FeedSource};
pub use self::primary::{parse_primary, PrimaryRecord};
pub use self::secondary::{parse_secondary, SecondaryRow};

/// Default location of the primary feed.
pub const DEFAULT_PRIMARY_URL: &str = "https://www.exoclock.space/database/planets_json";

/// Default TAP synchronous endpoint of the secondary feed.
pub const DEFAULT_SECONDARY_URL: &str = "https://exoplanetarchive.ipac.caltech.edu/TAP/sync";

/// Table queried on the secondary archive.
pub const SECONDARY_TABLE: &str = "pscomppars";

/// Columns requested from the secondary archive, in order.
pub const SECONDARY_COLUMNS: [&str; 9] = [
    "pl_name",
    "hostname",
    "ra",
    "dec",
    "sy_vmag",
    "pl_orbper",
    "pl_tranmid",
    "pl_trandur",
    "pl_trandep",
];

/// Server-side filter: only planets with both a transit epoch and a transit duration.
pub const SECONDARY_FILTER: &str = "pl_tranmid is not null and pl_trandur is not null";

/// Records of one primary feed document, each parsed independently.
pub type PrimaryFeed = Vec<Result<PrimaryRecord, ExoError>>;

/// Rows of one secondary feed document, each parsed independently.
pub type SecondaryFeed = Vec<Result<SecondaryRow, ExoError>>;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed CSV document: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unexpected feed layout: {0}")]
    Shape(String),
}
