use thiserror::Error;

use crate::catalog::StoreError;
use crate::feeds::FeedError;

#[derive(Error, Debug)]
pub enum ExoError {
    #[error("Invalid sexagesimal coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid observer: {0}")]
    InvalidObserver(String),

    #[error("NaN value where a real number was required")]
    NaNValue(#[from] ordered_float::FloatIsNan),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid time window: start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },

    #[error("Ephemeris store error: {0}")]
    Store(#[from] StoreError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for ExoError {
    fn eq(&self, other: &Self) -> bool {
        use ExoError::*;
        match (self, other) {
            (InvalidCoordinate(a), InvalidCoordinate(b)) => a == b,
            (MissingField(a), MissingField(b)) => a == b,
            (InvalidObserver(a), InvalidObserver(b)) => a == b,
            (InvalidTime(a), InvalidTime(b)) => a == b,
            (
                InvalidWindow { start: s1, end: e1 },
                InvalidWindow { start: s2, end: e2 },
            ) => s1 == s2 && e1 == e2,
            (Config(a), Config(b)) => a == b,
            (Store(a), Store(b)) => a == b,

            // not comparable: equal when the variant matches
            (NaNValue(_), NaNValue(_)) => true,
            (Feed(_), Feed(_)) => true,
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
