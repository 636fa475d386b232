//! Configuration file support.
//!
//! Settings are read from a TOML file; every section and every key is optional and falls
//! back to the built-in defaults.
//!
//! ```toml
//! [observer]
//! latitude = 43.6
//! longitude = 1.44
//! elevation_m = 150.0
//! name = "Toulouse"
//! aperture_in = 8.0
//!
//! [feeds]
//! timeout_secs = 30
//!
//! [search]
//! min_altitude = 30.0
//! max_sun_altitude = -6.0
//! priorities = ["high", "alert"]
//!
//! [store]
//! path = "exotransit.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{CandidateFilter, Priority};
use crate::constants::{Degree, Hour, Inch, Meter, MilliMag};
use crate::exo_errors::ExoError;
use crate::feeds::{FeedClient, DEFAULT_PRIMARY_URL, DEFAULT_SECONDARY_URL};
use crate::observers::Observer;
use crate::transit::VisibilityConstraints;

/// Name of the configuration file looked up by [`ExoConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "exotransit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExoConfig {
    #[serde(default)]
    pub observer: ObserverSettings,
    #[serde(default)]
    pub feeds: FeedSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

/// Observing site and equipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObserverSettings {
    #[serde(default)]
    pub latitude: Degree,
    #[serde(default)]
    pub longitude: Degree,
    #[serde(default)]
    pub elevation_m: Meter,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub aperture_in: Option<Inch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_primary_url")]
    pub primary_url: String,
    #[serde(default = "default_secondary_url")]
    pub secondary_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_min_altitude")]
    pub min_altitude: Degree,
    #[serde(default = "default_max_sun_altitude")]
    pub max_sun_altitude: Degree,
    #[serde(default)]
    pub min_depth_mmag: MilliMag,
    #[serde(default = "default_max_magnitude")]
    pub max_magnitude: f64,
    /// Priority labels, case-insensitive; empty accepts every priority.
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default = "default_window_hours")]
    pub window_hours: Hour,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_primary_url() -> String {
    DEFAULT_PRIMARY_URL.to_string()
}

fn default_secondary_url() -> String {
    DEFAULT_SECONDARY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_altitude() -> Degree {
    VisibilityConstraints::default().min_altitude
}

fn default_max_sun_altitude() -> Degree {
    VisibilityConstraints::default().max_sun_altitude
}

fn default_max_magnitude() -> f64 {
    15.0
}

fn default_window_hours() -> Hour {
    24.0
}

fn default_store_path() -> PathBuf {
    PathBuf::from("exotransit.json")
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            secondary_url: default_secondary_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_altitude: default_min_altitude(),
            max_sun_altitude: default_max_sun_altitude(),
            min_depth_mmag: 0.0,
            max_magnitude: default_max_magnitude(),
            priorities: Vec::new(),
            window_hours: default_window_hours(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl ExoConfig {
    /// Load the configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Err(ExoError::Config)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExoError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ExoError::Config(format!(
                "Failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| ExoError::Config(format!("Failed to parse config file: {e}")))
    }

    /// Load the configuration from the default location.
    ///
    /// Searches for `exotransit.toml` in:
    /// 1. Current directory
    /// 2. `config/` directory
    /// 3. Parent directory
    ///
    /// Falls back to [`ExoConfig::default`] when no file exists.
    pub fn from_default_location() -> Result<Self, ExoError> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("config").join(CONFIG_FILE_NAME),
            Path::new("..").join(CONFIG_FILE_NAME),
        ];

        match search_paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn observer(&self) -> Result<Observer, ExoError> {
        Observer::new(
            self.observer.latitude,
            self.observer.longitude,
            self.observer.elevation_m,
            self.observer.name.clone(),
        )
    }

    pub fn constraints(&self) -> VisibilityConstraints {
        VisibilityConstraints {
            min_altitude: self.search.min_altitude,
            max_sun_altitude: self.search.max_sun_altitude,
        }
    }

    /// Static candidate filter, with priority labels resolved.
    pub fn candidate_filter(&self) -> Result<CandidateFilter, ExoError> {
        let priorities = self
            .search
            .priorities
            .iter()
            .map(|label| label.parse::<Priority>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CandidateFilter {
            max_magnitude: self.search.max_magnitude,
            min_depth_mmag: self.search.min_depth_mmag,
            priorities,
        })
    }

    pub fn feed_client(&self) -> FeedClient {
        FeedClient::new(
            self.feeds.primary_url.as_str(),
            self.feeds.secondary_url.as_str(),
            Duration::from_secs(self.feeds.timeout_secs),
        )
    }
}
