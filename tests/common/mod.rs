#![allow(dead_code)]

use approx::assert_relative_eq;
use exotransit::catalog::Planet;
use exotransit::feeds::{
    parse_primary, parse_secondary, FeedError, FeedSource, PrimaryFeed, SecondaryFeed,
};
use exotransit::observers::Observer;

/// Primary feed with two planets around distinct hosts.
pub const PRIMARY_JSON: &str = r#"{
    "HD1b": {
        "name": "HD 1 b",
        "star": "HD 1",
        "ra_j2000": "08:00:00",
        "dec_j2000": "+20:00:00",
        "v_mag": 9.5,
        "ephem_mid_time": 2459000.0,
        "ephem_period": 3.0,
        "ephem_mid_time_e1": 0.0005,
        "ephem_period_e1": 0.00001,
        "duration_hours": 2.4,
        "depth_r_mmag": 12.0,
        "min_telescope_inches": 6.0,
        "priority": "high"
    },
    "WASP-2b": {
        "name": "WASP-2 b",
        "star": "WASP-2",
        "ra_j2000": "20:30:54.13",
        "dec_j2000": "+06:25:46.4",
        "r_mag": "11.9",
        "t0_bjd_tdb": 2459001.2,
        "period_days": 2.1522,
        "duration_hours": 1.8,
        "depth_r_mmag": 18.5,
        "priority": "MEDIUM"
    }
}"#;

/// Secondary table: one planet shadowed by the primary feed, one new planet with a masked
/// magnitude and a 1 % depth, one saturated depth.
pub const SECONDARY_CSV: &str = "\
pl_name,hostname,ra,dec,sy_vmag,pl_orbper,pl_tranmid,pl_trandur,pl_trandep
HD-1b,HD 1,1.0,2.0,3.0,9.9,2450000.0,9.9,5.0
KELT-9 b,KELT-9,307.8597,39.9384,,1.4811235,2457095.68572,3.9158,1.0
Saturated b,Saturated,10.0,10.0,12.0,4.0,2459000.5,2.0,100.0
";

pub fn primary_feed() -> PrimaryFeed {
    parse_primary(PRIMARY_JSON).unwrap()
}

pub fn secondary_feed() -> SecondaryFeed {
    parse_secondary(SECONDARY_CSV).unwrap()
}

/// Feed source serving fixed documents; `None` simulates a failed download.
pub struct StaticFeeds {
    pub primary: Option<&'static str>,
    pub secondary: Option<&'static str>,
}

impl StaticFeeds {
    pub fn both() -> Self {
        StaticFeeds {
            primary: Some(PRIMARY_JSON),
            secondary: Some(SECONDARY_CSV),
        }
    }
}

impl FeedSource for StaticFeeds {
    fn fetch_primary(&self) -> Result<PrimaryFeed, FeedError> {
        let body = self
            .primary
            .ok_or_else(|| FeedError::Shape("primary download failed".into()))?;
        parse_primary(body)
    }

    fn fetch_secondary(&self) -> Result<SecondaryFeed, FeedError> {
        let body = self
            .secondary
            .ok_or_else(|| FeedError::Shape("secondary download failed".into()))?;
        parse_secondary(body)
    }
}

pub fn toulouse() -> Observer {
    Observer::new(43.6045, 1.444, 146.0, Some("Toulouse".into())).unwrap()
}

pub fn assert_ephemeris_close(actual: &Planet, period: f64, epoch: f64, epsilon: f64) {
    assert_relative_eq!(actual.period.unwrap(), period, epsilon = epsilon);
    assert_relative_eq!(actual.epoch.unwrap(), epoch, epsilon = epsilon);
}
