//! # Sky context
//!
//! Darkness tier and Moon altitude along a timeline, used to annotate a transit.
//!
//! | Tier | Sun altitude |
//! |---|---|
//! | [`TwilightTier::Civil`] | above −6° |
//! | [`TwilightTier::Nautical`] | (−18°, −6°] |
//! | [`TwilightTier::Night`] | −18° and below |

use hifitime::Epoch;

use crate::bodies::{sun_position, topocentric_moon};
use crate::constants::{Degree, ASTRONOMICAL_TWILIGHT, CIVIL_TWILIGHT, HOURS_PER_DAY};
use crate::observers::Observer;
use crate::time::{epoch_from_jd_tdb, jd_tdb};
use crate::transit::TransitEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TwilightTier {
    Civil,
    Nautical,
    Night,
}

impl TwilightTier {
    pub fn from_sun_altitude(sun_altitude: Degree) -> Self {
        if sun_altitude > CIVIL_TWILIGHT {
            TwilightTier::Civil
        } else if sun_altitude > ASTRONOMICAL_TWILIGHT {
            TwilightTier::Nautical
        } else {
            TwilightTier::Night
        }
    }
}

/// Tier and Sun altitude per sample, in sample order.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyContext {
    pub tiers: Vec<TwilightTier>,
    pub sun_altitudes: Vec<Degree>,
}

/// Contiguous run of samples sharing a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyBand {
    pub tier: TwilightTier,
    pub start: Epoch,
    pub end: Epoch,
}

fn sun_altitude(observer: &Observer, epoch: &Epoch) -> Degree {
    let sun = sun_position(epoch);
    observer.altaz_of_date(sun.ra, sun.dec, epoch).0
}

/// Classify each sample by Sun altitude.
pub fn classify(observer: &Observer, samples: &[Epoch]) -> SkyContext {
    let sun_altitudes: Vec<Degree> = samples.iter().map(|t| sun_altitude(observer, t)).collect();
    SkyContext {
        tiers: sun_altitudes
            .iter()
            .copied()
            .map(TwilightTier::from_sun_altitude)
            .collect(),
        sun_altitudes,
    }
}

/// Topocentric Moon altitude at each sample, degrees.
pub fn moon_altitude(observer: &Observer, samples: &[Epoch]) -> Vec<Degree> {
    samples
        .iter()
        .map(|t| {
            let moon = topocentric_moon(observer, t);
            observer.altaz_of_date(moon.ra, moon.dec, t).0
        })
        .collect()
}

/// `count` evenly spaced epochs over mid ± 1.5·duration, endpoints included.
pub fn timeline_samples(event: &TransitEvent, count: usize) -> Vec<Epoch> {
    let mid = event.mid_jd_tdb();
    let span = 3.0 * event.duration_hours / HOURS_PER_DAY;
    match count {
        0 => Vec::new(),
        1 => vec![event.mid_time],
        _ => (0..count)
            .map(|i| epoch_from_jd_tdb(mid - span / 2.0 + span * i as f64 / (count - 1) as f64))
            .collect(),
    }
}

/// Collapse per-sample tiers into bands.
///
/// Each band starts at its first sample and ends where the next band starts; the last band
/// ends at the last sample. Extra samples or tiers beyond the shorter slice are ignored.
pub fn tier_bands(samples: &[Epoch], tiers: &[TwilightTier]) -> Vec<SkyBand> {
    let mut bands: Vec<SkyBand> = Vec::new();
    for (epoch, tier) in samples.iter().zip(tiers) {
        match bands.last_mut() {
            Some(band) if band.tier == *tier => band.end = *epoch,
            Some(band) => {
                band.end = *epoch;
                bands.push(SkyBand {
                    tier: *tier,
                    start: *epoch,
                    end: *epoch,
                });
            }
            None => bands.push(SkyBand {
                tier: *tier,
                start: *epoch,
                end: *epoch,
            }),
        }
    }
    bands
}

/// Timeline in JD TDB, handy for plotting.
pub fn sample_jds(samples: &[Epoch]) -> Vec<f64> {
    samples.iter().map(jd_tdb).collect()
}

#[cfg(test)]
mod sky_test {
    use super::*;
    use crate::catalog::Priority;

    fn pic_du_midi() -> Observer {
        Observer::new(42.9364, 0.1425, 2877.0, Some("Pic du Midi".into())).unwrap()
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(TwilightTier::from_sun_altitude(10.0), TwilightTier::Civil);
        assert_eq!(TwilightTier::from_sun_altitude(-5.9), TwilightTier::Civil);
        assert_eq!(TwilightTier::from_sun_altitude(-6.0), TwilightTier::Nautical);
        assert_eq!(TwilightTier::from_sun_altitude(-17.9), TwilightTier::Nautical);
        assert_eq!(TwilightTier::from_sun_altitude(-18.0), TwilightTier::Night);
    }

    #[test]
    fn test_noon_and_midnight() {
        let site = pic_du_midi();
        // local solar noon and midnight close to the June solstice
        let samples = [
            Epoch::from_gregorian_utc(2024, 6, 21, 12, 0, 0, 0),
            Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0),
        ];
        let ctx = classify(&site, &samples);
        assert_eq!(ctx.tiers[0], TwilightTier::Civil);
        assert!(ctx.sun_altitudes[0] > 65.0);
        // short summer night at 43°N: the Sun stays above −24°
        assert!(ctx.sun_altitudes[1] < -18.0);
        assert_eq!(ctx.tiers[1], TwilightTier::Night);
    }

    #[test]
    fn test_moon_altitude_bounds() {
        let site = pic_du_midi();
        let start = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
        let samples: Vec<Epoch> = (0..48)
            .map(|h| crate::time::shift_hours(&start, h as f64))
            .collect();
        let altitudes = moon_altitude(&site, &samples);
        assert_eq!(altitudes.len(), 48);
        assert!(altitudes.iter().all(|a| (-90.0..=90.0).contains(a)));
        assert!(altitudes.iter().any(|a| *a > 0.0));
        assert!(altitudes.iter().any(|a| *a < 0.0));
    }

    fn event(mid: f64, duration_hours: f64) -> TransitEvent {
        let mid_time = epoch_from_jd_tdb(mid);
        TransitEvent {
            planet: "HD 1 b".into(),
            host: "HD 1".into(),
            cycle: 0,
            mid_time,
            ingress: mid_time,
            egress: mid_time,
            altitude: 45.0,
            azimuth: 180.0,
            sun_altitude: -20.0,
            meridian_flip: false,
            moon_separation: 90.0,
            moon_illumination: 0.5,
            uncertainty_minutes: 1.0,
            depth_mmag: 10.0,
            duration_hours,
            ra: 0.0,
            dec: 0.0,
            magnitude: Some(10.0),
            priority: Priority::Normal,
            min_aperture_in: None,
        }
    }

    #[test]
    fn test_timeline_span() {
        let samples = timeline_samples(&event(2459000.5, 2.0), 7);
        let jds = sample_jds(&samples);
        assert_eq!(jds.len(), 7);
        approx::assert_relative_eq!(jds[0], 2459000.5 - 0.125, epsilon = 1e-6);
        approx::assert_relative_eq!(jds[3], 2459000.5, epsilon = 1e-6);
        approx::assert_relative_eq!(jds[6], 2459000.5 + 0.125, epsilon = 1e-6);

        assert!(timeline_samples(&event(2459000.5, 2.0), 0).is_empty());
        assert_eq!(timeline_samples(&event(2459000.5, 2.0), 1).len(), 1);
    }

    #[test]
    fn test_bands() {
        let t: Vec<Epoch> = (0..5).map(|i| epoch_from_jd_tdb(2459000.0 + i as f64)).collect();
        let tiers = [
            TwilightTier::Civil,
            TwilightTier::Nautical,
            TwilightTier::Nautical,
            TwilightTier::Night,
            TwilightTier::Night,
        ];
        let bands = tier_bands(&t, &tiers);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].tier, TwilightTier::Civil);
        assert_eq!((bands[0].start, bands[0].end), (t[0], t[1]));
        assert_eq!((bands[1].start, bands[1].end), (t[1], t[3]));
        assert_eq!((bands[2].start, bands[2].end), (t[3], t[4]));

        assert!(tier_bands(&[], &[]).is_empty());
    }
}
