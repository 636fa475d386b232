//! # Transit enumeration
//!
//! Given a planet with a linear ephemeris `T(N) = t0 + N·P`, an observer and a time window,
//! [`find_transits`] lists the cycles whose mid-time falls inside the window and that are
//! observable: target high enough, Sun low enough.
//!
//! ## Pipeline
//!
//! ```text
//! snapshot ──▶ CandidateFilter (magnitude, depth, priority)
//!          ──▶ find_transits per candidate (altitude, Sun altitude)
//!          ──▶ merge + sort by mid-time
//!          ──▶ apply_aperture_filter (removed events are counted, not lost)
//! ```
//!
//! [`search_transits`] runs the whole pipeline on a catalog snapshot.
//!
//! ## Derived metrics
//!
//! - **Meridian flip**: hour angle at ingress and at egress, wrapped into [−180°, 180°);
//!   flagged when their signs differ.
//! - **Moon**: topocentric separation from the target and illuminated fraction at mid-time.
//! - **Timing uncertainty**: `sqrt(σ_t0² + (N·σ_P)²)`, in minutes.
//!
//! All times are compared as Julian Dates in TDB, the scale of published transit epochs.

use std::ops::RangeInclusive;

use hifitime::Epoch;
use tracing::{debug, info, warn};

use crate::bodies::{moon_illumination, sun_position, topocentric_moon};
use crate::catalog::{Candidate, CandidateFilter, Catalog, Priority};
use crate::constants::{
    Degree, Hour, Inch, MilliMag, Minute, DEFAULT_MAX_SUN_ALTITUDE, DEFAULT_MIN_ALTITUDE,
    HOURS_PER_DAY, JD, MINUTES_PER_DAY, UNCERTAIN_TIMING_MINUTES,
};
use crate::earth_orientation::precess_from_j2000;
use crate::observers::Observer;
use crate::ref_system::angular_separation;
use crate::time::{epoch_from_jd_tdb, jd_tdb, TimeWindow};

/// Slack applied to the window bounds when selecting cycles (about one millisecond), so that
/// a mid-time sitting exactly on a bound survives the TDB round trip.
const WINDOW_TOLERANCE_DAYS: f64 = 1e-8;

/// Largest number of cycles enumerated in one window. Beyond it the period is not a
/// plausible transit period and the planet is skipped.
pub const MAX_CYCLES_PER_WINDOW: i64 = 100_000;

/// Accept/reject thresholds evaluated at mid-transit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityConstraints {
    /// Lowest accepted target altitude, degrees.
    pub min_altitude: Degree,
    /// Highest accepted Sun altitude, degrees (−6° = end of civil twilight).
    pub max_sun_altitude: Degree,
}

impl Default for VisibilityConstraints {
    fn default() -> Self {
        VisibilityConstraints {
            min_altitude: DEFAULT_MIN_ALTITUDE,
            max_sun_altitude: DEFAULT_MAX_SUN_ALTITUDE,
        }
    }
}

impl VisibilityConstraints {
    /// Constraints accepting every cycle.
    pub fn permissive() -> Self {
        VisibilityConstraints {
            min_altitude: -90.0,
            max_sun_altitude: 90.0,
        }
    }

    pub fn accepts(&self, altitude: Degree, sun_altitude: Degree) -> bool {
        altitude >= self.min_altitude && sun_altitude <= self.max_sun_altitude
    }
}

/// One observable transit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitEvent {
    pub planet: String,
    pub host: String,
    /// Cycle number N relative to the reference epoch.
    pub cycle: i64,
    pub mid_time: Epoch,
    pub ingress: Epoch,
    pub egress: Epoch,
    /// Target altitude at mid-time, degrees.
    pub altitude: Degree,
    /// Target azimuth at mid-time, degrees from North through East.
    pub azimuth: Degree,
    pub sun_altitude: Degree,
    pub meridian_flip: bool,
    pub moon_separation: Degree,
    /// Illuminated fraction of the Moon, in [0, 1].
    pub moon_illumination: f64,
    pub uncertainty_minutes: Minute,
    pub depth_mmag: MilliMag,
    pub duration_hours: Hour,
    pub ra: Degree,
    pub dec: Degree,
    pub magnitude: Option<f64>,
    pub priority: Priority,
    pub min_aperture_in: Option<Inch>,
}

impl TransitEvent {
    /// Mid-time as a Julian Date in TDB.
    pub fn mid_jd_tdb(&self) -> JD {
        jd_tdb(&self.mid_time)
    }

    /// `true` when the predicted time is off by more than half an hour (1σ).
    pub fn is_timing_uncertain(&self) -> bool {
        self.uncertainty_minutes > UNCERTAIN_TIMING_MINUTES
    }
}

/// Cycles whose mid-time lies in `[start, end]` (Julian Dates in TDB).
///
/// ```text
/// N_min = ceil((start − t0) / P),   N_max = floor((end − t0) / P)
/// ```
///
/// Return
/// ------
/// * `None` if `period ≤ 0`, the window holds no cycle, or it holds more than
///   [`MAX_CYCLES_PER_WINDOW`] cycles.
pub fn cycle_range(epoch: JD, period: f64, start: JD, end: JD) -> Option<RangeInclusive<i64>> {
    if !(period > 0.0) || !epoch.is_finite() {
        return None;
    }
    let n_min = ((start - epoch) / period - WINDOW_TOLERANCE_DAYS / period).ceil();
    let n_max = ((end - epoch) / period + WINDOW_TOLERANCE_DAYS / period).floor();
    if !(n_min.is_finite() && n_max.is_finite()) || n_min > n_max {
        return None;
    }
    if n_max - n_min >= MAX_CYCLES_PER_WINDOW as f64 {
        warn!(period, cycles = n_max - n_min + 1.0, "implausible period, cycles not enumerated");
        return None;
    }
    Some(n_min as i64..=n_max as i64)
}

/// Linear propagation of the ephemeris uncertainty to cycle `cycle`, in minutes.
///
/// Missing uncertainties count as zero.
pub fn propagated_uncertainty_minutes(
    epoch_uncertainty: Option<f64>,
    period_uncertainty: Option<f64>,
    cycle: i64,
) -> Minute {
    let sigma_t0 = epoch_uncertainty.unwrap_or(0.0);
    let sigma_p = period_uncertainty.unwrap_or(0.0);
    (sigma_t0.powi(2) + (cycle as f64 * sigma_p).powi(2)).sqrt() * MINUTES_PER_DAY
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// `true` when the hour angle changes sign between ingress and egress.
///
/// A hour angle of exactly 0 has sign 0 and differs from both signs.
pub fn meridian_flip(hour_angle_ingress: Degree, hour_angle_egress: Degree) -> bool {
    sign(hour_angle_ingress) != sign(hour_angle_egress)
}

/// Observable transits of one planet in a window, sorted by mid-time.
///
/// Arguments
/// -----------------
/// * `target`: the planet and its host star.
/// * `observer`: the observing site.
/// * `window`: closed search window.
/// * `constraints`: altitude thresholds evaluated at mid-transit.
///
/// Return
/// ----------
/// * The accepted events, at most one per cycle of the window. A planet without a usable
///   ephemeris yields no event.
///
/// See also
/// ------------
/// * [`search_transits`] – the same over every candidate of a catalog.
pub fn find_transits(
    target: &Candidate,
    observer: &Observer,
    window: &TimeWindow,
    constraints: &VisibilityConstraints,
) -> Vec<TransitEvent> {
    let planet = target.planet;
    let star = target.star;

    let Some((epoch, period)) = planet.ephemeris() else {
        return Vec::new();
    };
    let (start, end) = window.jd_tdb_bounds();
    let Some(cycles) = cycle_range(epoch, period, start, end) else {
        return Vec::new();
    };

    let half_duration = planet.duration_hours / HOURS_PER_DAY / 2.0;
    let mut events = Vec::new();

    for cycle in cycles {
        let predicted = epoch_from_jd_tdb(epoch + cycle as f64 * period);
        // cycles admitted through the bound slack sit on the bound itself
        let mid_time = match jd_tdb(&predicted) {
            jd if jd < start => window.start,
            jd if jd > end => window.end,
            _ => predicted,
        };
        let mid_jd = jd_tdb(&mid_time);

        let (altitude, azimuth) = observer.altaz(star.ra, star.dec, &mid_time);
        let sun = sun_position(&mid_time);
        let (sun_altitude, _) = observer.altaz_of_date(sun.ra, sun.dec, &mid_time);
        if !constraints.accepts(altitude, sun_altitude) {
            continue;
        }

        let ingress = epoch_from_jd_tdb(mid_jd - half_duration);
        let egress = epoch_from_jd_tdb(mid_jd + half_duration);

        let (ra_date, dec_date) = precess_from_j2000(star.ra, star.dec, mid_time.to_mjd_tt_days());
        let flip = meridian_flip(
            observer.hour_angle(ra_date, &ingress),
            observer.hour_angle(ra_date, &egress),
        );

        let moon = topocentric_moon(observer, &mid_time);

        events.push(TransitEvent {
            planet: planet.name.clone(),
            host: star.name.clone(),
            cycle,
            mid_time,
            ingress,
            egress,
            altitude,
            azimuth,
            sun_altitude,
            meridian_flip: flip,
            moon_separation: angular_separation(ra_date, dec_date, moon.ra, moon.dec),
            moon_illumination: moon_illumination(&mid_time),
            uncertainty_minutes: propagated_uncertainty_minutes(
                planet.epoch_uncertainty,
                planet.period_uncertainty,
                cycle,
            ),
            depth_mmag: planet.depth_mmag,
            duration_hours: planet.duration_hours,
            ra: star.ra,
            dec: star.dec,
            magnitude: star.magnitude,
            priority: planet.priority,
            min_aperture_in: planet.min_aperture_in,
        });
    }

    debug!(planet = %planet.name, events = events.len(), "transits enumerated");
    events
}

/// Parameters of a catalog-wide transit search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub observer: Observer,
    pub window: TimeWindow,
    pub constraints: VisibilityConstraints,
    pub filter: CandidateFilter,
    /// Aperture available to the observer; `None` disables the aperture filter.
    pub aperture_in: Option<Inch>,
}

/// Result of [`search_transits`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Candidates that passed the static filter.
    pub candidates_considered: usize,
    /// Observable events, soonest first.
    pub events: Vec<TransitEvent>,
    /// Events removed because they need a larger aperture.
    pub hidden_by_aperture: usize,
}

/// Remove events requiring more aperture than available.
///
/// A missing minimum aperture counts as 0 (any telescope).
///
/// Return
/// ------
/// * The kept events (order preserved) and the number removed.
pub fn apply_aperture_filter(events: Vec<TransitEvent>, aperture: Inch) -> (Vec<TransitEvent>, usize) {
    let (kept, hidden): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|event| event.min_aperture_in.unwrap_or(0.0) <= aperture);
    (kept, hidden.len())
}

/// Run the full search pipeline on a catalog snapshot.
pub fn search_transits(snapshot: &Catalog, request: &SearchRequest) -> SearchOutcome {
    let candidates = snapshot.filter_candidates(&request.filter);

    let mut events: Vec<TransitEvent> = candidates
        .iter()
        .flat_map(|candidate| {
            find_transits(
                candidate,
                &request.observer,
                &request.window,
                &request.constraints,
            )
        })
        .collect();
    events.sort_by(|a, b| a.mid_jd_tdb().total_cmp(&b.mid_jd_tdb()));

    let (events, hidden_by_aperture) = match request.aperture_in {
        Some(aperture) => apply_aperture_filter(events, aperture),
        None => (events, 0),
    };

    info!(
        candidates = candidates.len(),
        events = events.len(),
        hidden_by_aperture,
        "transit search done"
    );
    SearchOutcome {
        candidates_considered: candidates.len(),
        events,
        hidden_by_aperture,
    }
}
