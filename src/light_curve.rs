//! Trapezoid transit model used to preview an event.
//!
//! The flux drops linearly during the ingress ramp (one tenth of the duration), stays at
//! its minimum during the flat bottom and rises back symmetrically.

use hifitime::Epoch;

use crate::constants::{HOURS_PER_DAY, JD};
use crate::time::jd_tdb;
use crate::transit::TransitEvent;

/// Flux at minimum for a depth in milli-magnitudes.
pub fn min_flux(depth_mmag: f64) -> f64 {
    10f64.powf(-depth_mmag / 1000.0 / 2.5)
}

/// Normalized flux at `time` (1.0 out of transit).
pub fn relative_flux(event: &TransitEvent, time: &Epoch) -> f64 {
    trapezoid(
        jd_tdb(time) - event.mid_jd_tdb(),
        event.duration_hours / HOURS_PER_DAY,
        event.depth_mmag,
    )
}

fn trapezoid(offset_days: f64, duration_days: f64, depth_mmag: f64) -> f64 {
    let floor = min_flux(depth_mmag);
    let half = duration_days / 2.0;
    let ramp = duration_days / 10.0;
    let dt = offset_days.abs();

    if ramp <= 0.0 || dt > half {
        1.0
    } else if dt <= half - ramp {
        floor
    } else {
        1.0 - (1.0 - floor) * (half - dt) / ramp
    }
}

/// Model light curve sampled over mid ± 1.5·duration.
///
/// Return
/// ------
/// * `samples` pairs (JD TDB, relative flux), evenly spaced, endpoints included.
pub fn model_curve(event: &TransitEvent, samples: usize) -> Vec<(JD, f64)> {
    let duration_days = event.duration_hours / HOURS_PER_DAY;
    let mid = event.mid_jd_tdb();
    let span = 3.0 * duration_days;
    let start = mid - span / 2.0;

    (0..samples)
        .map(|i| {
            let t = if samples > 1 {
                start + span * i as f64 / (samples - 1) as f64
            } else {
                mid
            };
            (t, trapezoid(t - mid, duration_days, event.depth_mmag))
        })
        .collect()
}
