use hifitime::{Epoch, TimeScale, Unit};
use std::str::FromStr;

use crate::constants::{Hour, DPI, JD, JDTOMJD, MJD, SECONDS_PER_DAY, SIDEREAL_RATE, T2000};
use crate::exo_errors::ExoError;

/// Transformation from julian date (JD) in modified julian date (MJD)
pub fn jd_to_mjd(jd: JD) -> MJD {
    jd - JDTOMJD
}

/// Transformation from modified julian date (MJD) in julian date (JD)
pub fn mjd_to_jd(mjd: MJD) -> JD {
    mjd + JDTOMJD
}

/// Build an epoch from a Julian Date expressed in the barycentric dynamical
/// timescale (BJD_TDB), the scale in which catalogs publish transit epochs.
pub fn epoch_from_jd_tdb(jd: JD) -> Epoch {
    Epoch::from_jde_tdb(jd)
}

/// Julian Date of an epoch in the TDB timescale.
pub fn jd_tdb(epoch: &Epoch) -> JD {
    epoch.to_jde_tdb_days()
}

/// Modified Julian Date of an epoch in UT.
///
/// UT1 is approximated by UTC: the difference stays below 0.9 s, i.e. below 4 arcseconds
/// of Earth rotation, which is negligible for altitude thresholds expressed in degrees.
pub fn mjd_ut(epoch: &Epoch) -> MJD {
    epoch.to_mjd_utc_days()
}

/// Parse a date in the format `YYYY-MM-ddTHH:mm:ss` (UTC unless a timescale suffix
/// such as `TDB` is given).
///
/// Return
/// ------
/// * the parsed [`Epoch`], or [`ExoError::InvalidTime`] with the offending input.
pub fn parse_epoch(date: &str) -> Result<Epoch, ExoError> {
    Epoch::from_str(date.trim()).map_err(|e| ExoError::InvalidTime(format!("'{date}': {e}")))
}

/// Shift an epoch by a number of hours (negative values move backwards).
pub fn shift_hours(epoch: &Epoch, hours: Hour) -> Epoch {
    *epoch + Unit::Hour * hours
}

/// Render an epoch as UTC for display, e.g. `2024-05-01T21:13:05 UTC`.
pub fn format_utc(epoch: &Epoch) -> String {
    let utc = epoch.to_time_scale(TimeScale::UTC);
    let (y, m, d, hh, mm, ss, _) = utc.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02}T{hh:02}:{mm:02}:{ss:02} UTC")
}

/// A closed search window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: Epoch,
    pub end: Epoch,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, ExoError> {
        if start > end {
            return Err(ExoError::InvalidWindow {
                start: format_utc(&start),
                end: format_utc(&end),
            });
        }
        Ok(TimeWindow { start, end })
    }

    /// Window starting at `start` and lasting `hours`.
    pub fn from_start(start: Epoch, hours: Hour) -> Result<Self, ExoError> {
        TimeWindow::new(start, shift_hours(&start, hours))
    }

    /// Window bounds as Julian Dates in TDB.
    pub fn jd_tdb_bounds(&self) -> (JD, JD) {
        (jd_tdb(&self.start), jd_tdb(&self.end))
    }
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # References
/// * IAU 1982, IERS Conventions 1996/2000.
/// * Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(tjm: MJD) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / SECONDS_PER_DAY;

    // fraction of the day, scaled to the sidereal rate
    let h = (tjm - itjm) * DPI;
    (gmst0 + h * SIDEREAL_RATE).rem_euclid(DPI)
}
