//! # Constants and type definitions for exotransit
//!
//! This module centralizes the **physical constants**, **conversion factors**, **default
//! thresholds** and **unit aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, days ↔ minutes/hours, JD ↔ MJD)
//! - Twilight thresholds shared by the transit filter and the sky classifier
//! - Type aliases documenting the unit carried by a plain `f64`

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of minutes in a Julian day
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Number of hours in a Julian day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Julian Date of J2000.0
pub const JD2000: f64 = 2_451_545.0;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth polar radius in meters (GRS1980/WGS84)
pub const EARTH_MINOR_AXIS: f64 = 6_356_752.3;

/// Earth equatorial radius in kilometers
pub const EARTH_RADIUS_KM: f64 = EARTH_MAJOR_AXIS / 1000.;

/// Ratio of the sidereal to the solar day
pub const SIDEREAL_RATE: f64 = 1.00273790934;

// -------------------------------------------------------------------------------------------------
// Observability thresholds
// -------------------------------------------------------------------------------------------------

/// Sun altitude below which civil twilight has ended (degrees)
pub const CIVIL_TWILIGHT: Degree = -6.0;

/// Sun altitude below which astronomical night begins (degrees)
pub const ASTRONOMICAL_TWILIGHT: Degree = -18.0;

/// Default minimum target altitude for an observable transit (degrees)
pub const DEFAULT_MIN_ALTITUDE: Degree = 30.0;

/// Default maximum Sun altitude for an observable transit (degrees)
pub const DEFAULT_MAX_SUN_ALTITUDE: Degree = CIVIL_TWILIGHT;

/// Timing uncertainty above which a predicted transit is flagged as uncertain (minutes)
pub const UNCERTAIN_TIMING_MINUTES: Minute = 30.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Telescope aperture in inches
pub type Inch = f64;
/// Duration in hours
pub type Hour = f64;
/// Duration in minutes
pub type Minute = f64;
/// Brightness dip in milli-magnitudes
pub type MilliMag = f64;

/// Julian Date (days)
pub type JD = f64;

/// Modified Julian Date (days)
pub type MJD = f64;
