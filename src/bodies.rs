//! # Sun and Moon
//!
//! Low-precision geocentric positions of the Sun and the Moon, as tabulated in the
//! *Astronomical Almanac* ("low precision formulae"), plus the illuminated fraction of
//! the lunar disk. Accuracy is about 0.01° for the Sun and 0.3° for the Moon between
//! 1950 and 2050, which is ample for twilight tiers and lunar-interference warnings.
//!
//! Coordinates are referred to the equator and equinox **of date**: feed them to
//! [`Observer::altaz_of_date`](crate::observers::Observer::altaz_of_date), not to the J2000
//! entry point.
//!
//! ## See also
//! * [`moon_illumination`] – Meeus, *Astronomical Algorithms*, ch. 48.
//! * [`topocentric_moon`] – parallax-corrected lunar position for a site.

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::constants::{Degree, AU, EARTH_RADIUS_KM, JD2000, RADEG};
use crate::observers::Observer;
use crate::ref_system::{cartesian_to_radec, ecliptic_to_equatorial, spherical_to_cartesian};
use crate::time::jd_tdb;

/// Apparent geocentric position of a body in the equatorial frame of date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPosition {
    /// Right ascension, degrees in [0, 360).
    pub ra: Degree,
    /// Declination, degrees.
    pub dec: Degree,
    /// Geocentric distance in kilometers.
    pub distance_km: f64,
}

/// Low-precision obliquity used together with the almanac series.
fn almanac_obliquity(days: f64) -> f64 {
    (23.439 - 0.000_000_4 * days) * RADEG
}

fn ecliptic_to_body(lon: Degree, lat: Degree, distance_km: f64, days: f64) -> BodyPosition {
    let ecl = spherical_to_cartesian(lon * RADEG, lat * RADEG, distance_km);
    let equ = ecliptic_to_equatorial(&ecl, almanac_obliquity(days));
    let (ra, dec, r) = cartesian_to_radec(&equ);
    BodyPosition {
        ra: ra.to_degrees(),
        dec: dec.to_degrees(),
        distance_km: r,
    }
}

/// Geocentric position of the Sun.
///
/// With `n = JD − 2451545.0`:
///
/// ```text
/// L = 280.460° + 0.9856474° n
/// g = 357.528° + 0.9856003° n
/// λ = L + 1.915° sin g + 0.020° sin 2g,   β = 0
/// R = 1.00014 − 0.01671 cos g − 0.00014 cos 2g   [AU]
/// ```
pub fn sun_position(epoch: &Epoch) -> BodyPosition {
    let n = jd_tdb(epoch) - JD2000;

    let mean_lon = 280.460 + 0.985_647_4 * n;
    let g = (357.528 + 0.985_600_3 * n) * RADEG;

    let lambda = mean_lon + 1.915 * g.sin() + 0.020 * (2.0 * g).sin();
    let r_au = 1.000_14 - 0.016_71 * g.cos() - 0.000_14 * (2.0 * g).cos();

    ecliptic_to_body(lambda, 0.0, r_au * AU, n)
}

/// Geocentric position of the Moon.
///
/// Ecliptic longitude, latitude and horizontal parallax are truncated trigonometric series
/// in Julian centuries `T` from J2000; the distance is `1 / sin π` Earth radii.
pub fn moon_position(epoch: &Epoch) -> BodyPosition {
    let days = jd_tdb(epoch) - JD2000;
    let t = days / 36525.0;
    let sin = |deg: f64| (deg * RADEG).sin();
    let cos = |deg: f64| (deg * RADEG).cos();

    let lambda = 218.32 + 481_267.881 * t + 6.29 * sin(135.0 + 477_198.87 * t)
        - 1.27 * sin(259.3 - 413_335.36 * t)
        + 0.66 * sin(235.7 + 890_534.22 * t)
        + 0.21 * sin(269.9 + 954_397.74 * t)
        - 0.19 * sin(357.5 + 35_999.05 * t)
        - 0.11 * sin(186.5 + 966_404.03 * t);

    let beta = 5.13 * sin(93.3 + 483_202.02 * t) + 0.28 * sin(228.2 + 960_400.89 * t)
        - 0.28 * sin(318.3 + 6_003.15 * t)
        - 0.17 * sin(217.6 - 407_332.21 * t);

    let parallax = 0.9508
        + 0.0518 * cos(135.0 + 477_198.87 * t)
        + 0.0095 * cos(259.3 - 413_335.36 * t)
        + 0.0078 * cos(235.7 + 890_534.22 * t)
        + 0.0028 * cos(269.9 + 954_397.74 * t);

    let distance_km = EARTH_RADIUS_KM / sin(parallax);
    ecliptic_to_body(lambda, beta, distance_km, days)
}

/// Position of the Moon as seen from the observer's site (parallax corrected).
///
/// The geocentric site vector is subtracted from the geocentric lunar vector, both in Earth
/// radii in the equatorial frame of date. The correction reaches about one degree near the
/// horizon.
pub fn topocentric_moon(observer: &Observer, epoch: &Epoch) -> BodyPosition {
    let geo = moon_position(epoch);
    let moon = spherical_to_cartesian(
        geo.ra * RADEG,
        geo.dec * RADEG,
        geo.distance_km / EARTH_RADIUS_KM,
    );
    let topo: Vector3<f64> = moon - observer.geocentric_position(epoch);
    let (ra, dec, r) = cartesian_to_radec(&topo);
    BodyPosition {
        ra: ra.to_degrees(),
        dec: dec.to_degrees(),
        distance_km: r * EARTH_RADIUS_KM,
    }
}

/// Illuminated fraction of the lunar disk, in [0, 1].
///
/// ```text
/// cos ψ = sin δ☉ sin δ + cos δ☉ cos δ cos(α☉ − α)
/// tan i = R sin ψ / (Δ − R cos ψ)
/// k     = (1 + cos i) / 2
/// ```
///
/// where ψ is the geocentric elongation, i the phase angle, R the Earth–Sun distance and
/// Δ the Earth–Moon distance.
pub fn moon_illumination(epoch: &Epoch) -> f64 {
    let sun = sun_position(epoch);
    let moon = moon_position(epoch);

    let (sa, sd) = (sun.ra * RADEG, sun.dec * RADEG);
    let (ma, md) = (moon.ra * RADEG, moon.dec * RADEG);
    let cos_psi = sd.sin() * md.sin() + sd.cos() * md.cos() * (sa - ma).cos();
    let psi = cos_psi.clamp(-1.0, 1.0).acos();

    let phase_angle =
        (sun.distance_km * psi.sin()).atan2(moon.distance_km - sun.distance_km * psi.cos());
    ((1.0 + phase_angle.cos()) / 2.0).clamp(0.0, 1.0)
}
