use crate::constants::{ArcSec, Degree, Radian, RADEG, RADSEC, T2000};

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// This function returns the mean obliquity angle ε, defined as the angle between
/// the Earth's equator and the ecliptic plane, using the standard IAU 1976 polynomial model.
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
///
/// Formula
/// -------
/// ```text
/// ε(t) = ε₀ + ε₁·T + ε₂·T² + ε₃·T³,   T = (tjm - T2000) / 36525
/// ```
/// evaluated with Horner's method, coefficients in arcseconds.
pub fn obleq(tjm: f64) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Nutation in longitude and obliquity, truncated IAU 1980 series.
///
/// Only the four dominant periodic terms are kept (lunar node, twice the mean longitudes
/// of the Sun and of the Moon, twice the node). The truncation error stays below
/// 0.5 arcsecond in Δψ and 0.1 arcsecond in Δε, far below what altitude-based
/// observability decisions need.
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * `(Δψ, Δε)` in **arcseconds**.
pub fn nutation(tjm: f64) -> (ArcSec, ArcSec) {
    let t = (tjm - T2000) / 36525.0;

    // longitude of the Moon's ascending node, mean longitudes of the Sun and the Moon
    let node = (125.04452 - 1934.136261 * t) * RADEG;
    let sun = (280.4665 + 36000.7698 * t) * RADEG;
    let moon = (218.3165 + 481267.8813 * t) * RADEG;

    let dpsi = -17.20 * node.sin() - 1.32 * (2.0 * sun).sin() - 0.23 * (2.0 * moon).sin()
        + 0.21 * (2.0 * node).sin();
    let deps = 9.20 * node.cos() + 0.57 * (2.0 * sun).cos() + 0.10 * (2.0 * moon).cos()
        - 0.09 * (2.0 * node).cos();

    (dpsi, deps)
}

/// Compute the equation of the equinoxes (nutation correction) in radians.
///
/// This term accounts for the small difference between apparent sidereal time
/// and mean sidereal time due to the nutation of Earth's rotation axis:
///
/// ```text
/// Eq_eq = Δψ * cos(ε)
/// ```
///
/// # Arguments
/// * `tjm` - Modified Julian Date (TT or TDB time scale)
///
/// # See also
/// * [`obleq`] – mean obliquity of the ecliptic.
/// * [`nutation`] – truncated nutation series.
pub fn equequ(tjm: f64) -> Radian {
    let (dpsi, _deps) = nutation(tjm);
    RADSEC * dpsi * obleq(tjm).cos()
}

/// Precess mean equatorial coordinates from J2000 to the mean equator and equinox of date
/// (IAU 1976 model).
///
/// The three precession angles are time polynomials in Julian centuries
/// `T = (tjm - T2000) / 36525`:
///
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// θ(T) = (0.5567530 - 0.0001185·T - 0.0000116·T²) · T  [deg]
/// ```
///
/// and the rigorous transformation is
///
/// ```text
/// A = cos δ₀ sin(α₀ + ζ)
/// B = cos θ cos δ₀ cos(α₀ + ζ) − sin θ sin δ₀
/// C = sin θ cos δ₀ cos(α₀ + ζ) + cos θ sin δ₀
/// α = atan2(A, B) + z,   δ = asin(C)
/// ```
///
/// Arguments
/// ---------
/// * `ra`, `dec`: J2000 coordinates in **degrees**.
/// * `tjm`: target epoch, Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * `(ra, dec)` of date in degrees, RA within [0, 360).
pub fn precess_from_j2000(ra: Degree, dec: Degree, tjm: f64) -> (Degree, Degree) {
    let t = (tjm - T2000) / 36525.0;

    let zeta = ((0.0000050 * t + 0.0000839) * t + 0.6406161) * t * RADEG;
    let z = ((0.0000051 * t + 0.0003041) * t + 0.6406161) * t * RADEG;
    let theta = ((-0.0000116 * t - 0.0001185) * t + 0.5567530) * t * RADEG;

    let (alpha0, delta0) = (ra * RADEG, dec * RADEG);
    let a = delta0.cos() * (alpha0 + zeta).sin();
    let b = theta.cos() * delta0.cos() * (alpha0 + zeta).cos() - theta.sin() * delta0.sin();
    let c = theta.sin() * delta0.cos() * (alpha0 + zeta).cos() + theta.cos() * delta0.sin();

    let alpha = (a.atan2(b) + z).to_degrees().rem_euclid(360.0);
    let delta = c.clamp(-1.0, 1.0).asin().to_degrees();
    (alpha, delta)
}

#[cfg(test)]
mod test_earth_orientation {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_obliquity() {
        let obl = obleq(T2000);
        assert_relative_eq!(obl, 0.40909280422232897, epsilon = 1e-15);
    }

    #[test]
    fn test_nutation_matches_full_series() {
        // full IAU 1980 series at J2000: Δψ = -13.923", Δε = -5.774"
        let (dpsi, deps) = nutation(T2000);
        assert_relative_eq!(dpsi, -13.923385169502602, epsilon = 0.5);
        assert_relative_eq!(deps, -5.773808263765919, epsilon = 0.5);
    }

    #[test]
    fn test_equequ_is_small() {
        let val = equequ(58000.0);
        // below 0.001 rad ≈ 206 arcsec
        assert!(val.abs() < 1e-3);
        assert!((equequ(60000.0) - equequ(T2000)).abs() > 1e-7);
    }

    #[test]
    fn test_precession_identity_at_j2000() {
        let (ra, dec) = precess_from_j2000(41.054063, 49.227750, T2000);
        assert_relative_eq!(ra, 41.054063, epsilon = 1e-9);
        assert_relative_eq!(dec, 49.227750, epsilon = 1e-9);
    }

    #[test]
    fn test_precession_theta_persei() {
        // Meeus, Astronomical Algorithms, example 21.b: θ Persei J2000 (41.054063, 49.227750)
        // → 2028 Nov 13.19 TD (41.547214, 49.348483); the example also applies ~0.004° of
        // proper motion, which is not modelled here.
        let tjm = 2462088.69 - 2400000.5;
        let (ra, dec) = precess_from_j2000(41.054063, 49.227750, tjm);
        assert_relative_eq!(ra, 41.547214, epsilon = 1e-2);
        assert_relative_eq!(dec, 49.348483, epsilon = 1e-2);
    }
}
