use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Degree, Radian, DPI};

/// Compute a rotation matrix around one of the principal Cartesian axes (X, Y, or Z).
///
/// Returns the 3×3 matrix rotating a vector by an angle `alpha` (in radians)
/// around the axis given by `k`:
///
/// - `k = 0`: rotation around the X-axis,
/// - `k = 1`: rotation around the Y-axis,
/// - `k = 2`: rotation around the Z-axis.
///
/// Arguments
/// ---------
/// * `alpha`: rotation angle in **radians**, positive counter-clockwise when looking
///   down the rotation axis towards the origin.
/// * `k`: axis index (0, 1 or 2).
///
/// Returns
/// --------
/// * The orthonormal rotation matrix. The rotation is **applied to the vector** expressed
///   in a fixed frame.
///
/// # Panics
///
/// Panics if `k > 2`, as only axes 0–2 are valid.
///
/// # See also
/// * [`ecliptic_to_equatorial`] – rotation of an ecliptic vector by the obliquity.
pub fn rotmt(alpha: f64, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("**** ROTMT: invalid axis index {k} (must be 0,1,2) ****"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotate a geocentric ecliptic vector into the equatorial frame of the same equinox.
///
/// Arguments
/// ---------
/// * `ecliptic`: Cartesian vector in the ecliptic frame (any length unit).
/// * `obliquity`: obliquity of the ecliptic in **radians** (mean or true, matching the
///   equinox of the input).
pub fn ecliptic_to_equatorial(ecliptic: &Vector3<f64>, obliquity: Radian) -> Vector3<f64> {
    rotmt(obliquity, 0) * ecliptic
}

/// Unit (or scaled) Cartesian vector from spherical coordinates.
///
/// Arguments
/// ---------
/// * `lon`, `lat`: longitude-like and latitude-like angles in **radians**
///   (RA/Dec or ecliptic λ/β).
/// * `distance`: vector length.
pub fn spherical_to_cartesian(lon: Radian, lat: Radian, distance: f64) -> Vector3<f64> {
    Vector3::new(
        distance * lat.cos() * lon.cos(),
        distance * lat.cos() * lon.sin(),
        distance * lat.sin(),
    )
}

/// Convert a 3D Cartesian position vector to right ascension and declination.
///
/// Given a position vector expressed in Cartesian coordinates (typically in an equatorial frame),
/// this function returns the corresponding right ascension (α), declination (δ), and norm (distance).
///
/// Arguments
/// ---------
/// * `cartesian_position`: 3D position vector in Cartesian coordinates.
///
/// Returns
/// --------
/// * Tuple `(α, δ, ρ)`:
///     - `α`: right ascension in radians, in the range [0, 2π).
///     - `δ`: declination in radians, in the range [−π/2, +π/2].
///     - `ρ`: Euclidean norm of the vector (distance to the origin).
///
/// Remarks
/// -------
/// * If the input vector has zero norm, the result is `(0.0, 0.0, 0.0)`.
/// * At the poles the right ascension is undefined and reported as 0.
pub fn cartesian_to_radec(cartesian_position: &Vector3<f64>) -> (Radian, Radian, f64) {
    let pos_norm = cartesian_position.norm();
    if pos_norm == 0. {
        return (0.0, 0.0, pos_norm);
    }

    let delta = (cartesian_position.z / pos_norm).clamp(-1.0, 1.0).asin();
    if delta.cos() == 0.0 {
        return (0.0, delta, pos_norm);
    }

    let alpha = cartesian_position.y.atan2(cartesian_position.x);
    (alpha.rem_euclid(DPI), delta, pos_norm)
}

/// Equatorial → horizontal coordinates.
///
/// ```text
/// sin h = sin φ sin δ + cos φ cos δ cos H
/// A     = atan2(−sin H cos δ, cos φ sin δ − sin φ cos δ cos H)
/// ```
///
/// Arguments
/// ---------
/// * `hour_angle`: local hour angle H in **degrees** (positive west of the meridian).
/// * `dec`: declination δ in **degrees**.
/// * `latitude`: observer latitude φ in **degrees**.
///
/// Returns
/// --------
/// * `(altitude, azimuth)` in degrees; azimuth measured from North through East, in [0, 360).
pub fn equatorial_to_horizontal(
    hour_angle: Degree,
    dec: Degree,
    latitude: Degree,
) -> (Degree, Degree) {
    let (h, d, phi) = (
        hour_angle.to_radians(),
        dec.to_radians(),
        latitude.to_radians(),
    );

    let sin_alt = phi.sin() * d.sin() + phi.cos() * d.cos() * h.cos();
    let alt = sin_alt.clamp(-1.0, 1.0).asin();

    let y = -h.sin() * d.cos();
    let x = phi.cos() * d.sin() - phi.sin() * d.cos() * h.cos();
    let az = y.atan2(x);

    (alt.to_degrees(), wrap_360(az.to_degrees()))
}

/// Great-circle separation between two points given in RA/Dec (degrees).
///
/// Uses the Vincenty form of the haversine, well conditioned at both small and
/// antipodal separations.
pub fn angular_separation(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> Degree {
    let (a1, d1, a2, d2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    let dra = a2 - a1;

    let num_x = d2.cos() * dra.sin();
    let num_y = d1.cos() * d2.sin() - d1.sin() * d2.cos() * dra.cos();
    let den = d1.sin() * d2.sin() + d1.cos() * d2.cos() * dra.cos();

    num_x.hypot(num_y).atan2(den).to_degrees()
}

/// Wrap an angle in degrees into [−180, 180).
pub fn wrap_180(angle: Degree) -> Degree {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap an angle in degrees into [0, 360).
pub fn wrap_360(angle: Degree) -> Degree {
    angle.rem_euclid(360.0)
}
