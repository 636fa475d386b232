//! # Observer site geometry
//!
//! A ground-based [`Observer`] is a plain value: geodetic latitude, east-positive longitude,
//! elevation above the ellipsoid and an optional name. Everything the transit search needs
//! from the site is derived from it:
//!
//! - **Local apparent sidereal time** from [`gmst`](crate::time::gmst) and the
//!   [`equation of the equinoxes`](crate::earth_orientation::equequ),
//! - **hour angle** of a right ascension of date, wrapped into [−180°, 180°),
//! - **altitude/azimuth** of J2000 catalog coordinates (precessed to the date),
//! - **geocentric parallax factors** (ρ·cosφ, ρ·sinφ) and the geocentric position of the
//!   site in the equatorial frame of date, used for the topocentric Moon.
//!
//! ## Units
//!
//! - Latitude, longitude, sidereal time, hour angle, altitude, azimuth: **degrees**.
//! - Elevation: **meters**.
//! - Parallax factors and geocentric site vector: **Earth equatorial radii**.
//!
//! ## Errors
//!
//! [`Observer::new`] returns [`ExoError::NaNValue`] for NaN inputs and
//! [`ExoError::InvalidObserver`] for a latitude outside [−90°, 90°] or a non finite value.
//!
//! ## See also
//! ------------
//! * [`crate::ref_system::equatorial_to_horizontal`] – the alt/az transformation.
//! * [`crate::bodies`] – Sun and Moon positions consumed with [`Observer::altaz_of_date`].

use hifitime::Epoch;
use nalgebra::Vector3;
use ordered_float::NotNan;

use crate::constants::{Degree, Meter, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS};
use crate::earth_orientation::{equequ, precess_from_j2000};
use crate::exo_errors::ExoError;
use crate::ref_system::{equatorial_to_horizontal, rotmt, wrap_180, wrap_360};
use crate::time::{gmst, mjd_ut};

/// Geodetic observing site.
///
/// Units
/// -----
/// * `latitude`: degrees, north positive.
/// * `longitude`: degrees, east positive, normalized into [−180, 180).
/// * `elevation`: meters above the reference ellipsoid.
/// * `rho_cos_phi`, `rho_sin_phi`: Earth radii (precomputed from latitude and elevation).
///
/// See also
/// ------------
/// * [`geodetic_to_parallax`] – Converts geodetic latitude/elevation to (ρ·cosφ, ρ·sinφ).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Observer {
    /// Geodetic latitude in **degrees**.
    pub latitude: NotNan<f64>,

    /// Geodetic longitude in **degrees** east of Greenwich.
    pub longitude: NotNan<f64>,

    /// Height above the ellipsoid in **meters**.
    pub elevation: NotNan<f64>,

    /// Optional human-readable site name.
    pub name: Option<String>,

    /// ρ·cosφ (geocentric latitude φ), in **Earth radii**.
    pub rho_cos_phi: NotNan<f64>,

    /// ρ·sinφ (geocentric latitude φ), in **Earth radii**.
    pub rho_sin_phi: NotNan<f64>,
}

impl Observer {
    /// Create a new observer from geodetic coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `latitude`: Geodetic latitude in **degrees**, within [−90, 90].
    /// * `longitude`: Geodetic longitude in **degrees** (east positive), any range.
    /// * `elevation`: Height above the reference ellipsoid in **meters**.
    /// * `name`: Optional site name.
    ///
    /// Return
    /// ----------
    /// * A constructed [`Observer`] with precomputed parallax factors.
    ///
    /// Errors
    /// ----------
    /// * [`ExoError::NaNValue`] if any input is NaN.
    /// * [`ExoError::InvalidObserver`] if the latitude is out of range or an input is infinite.
    pub fn new(
        latitude: Degree,
        longitude: Degree,
        elevation: Meter,
        name: Option<String>,
    ) -> Result<Observer, ExoError> {
        let latitude = NotNan::new(latitude)?;
        let longitude = NotNan::new(longitude)?;
        let elevation = NotNan::new(elevation)?;

        if !(latitude.is_finite() && longitude.is_finite() && elevation.is_finite()) {
            return Err(ExoError::InvalidObserver(
                "coordinates must be finite".into(),
            ));
        }
        if latitude.abs() > 90.0 {
            return Err(ExoError::InvalidObserver(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }

        let (rho_cos_phi, rho_sin_phi) =
            geodetic_to_parallax(latitude.into_inner(), elevation.into_inner());

        Ok(Observer {
            latitude,
            longitude: NotNan::new(wrap_180(longitude.into_inner()))?,
            elevation,
            name,
            rho_cos_phi: NotNan::new(rho_cos_phi)?,
            rho_sin_phi: NotNan::new(rho_sin_phi)?,
        })
    }

    /// Local apparent sidereal time in **degrees**, within [0, 360).
    ///
    /// ```text
    /// LAST = GMST(UT) + Eq_eq(TT) + λ
    /// ```
    ///
    /// # See also
    /// * [`gmst`], [`equequ`] – Earth orientation terms.
    pub fn local_sidereal_time(&self, epoch: &Epoch) -> Degree {
        let gast = gmst(mjd_ut(epoch)) + equequ(epoch.to_mjd_tt_days());
        wrap_360(gast.to_degrees() + self.longitude.into_inner())
    }

    /// Hour angle of a right ascension **of date**, wrapped into [−180°, 180°).
    ///
    /// Negative values are east of the meridian (rising), positive values west (setting).
    pub fn hour_angle(&self, ra_of_date: Degree, epoch: &Epoch) -> Degree {
        wrap_180(self.local_sidereal_time(epoch) - ra_of_date)
    }

    /// Altitude and azimuth of coordinates referred to the equator and equinox of date.
    ///
    /// Used for the Sun and the Moon, whose positions are computed in the frame of date.
    pub fn altaz_of_date(&self, ra: Degree, dec: Degree, epoch: &Epoch) -> (Degree, Degree) {
        equatorial_to_horizontal(
            self.hour_angle(ra, epoch),
            dec,
            self.latitude.into_inner(),
        )
    }

    /// Altitude and azimuth of catalog (J2000) coordinates at `epoch`.
    ///
    /// Arguments
    /// -----------------
    /// * `ra`, `dec`: J2000 mean coordinates in **degrees**.
    /// * `epoch`: instant of observation.
    ///
    /// Return
    /// ----------
    /// * `(altitude, azimuth)` in degrees, azimuth from North through East.
    ///
    /// See also
    /// ------------
    /// * [`precess_from_j2000`] – J2000 → mean equinox of date.
    pub fn altaz(&self, ra: Degree, dec: Degree, epoch: &Epoch) -> (Degree, Degree) {
        let (ra_date, dec_date) = precess_from_j2000(ra, dec, epoch.to_mjd_tt_days());
        self.altaz_of_date(ra_date, dec_date, epoch)
    }

    /// Geocentric position of the site in the equatorial frame of date, in Earth radii.
    ///
    /// The body-fixed vector `(ρ·cosφ cos λ, ρ·cosφ sin λ, ρ·sinφ)` is rotated by the
    /// Greenwich apparent sidereal time about the polar axis.
    pub fn geocentric_position(&self, epoch: &Epoch) -> Vector3<f64> {
        let last = self.local_sidereal_time(epoch).to_radians();
        let rho_cos_phi = self.rho_cos_phi.into_inner();
        rotmt(last, 2) * Vector3::new(rho_cos_phi, 0.0, self.rho_sin_phi.into_inner())
    }
}

/// Compute the normalized geocentric coordinates of an observer, taking into account
/// the Earth's oblateness.
///
/// Arguments
/// ---------
/// * `lat` - Geodetic latitude of the observer in **radians**.
/// * `height` - Observer's altitude above the reference ellipsoid in **meters**.
///
/// Returns
/// -------
/// A tuple `(rho_cos_phi, rho_sin_phi)` in Earth equatorial radii.
///
/// Details
/// -------
/// ```text
/// u = atan( (sin φ * (b/a)) / cos φ )
/// ρ_sinφ = (b/a) * sin u + (h/a) * sin φ
/// ρ_cosφ = cos u + (h/a) * cos φ
/// ```
///
/// where `a` and `b` are the Earth's semi-major and semi-minor axes,
/// and `h` is the height above the ellipsoid.
pub fn lat_alt_to_parallax(lat: f64, height: Meter) -> (f64, f64) {
    let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;

    // parametric latitude
    let u = (lat.sin() * axis_ratio).atan2(lat.cos());

    let rho_sin_phi = axis_ratio * u.sin() + (height / EARTH_MAJOR_AXIS) * lat.sin();
    let rho_cos_phi = u.cos() + (height / EARTH_MAJOR_AXIS) * lat.cos();

    (rho_cos_phi, rho_sin_phi)
}

/// Convert geodetic latitude (in degrees) and height (in meters)
/// into normalized parallax coordinates.
///
/// See also
/// --------
/// * [`lat_alt_to_parallax`] – Performs the actual computation given latitude in radians.
pub fn geodetic_to_parallax(lat: Degree, height: Meter) -> (f64, f64) {
    lat_alt_to_parallax(lat.to_radians(), height)
}
