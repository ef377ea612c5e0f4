//! Observer locations on the Earth's surface

use crate::celestial::{CelestialObject, GeocentricTarget};
use crate::constants::TAU;
use crate::earthlib::terra;
use crate::errors::{PositionError, Result};
use crate::functions::{rot_z, rotate_each};
use crate::planetlib::{Body, Ephemeris};
use crate::positions::{Frame, Position};
use crate::time::Time;
use crate::units::{interpret_ltude, Angle, Distance};
use log::debug;
use nalgebra::{Matrix3, Matrix3xX, Vector3};
use std::fmt;
use std::sync::Arc;

/// A latitude or longitude as accepted by [`Topos::new`]
#[derive(Debug, Clone, PartialEq)]
pub enum Ltude {
    /// A single-valued angle
    Angle(Angle),
    /// Plain degrees, positive north or east
    Degrees(f64),
    /// Degrees with a hemisphere letter, e.g. `"42.3583 N"` or `"71 3 37 W"`
    Text(String),
}

impl From<Angle> for Ltude {
    fn from(angle: Angle) -> Self {
        Ltude::Angle(angle)
    }
}

impl From<f64> for Ltude {
    fn from(degrees: f64) -> Self {
        Ltude::Degrees(degrees)
    }
}

impl From<&str> for Ltude {
    fn from(text: &str) -> Self {
        Ltude::Text(text.to_string())
    }
}

impl From<String> for Ltude {
    fn from(text: String) -> Self {
        Ltude::Text(text)
    }
}

impl Ltude {
    fn into_angle(self, name: &str, positive: char, negative: char) -> Result<Angle> {
        match self {
            Ltude::Angle(angle) if angle.len() == 1 => Ok(angle),
            Ltude::Angle(angle) => Err(PositionError::InvalidArgument(format!(
                "{} must be a single angle, got {} values",
                name,
                angle.len()
            ))),
            Ltude::Degrees(degrees) if degrees.is_finite() => Ok(Angle::from_degrees(vec![degrees])),
            Ltude::Degrees(degrees) => Err(PositionError::InvalidArgument(format!(
                "{} must be finite, got {}",
                name, degrees
            ))),
            Ltude::Text(text) => {
                let degrees = interpret_ltude(&text, name, positive, negative)?;
                Ok(Angle::from_degrees(vec![degrees]))
            }
        }
    }
}

/// A fixed location on the Earth's surface
///
/// The local unit vectors `up`, `north` and `west` are expressed in the
/// Earth-fixed equatorial frame and are mutually orthonormal.
#[derive(Clone)]
pub struct Topos {
    latitude: Angle,
    longitude: Angle,
    elevation: Distance,
    up: Vector3<f64>,
    north: Vector3<f64>,
    west: Vector3<f64>,
    ephemeris: Option<Arc<dyn Ephemeris>>,
}

impl Topos {
    /// Create a location from latitude (positive north), longitude
    /// (positive east) and elevation in meters.
    ///
    /// ```rust
    /// use starfield_positions::toposlib::Topos;
    ///
    /// let boston = Topos::new("42.3583 N", "71.0603 W", 43.0).unwrap();
    /// assert!(boston.longitude().degrees()[0] < 0.0);
    /// assert!(Topos::new("42.3583 E", 0.0, 0.0).is_err());
    /// ```
    pub fn new(
        latitude: impl Into<Ltude>,
        longitude: impl Into<Ltude>,
        elevation_m: f64,
    ) -> Result<Self> {
        let latitude = latitude.into().into_angle("latitude", 'N', 'S')?;
        let longitude = longitude.into().into_angle("longitude", 'E', 'W')?;
        if !elevation_m.is_finite() {
            return Err(PositionError::InvalidArgument(format!(
                "elevation must be finite, got {}",
                elevation_m
            )));
        }
        Ok(Self::from_angles(latitude, longitude, elevation_m))
    }

    /// Create a location from decimal degrees
    ///
    /// Non-finite values are rejected as in [`Topos::new`].
    pub fn from_degrees(latitude: f64, longitude: f64, elevation_m: f64) -> Result<Self> {
        Self::new(Ltude::Degrees(latitude), Ltude::Degrees(longitude), elevation_m)
    }

    fn from_angles(latitude: Angle, longitude: Angle, elevation_m: f64) -> Self {
        let lat = latitude.radians_scalar().unwrap_or(0.0);
        let lon = longitude.radians_scalar().unwrap_or(0.0);
        let (sinlat, coslat) = lat.sin_cos();
        let (sinlon, coslon) = lon.sin_cos();

        Topos {
            latitude,
            longitude,
            elevation: Distance::from_m(vec![elevation_m]),
            up: Vector3::new(coslat * coslon, coslat * sinlon, sinlat),
            north: Vector3::new(-sinlat * coslon, -sinlat * sinlon, coslat),
            west: Vector3::new(sinlon, -coslon, 0.0),
            ephemeris: None,
        }
    }

    /// Attach the ephemeris used to find the Earth
    pub fn with_ephemeris(mut self, ephemeris: Arc<dyn Ephemeris>) -> Self {
        self.ephemeris = Some(ephemeris);
        self
    }

    pub fn latitude(&self) -> &Angle {
        &self.latitude
    }

    pub fn longitude(&self) -> &Angle {
        &self.longitude
    }

    pub fn elevation(&self) -> &Distance {
        &self.elevation
    }

    pub fn up(&self) -> &Vector3<f64> {
        &self.up
    }

    pub fn north(&self) -> &Vector3<f64> {
        &self.north
    }

    pub fn west(&self) -> &Vector3<f64> {
        &self.west
    }

    pub fn ephemeris(&self) -> Option<&Arc<dyn Ephemeris>> {
        self.ephemeris.as_ref()
    }

    fn elevation_au(&self) -> f64 {
        self.elevation.au().first().copied().unwrap_or(0.0)
    }

    /// Elevation in meters
    pub fn elevation_m(&self) -> f64 {
        self.elevation.m().first().copied().unwrap_or(0.0)
    }

    /// GCRS position (AU) and velocity (AU/day) of this location
    pub fn position_and_velocity(&self, t: &Time) -> (Matrix3xX<f64>, Matrix3xX<f64>) {
        let lat = self.latitude.radians_scalar().unwrap_or(0.0);
        let lon = self.longitude.radians_scalar().unwrap_or(0.0);
        let (pos, vel) = terra(lat, lon, self.elevation_au(), t.gast());
        (rotate_each(t.mt(), &pos), rotate_each(t.mt(), &vel))
    }

    /// Rotations from the ICRS into (north, east, up) at each instant
    pub fn altaz_rotation(&self, t: &Time) -> Vec<Matrix3<f64>> {
        let u = Matrix3::from_columns(&[self.north, -self.west, self.up]);
        t.gast()
            .iter()
            .zip(t.m())
            .map(|(gast, m)| {
                let spin = rot_z(gast * TAU / 24.0);
                (spin * u).transpose() * m
            })
            .collect()
    }

    /// Barycentric position of this location at each instant of `t`
    ///
    /// Requires an ephemeris that can locate the Earth.
    pub fn at(&self, t: &Time) -> Result<Position> {
        let ephemeris = self
            .ephemeris
            .as_ref()
            .ok_or(PositionError::MissingEphemeris("Topos::at"))?;

        let (earth_position, earth_velocity) =
            ephemeris.position_velocity_of(Body::Earth, t.tdb())?;
        let (tpos, tvel) = self.position_and_velocity(t);
        debug!("{} evaluated at {}", self, t);

        let position = Position::from_parts(
            Frame::Barycentric,
            earth_position + &tpos,
            Some(earth_velocity + &tvel),
            Some(Arc::new(t.clone())),
        )?
        .not_geocentric()
        .with_gcrs(tpos, tvel)
        .with_topos(Arc::new(self.clone()))
        .with_ephemeris(Arc::clone(ephemeris))
        .with_horizon_rotation(self.altaz_rotation(t));

        Ok(position)
    }
}

impl GeocentricTarget for Topos {
    /// Position of this location in the GCRS at each instant of `t`
    fn gcrs(&self, t: &Time) -> Result<Position> {
        let (tpos, tvel) = self.position_and_velocity(t);
        let mut position =
            Position::from_parts(Frame::Geocentric, tpos, Some(tvel), Some(Arc::new(t.clone())))?
                .with_topos(Arc::new(self.clone()))
                .with_horizon_rotation(self.altaz_rotation(t));
        if let Some(ephemeris) = &self.ephemeris {
            position = position.with_ephemeris(Arc::clone(ephemeris));
        }
        Ok(position)
    }
}

impl CelestialObject for Topos {
    fn name(&self) -> String {
        self.to_string()
    }

    fn as_geocentric(&self) -> Option<&dyn GeocentricTarget> {
        Some(self)
    }
}

impl fmt::Debug for Topos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topos")
            .field("latitude", &self.latitude.degrees_scalar())
            .field("longitude", &self.longitude.degrees_scalar())
            .field("elevation_m", &self.elevation_m())
            .field("has_ephemeris", &self.ephemeris.is_some())
            .finish()
    }
}

impl fmt::Display for Topos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Topos {:.4} N {:.4} E>",
            self.latitude.degrees_scalar().unwrap_or(0.0),
            self.longitude.degrees_scalar().unwrap_or(0.0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EARTH_RADIUS_AU, J2000};
    use crate::planetlib::LinearEphemeris;
    use approx::assert_relative_eq;

    #[test]
    fn test_parses_hemisphere_strings() {
        let topos = Topos::new("42.3583 N", "71 3 37.08 W", 0.0).unwrap();
        assert_relative_eq!(topos.latitude().degrees()[0], 42.3583, epsilon = 1e-12);
        assert_relative_eq!(
            topos.longitude().degrees()[0],
            -(71.0 + 3.0 / 60.0 + 37.08 / 3600.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            Topos::new("42 W", 0.0, 0.0),
            Err(PositionError::InvalidArgument(_))
        ));
        assert!(matches!(
            Topos::new(Angle::from_degrees(vec![1.0, 2.0]), 0.0, 0.0),
            Err(PositionError::InvalidArgument(_))
        ));
        assert!(Topos::new(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_from_degrees_rejects_non_finite() {
        for (lat, lon, elevation) in [
            (f64::NAN, 0.0, 0.0),
            (0.0, f64::INFINITY, 0.0),
            (0.0, 0.0, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                Topos::from_degrees(lat, lon, elevation),
                Err(PositionError::InvalidArgument(_))
            ));
        }
        assert!(Topos::from_degrees(-90.0, 180.0, 0.0).is_ok());
    }

    #[test]
    fn test_local_vectors_at_origin() {
        let topos = Topos::from_degrees(0.0, 0.0, 0.0).unwrap();
        assert_eq!(*topos.up(), Vector3::x());
        assert_eq!(*topos.north(), Vector3::z());
        assert_eq!(*topos.west(), -Vector3::y());
    }

    #[test]
    fn test_geocentric_distance_is_earth_radius() {
        let topos = Topos::from_degrees(0.0, 45.0, 0.0).unwrap();
        let t = Time::from_tt_batch(&[J2000, J2000 + 0.25]);
        let (pos, vel) = topos.position_and_velocity(&t);
        for i in 0..2 {
            assert_relative_eq!(pos.column(i).norm(), EARTH_RADIUS_AU, epsilon = 1e-12);
            assert!(pos.column(i).dot(&vel.column(i)).abs() < 1e-15);
        }
    }

    #[test]
    fn test_altaz_rotation_puts_zenith_overhead() {
        let topos = Topos::from_degrees(35.0, -120.0, 0.0).unwrap();
        let t = Time::from_tt(J2000 + 1234.5);
        let (pos, _) = topos.position_and_velocity(&t);
        let r = topos.altaz_rotation(&t)[0];
        let local = r * pos.column(0).normalize();
        // Geodetic up differs from the geocentric radius by < 0.2 degrees
        assert!(local.z > (89.8_f64).to_radians().sin());
    }

    #[test]
    fn test_at_requires_ephemeris() {
        let topos = Topos::from_degrees(10.0, 20.0, 0.0).unwrap();
        assert!(matches!(
            topos.at(&Time::from_tt(J2000)),
            Err(PositionError::MissingEphemeris(_))
        ));
    }

    #[test]
    fn test_at_adds_earth_state() {
        let earth = Vector3::new(-0.17, 0.88, 0.38);
        let eph = LinearEphemeris::new(J2000).with_body(
            Body::Earth,
            earth,
            Vector3::new(-0.017, -0.003, -0.001),
        );
        let eph: Arc<dyn Ephemeris> = Arc::new(eph);
        let topos = Topos::from_degrees(10.0, 20.0, 100.0)
            .unwrap()
            .with_ephemeris(Arc::clone(&eph));
        let t = Time::from_tt(J2000);
        let position = topos.at(&t).unwrap();
        // Earth is looked up at TDB, not at the ephemeris epoch
        let (earth, _) = eph.state_at(Body::Earth, t.tdb()[0]).unwrap();

        assert_eq!(position.frame(), Frame::Barycentric);
        assert!(!position.is_geocentric());
        assert!(position.topos().is_some());
        assert!(position.horizon_rotation().is_some());
        let offset = position.position_au().column(0) - earth;
        assert_relative_eq!(
            offset,
            position.gcrs_position().unwrap().column(0).into_owned(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_gcrs_is_geocentric_frame() {
        let topos = Topos::from_degrees(-30.0, 70.0, 0.0).unwrap();
        let position = topos.gcrs(&Time::from_tt(J2000)).unwrap();
        assert_eq!(position.frame(), Frame::Geocentric);
        assert!(position.is_geocentric());
        assert!(position.ephemeris().is_none());
        assert!(topos.as_geocentric().is_some());
        assert!(topos.as_astrometric().is_none());
    }
}
