//! Positions and the observation pipeline
//!
//! A [`Position`] is a batch of ICRS-oriented vectors tagged with the
//! [`Frame`] it belongs to. Each pipeline step returns a new position in
//! the next frame, annotated with whatever the following step needs:
//!
//! ```text
//! Barycentric --observe--> Astrometric --apparent--> Apparent --altaz--> (alt, az, distance)
//! Geocentric  --observe--------------------------->  Apparent
//! ```
//!
//! ```rust
//! use starfield_positions::positions::Position;
//!
//! let (ra, dec, distance) = Position::icrs([1.0, 1.0, 1.0]).radec(None).unwrap();
//! assert_eq!(ra.to_string(), "03h 00m 00.00s");
//! assert_eq!(dec.to_string(), "+35deg 15' 51.8\"");
//! assert_eq!(distance.to_string(), "1.73205 AU");
//! ```

use crate::celestial::CelestialObject;
use crate::config::PipelineConfig;
use crate::constants::{C_AUDAY, RAD2DEG, ROTATION_TO_ECLIPTIC};
use crate::earthlib::{compute_limb_angle, refract_with_tolerance};
use crate::errors::{PositionError, Result};
use crate::functions::{length_of, rotate_all, rotate_each, to_polar};
use crate::planetlib::Ephemeris;
use crate::relativity::{add_aberration, add_deflection};
use crate::time::Time;
use crate::toposlib::Topos;
use crate::units::{Angle, Distance, Velocity};
use log::debug;
use nalgebra::{Matrix3, Matrix3xX};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;
use std::sync::Arc;

/// The reference frame a position is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Plain ICRS-oriented vector with no particular origin
    Icrs,
    /// Measured from the solar system barycenter
    Barycentric,
    /// Observer to target, corrected for light travel time
    Astrometric,
    /// Astrometric plus deflection and aberration
    Apparent,
    /// Measured from the geocenter
    Geocentric,
}

impl Frame {
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Icrs => "ICRS",
            Frame::Barycentric => "Barycentric",
            Frame::Astrometric => "Astrometric",
            Frame::Apparent => "Apparent",
            Frame::Geocentric => "Geocentric",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equinox to measure right ascension and declination against
#[derive(Debug, Clone, PartialEq)]
pub enum Epoch {
    /// The true equator and equinox of a given time
    Time(Time),
    /// The true equator and equinox of a TT Julian date
    Tt(f64),
    /// The position's own time
    Date,
}

impl From<Time> for Epoch {
    fn from(t: Time) -> Self {
        Epoch::Time(t)
    }
}

impl From<f64> for Epoch {
    fn from(jd_tt: f64) -> Self {
        Epoch::Tt(jd_tt)
    }
}

impl FromStr for Epoch {
    type Err = PositionError;

    /// Parses `"date"` or a TT Julian date.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "date" {
            return Ok(Epoch::Date);
        }
        s.parse::<f64>().map(Epoch::Tt).map_err(|_| {
            PositionError::InvalidArgument(format!(
                "the epoch must be a Julian date, a floating point Terrestrial Time (TT), \
                 or the string \"date\" for epoch-of-date; got {:?}",
                s
            ))
        })
    }
}

/// Air temperature for refraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    Celsius(f64),
    /// The configured standard temperature
    Standard,
}

/// Air pressure for refraction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Pressure {
    Millibars(f64),
    /// Standard atmosphere at the observer's elevation
    #[default]
    Standard,
}

/// A batch of positions, with optional velocities, in one frame
#[derive(Debug, Clone)]
pub struct Position {
    position: Matrix3xX<f64>,
    velocity: Option<Matrix3xX<f64>>,
    time: Option<Arc<Time>>,
    frame: Frame,
    is_geocentric: bool,
    light_time: Option<Vec<f64>>,
    observer: Option<Arc<Position>>,
    topos: Option<Arc<Topos>>,
    horizon_rotation: Option<Vec<Matrix3<f64>>>,
    ephemeris: Option<Arc<dyn Ephemeris>>,
    gcrs_position: Option<Matrix3xX<f64>>,
    gcrs_velocity: Option<Matrix3xX<f64>>,
}

impl Position {
    /// Create a position from AU vectors and optional AU/day velocities,
    /// one column per instant.
    pub fn new(
        frame: Frame,
        position: Matrix3xX<f64>,
        velocity: Option<Matrix3xX<f64>>,
        time: Option<Time>,
    ) -> Result<Self> {
        Self::from_parts(frame, position, velocity, time.map(Arc::new))
    }

    /// A single ICRS vector in AU with no velocity or time
    pub fn icrs(xyz: [f64; 3]) -> Self {
        Position {
            position: Matrix3xX::from_column_slice(&xyz),
            velocity: None,
            time: None,
            frame: Frame::Icrs,
            is_geocentric: true,
            light_time: None,
            observer: None,
            topos: None,
            horizon_rotation: None,
            ephemeris: None,
            gcrs_position: None,
            gcrs_velocity: None,
        }
    }

    pub(crate) fn from_parts(
        frame: Frame,
        position: Matrix3xX<f64>,
        velocity: Option<Matrix3xX<f64>>,
        time: Option<Arc<Time>>,
    ) -> Result<Self> {
        let n = position.ncols();
        if let Some(v) = &velocity {
            if v.ncols() != n {
                return Err(PositionError::ShapeMismatch(format!(
                    "{} position columns but {} velocity columns",
                    n,
                    v.ncols()
                )));
            }
        }
        if let Some(t) = &time {
            if t.len() != n {
                return Err(PositionError::ShapeMismatch(format!(
                    "{} position columns but {} instants",
                    n,
                    t.len()
                )));
            }
        }

        let mut p = Position::icrs([0.0; 3]);
        p.position = position;
        p.velocity = velocity;
        p.time = time;
        p.frame = frame;
        Ok(p)
    }

    /// Attach the ephemeris used for deflection
    pub fn with_ephemeris(mut self, ephemeris: Arc<dyn Ephemeris>) -> Self {
        self.ephemeris = Some(ephemeris);
        self
    }

    pub(crate) fn with_observer(mut self, observer: Arc<Position>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub(crate) fn with_light_time(mut self, light_time: Vec<f64>) -> Self {
        self.light_time = Some(light_time);
        self
    }

    pub(crate) fn with_topos(mut self, topos: Arc<Topos>) -> Self {
        self.topos = Some(topos);
        self
    }

    pub(crate) fn with_horizon_rotation(mut self, rotation: Vec<Matrix3<f64>>) -> Self {
        self.horizon_rotation = Some(rotation);
        self
    }

    pub(crate) fn with_gcrs(mut self, position: Matrix3xX<f64>, velocity: Matrix3xX<f64>) -> Self {
        self.gcrs_position = Some(position);
        self.gcrs_velocity = Some(velocity);
        self
    }

    pub(crate) fn not_geocentric(mut self) -> Self {
        self.is_geocentric = false;
        self
    }

    /// Number of instants
    pub fn len(&self) -> usize {
        self.position.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.position.ncols() == 0
    }

    /// Position vectors, AU
    pub fn position_au(&self) -> &Matrix3xX<f64> {
        &self.position
    }

    /// Velocity vectors, AU/day
    pub fn velocity_au_per_d(&self) -> Option<&Matrix3xX<f64>> {
        self.velocity.as_ref()
    }

    pub fn time(&self) -> Option<&Time> {
        self.time.as_deref()
    }

    pub(crate) fn time_arc(&self) -> Option<Arc<Time>> {
        self.time.clone()
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// False once the barycentric offset of an Earth location was added
    pub fn is_geocentric(&self) -> bool {
        self.is_geocentric
    }

    /// Light travel time to the target, days
    pub fn light_time(&self) -> Option<&[f64]> {
        self.light_time.as_deref()
    }

    /// The position this one was observed from
    pub fn observer(&self) -> Option<&Position> {
        self.observer.as_deref()
    }

    pub fn topos(&self) -> Option<&Topos> {
        self.topos.as_deref()
    }

    /// ICRS to (north, east, up) rotations, one per instant
    pub fn horizon_rotation(&self) -> Option<&[Matrix3<f64>]> {
        self.horizon_rotation.as_deref()
    }

    pub fn ephemeris(&self) -> Option<&Arc<dyn Ephemeris>> {
        self.ephemeris.as_ref()
    }

    /// Geocentric offset of the Earth location, AU
    pub fn gcrs_position(&self) -> Option<&Matrix3xX<f64>> {
        self.gcrs_position.as_ref()
    }

    /// Geocentric velocity of the Earth location, AU/day
    pub fn gcrs_velocity(&self) -> Option<&Matrix3xX<f64>> {
        self.gcrs_velocity.as_ref()
    }

    /// Vector from `other` to `self`, as a plain ICRS position at this
    /// position's time.
    ///
    /// The velocity is `other.velocity - self.velocity` and is present only
    /// when both operands carry one.
    pub fn difference(&self, other: &Position) -> Position {
        debug_assert!(
            same_time(self.time(), other.time()),
            "subtracting positions at different times"
        );
        let velocity = match (&self.velocity, &other.velocity) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        };
        let mut p = Position::icrs([0.0; 3]);
        p.position = &self.position - &other.position;
        p.velocity = velocity;
        p.time = self.time.clone();
        p
    }

    /// Length of each position vector
    ///
    /// ```rust
    /// use starfield_positions::positions::Position;
    ///
    /// assert_eq!(Position::icrs([1.0, 1.0, 0.0]).distance().to_string(), "1.41421 AU");
    /// ```
    pub fn distance(&self) -> Distance {
        Distance::from_au(length_of(&self.position))
    }

    /// Length of each velocity vector, if known
    pub fn speed(&self) -> Option<Velocity> {
        self.velocity
            .as_ref()
            .map(|v| Velocity::from_au_per_d(length_of(v)))
    }

    /// Right ascension, declination and distance.
    ///
    /// Without an epoch the coordinates are ICRS. With one, the vectors are
    /// first rotated onto the true equator and equinox of that epoch.
    pub fn radec(&self, epoch: Option<Epoch>) -> Result<(Angle, Angle, Distance)> {
        let xyz = match epoch {
            None => self.position.clone(),
            Some(epoch) => {
                let t = self.resolve_epoch(epoch)?;
                let m = t.m();
                if m.len() == 1 {
                    rotate_all(&m[0], &self.position)
                } else {
                    rotate_each(m, &self.position)
                }
            }
        };

        let (r, dec, ra) = to_polar(&xyz);
        Ok((
            Angle::from_radians(ra).with_hours_preference(),
            Angle::from_radians(dec).signed(),
            Distance::from_au(r),
        ))
    }

    fn resolve_epoch(&self, epoch: Epoch) -> Result<Arc<Time>> {
        let t = match epoch {
            Epoch::Time(t) => Arc::new(t),
            Epoch::Tt(jd) if jd.is_finite() => Arc::new(Time::from_tt(jd)),
            Epoch::Tt(jd) => {
                return Err(PositionError::InvalidArgument(format!(
                    "epoch TT must be finite, got {}",
                    jd
                )))
            }
            Epoch::Date => self.time.clone().ok_or_else(|| {
                PositionError::InvalidArgument(
                    "epoch \"date\" requires a position with a time".to_string(),
                )
            })?,
        };

        if t.len() != 1 && t.len() != self.len() {
            return Err(PositionError::InvalidArgument(format!(
                "epoch has {} instants but the position has {}",
                t.len(),
                self.len()
            )));
        }
        Ok(t)
    }

    /// Position vectors rotated onto the J2000 ecliptic, AU
    pub fn ecliptic_position(&self) -> Matrix3xX<f64> {
        rotate_all(&ROTATION_TO_ECLIPTIC, &self.position)
    }

    /// Ecliptic latitude, longitude and distance
    pub fn ecliptic_latlon(&self) -> (Angle, Angle, Distance) {
        let (d, lat, lon) = to_polar(&self.ecliptic_position());
        (
            Angle::from_radians(lat).signed(),
            Angle::from_radians(lon),
            Distance::from_au(d),
        )
    }

    /// Observe `target` from this position.
    ///
    /// From a barycentric position the target computes its own light-time
    /// corrected astrometric position. From a geocentric position the
    /// target's GCRS position is differenced directly, giving an apparent
    /// position with no light-time correction.
    pub fn observe(&self, target: &dyn CelestialObject) -> Result<Position> {
        match self.frame {
            Frame::Barycentric => self.observe_astrometric(target),
            Frame::Geocentric => self.observe_geocentric(target),
            frame => Err(PositionError::WrongFrame {
                operation: "observe",
                frame: frame.to_string(),
            }),
        }
    }

    fn observe_astrometric(&self, target: &dyn CelestialObject) -> Result<Position> {
        let capability =
            target
                .as_astrometric()
                .ok_or_else(|| PositionError::UnsupportedTarget {
                    target: target.name(),
                    reason: "a barycentric observer needs a target that can \
                             correct for light travel time",
                })?;
        if self.time.is_none() {
            return Err(PositionError::MissingTime("observe"));
        }

        let observer = Arc::new(self.clone());
        let astrometric = capability.observe_from_bcrs(&observer)?;
        Ok(match astrometric.observer {
            Some(_) => astrometric,
            None => astrometric.with_observer(observer),
        })
    }

    fn observe_geocentric(&self, target: &dyn CelestialObject) -> Result<Position> {
        let capability = target
            .as_geocentric()
            .ok_or_else(|| PositionError::UnsupportedTarget {
                target: target.name(),
                reason: "a geocentric observer can only observe a target \
                         that can compute its GCRS position",
            })?;
        let t = self
            .time
            .as_deref()
            .ok_or(PositionError::MissingTime("observe"))?;

        let g = capability.gcrs(t)?;
        let velocity = match (&g.velocity, &self.velocity) {
            (Some(gv), Some(v)) => Some(gv - v),
            _ => None,
        };
        let apparent = Position::from_parts(
            Frame::Apparent,
            &g.position - &self.position,
            velocity,
            self.time.clone(),
        )?;
        Ok(apparent.with_observer(Arc::new(self.clone())))
    }

    /// Apply deflection and aberration with the default configuration
    pub fn apparent(&self) -> Result<Position> {
        self.apparent_with(&PipelineConfig::default())
    }

    /// Apparent position of an astrometric position.
    ///
    /// Bends the light path around the configured deflectors (and around
    /// the Earth for observers well away from the geocenter) and then
    /// applies the aberration of the observer's velocity.
    pub fn apparent_with(&self, config: &PipelineConfig) -> Result<Position> {
        if self.frame != Frame::Astrometric {
            return Err(PositionError::WrongFrame {
                operation: "apparent",
                frame: self.frame.to_string(),
            });
        }
        let t = self
            .time
            .as_deref()
            .ok_or(PositionError::MissingTime("apparent"))?;
        let observer = self
            .observer
            .as_deref()
            .ok_or(PositionError::MissingObserver)?;
        let ephemeris = observer
            .ephemeris
            .as_ref()
            .or(self.ephemeris.as_ref())
            .ok_or(PositionError::MissingEphemeris("apparent"))?;
        let observer_velocity = observer
            .velocity
            .as_ref()
            .ok_or(PositionError::MissingVelocity("apparent"))?;

        let mut position = self.position.clone();

        let flags = if observer.is_geocentric {
            vec![false; self.len()]
        } else {
            let (limb_angle, _) = compute_limb_angle(&position, &observer.position);
            include_earth_deflection(false, &limb_angle, config.earth_deflection_limb_angle)
        };
        debug!(
            "Earth deflection applied to {} of {} instants",
            flags.iter().filter(|&&f| f).count(),
            flags.len()
        );

        add_deflection(
            &mut position,
            &observer.position,
            &**ephemeris,
            t.tdb(),
            &flags,
            &config.deflectors,
        )?;

        let light_time = match &self.light_time {
            Some(lt) => lt.clone(),
            None => length_of(&self.position)
                .into_iter()
                .map(|d| d / C_AUDAY)
                .collect(),
        };
        add_aberration(&mut position, observer_velocity, &light_time);

        let mut apparent = Position::from_parts(Frame::Apparent, position, None, self.time.clone())?;
        apparent.observer = self.observer.clone();
        Ok(apparent)
    }

    /// Unrefracted altitude, azimuth and distance
    pub fn altaz(&self) -> Result<(Angle, Angle, Distance)> {
        self.altaz_with(None, Pressure::Standard, &PipelineConfig::default())
    }

    /// Altitude, azimuth and distance for an observer on the Earth.
    ///
    /// Azimuth is measured east from north. Without a temperature the
    /// altitude is geometric; otherwise it is corrected for atmospheric
    /// refraction.
    pub fn altaz_with(
        &self,
        temperature: Option<Temperature>,
        pressure: Pressure,
        config: &PipelineConfig,
    ) -> Result<(Angle, Angle, Distance)> {
        if self.frame != Frame::Apparent {
            return Err(PositionError::WrongFrame {
                operation: "altaz",
                frame: self.frame.to_string(),
            });
        }
        let observer = self
            .observer
            .as_deref()
            .ok_or(PositionError::MissingObserver)?;
        let (topos, rotation) = match (&observer.topos, &observer.horizon_rotation) {
            (Some(topos), Some(rotation)) => (topos, rotation),
            _ => return Err(PositionError::MissingObserver),
        };
        if rotation.len() != self.len() {
            return Err(PositionError::ShapeMismatch(format!(
                "{} horizon rotations for {} positions",
                rotation.len(),
                self.len()
            )));
        }

        let (r, alt, az) = to_polar(&rotate_each(rotation, &self.position));

        let alt = match temperature {
            None => Angle::from_radians(alt),
            Some(temperature) => {
                let temperature_c = match temperature {
                    Temperature::Celsius(c) => c,
                    Temperature::Standard => config.standard_temperature_c,
                };
                let pressure_mbar = match pressure {
                    Pressure::Millibars(p) => p,
                    Pressure::Standard => config.standard_pressure_mbar(topos.elevation_m()),
                };
                debug!(
                    "refracting for {} C and {:.1} mbar",
                    temperature_c, pressure_mbar
                );
                Angle::from_degrees(
                    alt.iter()
                        .map(|a| {
                            refract_with_tolerance(
                                a * RAD2DEG,
                                temperature_c,
                                pressure_mbar,
                                config.refraction_tolerance_deg,
                            )
                        })
                        .collect(),
                )
            }
        };

        Ok((alt, Angle::from_radians(az), Distance::from_au(r)))
    }
}

impl Sub for &Position {
    type Output = Position;

    fn sub(self, other: &Position) -> Position {
        self.difference(other)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        self.difference(&other)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} position x,y,z AU{}{}>",
            self.frame,
            if self.velocity.is_some() {
                " and velocity xdot,ydot,zdot AU/day"
            } else {
                ""
            },
            match &self.time {
                Some(t) => format!(" at {}", t),
                None => String::new(),
            }
        )
    }
}

/// Which instants receive the Earth's own light deflection.
///
/// Never for a geocentric observer; otherwise wherever the limb angle
/// (radians) reaches `threshold`.
pub fn include_earth_deflection(is_geocentric: bool, limb_angle: &[f64], threshold: f64) -> Vec<bool> {
    if is_geocentric {
        return vec![false; limb_angle.len()];
    }
    limb_angle.iter().map(|&a| a >= threshold).collect()
}

fn same_time(a: Option<&Time>, b: Option<&Time>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.tt() == b.tt(),
        (None, None) => true,
        _ => false,
    }
}
