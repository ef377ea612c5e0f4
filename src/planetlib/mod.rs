//! Solar system bodies and the ephemeris interface
//!
//! The pipeline never reads ephemeris files itself. It consumes any
//! [`Ephemeris`] implementation through an `Arc<dyn Ephemeris>`;
//! [`LinearEphemeris`] is a small in-memory implementation.

use crate::celestial::{AstrometricTarget, CelestialObject};
use crate::config::PipelineConfig;
use crate::constants::C_AUDAY;
use crate::errors::{PositionError, Result as PositionResult};
use crate::functions::length_of;
use crate::positions::{Frame, Position};
use crate::time::Time;
use log::{debug, trace};
use nalgebra::{Matrix3xX, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type for ephemeris lookups
#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("Body not found: {0}")]
    BodyNotFound(String),

    #[error("{body} is not covered at TDB {jd_tdb}")]
    OutOfRange { body: String, jd_tdb: f64 },
}

/// Result type for ephemeris lookups
pub type Result<T> = std::result::Result<T, EphemerisError>;

/// Enum representing the major solar system bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    /// Get the body's name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Moon => "Moon",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
        }
    }

    /// Mass of the Sun divided by the mass of this body
    pub fn reciprocal_mass(&self) -> f64 {
        match self {
            Body::Sun => 1.0,
            Body::Mercury => 6_023_600.0,
            Body::Venus => 408_523.71,
            Body::Earth => 332_946.050_895,
            Body::Moon => 27_068_700.387_534,
            Body::Mars => 3_098_708.0,
            Body::Jupiter => 1_047.348_6,
            Body::Saturn => 3_497.898,
            Body::Uranus => 22_902.98,
            Body::Neptune => 19_412.24,
            Body::Pluto => 135_200_000.0,
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of barycentric body states
///
/// Positions are ICRS, AU, measured from the solar system barycenter;
/// velocities AU/day. Times are TDB Julian dates.
pub trait Ephemeris: Send + Sync + fmt::Debug {
    /// State of one body at one instant
    fn state_at(&self, body: Body, jd_tdb: f64) -> Result<(Vector3<f64>, Vector3<f64>)>;

    /// States of one body over a batch of instants
    fn position_velocity_of(
        &self,
        body: Body,
        jd_tdb: &[f64],
    ) -> Result<(Matrix3xX<f64>, Matrix3xX<f64>)> {
        let mut position = Matrix3xX::zeros(jd_tdb.len());
        let mut velocity = Matrix3xX::zeros(jd_tdb.len());
        for (i, &jd) in jd_tdb.iter().enumerate() {
            let (p, v) = self.state_at(body, jd)?;
            position.set_column(i, &p);
            velocity.set_column(i, &v);
        }
        Ok((position, velocity))
    }

    /// Positions of one body over a batch of instants
    fn position_of(&self, body: Body, jd_tdb: &[f64]) -> Result<Matrix3xX<f64>> {
        Ok(self.position_velocity_of(body, jd_tdb)?.0)
    }
}

/// Reference state of one body
#[derive(Debug, Clone, Copy, PartialEq)]
struct BodyState {
    position: Vector3<f64>,
    velocity: Vector3<f64>,
}

/// In-memory ephemeris propagating each body in a straight line
///
/// Every body moves with constant velocity from its state at
/// `epoch_tdb`. Useful for tests and for short spans where a full
/// ephemeris is unnecessary.
#[derive(Debug, Clone)]
pub struct LinearEphemeris {
    epoch_tdb: f64,
    coverage_days: Option<f64>,
    states: HashMap<Body, BodyState>,
}

impl LinearEphemeris {
    /// Create an empty ephemeris referenced to a TDB Julian date
    pub fn new(epoch_tdb: f64) -> Self {
        Self {
            epoch_tdb,
            coverage_days: None,
            states: HashMap::new(),
        }
    }

    /// Add a body with its position (AU) and velocity (AU/day) at the epoch
    pub fn with_body(mut self, body: Body, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        self.states.insert(body, BodyState { position, velocity });
        self
    }

    /// Refuse lookups more than `days` away from the epoch
    pub fn with_coverage(mut self, days: f64) -> Self {
        self.coverage_days = Some(days);
        self
    }

    /// TDB Julian date of the reference states
    pub fn epoch_tdb(&self) -> f64 {
        self.epoch_tdb
    }

    /// Bodies this ephemeris knows about
    pub fn bodies(&self) -> Vec<Body> {
        self.states.keys().copied().collect()
    }
}

impl Ephemeris for LinearEphemeris {
    fn state_at(&self, body: Body, jd_tdb: f64) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let state = self
            .states
            .get(&body)
            .ok_or_else(|| EphemerisError::BodyNotFound(body.name().to_string()))?;

        let dt = jd_tdb - self.epoch_tdb;
        if let Some(limit) = self.coverage_days {
            if dt.abs() > limit {
                return Err(EphemerisError::OutOfRange {
                    body: body.name().to_string(),
                    jd_tdb,
                });
            }
        }

        Ok((state.position + state.velocity * dt, state.velocity))
    }
}

/// A solar system body bound to the ephemeris that locates it
#[derive(Debug, Clone)]
pub struct Planet {
    body: Body,
    ephemeris: Arc<dyn Ephemeris>,
    max_iterations: usize,
    tolerance_days: f64,
}

impl Planet {
    pub fn new(body: Body, ephemeris: Arc<dyn Ephemeris>) -> Self {
        let config = PipelineConfig::default();
        Self {
            body,
            ephemeris,
            max_iterations: config.light_time_max_iterations,
            tolerance_days: config.light_time_tolerance_days,
        }
    }

    /// Take light-time iteration limits from a configuration
    pub fn with_config(mut self, config: &PipelineConfig) -> Self {
        self.max_iterations = config.light_time_max_iterations;
        self.tolerance_days = config.light_time_tolerance_days;
        self
    }

    pub fn body(&self) -> Body {
        self.body
    }

    pub fn ephemeris(&self) -> &Arc<dyn Ephemeris> {
        &self.ephemeris
    }

    /// Barycentric position and velocity at each instant of `t`
    pub fn at(&self, t: &Time) -> PositionResult<Position> {
        let (position, velocity) = self.ephemeris.position_velocity_of(self.body, t.tdb())?;
        let position = Position::from_parts(
            Frame::Barycentric,
            position,
            Some(velocity),
            Some(Arc::new(t.clone())),
        )?;
        Ok(position.with_ephemeris(Arc::clone(&self.ephemeris)))
    }
}

impl CelestialObject for Planet {
    fn name(&self) -> String {
        self.body.name().to_string()
    }

    fn as_astrometric(&self) -> Option<&dyn AstrometricTarget> {
        Some(self)
    }
}

impl AstrometricTarget for Planet {
    /// Iterate on light travel time until the emission instant settles.
    fn observe_from_bcrs(&self, observer: &Arc<Position>) -> PositionResult<Position> {
        let t = observer
            .time_arc()
            .ok_or(PositionError::MissingTime("observe"))?;
        let tdb = t.tdb();
        let cposition = observer.position_au();

        let (mut tposition, mut tvelocity) = self.ephemeris.position_velocity_of(self.body, tdb)?;
        let mut distance = length_of(&(&tposition - cposition));
        let mut light_time0 = vec![0.0; tdb.len()];
        let mut converged = None;

        for iteration in 0..self.max_iterations {
            let light_time: Vec<f64> = distance.iter().map(|d| d / C_AUDAY).collect();
            let delta = light_time
                .iter()
                .zip(&light_time0)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            trace!(
                "{} light-time iteration {}: change {:e} days",
                self.body,
                iteration,
                delta
            );
            if delta < self.tolerance_days {
                converged = Some(light_time);
                break;
            }

            let emitted: Vec<f64> = tdb.iter().zip(&light_time).map(|(t, lt)| t - lt).collect();
            let (p, v) = self.ephemeris.position_velocity_of(self.body, &emitted)?;
            tposition = p;
            tvelocity = v;
            distance = length_of(&(&tposition - cposition));
            light_time0 = light_time;
        }

        let light_time = converged.ok_or(PositionError::LightTimeDidNotConverge {
            iterations: self.max_iterations,
        })?;
        debug!(
            "{} light time converged: {:?} days",
            self.body,
            light_time.first()
        );

        let velocity = observer
            .velocity_au_per_d()
            .map(|cvelocity| &tvelocity - cvelocity);
        let astrometric = Position::from_parts(
            Frame::Astrometric,
            &tposition - cposition,
            velocity,
            Some(t),
        )?
        .with_light_time(light_time)
        .with_observer(Arc::clone(observer))
        .with_ephemeris(Arc::clone(&self.ephemeris));

        Ok(astrometric)
    }
}
