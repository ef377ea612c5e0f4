//! Capabilities of things that can be observed
//!
//! A target advertises what it can do through the `as_*` accessors of
//! [`CelestialObject`]. Frames that need a capability the target lacks
//! report [`PositionError::UnsupportedTarget`](crate::errors::PositionError).

use crate::errors::Result;
use crate::positions::Position;
use crate::time::Time;
use std::fmt;
use std::sync::Arc;

/// A trait for objects that can be the target of an observation
pub trait CelestialObject: fmt::Debug {
    /// Name used in log and error messages
    fn name(&self) -> String;

    /// Light-time corrected observation from a barycentric position
    fn as_astrometric(&self) -> Option<&dyn AstrometricTarget> {
        None
    }

    /// Direct position in the geocentric frame
    fn as_geocentric(&self) -> Option<&dyn GeocentricTarget> {
        None
    }
}

/// Targets that can compute their astrometric position as seen from a
/// barycentric observer
pub trait AstrometricTarget {
    /// Returns an `Astrometric` position with `light_time` set and the
    /// observer attached.
    fn observe_from_bcrs(&self, observer: &Arc<Position>) -> Result<Position>;
}

/// Targets with a known position and velocity in the GCRS
pub trait GeocentricTarget {
    /// Returns a `Geocentric` position at each instant of `t`.
    fn gcrs(&self, t: &Time) -> Result<Position>;
}
