//! Starfield positions: apparent places of celestial bodies, inspired by Python's skyfield
//!
//! This crate computes where a body appears in the sky for an observer on
//! or near the Earth. Starting from barycentric coordinates it corrects for
//! light travel time, gravitational deflection and aberration, and rotates
//! the result into the observer's horizon.
//!
//! Every quantity is a batch: a `Time` holds any number of instants and a
//! `Position` one column per instant.
//!
//! ```rust
//! use starfield_positions::{Body, Ephemeris, LinearEphemeris, Planet, Time, Topos};
//! use nalgebra::Vector3;
//! use std::sync::Arc;
//!
//! let t = Time::from_tt(2_451_545.0);
//! let ephemeris: Arc<dyn Ephemeris> = Arc::new(
//!     LinearEphemeris::new(t.tdb()[0])
//!         .with_body(Body::Sun, Vector3::zeros(), Vector3::zeros())
//!         .with_body(Body::Jupiter, Vector3::new(4.0, 3.0, 0.0), Vector3::zeros())
//!         .with_body(Body::Saturn, Vector3::new(-9.0, 2.0, 0.0), Vector3::zeros())
//!         .with_body(Body::Earth, Vector3::new(-0.18, 0.89, 0.39), Vector3::new(-0.0172, -0.0029, -0.0013))
//!         .with_body(Body::Mars, Vector3::new(1.39, -0.01, -0.04), Vector3::new(0.0007, 0.0138, 0.0063)),
//! );
//!
//! let observer = Topos::new("42.3583 N", "71.0603 W", 0.0)
//!     .unwrap()
//!     .with_ephemeris(Arc::clone(&ephemeris));
//! let mars = Planet::new(Body::Mars, ephemeris);
//!
//! let apparent = observer.at(&t).unwrap().observe(&mars).unwrap().apparent().unwrap();
//! let (alt, az, distance) = apparent.altaz().unwrap();
//! assert!(alt.degrees()[0].abs() <= 90.0);
//! assert!(az.degrees()[0] >= 0.0 && az.degrees()[0] < 360.0);
//! assert!(distance.au()[0] > 1.0);
//! ```

pub mod celestial;
pub mod config;
pub mod constants;
pub mod earthlib;
pub mod errors;
pub mod framelib;
pub mod functions;
pub mod nutationlib;
pub mod planetlib;
pub mod positions;
pub mod precessionlib;
pub mod relativity;
pub mod time;
pub mod toposlib;
pub mod units;

// Re-export commonly used types
pub use celestial::{AstrometricTarget, CelestialObject, GeocentricTarget};
pub use config::PipelineConfig;
pub use errors::{PositionError, Result};
pub use framelib::itrf_to_gcrs;
pub use planetlib::{Body, Ephemeris, EphemerisError, LinearEphemeris, Planet};
pub use positions::{Epoch, Frame, Position, Pressure, Temperature};
pub use time::{Time, TimeError};
pub use toposlib::{Ltude, Topos};
pub use units::{Angle, Distance, Velocity};
