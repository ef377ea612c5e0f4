//! Earth-related kernels: rotation, observer geometry, limb angle and
//! atmospheric refraction

use crate::constants::{
    DAY_S, DEG2RAD, EARTH_ANGVEL, EARTH_RADIUS_AU, IERS_2010_INVERSE_EARTH_FLATTENING, J2000,
    JULIAN_CENTURY,
};
use crate::functions::length_of;
use log::{trace, warn};
use nalgebra::{Matrix3xX, Vector3};
use std::f64::consts::PI;

const ONE_MINUS_FLATTENING: f64 = 1.0 - 1.0 / IERS_2010_INVERSE_EARTH_FLATTENING;
const ONE_MINUS_FLATTENING_SQUARED: f64 = ONE_MINUS_FLATTENING * ONE_MINUS_FLATTENING;

/// Refraction iteration stops once successive altitudes agree to this, degrees
pub const REFRACTION_TOLERANCE_DEG: f64 = 3.0e-5;

const MAX_REFRACTION_ITERATIONS: usize = 50;

/// Earth rotation angle as a fraction of a full turn (IERS 2010, Eq. 5.15).
pub fn earth_rotation_angle(jd_ut1: f64) -> f64 {
    let th = 0.779_057_273_264_0 + 0.002_737_811_911_354_48 * (jd_ut1 - J2000);
    (th.rem_euclid(1.0) + jd_ut1.rem_euclid(1.0)).rem_euclid(1.0)
}

/// Greenwich mean sidereal time in hours (IAU 2006).
pub fn sidereal_time(jd_ut1: f64, jd_tdb: f64) -> f64 {
    let theta = earth_rotation_angle(jd_ut1);
    let t = (jd_tdb - J2000) / JULIAN_CENTURY;

    let st = 0.014_506
        + ((((-0.000_000_036_8 * t - 0.000_029_956) * t - 0.000_000_44) * t + 1.391_581_7) * t
            + 4_612.156_534)
            * t;

    (st / 54_000.0 + theta * 24.0).rem_euclid(24.0)
}

/// Position and velocity of an Earth-surface observer in the
/// true-equatorial frame of date.
///
/// Latitude and longitude are geodetic, radians; elevation in AU; `gast`
/// in hours, one entry per instant. Position in AU, velocity in AU/day.
pub fn terra(
    latitude: f64,
    longitude: f64,
    elevation_au: f64,
    gast: &[f64],
) -> (Matrix3xX<f64>, Matrix3xX<f64>) {
    let (sinphi, cosphi) = latitude.sin_cos();
    let c = 1.0 / (cosphi * cosphi + sinphi * sinphi * ONE_MINUS_FLATTENING_SQUARED).sqrt();
    let s = ONE_MINUS_FLATTENING_SQUARED * c;
    let ach = EARTH_RADIUS_AU * c + elevation_au;
    let ash = EARTH_RADIUS_AU * s + elevation_au;
    let ac = ach * cosphi;
    let z = ash * sinphi;

    let mut pos = Matrix3xX::zeros(gast.len());
    let mut vel = Matrix3xX::zeros(gast.len());
    for (i, hours) in gast.iter().enumerate() {
        let stlocl = 15.0 * DEG2RAD * hours + longitude;
        let (sinst, cosst) = stlocl.sin_cos();
        let acsst = ac * sinst;
        let accst = ac * cosst;
        pos.set_column(i, &Vector3::new(accst, acsst, z));
        vel.set_column(
            i,
            &(EARTH_ANGVEL * DAY_S * Vector3::new(-acsst, accst, 0.0)),
        );
    }
    (pos, vel)
}

/// Angle of an object above Earth's limb as seen by an observer.
///
/// Both batches are measured from the geocenter. Returns
/// `(limb_angle, nadir_angle)`: the limb angle in radians (positive above
/// the limb) and the nadir angle as a fraction of the apparent angular
/// radius of the Earth.
pub fn compute_limb_angle(
    position_au: &Matrix3xX<f64>,
    observer_au: &Matrix3xX<f64>,
) -> (Vec<f64>, Vec<f64>) {
    let disobj = length_of(position_au);
    let disobs = length_of(observer_au);
    let n = position_au.ncols();

    let mut limb = Vec::with_capacity(n);
    let mut nadir = Vec::with_capacity(n);
    for i in 0..n {
        let aprad = (EARTH_RADIUS_AU / disobs[i]).min(1.0).asin();
        let zdlim = PI - aprad;
        let coszd = (position_au.column(i).dot(&observer_au.column(i)) / (disobj[i] * disobs[i]))
            .clamp(-1.0, 1.0);
        let zdobj = coszd.acos();
        limb.push(zdlim - zdobj);
        nadir.push((PI - zdobj) / aprad);
    }
    (limb, nadir)
}

/// Atmospheric refraction in degrees for an observed altitude.
///
/// Zero outside `-1° <= alt <= 89.9°`.
pub fn refraction(alt_degrees: f64, temperature_c: f64, pressure_mbar: f64) -> f64 {
    if !(-1.0..=89.9).contains(&alt_degrees) {
        return 0.0;
    }
    let r = 0.016_667 / ((alt_degrees + 7.31 / (alt_degrees + 4.4)) * DEG2RAD).tan();
    r * (0.28 * pressure_mbar / (temperature_c + 273.0))
}

/// Given an unrefracted altitude, return the refracted altitude in degrees.
pub fn refract(alt_degrees: f64, temperature_c: f64, pressure_mbar: f64) -> f64 {
    refract_with_tolerance(alt_degrees, temperature_c, pressure_mbar, REFRACTION_TOLERANCE_DEG)
}

/// [`refract`] with an explicit convergence threshold in degrees.
///
/// Just below the 89.9° cutoff the iteration can bounce across the edge of
/// the formula's domain; it then stops after `MAX_REFRACTION_ITERATIONS`
/// and keeps the last altitude.
pub fn refract_with_tolerance(
    alt_degrees: f64,
    temperature_c: f64,
    pressure_mbar: f64,
    tolerance_deg: f64,
) -> f64 {
    let mut alt = alt_degrees;
    for iteration in 1..=MAX_REFRACTION_ITERATIONS {
        let previous = alt;
        alt = alt_degrees + refraction(alt, temperature_c, pressure_mbar);
        if (alt - previous).abs() <= tolerance_deg {
            trace!("refraction converged after {} iterations", iteration);
            return alt;
        }
    }
    warn!(
        "refraction of {} deg did not converge in {} iterations",
        alt_degrees, MAX_REFRACTION_ITERATIONS
    );
    alt
}
