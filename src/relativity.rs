//! Gravitational deflection and aberration of light

use crate::constants::{AU_M, C, C_AUDAY, GS};
use crate::errors::Result;
use crate::functions::length_of;
use crate::planetlib::{Body, Ephemeris};
use log::trace;
use nalgebra::{Matrix3xX, Vector3};

/// Deflectors lying within about 1" of the line of sight are skipped
const COLINEAR_COSINE: f64 = 0.999_999_999_99;

/// Correct each column of `position` for light bending.
///
/// `position` is the observer→target vector and `observer` the observer's
/// barycentric position, both AU. Each body in `deflectors` is looked up at
/// the moment the incoming light passed closest to it. Earth's deflection
/// is added only for the columns where `include_earth_deflection` is set.
pub fn add_deflection(
    position: &mut Matrix3xX<f64>,
    observer: &Matrix3xX<f64>,
    ephemeris: &dyn Ephemeris,
    jd_tdb: &[f64],
    include_earth_deflection: &[bool],
    deflectors: &[Body],
) -> Result<()> {
    let tlt: Vec<f64> = length_of(position).iter().map(|d| d / C_AUDAY).collect();

    for &body in deflectors {
        let bposition = ephemeris.position_of(body, jd_tdb)?;
        let gpv = &bposition - observer;
        let dlt = light_time_difference(position, &gpv);

        let tclose: Vec<f64> = (0..jd_tdb.len())
            .map(|i| {
                if tlt[i] < dlt[i] {
                    jd_tdb[i] - tlt[i]
                } else if dlt[i] > 0.0 {
                    jd_tdb[i] - dlt[i]
                } else {
                    jd_tdb[i]
                }
            })
            .collect();

        let bposition = ephemeris.position_of(body, &tclose)?;
        trace!("deflecting by {} at closest approach", body.name());
        deflect(position, observer, &bposition, body.reciprocal_mass(), None);
    }

    if include_earth_deflection.iter().any(|&flag| flag) {
        let bposition = ephemeris.position_of(Body::Earth, jd_tdb)?;
        deflect(
            position,
            observer,
            &bposition,
            Body::Earth.reciprocal_mass(),
            Some(include_earth_deflection),
        );
    }

    Ok(())
}

/// Light time from the point on the incoming ray closest to a body, days.
///
/// Projection of `observer_position` onto the direction of `position`,
/// divided by the speed of light.
pub fn light_time_difference(
    position: &Matrix3xX<f64>,
    observer_position: &Matrix3xX<f64>,
) -> Vec<f64> {
    position
        .column_iter()
        .zip(observer_position.column_iter())
        .map(|(p, o)| p.normalize().dot(&o) / C_AUDAY)
        .collect()
}

fn deflect(
    position: &mut Matrix3xX<f64>,
    observer: &Matrix3xX<f64>,
    deflector: &Matrix3xX<f64>,
    rmass: f64,
    mask: Option<&[bool]>,
) {
    for i in 0..position.ncols() {
        if let Some(mask) = mask {
            if !mask[i] {
                continue;
            }
        }

        let p: Vector3<f64> = position.column(i).into_owned();
        let pq = observer.column(i) + p - deflector.column(i);
        let pe = observer.column(i) - deflector.column(i);

        let pmag = p.norm();
        let qmag = pq.norm();
        let emag = pe.norm();
        let phat = p / if pmag != 0.0 { pmag } else { 1.0 };
        let qhat = pq / if qmag != 0.0 { qmag } else { 1.0 };
        let ehat = pe / if emag != 0.0 { emag } else { 1.0 };

        let pdotq = phat.dot(&qhat);
        let qdote = qhat.dot(&ehat);
        let edotp = ehat.dot(&phat);

        if edotp.abs() > COLINEAR_COSINE {
            continue;
        }

        let fac1 = 2.0 * GS / (C * C * emag * AU_M * rmass);
        let fac2 = 1.0 + qdote;
        let correction = fac1 * (pdotq * ehat - edotp * qhat) / fac2 * pmag;
        position.set_column(i, &(p + correction));
    }
}

/// Correct each column of `position` for the observer's velocity.
///
/// Relativistic aberration; `velocity` in AU/day and `light_time` in days.
/// A zero velocity leaves the column untouched.
pub fn add_aberration(position: &mut Matrix3xX<f64>, velocity: &Matrix3xX<f64>, light_time: &[f64]) {
    for i in 0..position.ncols() {
        let v = velocity.column(i);
        let vemag = v.norm();
        if vemag == 0.0 {
            continue;
        }

        let p = position.column(i).into_owned();
        let p1mag = light_time[i] * C_AUDAY;
        let beta = vemag / C_AUDAY;
        let cosd = p.dot(&v) / (p1mag * vemag);
        let gammai = (1.0 - beta * beta).sqrt();
        let pp = beta * cosd;
        let q = (1.0 + pp / (1.0 + gammai)) * light_time[i];
        let r = 1.0 + pp;

        position.set_column(i, &((gammai * p + q * v) / r));
    }
}
