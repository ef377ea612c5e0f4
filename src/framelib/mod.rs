//! Reference frame transformations
//!
//! The ICRS frame tie and the Earth-fixed to GCRS rotation used by the
//! position pipeline.

use crate::constants::{ASEC2RAD, TAU};
use crate::errors::{PositionError, Result};
use crate::functions::rot_z;
use crate::time::Time;
use lazy_static::lazy_static;
use nalgebra::{Matrix3, Matrix3xX};

lazy_static! {
    /// Frame tie rotating ICRS vectors onto the dynamical mean equator and
    /// equinox of J2000 (IERS Conventions 2003, Ch. 5).
    pub static ref ICRS_TO_J2000: Matrix3<f64> = build_icrs_to_j2000();
}

fn build_icrs_to_j2000() -> Matrix3<f64> {
    // Offsets of the J2000 pole and equinox from the ICRS
    let xi0 = -0.016_617_0 * ASEC2RAD;
    let eta0 = -0.006_819_2 * ASEC2RAD;
    let da0 = -0.014_60 * ASEC2RAD;

    let yx = -da0;
    let zx = xi0;
    let xy = da0;
    let zy = eta0;
    let xz = -xi0;
    let yz = -eta0;

    // Second-order diagonal; orthonormal to second order in the offsets
    let xx = 1.0 - 0.5 * (yx * yx + zx * zx);
    let yy = 1.0 - 0.5 * (yx * yx + zy * zy);
    let zz = 1.0 - 0.5 * (zy * zy + zx * zx);

    Matrix3::new(
        xx, xy, xz,
        yx, yy, yz,
        zx, zy, zz,
    )
}

/// Rotate Earth-fixed (ITRF) vectors into the GCRS at each instant of `t`.
///
/// Polar motion is ignored. Only positions are converted; the velocity
/// term from Earth's rotation is not added.
pub fn itrf_to_gcrs(t: &Time, position_au: &Matrix3xX<f64>) -> Result<Matrix3xX<f64>> {
    if t.len() != position_au.ncols() {
        return Err(PositionError::ShapeMismatch(format!(
            "time has {} instants but position has {} columns",
            t.len(),
            position_au.ncols()
        )));
    }

    let mut out = Matrix3xX::zeros(position_au.ncols());
    for (i, column) in position_au.column_iter().enumerate() {
        let spin = rot_z(t.gast()[i] / 24.0 * TAU);
        out.set_column(i, &(t.mt()[i] * spin * column));
    }
    Ok(out)
}
