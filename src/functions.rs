//! Vector helpers shared by the position pipeline
//!
//! Positions are carried as batches: a `Matrix3xX<f64>` holds one column per
//! instant. The helpers here work column by column so every caller handles a
//! single instant and a time series the same way.

use crate::constants::TAU;
use nalgebra::{Matrix3, Matrix3xX, Vector3};

/// Length of each column vector.
pub fn length_of(xyz: &Matrix3xX<f64>) -> Vec<f64> {
    xyz.column_iter().map(|c| c.norm()).collect()
}

/// Convert each column to polar form `(r, latitude, longitude)`.
///
/// Longitude is wrapped into `[0, 2π)`. A zero-length vector reports
/// latitude and longitude of zero.
pub fn to_polar(xyz: &Matrix3xX<f64>) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = xyz.ncols();
    let mut r = Vec::with_capacity(n);
    let mut theta = Vec::with_capacity(n);
    let mut phi = Vec::with_capacity(n);

    for column in xyz.column_iter() {
        let length = column.norm();
        r.push(length);
        if length == 0.0 {
            theta.push(0.0);
            phi.push(0.0);
        } else {
            theta.push((column[2] / length).asin());
            phi.push(column[1].atan2(column[0]).rem_euclid(TAU));
        }
    }

    (r, theta, phi)
}

/// Inverse of [`to_polar`] for a single vector.
pub fn from_polar(r: f64, theta: f64, phi: f64) -> Vector3<f64> {
    let rxy = r * theta.cos();
    Vector3::new(rxy * phi.cos(), rxy * phi.sin(), r * theta.sin())
}

/// Active rotation by `theta` radians about the z axis.
pub fn rot_z(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(
        c, -s, 0.0,
        s, c, 0.0,
        0.0, 0.0, 1.0,
    )
}

/// Apply one rotation matrix per column.
pub fn rotate_each(matrices: &[Matrix3<f64>], xyz: &Matrix3xX<f64>) -> Matrix3xX<f64> {
    debug_assert_eq!(matrices.len(), xyz.ncols());
    let mut out = Matrix3xX::zeros(xyz.ncols());
    for (i, (m, column)) in matrices.iter().zip(xyz.column_iter()).enumerate() {
        out.set_column(i, &(m * column));
    }
    out
}

/// Apply the same rotation matrix to every column.
pub fn rotate_all(matrix: &Matrix3<f64>, xyz: &Matrix3xX<f64>) -> Matrix3xX<f64> {
    matrix * xyz
}

/// Build a batch from a list of vectors.
pub fn columns(vectors: &[Vector3<f64>]) -> Matrix3xX<f64> {
    Matrix3xX::from_columns(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_length_of_batch() {
        let xyz = columns(&[Vector3::new(3.0, 4.0, 0.0), Vector3::new(0.0, 0.0, 2.0)]);
        assert_eq!(length_of(&xyz), vec![5.0, 2.0]);
    }

    #[test]
    fn test_to_polar_wraps_longitude() {
        let xyz = columns(&[Vector3::new(0.0, -1.0, 0.0)]);
        let (r, lat, lon) = to_polar(&xyz);
        assert_relative_eq!(r[0], 1.0);
        assert_relative_eq!(lat[0], 0.0);
        assert_relative_eq!(lon[0], 1.5 * PI, epsilon = 1e-15);
    }

    #[test]
    fn test_to_polar_zero_vector() {
        let (r, lat, lon) = to_polar(&Matrix3xX::zeros(1));
        assert_eq!((r[0], lat[0], lon[0]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_polar_inverts_to_polar() {
        let v = from_polar(2.5, 0.3, 4.0);
        let (r, lat, lon) = to_polar(&columns(&[v]));
        assert_relative_eq!(r[0], 2.5, epsilon = 1e-14);
        assert_relative_eq!(lat[0], 0.3, epsilon = 1e-14);
        assert_relative_eq!(lon[0], 4.0, epsilon = 1e-14);
    }

    #[test]
    fn test_rot_z_quarter_turn() {
        let v = rot_z(PI / 2.0) * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(v, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_rotate_each_uses_matching_matrix() {
        let xyz = columns(&[Vector3::x(), Vector3::x()]);
        let out = rotate_each(&[Matrix3::identity(), rot_z(PI)], &xyz);
        assert_relative_eq!(out.column(0).into_owned(), Vector3::x(), epsilon = 1e-15);
        assert_relative_eq!(out.column(1).into_owned(), -Vector3::x(), epsilon = 1e-15);
    }
}
