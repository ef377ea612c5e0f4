//! IAU 2006 precession
//!
//! Source: Capitaine, Wallace & Chapront 2003, Table 1, as published in the
//! IERS Conventions 2010, Ch. 5. The four-rotation formulation follows
//! NOVAS `precession()`.

use crate::constants::{ASEC2RAD, J2000, JULIAN_CENTURY};
use nalgebra::Matrix3;

/// Obliquity of the ecliptic at J2000.0, arcseconds (IAU 2006)
pub const EPS0_ASEC: f64 = 84_381.406;

/// Precession matrix rotating J2000 mean-equator vectors to the mean
/// equator and equinox of `jd_tdb`.
pub fn compute_precession(jd_tdb: f64) -> Matrix3<f64> {
    let t = (jd_tdb - J2000) / JULIAN_CENTURY;

    // Lieske angles in arcseconds
    let psia = ((((-0.000_000_095_1 * t + 0.000_132_851) * t - 0.001_140_45) * t - 1.079_006_9)
        * t
        + 5_038.481_507)
        * t;
    let omegaa = ((((0.000_000_333_7 * t - 0.000_000_467) * t - 0.007_725_03) * t + 0.051_262_3)
        * t
        - 0.025_754)
        * t
        + EPS0_ASEC;
    let chia = ((((-0.000_000_056_0 * t + 0.000_170_663) * t - 0.001_211_97) * t - 2.381_429_2)
        * t
        + 10.556_403)
        * t;

    let eps0 = EPS0_ASEC * ASEC2RAD;
    let psia = psia * ASEC2RAD;
    let omegaa = omegaa * ASEC2RAD;
    let chia = chia * ASEC2RAD;

    let (sa, ca) = eps0.sin_cos();
    let (sb, cb) = (-psia).sin_cos();
    let (sc, cc) = (-omegaa).sin_cos();
    let (sd, cd) = chia.sin_cos();

    Matrix3::new(
        cd * cb - sb * sd * cc,
        cd * sb * ca + sd * cc * cb * ca - sa * sd * sc,
        cd * sb * sa + sd * cc * cb * sa + ca * sd * sc,
        -sd * cb - sb * cd * cc,
        -sd * sb * ca + cd * cc * cb * ca - sa * cd * sc,
        -sd * sb * sa + cd * cc * cb * sa + ca * cd * sc,
        sb * sc,
        -sc * cb * ca - sa * cc,
        -sc * cb * sa + cc * ca,
    )
}
