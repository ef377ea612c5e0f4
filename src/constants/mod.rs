//! Constants module for astronomical calculations

use lazy_static::lazy_static;
use nalgebra::Matrix3;
use std::f64::consts::PI;

// Astronomical distances
/// Astronomical Unit in meters (per IAU 2012 Resolution B2)
pub const AU_M: f64 = 149_597_870_700.0;
/// Astronomical Unit in kilometers
pub const AU_KM: f64 = 149_597_870.700;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// J2000.0 epoch as Julian date
pub const J2000: f64 = 2_451_545.0;
/// TT minus TAI in seconds
pub const TT_MINUS_TAI_S: f64 = 32.184;
/// TT minus TAI in days
pub const TT_MINUS_TAI: f64 = TT_MINUS_TAI_S / DAY_S;
/// Days in a Julian century
pub const JULIAN_CENTURY: f64 = 36_525.0;

// Angles
/// Arcseconds in a complete circle
pub const ASEC360: f64 = 1_296_000.0;
/// Arcseconds to radians conversion factor
pub const ASEC2RAD: f64 = 4.848_136_811_095_36e-6;
/// Degrees to radians conversion factor
pub const DEG2RAD: f64 = PI / 180.0;
/// Radians to degrees conversion factor
pub const RAD2DEG: f64 = 180.0 / PI;
/// Tau (2*PI) for full circle
pub const TAU: f64 = 2.0 * PI;

// Physics
/// Speed of light in m/s
pub const C: f64 = 299_792_458.0;
/// Heliocentric gravitational constant in m^3/s^2
pub const GS: f64 = 1.327_124_400_179_87e+20;

// Earth constants
/// Earth's angular velocity in radians/s
pub const EARTH_ANGVEL: f64 = 7.292_115_0e-5;
/// Earth's equatorial radius in meters
pub const EARTH_RADIUS: f64 = 6_378_136.6;
/// IERS 2010 inverse Earth flattening
pub const IERS_2010_INVERSE_EARTH_FLATTENING: f64 = 298.25642;

// Derived constants
/// Speed of light in AU/day
pub const C_AUDAY: f64 = C * DAY_S / AU_M;
/// Earth's equatorial radius in AU
pub const EARTH_RADIUS_AU: f64 = EARTH_RADIUS / AU_M;

/// Obliquity of the ecliptic at J2000.0 in arcseconds (IAU 1976, as used by ECLIPJ2000)
pub const J2000_OBLIQUITY_ASEC: f64 = 84_381.448;

lazy_static! {
    /// Rotation from the ICRS equator into the J2000 ecliptic.
    pub static ref ROTATION_TO_ECLIPTIC: Matrix3<f64> = {
        let epsilon = J2000_OBLIQUITY_ASEC * ASEC2RAD;
        let (s, c) = epsilon.sin_cos();
        Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, c, s,
            0.0, -s, c,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_speed_of_light_in_au_per_day() {
        assert_relative_eq!(C_AUDAY, 173.144_632_674, epsilon = 1e-6);
    }

    #[test]
    fn test_ecliptic_rotation_is_orthonormal() {
        let r = *ROTATION_TO_ECLIPTIC;
        let product = r * r.transpose();
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-15);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-15);
    }
}
