//! IAU 2000B nutation
//!
//! Truncated 77-term lunisolar series (IERS Conventions 2010, Table 5.3b)
//! with the fixed offsets that approximate the planetary terms. The
//! out-of-phase terms are omitted, which leaves errors of a few
//! milliarcseconds.

use crate::constants::{ASEC2RAD, ASEC360, J2000, JULIAN_CENTURY};
use nalgebra::Matrix3;

/// Offset standing in for the omitted planetary terms, arcseconds
const DPSI_PLANETARY_ASEC: f64 = -0.000_135;
const DEPS_PLANETARY_ASEC: f64 = 0.000_388;

/// Delaunay multipliers `[l, l', F, D, Ω]` and amplitudes
/// `[S, S', C, C']` in units of 0.1 microarcsecond.
#[rustfmt::skip]
const LUNISOLAR_TERMS: [([i8; 5], [f64; 4]); 77] = [
    ([ 0,  0,  0,  0,  1], [-172064161.0,    -174666.0,   92052331.0,       9086.0]),
    ([ 0,  0,  2, -2,  2], [ -13170906.0,      -1675.0,    5730336.0,      -3015.0]),
    ([ 0,  0,  2,  0,  2], [  -2276413.0,       -234.0,     978459.0,       -485.0]),
    ([ 0,  0,  0,  0,  2], [   2074554.0,        207.0,    -897492.0,        470.0]),
    ([ 0,  1,  0,  0,  0], [   1475877.0,      -3633.0,      73871.0,       -184.0]),
    ([ 0,  1,  2, -2,  2], [   -516821.0,       1226.0,     224386.0,       -677.0]),
    ([ 1,  0,  0,  0,  0], [    711159.0,         73.0,      -6750.0,          0.0]),
    ([ 0,  0,  2,  0,  1], [   -387298.0,       -367.0,     200728.0,         18.0]),
    ([ 1,  0,  2,  0,  2], [   -301461.0,        -36.0,     129025.0,        -63.0]),
    ([ 0, -1,  2, -2,  2], [    215829.0,       -494.0,     -95929.0,        299.0]),
    ([ 0,  0,  2, -2,  1], [    128227.0,        137.0,     -68982.0,         -9.0]),
    ([-1,  0,  2,  0,  2], [    123457.0,         11.0,     -53311.0,         32.0]),
    ([-1,  0,  0,  2,  0], [    156994.0,         10.0,      -1235.0,          0.0]),
    ([ 1,  0,  0,  0,  1], [     63110.0,         63.0,     -33228.0,          0.0]),
    ([-1,  0,  0,  0,  1], [    -57976.0,        -63.0,      31429.0,          0.0]),
    ([-1,  0,  2,  2,  2], [    -59641.0,        -11.0,      25543.0,        -11.0]),
    ([ 1,  0,  2,  0,  1], [    -51613.0,        -42.0,      26366.0,          0.0]),
    ([-2,  0,  2,  0,  1], [     45893.0,         50.0,     -24236.0,        -10.0]),
    ([ 0,  0,  0,  2,  0], [     63384.0,         11.0,      -1220.0,          0.0]),
    ([ 0,  0,  2,  2,  2], [    -38571.0,         -1.0,      16452.0,        -11.0]),
    ([ 0, -2,  2, -2,  2], [     32481.0,          0.0,     -13870.0,          0.0]),
    ([-2,  0,  0,  2,  0], [    -47722.0,          0.0,        477.0,          0.0]),
    ([ 2,  0,  2,  0,  2], [    -31046.0,         -1.0,      13238.0,        -11.0]),
    ([ 1,  0,  2, -2,  2], [     28593.0,          0.0,     -12338.0,         10.0]),
    ([-1,  0,  2,  0,  1], [     20441.0,         21.0,     -10758.0,          0.0]),
    ([ 2,  0,  0,  0,  0], [     29243.0,          0.0,       -609.0,          0.0]),
    ([ 0,  0,  2,  0,  0], [     25887.0,          0.0,       -550.0,          0.0]),
    ([ 0,  1,  0,  0,  1], [    -14053.0,        -25.0,       8551.0,         -2.0]),
    ([-1,  0,  0,  2,  1], [     15164.0,         10.0,      -8001.0,          0.0]),
    ([ 0,  2,  2, -2,  2], [    -15794.0,         72.0,       6850.0,        -42.0]),
    ([ 0,  0, -2,  2,  0], [     21783.0,          0.0,       -167.0,          0.0]),
    ([ 1,  0,  0, -2,  1], [    -12873.0,        -10.0,       6953.0,          0.0]),
    ([ 0, -1,  0,  0,  1], [    -12654.0,         11.0,       6415.0,          0.0]),
    ([-1,  0,  2,  2,  1], [    -10204.0,          0.0,       5222.0,          0.0]),
    ([ 0,  2,  0,  0,  0], [     16707.0,        -85.0,        168.0,         -1.0]),
    ([ 1,  0,  2,  2,  2], [     -7691.0,          0.0,       3268.0,          0.0]),
    ([-2,  0,  2,  0,  0], [    -11024.0,          0.0,        104.0,          0.0]),
    ([ 0,  1,  2,  0,  2], [      7566.0,        -21.0,      -3250.0,          0.0]),
    ([ 0,  0,  2,  2,  1], [     -6637.0,        -11.0,       3353.0,          0.0]),
    ([ 0, -1,  2,  0,  2], [     -7141.0,         21.0,       3070.0,          0.0]),
    ([ 0,  0,  0,  2,  1], [     -6302.0,        -11.0,       3272.0,          0.0]),
    ([ 1,  0,  2, -2,  1], [      5800.0,         10.0,      -3045.0,          0.0]),
    ([ 2,  0,  2, -2,  2], [      6443.0,          0.0,      -2768.0,          0.0]),
    ([-2,  0,  0,  2,  1], [     -5774.0,        -11.0,       3041.0,          0.0]),
    ([ 2,  0,  2,  0,  1], [     -5350.0,          0.0,       2695.0,          0.0]),
    ([ 0, -1,  2, -2,  1], [     -4752.0,        -11.0,       2719.0,          0.0]),
    ([ 0,  0,  0, -2,  1], [     -4940.0,        -11.0,       2720.0,          0.0]),
    ([-1, -1,  0,  2,  0], [      7350.0,          0.0,        -51.0,          0.0]),
    ([ 2,  0,  0, -2,  1], [     -4803.0,        -11.0,       2556.0,          0.0]),
    ([ 1,  0,  0,  2,  0], [     -7677.0,          0.0,        462.0,          0.0]),
    ([ 0,  1,  2, -2,  1], [      5417.0,          0.0,      -2520.0,          0.0]),
    ([ 1, -1,  0,  0,  0], [      6624.0,          0.0,       -468.0,          0.0]),
    ([-2,  0,  2,  0,  2], [     -5433.0,          0.0,       2334.0,          0.0]),
    ([ 3,  0,  2,  0,  2], [     -4632.0,          0.0,       1991.0,          0.0]),
    ([ 0, -1,  0,  2,  0], [      6106.0,          0.0,       -167.0,          0.0]),
    ([ 1, -1,  2,  0,  2], [     -3593.0,          0.0,       1556.0,          0.0]),
    ([ 0,  0,  0,  1,  0], [     -4766.0,          0.0,        270.0,          0.0]),
    ([-1, -1,  2,  2,  2], [     -4095.0,          0.0,       1793.0,          0.0]),
    ([-1,  0,  2,  0,  0], [      4229.0,          0.0,       -101.0,          0.0]),
    ([ 0, -1,  2,  2,  2], [     -3372.0,          0.0,       1487.0,          0.0]),
    ([ 2,  0,  0,  0,  1], [     -3353.0,          0.0,       1758.0,          0.0]),
    ([ 1,  0,  2,  0,  0], [     -3523.0,          0.0,        246.0,          0.0]),
    ([ 1,  1,  0,  0,  0], [     -3613.0,          0.0,        329.0,          0.0]),
    ([-1,  0,  2, -2,  1], [      3522.0,          0.0,      -1830.0,          0.0]),
    ([ 2,  0,  0,  0, -1], [      3312.0,          0.0,      -1730.0,          0.0]),
    ([ 0,  0, -2,  2,  1], [     -3142.0,          0.0,       1704.0,          0.0]),
    ([ 0,  1,  0,  0, -1], [     -2927.0,          0.0,       1564.0,          0.0]),
    ([ 0,  1,  2,  0,  1], [     -2887.0,          0.0,       1401.0,          0.0]),
    ([ 0, -1,  2,  0,  1], [      2451.0,          0.0,      -1200.0,          0.0]),
    ([ 2,  0, -2,  0,  0], [     -2790.0,          0.0,        410.0,          0.0]),
    ([-1,  0,  0,  2, -1], [      2145.0,          0.0,      -1154.0,          0.0]),
    ([ 0,  0,  2, -2,  0], [      2816.0,          0.0,        286.0,          0.0]),
    ([ 0,  1,  0, -2,  0], [      2700.0,          0.0,       -258.0,          0.0]),
    ([ 1,  0,  0, -1,  0], [     -2330.0,          0.0,        -37.0,          0.0]),
    ([ 0,  0,  0,  0,  2], [      2283.0,          0.0,      -1039.0,          0.0]),
    ([ 1,  0, -2,  0,  0], [     -2321.0,          0.0,        284.0,          0.0]),
    ([-1,  0,  0,  1,  1], [     -2049.0,          0.0,       1112.0,          0.0]),
];

/// Nutation angles and obliquities at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthTilt {
    /// Mean obliquity of the ecliptic, radians
    pub mean_obliquity: f64,
    /// True obliquity of the ecliptic, radians
    pub true_obliquity: f64,
    /// Equation of the equinoxes, seconds of time
    pub equation_of_equinoxes: f64,
    /// Nutation in longitude, arcseconds
    pub delta_psi: f64,
    /// Nutation in obliquity, arcseconds
    pub delta_epsilon: f64,
}

/// Delaunay arguments `[l, l', F, D, Ω]` in radians for `t` Julian
/// centuries of TDB since J2000.
pub fn fundamental_arguments(t: f64) -> [f64; 5] {
    let poly = |c: [f64; 5]| -> f64 {
        let asec = (((c[4] * t + c[3]) * t + c[2]) * t + c[1]) * t + c[0];
        (asec % ASEC360) * ASEC2RAD
    };

    [
        poly([485_868.249_036, 1_717_915_923.217_8, 31.879_2, 0.051_635, -0.000_244_70]),
        poly([1_287_104.793_05, 129_596_581.048_1, -0.553_2, 0.000_136, -0.000_011_49]),
        poly([335_779.526_232, 1_739_527_262.847_8, -12.751_2, -0.001_037, 0.000_004_17]),
        poly([1_072_260.703_69, 1_602_961_601.209_0, -6.370_6, 0.006_593, -0.000_031_69]),
        poly([450_160.398_036, -6_962_890.543_1, 7.472_2, 0.007_702, -0.000_059_39]),
    ]
}

/// Nutation in longitude and obliquity, arcseconds.
pub fn iau2000b(jd_tt: f64) -> (f64, f64) {
    let t = (jd_tt - J2000) / JULIAN_CENTURY;
    let args = fundamental_arguments(t);

    let (mut dpsi, mut deps) = (0.0, 0.0);
    for (multipliers, amplitudes) in LUNISOLAR_TERMS.iter() {
        let arg: f64 = multipliers
            .iter()
            .zip(args.iter())
            .map(|(&n, a)| f64::from(n) * a)
            .sum();
        let (s, c) = arg.sin_cos();
        dpsi += (amplitudes[0] + amplitudes[1] * t) * s;
        deps += (amplitudes[2] + amplitudes[3] * t) * c;
    }

    (
        dpsi * 1e-7 + DPSI_PLANETARY_ASEC,
        deps * 1e-7 + DEPS_PLANETARY_ASEC,
    )
}

/// Mean obliquity of the ecliptic, arcseconds (IAU 2006).
pub fn mean_obliquity(jd_tdb: f64) -> f64 {
    let t = (jd_tdb - J2000) / JULIAN_CENTURY;
    ((((-0.000_000_043_4 * t - 0.000_000_576) * t + 0.002_003_40) * t - 0.000_183_1) * t
        - 46.836_769)
        * t
        + 84_381.406
}

/// Complementary terms of the equation of the equinoxes, arcseconds.
///
/// Only the two terms above a microarcsecond are kept.
fn equation_of_equinoxes_complementary(omega: f64) -> f64 {
    0.002_640_96 * omega.sin() + 0.000_063_52 * (2.0 * omega).sin()
}

/// Obliquities, nutation angles and equation of the equinoxes.
pub fn earth_tilt(jd_tt: f64, jd_tdb: f64) -> EarthTilt {
    let (delta_psi, delta_epsilon) = iau2000b(jd_tt);
    let omega = fundamental_arguments((jd_tt - J2000) / JULIAN_CENTURY)[4];

    let mean_ob = mean_obliquity(jd_tdb);
    let true_ob = mean_ob + delta_epsilon;
    let mean_obliquity = mean_ob * ASEC2RAD;

    let eq_eq_asec =
        delta_psi * mean_obliquity.cos() + equation_of_equinoxes_complementary(omega);

    EarthTilt {
        mean_obliquity,
        true_obliquity: true_ob * ASEC2RAD,
        equation_of_equinoxes: eq_eq_asec / 15.0,
        delta_psi,
        delta_epsilon,
    }
}

/// Nutation matrix rotating mean-of-date vectors to true-of-date.
pub fn compute_nutation(tilt: &EarthTilt) -> Matrix3<f64> {
    let (sobm, cobm) = tilt.mean_obliquity.sin_cos();
    let (sobt, cobt) = tilt.true_obliquity.sin_cos();
    let (spsi, cpsi) = (tilt.delta_psi * ASEC2RAD).sin_cos();

    Matrix3::new(
        cpsi,
        -spsi * cobm,
        -spsi * sobm,
        spsi * cobt,
        cpsi * cobm * cobt + sobm * sobt,
        cpsi * sobm * cobt - cobm * sobt,
        spsi * sobt,
        cpsi * cobm * sobt - sobm * cobt,
        cpsi * sobm * sobt + cobm * cobt,
    )
}
