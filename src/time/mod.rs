//! Time module for the position pipeline
//!
//! A [`Time`] is a batch of instants. Alongside the TT, TDB and UT1 Julian
//! dates it carries everything the position pipeline needs per instant:
//! Greenwich apparent sidereal time and the ICRS→true-equator rotation `M`
//! (with its transpose `MT`). A single instant is a batch of length one.

use crate::constants::{DAY_S, J2000, JULIAN_CENTURY, TT_MINUS_TAI};
use crate::earthlib::sidereal_time;
use crate::framelib::ICRS_TO_J2000;
use crate::nutationlib::{compute_nutation, earth_tilt};
use crate::precessionlib::compute_precession;
use chrono::{DateTime, Utc};
use log::debug;
use nalgebra::Matrix3;
use std::fmt;
use thiserror::Error;

/// Error type for time operations
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Time out of range: {0}")]
    OutOfRange(String),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// Julian date of the Unix epoch
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// UTC Julian dates at which TAI−UTC changed, with the new offset in seconds
const LEAP_SECONDS: [(f64, f64); 28] = [
    (2_441_317.5, 10.0), // 1972-01-01
    (2_441_499.5, 11.0), // 1972-07-01
    (2_441_683.5, 12.0), // 1973-01-01
    (2_442_048.5, 13.0),
    (2_442_413.5, 14.0),
    (2_442_778.5, 15.0),
    (2_443_144.5, 16.0),
    (2_443_509.5, 17.0),
    (2_443_874.5, 18.0),
    (2_444_239.5, 19.0), // 1980-01-01
    (2_444_786.5, 20.0), // 1981-07-01
    (2_445_151.5, 21.0),
    (2_445_516.5, 22.0),
    (2_446_247.5, 23.0), // 1985-07-01
    (2_447_161.5, 24.0), // 1988-01-01
    (2_447_892.5, 25.0),
    (2_448_257.5, 26.0),
    (2_448_804.5, 27.0), // 1992-07-01
    (2_449_169.5, 28.0),
    (2_449_534.5, 29.0),
    (2_450_083.5, 30.0), // 1996-01-01
    (2_450_630.5, 31.0),
    (2_451_179.5, 32.0), // 1999-01-01
    (2_453_736.5, 33.0), // 2006-01-01
    (2_454_832.5, 34.0),
    (2_456_109.5, 35.0), // 2012-07-01
    (2_457_204.5, 36.0),
    (2_457_754.5, 37.0), // 2017-01-01
];

/// A batch of instants with the Earth orientation the pipeline consumes
#[derive(Debug, Clone, PartialEq)]
pub struct Time {
    tt: Vec<f64>,
    tdb: Vec<f64>,
    ut1: Vec<f64>,
    gast: Vec<f64>,
    m: Vec<Matrix3<f64>>,
    mt: Vec<Matrix3<f64>>,
}

impl Time {
    /// A single instant given as a TT Julian date
    pub fn from_tt(jd_tt: f64) -> Self {
        Self::from_tt_batch(&[jd_tt])
    }

    /// A batch of instants given as TT Julian dates
    pub fn from_tt_batch(jd_tt: &[f64]) -> Self {
        let n = jd_tt.len();
        let mut time = Time {
            tt: Vec::with_capacity(n),
            tdb: Vec::with_capacity(n),
            ut1: Vec::with_capacity(n),
            gast: Vec::with_capacity(n),
            m: Vec::with_capacity(n),
            mt: Vec::with_capacity(n),
        };

        for &tt in jd_tt {
            let tdb = tt + tdb_minus_tt(tt) / DAY_S;
            let ut1 = tt - delta_t(tt) / DAY_S;

            let tilt = earth_tilt(tt, tdb);
            let m = compute_nutation(&tilt) * compute_precession(tdb) * *ICRS_TO_J2000;
            let gast =
                (sidereal_time(ut1, tdb) + tilt.equation_of_equinoxes / 3600.0).rem_euclid(24.0);

            time.tt.push(tt);
            time.tdb.push(tdb);
            time.ut1.push(ut1);
            time.gast.push(gast);
            time.mt.push(m.transpose());
            time.m.push(m);
        }

        time
    }

    /// A single instant given as a UTC datetime
    ///
    /// Leap seconds are applied from the built-in table, which starts in
    /// 1972; earlier datetimes are rejected.
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self> {
        Self::from_datetimes(&[dt])
    }

    /// A batch of instants given as UTC datetimes
    pub fn from_datetimes(datetimes: &[DateTime<Utc>]) -> Result<Self> {
        let tt = datetimes
            .iter()
            .map(|dt| {
                let seconds = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
                let jd_utc = UNIX_EPOCH_JD + seconds / DAY_S;
                let tai_minus_utc = leap_seconds(jd_utc).ok_or_else(|| {
                    TimeError::OutOfRange(format!("{} precedes the leap second table", dt))
                })?;
                Ok(jd_utc + tai_minus_utc / DAY_S + TT_MINUS_TAI)
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Self::from_tt_batch(&tt))
    }

    /// Assemble a batch from values computed elsewhere
    ///
    /// `gast` is in hours and `m` holds one ICRS→true-equator rotation per
    /// instant. UT1 is estimated from TT with the built-in ΔT model.
    pub fn from_precomputed(
        tt: Vec<f64>,
        tdb: Vec<f64>,
        gast: Vec<f64>,
        m: Vec<Matrix3<f64>>,
    ) -> Result<Self> {
        let n = tt.len();
        if tdb.len() != n || gast.len() != n || m.len() != n {
            return Err(TimeError::ShapeMismatch(format!(
                "tt has {} values, tdb {}, gast {}, m {}",
                n,
                tdb.len(),
                gast.len(),
                m.len()
            )));
        }
        debug!("assembling {} precomputed instants", n);

        let ut1 = tt.iter().map(|&t| t - delta_t(t) / DAY_S).collect();
        let mt = m.iter().map(|r| r.transpose()).collect();
        Ok(Time {
            tt,
            tdb,
            ut1,
            gast,
            m,
            mt,
        })
    }

    /// Number of instants
    pub fn len(&self) -> usize {
        self.tt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tt.is_empty()
    }

    /// Terrestrial Time, Julian dates
    pub fn tt(&self) -> &[f64] {
        &self.tt
    }

    /// Barycentric Dynamical Time, Julian dates
    pub fn tdb(&self) -> &[f64] {
        &self.tdb
    }

    /// Universal Time, Julian dates
    pub fn ut1(&self) -> &[f64] {
        &self.ut1
    }

    /// Greenwich apparent sidereal time, hours
    pub fn gast(&self) -> &[f64] {
        &self.gast
    }

    /// Rotations from the ICRS to the true equator and equinox of date
    pub fn m(&self) -> &[Matrix3<f64>] {
        &self.m
    }

    /// Rotations from the true equator and equinox of date to the ICRS
    pub fn mt(&self) -> &[Matrix3<f64>] {
        &self.mt
    }

    /// TT − UT1 in seconds for each instant
    pub fn delta_t(&self) -> Vec<f64> {
        self.tt
            .iter()
            .zip(self.ut1.iter())
            .map(|(tt, ut1)| (tt - ut1) * DAY_S)
            .collect()
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tt.as_slice() {
            [tt] => write!(f, "<Time tt={:.6}>", tt),
            tts => write!(f, "<Time {} values>", tts.len()),
        }
    }
}

/// TAI − UTC in seconds at a UTC Julian date, if covered by the table
fn leap_seconds(jd_utc: f64) -> Option<f64> {
    let index = LEAP_SECONDS.partition_point(|&(date, _)| date <= jd_utc);
    index.checked_sub(1).map(|i| LEAP_SECONDS[i].1)
}

/// TDB − TT in seconds (USNO Circular 179, eq. 2.6)
fn tdb_minus_tt(jd_tdb: f64) -> f64 {
    let t = (jd_tdb - J2000) / JULIAN_CENTURY;

    0.001657 * f64::sin(628.3076 * t + 6.2401)
        + 0.000022 * f64::sin(575.3385 * t + 4.2970)
        + 0.000014 * f64::sin(1256.6152 * t + 6.1969)
        + 0.000005 * f64::sin(606.9777 * t + 4.0212)
        + 0.000005 * f64::sin(52.9691 * t + 0.4444)
        + 0.000002 * f64::sin(21.3299 * t + 5.5431)
        + 0.000010 * t * f64::sin(628.3076 * t + 4.2490)
}

/// TT − UT1 in seconds from the Espenak & Meeus polynomials
fn delta_t(jd_tt: f64) -> f64 {
    let year = (jd_tt - 1_721_045.0) / 365.25;

    if year < 1800.0 || year >= 2150.0 {
        // Long-term parabola
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    } else if year < 1860.0 {
        let t = year - 1800.0;
        13.72 - 0.332447 * t + 0.0068612 * t * t + 0.0041116 * t.powi(3)
            - 0.00037436 * t.powi(4)
            + 0.0000121272 * t.powi(5)
            - 0.0000001699 * t.powi(6)
            + 0.000000000875 * t.powi(7)
    } else if year < 1900.0 {
        let t = year - 1860.0;
        7.62 + 0.5737 * t - 0.251754 * t * t + 0.01680668 * t.powi(3) - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233174.0
    } else if year < 1920.0 {
        let t = year - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t * t + 0.0061966 * t.powi(3) - 0.000197 * t.powi(4)
    } else if year < 1941.0 {
        let t = year - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t * t + 0.0020936 * t.powi(3)
    } else if year < 1961.0 {
        let t = year - 1950.0;
        29.07 + 0.407 * t - t * t / 233.0 + t.powi(3) / 2547.0
    } else if year < 1986.0 {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t * t / 260.0 - t.powi(3) / 718.0
    } else if year < 2005.0 {
        let t = year - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t * t
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if year < 2050.0 {
        let t = year - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t * t
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - year)
    }
}
