//! # Units Module
//!
//! Value types returned by the position pipeline. Each wraps a batch of
//! values (one per instant) so a single instant and a time series share
//! the same type.
//!
//! ## Angle storage
//!
//! `Angle` keeps the values in the unit they were provided in, degrees or
//! radians, and converts only when asked. An altitude produced by the
//! refraction kernel in degrees therefore reads back bit-identical through
//! [`Angle::degrees`], and a right ascension built from radians reads back
//! bit-identical through [`Angle::radians`].
//!
//! ## Examples
//!
//! ```rust
//! use starfield_positions::units::{Angle, Distance};
//!
//! let ra = Angle::from_radians(vec![std::f64::consts::PI / 4.0]).with_hours_preference();
//! assert_eq!(ra.to_string(), "03h 00m 00.00s");
//!
//! let d = Distance::from_au(vec![2.0_f64.sqrt()]);
//! assert_eq!(d.to_string(), "1.41421 AU");
//! ```

use crate::constants::{AU_KM, AU_M, DAY_S};
use crate::errors::{PositionError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::f64::consts::PI;
use std::fmt;

/// Internal representation format for angle values
#[derive(Debug, Clone, PartialEq)]
pub enum AngleFormat {
    /// Angles stored in degrees
    Degrees(Vec<f64>),
    /// Angles stored in radians
    Radians(Vec<f64>),
}

/// Unit an angle prefers when displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnglePreference {
    /// Degrees, arcminutes, arcseconds
    Degrees,
    /// Hours, minutes, seconds (right ascension)
    Hours,
}

/// A batch of angular measurements
#[derive(Debug, Clone, PartialEq)]
pub struct Angle {
    angle: AngleFormat,
    preference: AnglePreference,
    signed: bool,
}

impl Angle {
    /// Creates angles from values in degrees, stored exactly as given.
    pub fn from_degrees(degrees: Vec<f64>) -> Self {
        Angle {
            angle: AngleFormat::Degrees(degrees),
            preference: AnglePreference::Degrees,
            signed: false,
        }
    }

    /// Creates angles from values in radians, stored exactly as given.
    pub fn from_radians(radians: Vec<f64>) -> Self {
        Angle {
            angle: AngleFormat::Radians(radians),
            preference: AnglePreference::Degrees,
            signed: false,
        }
    }

    /// Display as hours of right ascension.
    pub fn with_hours_preference(mut self) -> Self {
        self.preference = AnglePreference::Hours;
        self
    }

    /// Always display an explicit sign.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn preference(&self) -> AnglePreference {
        self.preference
    }

    pub fn format(&self) -> &AngleFormat {
        &self.angle
    }

    pub fn len(&self) -> usize {
        match &self.angle {
            AngleFormat::Degrees(v) | AngleFormat::Radians(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values in radians.
    pub fn radians(&self) -> Vec<f64> {
        match &self.angle {
            AngleFormat::Degrees(v) => v.iter().map(|d| d * (PI / 180.0)).collect(),
            AngleFormat::Radians(v) => v.clone(),
        }
    }

    /// Values in degrees.
    pub fn degrees(&self) -> Vec<f64> {
        match &self.angle {
            AngleFormat::Degrees(v) => v.clone(),
            AngleFormat::Radians(v) => v.iter().map(|r| r * (180.0 / PI)).collect(),
        }
    }

    /// Values in hours (15 degrees per hour).
    pub fn hours(&self) -> Vec<f64> {
        self.degrees().into_iter().map(|d| d / 15.0).collect()
    }

    /// First value in radians, for single-instant angles.
    pub fn radians_scalar(&self) -> Option<f64> {
        self.radians().first().copied()
    }

    /// First value in degrees, for single-instant angles.
    pub fn degrees_scalar(&self) -> Option<f64> {
        self.degrees().first().copied()
    }

    fn format_value(&self, degrees: f64) -> String {
        match self.preference {
            AnglePreference::Hours => {
                let (sign, h, m, s, frac) = sexagesimalize(degrees / 15.0, 2);
                let sign = sign_str(sign, self.signed);
                format!("{}{:02}h {:02}m {:02}.{:02}s", sign, h, m, s, frac)
            }
            AnglePreference::Degrees => {
                let (sign, d, m, s, frac) = sexagesimalize(degrees, 1);
                let sign = sign_str(sign, self.signed);
                format!("{}{:02}deg {:02}' {:02}.{}\"", sign, d, m, s, frac)
            }
        }
    }
}

fn sign_str(negative: bool, signed: bool) -> &'static str {
    match (negative, signed) {
        (true, _) => "-",
        (false, true) => "+",
        (false, false) => "",
    }
}

/// Split a value into whole units, minutes, seconds and a rounded
/// fraction of a second with `places` digits.
fn sexagesimalize(value: f64, places: u32) -> (bool, u64, u64, u64, u64) {
    let negative = value < 0.0;
    let power = 10_u64.pow(places);
    let n = (value.abs() * 3600.0 * power as f64).round() as u64;
    let fraction = n % power;
    let n = n / power;
    let seconds = n % 60;
    let n = n / 60;
    let minutes = n % 60;
    let units = n / 60;
    (negative, units, minutes, seconds, fraction)
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let degrees = self.degrees();
        match degrees.as_slice() {
            [single] => write!(f, "{}", self.format_value(*single)),
            many => {
                let parts: Vec<String> = many.iter().map(|d| self.format_value(*d)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Format a number with six significant digits, trimming trailing zeros.
fn format_significant(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    let exponent = value.abs().log10().floor() as i32;
    if !(-5..6).contains(&exponent) {
        return format!("{:.5e}", value);
    }
    let decimals = (5 - exponent).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn format_batch(values: &[f64], unit: &str) -> String {
    match values {
        [single] => format!("{} {}", format_significant(*single), unit),
        many => {
            let parts: Vec<String> = many.iter().map(|v| format_significant(*v)).collect();
            format!("[{}] {}", parts.join(", "), unit)
        }
    }
}

/// A batch of distances, stored in AU
#[derive(Debug, Clone, PartialEq)]
pub struct Distance {
    au: Vec<f64>,
}

impl Distance {
    pub fn from_au(au: Vec<f64>) -> Self {
        Distance { au }
    }

    pub fn from_km(km: Vec<f64>) -> Self {
        Distance {
            au: km.into_iter().map(|k| k / AU_KM).collect(),
        }
    }

    pub fn from_m(m: Vec<f64>) -> Self {
        Distance {
            au: m.into_iter().map(|v| v / AU_M).collect(),
        }
    }

    pub fn au(&self) -> &[f64] {
        &self.au
    }

    pub fn km(&self) -> Vec<f64> {
        self.au.iter().map(|a| a * AU_KM).collect()
    }

    pub fn m(&self) -> Vec<f64> {
        self.au.iter().map(|a| a * AU_M).collect()
    }

    pub fn len(&self) -> usize {
        self.au.len()
    }

    pub fn is_empty(&self) -> bool {
        self.au.is_empty()
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_batch(&self.au, "AU"))
    }
}

/// A batch of speeds, stored in AU/day
#[derive(Debug, Clone, PartialEq)]
pub struct Velocity {
    au_per_d: Vec<f64>,
}

impl Velocity {
    pub fn from_au_per_d(au_per_d: Vec<f64>) -> Self {
        Velocity { au_per_d }
    }

    pub fn au_per_d(&self) -> &[f64] {
        &self.au_per_d
    }

    pub fn km_per_s(&self) -> Vec<f64> {
        self.au_per_d.iter().map(|v| v * AU_KM / DAY_S).collect()
    }

    pub fn len(&self) -> usize {
        self.au_per_d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.au_per_d.is_empty()
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_batch(&self.au_per_d, "AU/day"))
    }
}

lazy_static! {
    static ref LTUDE: Regex = Regex::new(
        r"^([+-]?\d+(?:\.\d*)?)(?:\s+(\d+(?:\.\d*)?))?(?:\s+(\d+(?:\.\d*)?))?\s*([A-Z])$"
    )
    .expect("latitude/longitude pattern is valid");
}

/// Parse a latitude or longitude written with a hemisphere letter.
///
/// Accepts decimal degrees (`"42.3583 N"`) or degrees, minutes and
/// seconds separated by whitespace (`"71 3 37.2 W"`). `positive` and
/// `negative` are the accepted suffix letters.
pub fn interpret_ltude(value: &str, name: &str, positive: char, negative: char) -> Result<f64> {
    let text = value.trim().to_uppercase();
    let captures = LTUDE.captures(&text).ok_or_else(|| {
        PositionError::InvalidArgument(format!(
            "your {} string {:?} cannot be parsed as a floating point number \
             followed by {:?} or {:?}",
            name, value, positive, negative
        ))
    })?;

    let suffix = captures[4].chars().next().unwrap_or(' ');
    let sign = if suffix == positive {
        1.0
    } else if suffix == negative {
        -1.0
    } else {
        return Err(PositionError::InvalidArgument(format!(
            "your {} string {:?} does not end with either {:?} or {:?}",
            name, value, positive, negative
        )));
    };

    let parse = |i: usize| -> Result<f64> {
        match captures.get(i) {
            Some(m) => m.as_str().parse::<f64>().map_err(|e| {
                PositionError::InvalidArgument(format!("your {} string {:?}: {}", name, value, e))
            }),
            None => Ok(0.0),
        }
    };

    let degrees = parse(1)?;
    let minutes = parse(2)?;
    let seconds = parse(3)?;
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    let inner_sign = if degrees.is_sign_negative() { -1.0 } else { 1.0 };
    Ok(sign * inner_sign * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angle_keeps_original_storage() {
        let a = Angle::from_degrees(vec![123.456789012345]);
        assert_eq!(a.degrees(), vec![123.456789012345]);
        match a.format() {
            AngleFormat::Degrees(v) => assert_eq!(v, &vec![123.456789012345]),
            AngleFormat::Radians(_) => panic!("Expected degrees format"),
        }

        let b = Angle::from_radians(vec![2.154321098765432]);
        assert_eq!(b.radians(), vec![2.154321098765432]);
    }

    #[test]
    fn test_angle_conversions() {
        let a = Angle::from_radians(vec![PI, PI / 2.0]);
        let d = a.degrees();
        assert_relative_eq!(d[0], 180.0, epsilon = 1e-13);
        assert_relative_eq!(d[1], 90.0, epsilon = 1e-13);
        assert_relative_eq!(a.hours()[0], 12.0, epsilon = 1e-13);
    }

    #[test]
    fn test_hours_display() {
        let ra = Angle::from_radians(vec![PI / 4.0]).with_hours_preference();
        assert_eq!(ra.to_string(), "03h 00m 00.00s");
    }

    #[test]
    fn test_signed_degrees_display() {
        let dec = Angle::from_degrees(vec![35.264389682754654]).signed();
        assert_eq!(dec.to_string(), "+35deg 15' 51.8\"");

        let south = Angle::from_degrees(vec![-12.5]).signed();
        assert_eq!(south.to_string(), "-12deg 30' 00.0\"");
    }

    #[test]
    fn test_rounding_carries_into_minutes() {
        let a = Angle::from_degrees(vec![10.0 + 59.0 / 60.0 + 59.99 / 3600.0]);
        assert_eq!(a.to_string(), "11deg 00' 00.0\"");
    }

    #[test]
    fn test_batch_display() {
        let a = Angle::from_degrees(vec![1.0, 2.0]);
        assert_eq!(a.to_string(), "[01deg 00' 00.0\", 02deg 00' 00.0\"]");
    }

    #[test]
    fn test_distance_display_and_units() {
        let d = Distance::from_au(vec![3.0_f64.sqrt()]);
        assert_eq!(d.to_string(), "1.73205 AU");
        assert_relative_eq!(Distance::from_au(vec![1.0]).km()[0], AU_KM);
        assert_relative_eq!(Distance::from_m(vec![AU_M]).au()[0], 1.0);
        assert_eq!(Distance::from_au(vec![1.0, 2.5]).to_string(), "[1, 2.5] AU");
    }

    #[test]
    fn test_velocity_km_per_s() {
        let v = Velocity::from_au_per_d(vec![0.0172021]);
        assert_relative_eq!(v.km_per_s()[0], 29.78, epsilon = 0.01);
    }

    #[test]
    fn test_interpret_ltude_decimal() {
        assert_relative_eq!(interpret_ltude("42.3583 N", "latitude", 'N', 'S').unwrap(), 42.3583);
        assert_relative_eq!(interpret_ltude(" 71.0603 w ", "longitude", 'E', 'W').unwrap(), -71.0603);
    }

    #[test]
    fn test_interpret_ltude_sexagesimal() {
        let value = interpret_ltude("71 3 36 W", "longitude", 'E', 'W').unwrap();
        assert_relative_eq!(value, -71.06, epsilon = 1e-12);
    }

    #[test]
    fn test_interpret_ltude_rejects_wrong_suffix() {
        let err = interpret_ltude("42.3583 E", "latitude", 'N', 'S').unwrap_err();
        assert!(matches!(err, PositionError::InvalidArgument(_)));
        assert!(err.to_string().contains("does not end with"));
    }

    #[test]
    fn test_interpret_ltude_rejects_garbage() {
        let err = interpret_ltude("north-ish", "latitude", 'N', 'S').unwrap_err();
        assert!(matches!(err, PositionError::InvalidArgument(_)));
    }
}
