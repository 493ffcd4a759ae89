//! Call-site values handed to the rule builders.
//!
//! A [`Value`] is deliberately loose: observers type `scan=1`, `object=["3C273", "NGC1234"]`,
//! `ra=("12h30m", "12h40m")` or `dec=(None, 10.5)` and expect each of them to mean
//! something. The sanitizer narrows these down to plain comparable scalars before any
//! predicate is evaluated; this module only knows how to hold, convert and render them.

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

// used to print out readable forms of criteria
use std::fmt;

/// Units a [`Quantity`] may carry. Only the angular ones convert to degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Degree,
    ArcMinute,
    ArcSecond,
    Radian,
    HourAngle,
    Other(String),
}

impl Unit {
    /// Multiplier from this unit to degrees, if it is an angle.
    pub fn to_degrees(&self) -> Option<f64> {
        match self {
            Unit::Degree => Some(1.0),
            Unit::ArcMinute => Some(1.0 / 60.0),
            Unit::ArcSecond => Some(1.0 / 3600.0),
            Unit::Radian => Some(180.0 / std::f64::consts::PI),
            Unit::HourAngle => Some(15.0),
            Unit::Other(_) => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unit::Degree => write!(f, "deg"),
            Unit::ArcMinute => write!(f, "arcmin"),
            Unit::ArcSecond => write!(f, "arcsec"),
            Unit::Radian => write!(f, "rad"),
            Unit::HourAngle => write!(f, "hourangle"),
            Unit::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A number with a physical unit attached. Always a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    value: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }
    pub fn degrees(value: f64) -> Self {
        Self::new(value, Unit::Degree)
    }
    pub fn arcmin(value: f64) -> Self {
        Self::new(value, Unit::ArcMinute)
    }
    pub fn arcsec(value: f64) -> Self {
        Self::new(value, Unit::ArcSecond)
    }
    pub fn radians(value: f64) -> Self {
        Self::new(value, Unit::Radian)
    }
    pub fn hours(value: f64) -> Self {
        Self::new(value, Unit::HourAngle)
    }
    pub fn value(&self) -> f64 {
        self.value
    }
    pub fn unit(&self) -> &Unit {
        &self.unit
    }
    /// The quantity expressed in decimal degrees, or `None` for non-angular units.
    pub fn in_degrees(&self) -> Option<f64> {
        self.unit.to_degrees().map(|factor| self.value * factor)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A raw or sanitized criterion value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An open range bound.
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Time(NaiveDateTime),
    Quantity(Quantity),
    List(Vec<Value>),
}

impl Value {
    /// The plain number held by this value. Quantities give up their unit.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            Value::Quantity(q) => Some(q.value()),
            _ => None,
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn render(&self, f: &mut fmt::Formatter, nested: bool) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) if nested => write!(f, "'{}'", s),
            Value::Text(s) => write!(f, "{}", s),
            Value::Time(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Quantity(q) => write!(f, "{}", q),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.render(f, true)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Renders the value the way it is recorded in a rule's criteria.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.render(f, false)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i as i64) }
}
impl From<u32> for Value {
    fn from(i: u32) -> Self { Value::Int(i as i64) }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}
impl From<f32> for Value {
    fn from(x: f32) -> Self { Value::Float(x as f64) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_string()) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}
impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self { Value::Time(t) }
}
impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self { Value::Quantity(q) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
impl<A: Into<Value>> From<(A,)> for Value {
    fn from(t: (A,)) -> Self {
        Value::List(vec![t.0.into()])
    }
}
impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from(t: (A, B)) -> Self {
        Value::List(vec![t.0.into(), t.1.into()])
    }
}

lazy_static! {
    static ref DECIMAL_ANGLE: Regex = Regex::new(
        r#"(?i)^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:e[+-]?\d+)?)\s*(degrees|degree|deg|d|°|arcminutes|arcminute|arcmin|'|′|arcseconds|arcsecond|arcsec|"|″|radians|radian|rad|hourangle|hours|hour|hr|h)\s*$"#
    ).unwrap();
    static ref LETTER_SEXAGESIMAL: Regex = Regex::new(
        r#"(?i)^\s*([+-])?\s*(\d+)\s*([hd°])\s*(?:(\d+(?:\.\d*)?)\s*[m'′])?\s*(?:(\d+(?:\.\d*)?)\s*[s"″])?\s*$"#
    ).unwrap();
    static ref COLON_SEXAGESIMAL: Regex = Regex::new(
        r"(?i)^\s*([+-])?\s*(\d+):(\d+)(?::(\d+(?:\.\d*)?))?\s*(degrees|degree|deg|d|hourangle|hours|hour|hr|h)\s*$"
    ).unwrap();
    static ref GBT_TIMESTAMP: Regex = Regex::new(
        r"^\s*(\d{4})_(\d{2})_(\d{2})_(\d{2}:\d{2}:\d{2}(?:\.\d+)?)\s*$"
    ).unwrap();
}

fn unit_from_suffix(suffix: &str) -> Unit {
    match suffix.to_lowercase().as_str() {
        "degrees" | "degree" | "deg" | "d" | "°" => Unit::Degree,
        "arcminutes" | "arcminute" | "arcmin" | "'" | "′" => Unit::ArcMinute,
        "arcseconds" | "arcsecond" | "arcsec" | "\"" | "″" => Unit::ArcSecond,
        "radians" | "radian" | "rad" => Unit::Radian,
        _ => Unit::HourAngle,
    }
}

fn sexagesimal(negative: bool, lead: f64, minutes: f64, seconds: f64, factor: f64) -> Option<f64> {
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }
    let magnitude = (lead + minutes / 60.0 + seconds / 3600.0) * factor;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses an angle string into decimal degrees.
///
/// A unit is always required: `"12.5deg"`, `"30 arcmin"`, `"12h30m15.5s"`,
/// `"-10d20m30s"`, `"12:30:15 h"`, `"-10:20:30 deg"`. Returns `None` when the string
/// is not an angle or a sexagesimal field is out of range.
pub fn parse_angle(text: &str) -> Option<f64> {
    if let Some(c) = DECIMAL_ANGLE.captures(text) {
        let value: f64 = c[1].parse().ok()?;
        return unit_from_suffix(&c[2]).to_degrees().map(|factor| value * factor);
    }
    if let Some(c) = LETTER_SEXAGESIMAL.captures(text) {
        let negative = c.get(1).is_some_and(|s| s.as_str() == "-");
        let lead: f64 = c[2].parse().ok()?;
        let factor = if c[3].eq_ignore_ascii_case("h") { 15.0 } else { 1.0 };
        let minutes = c.get(4).map_or(Some(0.0), |m| m.as_str().parse().ok())?;
        let seconds = c.get(5).map_or(Some(0.0), |s| s.as_str().parse().ok())?;
        return sexagesimal(negative, lead, minutes, seconds, factor);
    }
    if let Some(c) = COLON_SEXAGESIMAL.captures(text) {
        let negative = c.get(1).is_some_and(|s| s.as_str() == "-");
        let lead: f64 = c[2].parse().ok()?;
        let minutes: f64 = c[3].parse().ok()?;
        let seconds = c.get(4).map_or(Some(0.0), |s| s.as_str().parse().ok())?;
        let factor = unit_from_suffix(&c[5]).to_degrees()?;
        return sexagesimal(negative, lead, minutes, seconds, factor);
    }
    None
}

/// Parses an observation timestamp.
///
/// Accepts the GBT SDFITS form `YYYY_MM_DD_HH:MM:SS`, ISO-8601 with a `T` or a space
/// separator (fractional seconds optional), and bare dates (midnight).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let iso = match GBT_TIMESTAMP.captures(text) {
        Some(c) => format!("{}-{}-{}T{}", &c[1], &c[2], &c[3], &c[4]),
        None => text.trim().to_string(),
    };
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&iso, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn decimal_angles_with_units() {
        assert!(close(parse_angle("12.5deg").unwrap(), 12.5));
        assert!(close(parse_angle("30 arcmin").unwrap(), 0.5));
        assert!(close(parse_angle("-36arcsec").unwrap(), -0.01));
        assert!(close(parse_angle("2h").unwrap(), 30.0));
        assert!(close(parse_angle("3.141592653589793 rad").unwrap(), 180.0));
    }

    #[test]
    fn sexagesimal_angles() {
        assert!(close(parse_angle("12h30m").unwrap(), 187.5));
        assert!(close(parse_angle("1h0m36s").unwrap(), 15.15));
        assert!(close(parse_angle("-10d30m").unwrap(), -10.5));
        assert!(close(parse_angle("-0d30m").unwrap(), -0.5));
        assert!(close(parse_angle("12:30:00 h").unwrap(), 187.5));
        assert!(close(parse_angle("-10:30 deg").unwrap(), -10.5));
    }

    #[test]
    fn rejects_unitless_and_out_of_range() {
        assert_eq!(parse_angle("12.5"), None);
        assert_eq!(parse_angle("12:30:00"), None);
        assert_eq!(parse_angle("10d75m"), None);
        assert_eq!(parse_angle("north"), None);
    }

    #[test]
    fn timestamps_in_archive_and_iso_forms() {
        let expected = NaiveDate::from_ymd_opt(2021, 2, 10)
            .unwrap()
            .and_hms_opt(7, 38, 37)
            .unwrap();
        assert_eq!(parse_timestamp("2021_02_10_07:38:37"), Some(expected));
        assert_eq!(parse_timestamp("2021-02-10T07:38:37"), Some(expected));
        assert_eq!(parse_timestamp("2021-02-10 07:38:37.000"), Some(expected));
        assert!(parse_timestamp("2021-02-10").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn criteria_rendering() {
        let v: Value = vec!["3C273", "NGC1234"].into();
        assert_eq!(v.to_string(), "['3C273', 'NGC1234']");
        let r: Value = (None::<f64>, 5).into();
        assert_eq!(r.to_string(), "[None, 5]");
        assert_eq!(Value::from("3C273").to_string(), "3C273");
    }
}
