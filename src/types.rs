//! Core value kinds carried by properties
//!
//! This module contains the composite value types that a [`Property`] can
//! hold in addition to plain numbers and strings.
//!
//! # Main Types
//!
//! - [`Scalar`] - A number with a unit (e.g. `1000 Hz`)
//! - [`Range`] - A min/max pair, each side with its own unit
//! - [`Rational`] - An exact `i64` fraction with a unit
//! - [`DecoratedNumber`] - A number with a display prefix and suffix
//! - [`Point`] - An `(x, y)` pair of doubles
//! - [`ValueList`] - Ordered lists of the above ([`DoubleList`], [`StringList`],
//!   [`PointList`], [`ChannelIdList`])
//!
//! [`Property`]: crate::property::Property

use std::fmt;

/// Global channel identifier as used by the host
///
/// Kept as a newtype so that it maps to its own property type tag
/// instead of sharing one with `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A number with a unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scalar {
    pub value: f64,
    pub unit: String,
}

impl Scalar {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, unit_suffix(&self.unit))
    }
}

/// A value range with separate units for both ends
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub min_unit: String,
    pub max_unit: String,
}

impl Range {
    /// Create a range whose ends share one unit
    pub fn new(min: f64, max: f64, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        Self {
            min,
            max,
            min_unit: unit.clone(),
            max_unit: unit,
        }
    }

    pub fn with_units(
        min: f64,
        max: f64,
        min_unit: impl Into<String>,
        max_unit: impl Into<String>,
    ) -> Self {
        Self {
            min,
            max,
            min_unit: min_unit.into(),
            max_unit: max_unit.into(),
        }
    }

    /// A range is valid when `min <= max` (NaN bounds are never valid)
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} .. {}{}",
            self.min,
            unit_suffix(&self.min_unit),
            self.max,
            unit_suffix(&self.max_unit)
        )
    }
}

/// An exact fraction with a unit, e.g. a sample rate of `1/3 Hz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
    pub unit: String,
}

impl Default for Rational {
    fn default() -> Self {
        Self {
            numerator: 0,
            denominator: 1,
            unit: String::new(),
        }
    }
}

impl Rational {
    pub fn new(numerator: i64, denominator: i64, unit: impl Into<String>) -> Self {
        Self {
            numerator,
            denominator,
            unit: unit.into(),
        }
    }

    /// Approximate value as a double (`NaN` for a zero denominator)
    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            f64::NAN
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}{}",
            self.numerator,
            self.denominator,
            unit_suffix(&self.unit)
        )
    }
}

/// A number rendered with a prefix and suffix (e.g. `"#" 3 " of 8"`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecoratedNumber {
    pub value: f64,
    pub prefix: String,
    pub suffix: String,
}

impl DecoratedNumber {
    pub fn new(value: f64, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            value,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl fmt::Display for DecoratedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, self.value, self.suffix)
    }
}

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An ordered list of values of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList<T> {
    pub values: Vec<T>,
}

impl<T> Default for ValueList<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> ValueList<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T> FromIterator<T> for ValueList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ValueList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

pub type DoubleList = ValueList<f64>;
pub type StringList = ValueList<String>;
pub type PointList = ValueList<Point>;
pub type ChannelIdList = ValueList<ChannelId>;

/// A closed interval, used for export time ranges
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Interval<T> {
    pub begin: T,
    pub end: T,
}

impl<T> Interval<T> {
    pub fn new(begin: T, end: T) -> Self {
        Self { begin, end }
    }
}

fn unit_suffix(unit: &str) -> String {
    if unit.is_empty() {
        String::new()
    } else {
        format!(" {}", unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validity() {
        assert!(!Range::new(2.0, -1.0, "").is_valid());
        assert!(Range::new(-1.0, 2.0, "").is_valid());
        assert!(Range::new(1.0, 1.0, "V").is_valid());
        assert!(!Range::new(f64::NAN, 1.0, "V").is_valid());
    }

    #[test]
    fn test_range_units() {
        let range = Range::new(0.0, 10.0, "V");
        assert_eq!(range.min_unit, "V");
        assert_eq!(range.max_unit, "V");
        assert_eq!(range.span(), 10.0);
        assert_eq!(range.to_string(), "0 V .. 10 V");
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Scalar::new(1000.0, "Hz").to_string(), "1000 Hz");
        assert_eq!(Scalar::new(0.5, "").to_string(), "0.5");
        assert_eq!(Rational::new(1, 3, "Hz").to_string(), "1/3 Hz");
        assert_eq!(DecoratedNumber::new(3.0, "#", " of 8").to_string(), "#3 of 8");
        assert_eq!(Point::new(1.5, -2.0).to_string(), "(1.5, -2)");
        let list: DoubleList = vec![1.0, 2.5].into_iter().collect();
        assert_eq!(list.to_string(), "[1, 2.5]");
    }

    #[test]
    fn test_rational_as_f64() {
        assert_eq!(Rational::new(1, 4, "").as_f64(), 0.25);
        assert!(Rational::new(1, 0, "").as_f64().is_nan());
        assert_eq!(Rational::default().denominator, 1);
    }
}
