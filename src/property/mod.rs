//! Dynamically typed name/value pairs.
//!
//! A [`Property`] couples a name with a [`PropertyType`] tag and a
//! [`PropertyValue`] payload. The tag always agrees with the payload: every
//! constructor and setter writes both together.
//!
//! ```text
//! Property { name: "AcquisitionRate", kind: Scalar, value: Scalar(1000 Hz) }
//! Property { name: "Mode",            kind: Enum,   value: Enum("Fast", "SpeedMode") }
//! ```
//!
//! Typed reads come in two flavours:
//! - `value_strict::<T>()` requires the stored tag to be `T::TYPE`.
//! - `value::<T>()` only rejects a mismatching *typed* payload; a string
//!   payload is converted lexically.
//!
//! Boolean properties are the one permitted coercion: they read as `1`/`0`
//! through numeric getters and as `"true"`/`"false"` through string getters.

mod kind;
mod list;

pub use kind::{PropertyKind, PropertyType, PropertyValue, StringFormat};
pub use list::PropertyList;

pub(crate) use kind::parse_bool;

use crate::error::{PluginError, Result};
use crate::types::{
    ChannelId, ChannelIdList, DecoratedNumber, DoubleList, Point, PointList, Range, Rational,
    Scalar, StringList,
};
use std::borrow::Cow;

/// A named, typed configuration value
#[derive(Debug, Clone, Default)]
pub struct Property {
    name: String,
    kind: PropertyType,
    string_format: StringFormat,
    value: PropertyValue,
}

impl Property {
    /// Create a property without a value (invalid until a value is set)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a property with a value of any supported kind
    pub fn new<T: PropertyKind>(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            kind: T::TYPE,
            string_format: StringFormat::Plain,
            value: value.into_value(),
        }
    }

    /// Create an enum property
    pub fn new_enum(
        name: impl Into<String>,
        value: impl Into<String>,
        enum_type: impl Into<String>,
    ) -> Self {
        let mut property = Self::named(name);
        property.set_enum_value(value, enum_type);
        property
    }

    /// Create a property of an explicit type from its string form
    ///
    /// The string is kept as payload; typed getters convert it lazily.
    pub fn with_type_and_text(
        name: impl Into<String>,
        kind: PropertyType,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            string_format: StringFormat::Plain,
            value: PropertyValue::Text(text.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> PropertyType {
        self.kind
    }

    pub fn string_format(&self) -> StringFormat {
        self.string_format
    }

    pub fn raw_value(&self) -> &PropertyValue {
        &self.value
    }

    /// False for default-constructed properties
    pub fn is_valid(&self) -> bool {
        self.kind != PropertyType::Unknown
    }

    /// Value equality ignoring the name. A number held as text equals the
    /// same number held typed.
    pub fn same_value(&self, other: &Property) -> bool {
        self.kind == other.kind && *self.canonical_value() == *other.canonical_value()
    }

    /// Payload with text of a lexically convertible kind parsed into its
    /// typed variant. Unparsable text is compared as text.
    fn canonical_value(&self) -> Cow<'_, PropertyValue> {
        let PropertyValue::Text(text) = &self.value else {
            return Cow::Borrowed(&self.value);
        };
        let parsed = match self.kind {
            PropertyType::Integer => i32::from_text(text).map(PropertyKind::into_value),
            PropertyType::UnsignedInteger => u32::from_text(text).map(PropertyKind::into_value),
            PropertyType::Integer64 => i64::from_text(text).map(PropertyKind::into_value),
            PropertyType::UnsignedInteger64 => u64::from_text(text).map(PropertyKind::into_value),
            PropertyType::FloatingPointNumber => f64::from_text(text).map(PropertyKind::into_value),
            PropertyType::Boolean => bool::from_text(text).map(PropertyKind::into_value),
            PropertyType::ChannelId => ChannelId::from_text(text).map(PropertyKind::into_value),
            _ => None,
        };
        parsed.map_or(Cow::Borrowed(&self.value), Cow::Owned)
    }

    // ── Setters ──

    pub fn set_value<T: PropertyKind>(&mut self, value: T) {
        self.kind = T::TYPE;
        self.string_format = StringFormat::Plain;
        self.value = value.into_value();
    }

    pub fn set_string_value_with_format(&mut self, value: impl Into<String>, format: StringFormat) {
        self.kind = PropertyType::String;
        self.string_format = format;
        self.value = PropertyValue::Text(value.into());
    }

    pub fn set_enum_value(&mut self, value: impl Into<String>, enum_type: impl Into<String>) {
        self.kind = PropertyType::Enum;
        self.string_format = StringFormat::Plain;
        self.value = PropertyValue::Enum {
            value: value.into(),
            enum_type: enum_type.into(),
        };
    }

    pub fn set_color_value(&mut self, color: impl Into<String>) {
        self.set_text_of_kind(PropertyType::Color, color.into());
    }

    pub fn set_date_value(&mut self, date: impl Into<String>) {
        self.set_text_of_kind(PropertyType::Date, date.into());
    }

    pub fn set_date_time_value(&mut self, date_time: impl Into<String>) {
        self.set_text_of_kind(PropertyType::DateTime, date_time.into());
    }

    pub fn set_geo_coordinate_value(&mut self, coord: impl Into<String>) {
        self.set_text_of_kind(PropertyType::GeoCoordinate, coord.into());
    }

    fn set_text_of_kind(&mut self, kind: PropertyType, text: String) {
        self.kind = kind;
        self.string_format = StringFormat::Plain;
        self.value = PropertyValue::Text(text);
    }

    // ── Generic getters ──

    /// Read a value whose stored tag must be exactly `T::TYPE`
    pub fn value_strict<T: PropertyKind>(&self) -> Result<T> {
        if self.kind != T::TYPE && self.kind != PropertyType::Boolean {
            return Err(self.mismatch(T::TYPE));
        }
        self.cast()
    }

    /// Read a value, rejecting only a mismatching typed payload
    pub fn value<T: PropertyKind>(&self) -> Result<T> {
        if self.value.is_typed() && self.kind != T::TYPE && self.kind != PropertyType::Boolean {
            return Err(self.mismatch(T::TYPE));
        }
        self.cast()
    }

    fn cast<T: PropertyKind>(&self) -> Result<T> {
        if self.kind == PropertyType::Boolean && T::TYPE != PropertyType::Boolean {
            let flag = self.get_bool_value()?;
            return T::from_bool(flag).ok_or_else(|| self.mismatch(T::TYPE));
        }
        match &self.value {
            PropertyValue::None => Err(PluginError::AbsentValue(self.name.clone())),
            PropertyValue::Text(text) => {
                T::from_text(text).ok_or_else(|| PluginError::AbsentValue(self.name.clone()))
            }
            typed => T::from_value(typed).ok_or_else(|| self.mismatch(T::TYPE)),
        }
    }

    fn mismatch(&self, expected: PropertyType) -> PluginError {
        PluginError::type_mismatch(self.name.clone(), expected, self.kind)
    }

    // ── Named getters ──

    /// The value as string regardless of its type
    pub fn get_string_value(&self) -> String {
        match &self.value {
            PropertyValue::Text(text) => text.clone(),
            _ => self.value_to_string(),
        }
    }

    pub fn get_int_value(&self) -> Result<i32> {
        self.value_strict()
    }

    pub fn get_unsigned_int_value(&self) -> Result<u32> {
        self.value_strict()
    }

    /// Accepts both UNSIGNED_INTEGER and UNSIGNED_INTEGER64
    pub fn get_unsigned_int64_value(&self) -> Result<u64> {
        match (&self.value, self.kind) {
            (PropertyValue::UnsignedInteger(v), _) => Ok(u64::from(*v)),
            (PropertyValue::Text(_), PropertyType::UnsignedInteger) => {
                self.value::<u32>().map(u64::from)
            }
            _ => self.value_strict(),
        }
    }

    /// Accepts both INTEGER and INTEGER64
    pub fn get_int64_value(&self) -> Result<i64> {
        match (&self.value, self.kind) {
            (PropertyValue::Integer(v), _) => Ok(i64::from(*v)),
            (PropertyValue::Text(_), PropertyType::Integer) => self.value::<i32>().map(i64::from),
            _ => self.value_strict(),
        }
    }

    pub fn get_double_value(&self) -> Result<f64> {
        self.value_strict()
    }

    /// Boolean value; string payloads `true`/`false`/`1`/`0` are accepted
    pub fn get_bool_value(&self) -> Result<bool> {
        match &self.value {
            PropertyValue::Boolean(v) => Ok(*v),
            PropertyValue::Text(text)
                if matches!(self.kind, PropertyType::Boolean | PropertyType::String) =>
            {
                parse_bool(text).ok_or_else(|| self.mismatch(PropertyType::Boolean))
            }
            PropertyValue::None => Err(PluginError::AbsentValue(self.name.clone())),
            _ => Err(self.mismatch(PropertyType::Boolean)),
        }
    }

    pub fn get_scalar_value(&self) -> Result<Scalar> {
        self.value_strict()
    }

    pub fn get_decorated_number_value(&self) -> Result<DecoratedNumber> {
        self.value_strict()
    }

    pub fn get_range_value(&self) -> Result<Range> {
        self.value_strict()
    }

    pub fn get_rational_value(&self) -> Result<Rational> {
        self.value_strict()
    }

    pub fn get_point_value(&self) -> Result<Point> {
        self.value_strict()
    }

    pub fn get_point_list_value(&self) -> Result<PointList> {
        self.value_strict()
    }

    pub fn get_double_list_value(&self) -> Result<DoubleList> {
        self.value_strict()
    }

    pub fn get_string_list_value(&self) -> Result<StringList> {
        self.value_strict()
    }

    pub fn get_channel_id_value(&self) -> Result<ChannelId> {
        self.value_strict()
    }

    pub fn get_channel_id_list_value(&self) -> Result<ChannelIdList> {
        self.value_strict()
    }

    pub fn get_property_list_value(&self) -> Result<&PropertyList> {
        match &self.value {
            PropertyValue::PropertyList(list) if self.kind == PropertyType::PropertyList => Ok(list),
            PropertyValue::None if self.kind == PropertyType::PropertyList => {
                Err(PluginError::AbsentValue(self.name.clone()))
            }
            _ => Err(self.mismatch(PropertyType::PropertyList)),
        }
    }

    pub fn get_enum_value(&self) -> Result<&str> {
        match &self.value {
            PropertyValue::Enum { value, .. } => Ok(value),
            _ => Err(self.mismatch(PropertyType::Enum)),
        }
    }

    pub fn get_enum_type(&self) -> Result<&str> {
        match &self.value {
            PropertyValue::Enum { enum_type, .. } => Ok(enum_type),
            _ => Err(self.mismatch(PropertyType::Enum)),
        }
    }

    /// Human readable rendering of the value, whatever its kind
    pub fn value_to_string(&self) -> String {
        match &self.value {
            PropertyValue::None => String::new(),
            PropertyValue::Text(text) => text.clone(),
            PropertyValue::Integer(v) => v.to_string(),
            PropertyValue::UnsignedInteger(v) => v.to_string(),
            PropertyValue::Integer64(v) => v.to_string(),
            PropertyValue::UnsignedInteger64(v) => v.to_string(),
            PropertyValue::Double(v) => v.to_string(),
            PropertyValue::Boolean(v) => v.to_string(),
            PropertyValue::Scalar(v) => v.to_string(),
            PropertyValue::Range(v) => v.to_string(),
            PropertyValue::DecoratedNumber(v) => v.to_string(),
            PropertyValue::Rational(v) => v.to_string(),
            PropertyValue::Point(v) => v.to_string(),
            PropertyValue::PointList(v) => v.to_string(),
            PropertyValue::DoubleList(v) => v.to_string(),
            PropertyValue::StringList(v) => v.to_string(),
            PropertyValue::ChannelId(v) => v.to_string(),
            PropertyValue::ChannelIdList(v) => v.to_string(),
            PropertyValue::PropertyList(list) => {
                let entries: Vec<String> = list
                    .iter()
                    .map(|p| format!("{}: {}", p.name(), p.value_to_string()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            PropertyValue::Enum { value, .. } => value.clone(),
        }
    }

    /// Replace the payload wholesale. Used by the codec, which has
    /// already checked that `kind` and `value` agree.
    pub(crate) fn set_raw(&mut self, kind: PropertyType, format: StringFormat, value: PropertyValue) {
        self.kind = kind;
        self.string_format = format;
        self.value = value;
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.same_value(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invalid() {
        let property = Property::default();
        assert!(!property.is_valid());
        assert_eq!(property.kind(), PropertyType::Unknown);
        assert!(Property::named("x").get_double_value().is_err());
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(Property::new("a", 1i32).kind(), PropertyType::Integer);
        assert_eq!(Property::new("a", 1u32).kind(), PropertyType::UnsignedInteger);
        assert_eq!(Property::new("a", 1i64).kind(), PropertyType::Integer64);
        assert_eq!(Property::new("a", 1u64).kind(), PropertyType::UnsignedInteger64);
        assert_eq!(Property::new("a", 1.0).kind(), PropertyType::FloatingPointNumber);
        assert_eq!(Property::new("a", "s").kind(), PropertyType::String);
        assert_eq!(Property::new("a", ChannelId(4)).kind(), PropertyType::ChannelId);
        assert_eq!(
            Property::new("a", Scalar::new(1.0, "Hz")).kind(),
            PropertyType::Scalar
        );
    }

    #[test]
    fn test_strict_mismatch_never_defaults() {
        let property = Property::new("rate", Scalar::new(100.0, "Hz"));
        assert!(matches!(
            property.get_double_value(),
            Err(PluginError::TypeMismatch { .. })
        ));
        assert!(matches!(
            property.get_range_value(),
            Err(PluginError::TypeMismatch { .. })
        ));
        assert!(property.get_enum_value().is_err());
        assert_eq!(property.get_scalar_value().unwrap(), Scalar::new(100.0, "Hz"));
    }

    #[test]
    fn test_lenient_reads_string_payload() {
        let property = Property::with_type_and_text("n", PropertyType::Integer, "42");
        assert_eq!(property.value::<i32>().unwrap(), 42);
        assert_eq!(property.get_int_value().unwrap(), 42);
        assert_eq!(property.get_int64_value().unwrap(), 42);

        let garbage = Property::with_type_and_text("n", PropertyType::Integer, "abc");
        assert!(matches!(
            garbage.get_int_value(),
            Err(PluginError::AbsentValue(_))
        ));
    }

    #[test]
    fn test_lenient_rejects_typed_mismatch() {
        let property = Property::new("n", 5u32);
        assert!(property.value::<f64>().is_err());
        assert_eq!(property.value::<u32>().unwrap(), 5);
        assert_eq!(property.get_unsigned_int64_value().unwrap(), 5);
    }

    #[test]
    fn test_bool_coercion() {
        let property = Property::new("used", true);
        assert_eq!(property.value::<i32>().unwrap(), 1);
        assert_eq!(property.value_strict::<f64>().unwrap(), 1.0);
        assert_eq!(property.value::<String>().unwrap(), "true");
        assert!(property.get_bool_value().unwrap());

        let text = Property::new("used", "0");
        assert!(!text.get_bool_value().unwrap());

        // Coercion is one-way: numbers do not read as booleans
        let number = Property::new("used", 1i32);
        assert!(number.get_bool_value().is_err());
        // and composites do not accept booleans
        assert!(property.get_scalar_value().is_err());
    }

    #[test]
    fn test_enum_value() {
        let property = Property::new_enum("mode", "Fast", "SpeedMode");
        assert_eq!(property.kind(), PropertyType::Enum);
        assert_eq!(property.get_enum_value().unwrap(), "Fast");
        assert_eq!(property.get_enum_type().unwrap(), "SpeedMode");
        assert_eq!(property.value_to_string(), "Fast");
    }

    #[test]
    fn test_equality_ignores_representation_but_not_name() {
        let a = Property::new("a", 3.5);
        let b = Property::new("b", 3.5);
        assert!(a.same_value(&b));
        assert_ne!(a, b);
        assert_eq!(a, Property::new("a", 3.5));
        assert!(!a.same_value(&Property::new("a", Scalar::new(3.5, ""))));
    }

    #[test]
    fn test_text_payload_equals_typed_payload() {
        let text = Property::with_type_and_text("n", PropertyType::Integer, "42");
        let typed = Property::new("n", 42i32);
        assert!(text.same_value(&typed));
        assert_eq!(text, typed);
        assert_eq!(typed, text);
        assert_eq!(
            Property::with_type_and_text("n", PropertyType::Integer, " 042"),
            typed
        );
        assert_eq!(
            Property::with_type_and_text("b", PropertyType::Boolean, "1"),
            Property::new("b", true)
        );

        assert_ne!(Property::with_type_and_text("n", PropertyType::Integer, "43"), typed);
        // the tag still has to match
        assert_ne!(Property::with_type_and_text("n", PropertyType::Integer64, "42"), typed);
        assert_ne!(Property::with_type_and_text("n", PropertyType::Integer, "abc"), typed);
    }

    #[test]
    fn test_string_like_kinds() {
        let mut property = Property::named("c");
        property.set_color_value("#ff0000");
        assert_eq!(property.kind(), PropertyType::Color);
        assert_eq!(property.get_string_value(), "#ff0000");
        property.set_date_time_value("2024-01-02T03:04:05");
        assert_eq!(property.kind(), PropertyType::DateTime);

        property.set_string_value_with_format("line 1\nline 2", StringFormat::MultiLine);
        assert_eq!(property.kind(), PropertyType::String);
        assert_eq!(property.string_format(), StringFormat::MultiLine);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(Property::new("a", 7i32).value_to_string(), "7");
        assert_eq!(
            Property::new("a", Range::new(-1.0, 2.0, "V")).value_to_string(),
            "-1 V .. 2 V"
        );
        let mut list = PropertyList::new();
        list.set_int("x", 1);
        list.set_string("y", "z");
        assert_eq!(Property::new("l", list).value_to_string(), "{x: 1, y: z}");
    }
}
