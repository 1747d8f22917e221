//! Property type tags and the native kind mapping.
//!
//! Every native Rust type that can be stored in a [`Property`] implements
//! [`PropertyKind`], which pins it to exactly one [`PropertyType`] tag.
//! Adding a new value kind means adding a tag, a [`PropertyValue`] variant
//! and one `PropertyKind` impl.
//!
//! [`Property`]: super::Property

use crate::property::PropertyList;
use crate::types::{
    ChannelId, ChannelIdList, DecoratedNumber, DoubleList, Point, PointList, Range, Rational,
    Scalar, StringList,
};
use std::fmt;

/// Semantic kind of a property. Discriminants are part of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum PropertyType {
    #[default]
    Unknown = 0,
    String = 1,
    Integer = 2,
    UnsignedInteger = 3,
    UnsignedInteger64 = 4,
    FloatingPointNumber = 5,
    Boolean = 6,
    Color = 7,
    Date = 8,
    DateTime = 9,
    Range = 10,
    Enum = 11,
    PropertyList = 12,
    Scalar = 13,
    StringList = 14,
    PointList = 15,
    DecoratedNumber = 16,
    ChannelId = 17,
    FloatingPointNumberList = 18,
    Rational = 19,
    GeoCoordinate = 20,
    Point = 21,
    ChannelIdList = 22,
    Integer64 = 23,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Rendering hint for string properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringFormat {
    Unknown,
    #[default]
    Plain,
    /// The string holds embedded markup
    Xml,
    MultiLine,
    /// reStructuredText
    Rst,
}

impl StringFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StringFormat::Unknown => "unknown",
            StringFormat::Plain => "plain",
            StringFormat::Xml => "xml",
            StringFormat::MultiLine => "multiline",
            StringFormat::Rst => "rst",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "plain" => StringFormat::Plain,
            "xml" => StringFormat::Xml,
            "multiline" => StringFormat::MultiLine,
            "rst" => StringFormat::Rst,
            _ => StringFormat::Unknown,
        }
    }
}

/// Payload of a property. Exactly one variant is populated at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    #[default]
    None,
    /// Plain string payload (strings, colors, dates, geo coordinates)
    Text(String),
    Integer(i32),
    UnsignedInteger(u32),
    Integer64(i64),
    UnsignedInteger64(u64),
    Double(f64),
    Boolean(bool),
    Scalar(Scalar),
    Range(Range),
    DecoratedNumber(DecoratedNumber),
    Rational(Rational),
    Point(Point),
    PointList(PointList),
    DoubleList(DoubleList),
    StringList(StringList),
    ChannelId(ChannelId),
    ChannelIdList(ChannelIdList),
    PropertyList(PropertyList),
    Enum { value: String, enum_type: String },
}

impl PropertyValue {
    /// True for payloads other than `None` and plain text
    pub fn is_typed(&self) -> bool {
        !matches!(self, PropertyValue::None | PropertyValue::Text(_))
    }
}

/// A native Rust type with a fixed property type tag.
pub trait PropertyKind: Sized {
    /// The single tag this kind maps to
    const TYPE: PropertyType;

    fn into_value(self) -> PropertyValue;

    /// Extract from a payload of the matching variant
    fn from_value(value: &PropertyValue) -> Option<Self>;

    /// Lexical conversion from a string payload
    fn from_text(_text: &str) -> Option<Self> {
        None
    }

    /// Conversion from a boolean property (the one permitted coercion)
    fn from_bool(_value: bool) -> Option<Self> {
        None
    }
}

macro_rules! numeric_kind {
    ($ty:ty, $tag:ident, $variant:ident) => {
        impl PropertyKind for $ty {
            const TYPE: PropertyType = PropertyType::$tag;

            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn from_text(text: &str) -> Option<Self> {
                text.trim().parse().ok()
            }

            fn from_bool(value: bool) -> Option<Self> {
                Some(if value { 1 as $ty } else { 0 as $ty })
            }
        }
    };
}

numeric_kind!(i32, Integer, Integer);
numeric_kind!(u32, UnsignedInteger, UnsignedInteger);
numeric_kind!(i64, Integer64, Integer64);
numeric_kind!(u64, UnsignedInteger64, UnsignedInteger64);
numeric_kind!(f64, FloatingPointNumber, Double);

impl PropertyKind for bool {
    const TYPE: PropertyType = PropertyType::Boolean;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Boolean(self)
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        parse_bool(text)
    }

    fn from_bool(value: bool) -> Option<Self> {
        Some(value)
    }
}

impl PropertyKind for String {
    const TYPE: PropertyType = PropertyType::String;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Text(self)
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn from_bool(value: bool) -> Option<Self> {
        Some(value.to_string())
    }
}

impl PropertyKind for &str {
    const TYPE: PropertyType = PropertyType::String;

    fn into_value(self) -> PropertyValue {
        PropertyValue::Text(self.to_string())
    }

    // Borrowed strings can be stored but not read back; use `String`.
    fn from_value(_value: &PropertyValue) -> Option<Self> {
        None
    }
}

impl PropertyKind for ChannelId {
    const TYPE: PropertyType = PropertyType::ChannelId;

    fn into_value(self) -> PropertyValue {
        PropertyValue::ChannelId(self)
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::ChannelId(v) => Some(*v),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok().map(ChannelId)
    }
}

macro_rules! composite_kind {
    ($ty:ty, $tag:ident, $variant:ident) => {
        impl PropertyKind for $ty {
            const TYPE: PropertyType = PropertyType::$tag;

            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

composite_kind!(Scalar, Scalar, Scalar);
composite_kind!(Range, Range, Range);
composite_kind!(DecoratedNumber, DecoratedNumber, DecoratedNumber);
composite_kind!(Rational, Rational, Rational);
composite_kind!(Point, Point, Point);
composite_kind!(PointList, PointList, PointList);
composite_kind!(DoubleList, FloatingPointNumberList, DoubleList);
composite_kind!(StringList, StringList, StringList);
composite_kind!(ChannelIdList, ChannelIdList, ChannelIdList);
composite_kind!(PropertyList, PropertyList, PropertyList);

/// Accepts `true`/`false` and `1`/`0`
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_distinct_tags() {
        let tags = [
            i32::TYPE,
            u32::TYPE,
            i64::TYPE,
            u64::TYPE,
            f64::TYPE,
            bool::TYPE,
            String::TYPE,
            ChannelId::TYPE,
            Scalar::TYPE,
            Range::TYPE,
            DecoratedNumber::TYPE,
            Rational::TYPE,
            Point::TYPE,
            PointList::TYPE,
            DoubleList::TYPE,
            StringList::TYPE,
            ChannelIdList::TYPE,
            PropertyList::TYPE,
        ];
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
        assert_eq!(<&str>::TYPE, String::TYPE);
    }

    #[test]
    fn test_wire_discriminants() {
        assert_eq!(PropertyType::Unknown as u32, 0);
        assert_eq!(PropertyType::Range as u32, 10);
        assert_eq!(PropertyType::ChannelIdList as u32, 22);
        assert_eq!(PropertyType::Integer64 as u32, 23);
    }

    #[test]
    fn test_string_format_names() {
        for format in [
            StringFormat::Plain,
            StringFormat::Xml,
            StringFormat::MultiLine,
            StringFormat::Rst,
        ] {
            assert_eq!(StringFormat::from_name(format.as_str()), format);
        }
        assert_eq!(StringFormat::from_name("html"), StringFormat::Unknown);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }
}
