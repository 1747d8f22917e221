//! Property <-> markup mapping.
//!
//! ```text
//! <Property name="AcquisitionRate"><Scalar unit="Hz">1000</Scalar></Property>
//! <Property name="Limits"><Range min_unit="V" max_unit="V"><Min>-1</Min><Max>2</Max></Range></Property>
//! <Property name="Notes"><String format="multiline">a
//! b</String></Property>
//! <Property name="Unset"/>
//! ```
//!
//! The element name of the value node encodes the type tag. A property
//! without a value node of a known type decodes to an invalid (unknown) property.

use crate::error::{PluginError, Result};
use crate::markup::format::format_f64;
use crate::markup::{MarkupNode, Version};
use crate::property::{parse_bool, Property, PropertyList, PropertyType, PropertyValue, StringFormat};
use crate::types::{ChannelId, DecoratedNumber, Point, Range, Rational, Scalar};
use std::str::FromStr;

const TYPE_NAMES: &[(PropertyType, &str)] = &[
    (PropertyType::String, "String"),
    (PropertyType::Integer, "Integer"),
    (PropertyType::UnsignedInteger, "UnsignedInteger"),
    (PropertyType::UnsignedInteger64, "UnsignedInteger64"),
    (PropertyType::FloatingPointNumber, "Double"),
    (PropertyType::Boolean, "Boolean"),
    (PropertyType::Color, "Color"),
    (PropertyType::Date, "Date"),
    (PropertyType::DateTime, "DateTime"),
    (PropertyType::Range, "Range"),
    (PropertyType::Enum, "Enum"),
    (PropertyType::PropertyList, "PropertyList"),
    (PropertyType::Scalar, "Scalar"),
    (PropertyType::StringList, "StringList"),
    (PropertyType::PointList, "PointList"),
    (PropertyType::DecoratedNumber, "DecoratedNumber"),
    (PropertyType::ChannelId, "ChannelID"),
    (PropertyType::FloatingPointNumberList, "DoubleList"),
    (PropertyType::Rational, "Rational"),
    (PropertyType::GeoCoordinate, "GeoCoordinate"),
    (PropertyType::Point, "Point"),
    (PropertyType::ChannelIdList, "ChannelIDList"),
    (PropertyType::Integer64, "Integer64"),
];

impl PropertyType {
    /// Element name of the value node, `None` for [`PropertyType::Unknown`]
    pub fn markup_name(self) -> Option<&'static str> {
        TYPE_NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, name)| *name)
    }

    pub fn from_markup_name(name: &str) -> Option<Self> {
        TYPE_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(kind, _)| *kind)
    }
}

impl Property {
    /// Build a standalone `<Property>` element
    pub fn to_markup(&self) -> MarkupNode {
        let mut node = MarkupNode::new("Property").with_attr("name", self.name());
        if let Some(value) = self.value_node() {
            node.append_child(value);
        }
        node
    }

    /// Append this property as a `<Property>` child of `parent`
    pub fn append_to<'a>(&self, parent: &'a mut MarkupNode) -> &'a mut MarkupNode {
        parent.append_child(self.to_markup())
    }

    pub fn from_markup(node: &MarkupNode, version: Version) -> Result<Property> {
        if node.name() != "Property" {
            return Err(PluginError::Parse(format!(
                "expected <Property>, found <{}>",
                node.name()
            )));
        }
        let mut property = Property::named(node.attr("name").unwrap_or_default());
        if node.children().is_empty() {
            return Ok(property);
        }

        // Unknown siblings of the value node come from newer peers
        let Some(value_node) = node
            .children()
            .iter()
            .find(|child| PropertyType::from_markup_name(child.name()).is_some())
        else {
            tracing::debug!("Property '{}' has no value of a known type", property.name());
            return Ok(property);
        };
        let (kind, format, value) = decode_value(value_node, version)
            .map_err(|e| e.with_context(format!("property '{}'", property.name())))?;
        property.set_raw(kind, format, value);
        Ok(property)
    }

    /// Replace `self` with the property stored in `node`.
    /// Returns false and leaves `self` unchanged when `node` is malformed.
    pub fn read_from(&mut self, node: &MarkupNode, version: Version) -> bool {
        match Property::from_markup(node, version) {
            Ok(property) => {
                *self = property;
                true
            }
            Err(e) => {
                tracing::debug!("Ignoring malformed property: {}", e);
                false
            }
        }
    }

    fn value_node(&self) -> Option<MarkupNode> {
        let mut node = MarkupNode::new(self.kind().markup_name()?);
        match self.raw_value() {
            PropertyValue::None => {}
            PropertyValue::Text(text) => {
                if self.kind() == PropertyType::String && self.string_format() != StringFormat::Plain {
                    node.set_attr("format", self.string_format().as_str());
                }
                node.set_text(text.clone());
            }
            PropertyValue::Integer(v) => {
                node.set_text(v.to_string());
            }
            PropertyValue::UnsignedInteger(v) => {
                node.set_text(v.to_string());
            }
            PropertyValue::Integer64(v) => {
                node.set_text(v.to_string());
            }
            PropertyValue::UnsignedInteger64(v) => {
                node.set_text(v.to_string());
            }
            PropertyValue::Double(v) => {
                node.set_text(format_f64(*v));
            }
            PropertyValue::Boolean(v) => {
                node.set_text(v.to_string());
            }
            PropertyValue::Scalar(scalar) => {
                set_optional_attr(&mut node, "unit", &scalar.unit);
                node.set_text(format_f64(scalar.value));
            }
            PropertyValue::Range(range) => write_range(&mut node, range),
            PropertyValue::DecoratedNumber(number) => {
                set_optional_attr(&mut node, "prefix", &number.prefix);
                set_optional_attr(&mut node, "suffix", &number.suffix);
                node.set_text(format_f64(number.value));
            }
            PropertyValue::Rational(rational) => {
                set_optional_attr(&mut node, "unit", &rational.unit);
                node.append("Numerator").set_text(rational.numerator.to_string());
                node.append("Denominator").set_text(rational.denominator.to_string());
            }
            PropertyValue::Point(point) => write_point(&mut node, point),
            PropertyValue::PointList(points) => {
                for point in points.iter() {
                    write_point(node.append("Point"), point);
                }
            }
            PropertyValue::DoubleList(values) => {
                for value in values.iter() {
                    node.append("Double").set_text(format_f64(*value));
                }
            }
            PropertyValue::StringList(values) => {
                for value in values.iter() {
                    node.append("String").set_text(value.clone());
                }
            }
            PropertyValue::ChannelId(id) => {
                node.set_text(id.to_string());
            }
            PropertyValue::ChannelIdList(ids) => {
                for id in ids.iter() {
                    node.append("ChannelID").set_text(id.to_string());
                }
            }
            PropertyValue::PropertyList(list) => list.append_to(&mut node),
            PropertyValue::Enum { value, enum_type } => {
                node.set_attr("type", enum_type);
                node.set_text(value.clone());
            }
        }
        Some(node)
    }
}

impl PropertyList {
    /// Append every entry as a `<Property>` child of `parent`
    pub fn append_to(&self, parent: &mut MarkupNode) {
        for property in self.iter() {
            property.append_to(parent);
        }
    }

    /// Collect the `<Property>` children of `node`
    pub fn from_markup(node: &MarkupNode, version: Version) -> Result<PropertyList> {
        node.children_named("Property")
            .map(|child| Property::from_markup(child, version))
            .collect()
    }
}

fn set_optional_attr(node: &mut MarkupNode, key: &str, value: &str) {
    if !value.is_empty() {
        node.set_attr(key, value);
    }
}

fn write_point(node: &mut MarkupNode, point: &Point) {
    node.set_attr("x", format_f64(point.x));
    node.set_attr("y", format_f64(point.y));
}

fn read_point(node: &MarkupNode) -> Result<Point> {
    Ok(Point {
        x: node.attr_as("x")?.unwrap_or_default(),
        y: node.attr_as("y")?.unwrap_or_default(),
    })
}

pub(crate) fn write_range(node: &mut MarkupNode, range: &Range) {
    set_optional_attr(node, "min_unit", &range.min_unit);
    set_optional_attr(node, "max_unit", &range.max_unit);
    node.append("Min").set_text(format_f64(range.min));
    node.append("Max").set_text(format_f64(range.max));
}

pub(crate) fn read_range(node: &MarkupNode) -> Result<Range> {
    Ok(Range {
        min: node.child_text_as("Min")?.unwrap_or_default(),
        max: node.child_text_as("Max")?.unwrap_or_default(),
        min_unit: node.attr("min_unit").unwrap_or_default().to_string(),
        max_unit: node.attr("max_unit").unwrap_or_default().to_string(),
    })
}

/// Numbers with empty text decode to "no value" rather than an error
fn numeric<T: FromStr>(node: &MarkupNode, wrap: fn(T) -> PropertyValue) -> Result<PropertyValue> {
    if node.text().trim().is_empty() {
        return Ok(PropertyValue::None);
    }
    node.text_as().map(wrap)
}

fn decode_value(
    node: &MarkupNode,
    version: Version,
) -> Result<(PropertyType, StringFormat, PropertyValue)> {
    let kind = PropertyType::from_markup_name(node.name())
        .ok_or_else(|| PluginError::Parse(format!("unknown property type <{}>", node.name())))?;
    let mut format = StringFormat::Plain;

    let value = match kind {
        PropertyType::Unknown => PropertyValue::None,
        PropertyType::String => {
            if version.supports_string_format() {
                if let Some(name) = node.attr("format") {
                    format = StringFormat::from_name(name);
                }
            }
            PropertyValue::Text(node.text().to_string())
        }
        PropertyType::Color
        | PropertyType::Date
        | PropertyType::DateTime
        | PropertyType::GeoCoordinate => PropertyValue::Text(node.text().to_string()),
        PropertyType::Integer => numeric(node, PropertyValue::Integer)?,
        PropertyType::UnsignedInteger => numeric(node, PropertyValue::UnsignedInteger)?,
        PropertyType::Integer64 => numeric(node, PropertyValue::Integer64)?,
        PropertyType::UnsignedInteger64 => numeric(node, PropertyValue::UnsignedInteger64)?,
        PropertyType::FloatingPointNumber => numeric(node, PropertyValue::Double)?,
        PropertyType::Boolean => match parse_bool(node.text()) {
            Some(flag) => PropertyValue::Boolean(flag),
            None => {
                return Err(PluginError::Parse(format!(
                    "'{}' is not a boolean",
                    node.text()
                )))
            }
        },
        PropertyType::Scalar => PropertyValue::Scalar(Scalar {
            value: node.text_as()?,
            unit: node.attr("unit").unwrap_or_default().to_string(),
        }),
        PropertyType::Range => PropertyValue::Range(read_range(node)?),
        PropertyType::DecoratedNumber => PropertyValue::DecoratedNumber(DecoratedNumber {
            value: node.text_as()?,
            prefix: node.attr("prefix").unwrap_or_default().to_string(),
            suffix: node.attr("suffix").unwrap_or_default().to_string(),
        }),
        PropertyType::Rational => PropertyValue::Rational(Rational {
            numerator: node.child_text_as("Numerator")?.unwrap_or(0),
            denominator: node.child_text_as("Denominator")?.unwrap_or(1),
            unit: node.attr("unit").unwrap_or_default().to_string(),
        }),
        PropertyType::Point => PropertyValue::Point(read_point(node)?),
        PropertyType::PointList => PropertyValue::PointList(
            node.children_named("Point")
                .map(read_point)
                .collect::<Result<_>>()?,
        ),
        PropertyType::FloatingPointNumberList => PropertyValue::DoubleList(
            node.children_named("Double")
                .map(|child| child.text_as())
                .collect::<Result<_>>()?,
        ),
        PropertyType::StringList => PropertyValue::StringList(
            node.children_named("String")
                .map(|child| child.text().to_string())
                .collect(),
        ),
        PropertyType::ChannelId => PropertyValue::ChannelId(ChannelId(node.text_as()?)),
        PropertyType::ChannelIdList => PropertyValue::ChannelIdList(
            node.children_named("ChannelID")
                .map(|child| child.text_as().map(ChannelId))
                .collect::<Result<_>>()?,
        ),
        PropertyType::PropertyList => {
            PropertyValue::PropertyList(PropertyList::from_markup(node, version)?)
        }
        PropertyType::Enum => PropertyValue::Enum {
            value: node.text().to_string(),
            enum_type: node.attr("type").unwrap_or_default().to_string(),
        },
    };
    Ok((kind, format, value))
}
