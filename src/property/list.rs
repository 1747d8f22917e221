//! Ordered property collections.

use super::{Property, PropertyKind};
use crate::error::{PluginError, Result};
use crate::types::{Range, Scalar};

/// Properties in insertion order.
///
/// Names are not forced to be unique in storage; lookups return the first
/// match and setters replace the first match in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyList {
    properties: Vec<Property>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append without checking for an existing entry
    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Replace the first entry with the same name, or append
    pub fn set(&mut self, property: Property) {
        match self.get_mut(property.name()) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let index = self.properties.iter().position(|p| p.name() == name)?;
        Some(self.properties.remove(index))
    }

    fn require(&self, name: &str) -> Result<&Property> {
        self.get(name)
            .ok_or_else(|| PluginError::AbsentValue(name.to_string()))
    }

    /// Typed lookup; absent entries and type mismatches are errors
    pub fn get_value<T: PropertyKind>(&self, name: &str) -> Result<T> {
        self.require(name)?.value_strict()
    }

    pub fn set_value<T: PropertyKind>(&mut self, name: &str, value: T) {
        self.set(Property::new(name, value));
    }

    /// String value of an entry, empty when absent
    pub fn get_string(&self, name: &str) -> String {
        self.get(name)
            .map(|p| p.get_string_value())
            .unwrap_or_default()
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        self.require(name)?.get_bool_value()
    }

    pub fn get_int(&self, name: &str) -> Result<i32> {
        self.require(name)?.get_int_value()
    }

    pub fn get_unsigned_int(&self, name: &str) -> Result<u32> {
        self.require(name)?.get_unsigned_int_value()
    }

    pub fn get_int64(&self, name: &str) -> Result<i64> {
        self.require(name)?.get_int64_value()
    }

    pub fn get_unsigned_int64(&self, name: &str) -> Result<u64> {
        self.require(name)?.get_unsigned_int64_value()
    }

    pub fn get_double(&self, name: &str) -> Result<f64> {
        self.require(name)?.get_double_value()
    }

    pub fn get_scalar(&self, name: &str) -> Result<Scalar> {
        self.require(name)?.get_scalar_value()
    }

    pub fn get_range(&self, name: &str) -> Result<Range> {
        self.require(name)?.get_range_value()
    }

    pub fn get_enum(&self, name: &str) -> Result<String> {
        self.require(name)?.get_enum_value().map(str::to_string)
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) {
        self.set_value(name, value.into());
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set_value(name, value);
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set_value(name, value);
    }

    pub fn set_double(&mut self, name: &str, value: f64) {
        self.set_value(name, value);
    }

    pub fn set_enum(&mut self, name: &str, value: impl Into<String>, enum_type: impl Into<String>) {
        self.set(Property::new_enum(name, value, enum_type));
    }
}

impl From<Vec<Property>> for PropertyList {
    fn from(properties: Vec<Property>) -> Self {
        Self { properties }
    }
}

impl FromIterator<Property> for PropertyList {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}
