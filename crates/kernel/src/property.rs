//! Dynamically typed property bag attached to every instance.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A property value. Plain data only; copying a value never aliases state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    String(String),
    Vector(Vec3),
}

/// Typed view over a [`PropertyValue`].
///
/// `zero()` is what a read returns when the key is absent or holds another
/// type, so property access from scripts and config never fails.
pub trait PropertyType: Sized {
    fn zero() -> Self;
    fn from_value(value: &PropertyValue) -> Option<Self>;
    fn into_value(self) -> PropertyValue;
}

impl PropertyType for f64 {
    fn zero() -> Self {
        0.0
    }
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
    fn into_value(self) -> PropertyValue {
        PropertyValue::Number(self)
    }
}

impl PropertyType for f32 {
    fn zero() -> Self {
        0.0
    }
    fn from_value(value: &PropertyValue) -> Option<Self> {
        f64::from_value(value).map(|n| n as f32)
    }
    fn into_value(self) -> PropertyValue {
        PropertyValue::Number(self as f64)
    }
}

impl PropertyType for bool {
    fn zero() -> Self {
        false
    }
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
    fn into_value(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }
}

impl PropertyType for String {
    fn zero() -> Self {
        String::new()
    }
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
    fn into_value(self) -> PropertyValue {
        PropertyValue::String(self)
    }
}

impl PropertyType for Vec3 {
    fn zero() -> Self {
        Vec3::ZERO
    }
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Vector(v) => Some(*v),
            _ => None,
        }
    }
    fn into_value(self) -> PropertyValue {
        PropertyValue::Vector(self)
    }
}

/// Name-keyed property storage. BTreeMap keeps iteration (and dumps) stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag {
    values: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: PropertyType>(&self, name: &str) -> T {
        self.values
            .get(name)
            .and_then(T::from_value)
            .unwrap_or_else(T::zero)
    }

    pub fn set<T: PropertyType>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), value.into_value());
    }

    pub fn get_raw(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
