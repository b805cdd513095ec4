// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host-side values wrapped by glue nodes.
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque identity of a host object, collection, or command owner.
///
/// The core never dereferences a `HostRef`; it only carries it so adapters
/// and diagnostics can correlate a glue node with the host value it mirrors.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct HostRef(pub u64);

/// An enumeration value coming from the host.
///
/// Two enum values are equal when type, variant name, and ordinal all match;
/// that equality is what the session cache interns on.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct EnumValue {
    /// Fully qualified enum type name.
    pub type_name: String,
    /// Variant name.
    pub name: String,
    /// Numeric discriminant.
    pub ordinal: i64,
}

impl EnumValue {
    /// Builds an enum value from its parts.
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, ordinal: i64) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            ordinal,
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

/// A host value as seen by the glue layer.
///
/// Equality and hashing are total: numbers compare by bit pattern, so any
/// `HostValue` (including `NaN`) can key a hash map.
#[derive(Clone, Debug)]
pub enum HostValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Number(f64),
    /// UTF-8 string.
    Str(String),
    /// Point in time, milliseconds since the Unix epoch.
    Date(i64),
    /// Enumeration value.
    Enum(EnumValue),
    /// Reference to a host object with no primitive representation.
    Ref(HostRef),
}

impl HostValue {
    /// Returns `true` for [`HostValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the enum payload when this value is enum-typed.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Date(_) => "date",
            Self::Enum(e) => &e.type_name,
            Self::Ref(_) => "ref",
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) | (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for HostValue {}

impl Hash for HostValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) | Self::Date(i) => i.hash(state),
            Self::Number(n) => n.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::Enum(e) => e.hash(state),
            Self::Ref(r) => r.hash(state),
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<EnumValue> for HostValue {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn nan_keys_are_stable() {
        let mut set = FxHashSet::default();
        set.insert(HostValue::Number(f64::NAN));
        assert!(set.contains(&HostValue::Number(f64::NAN)));
        assert_ne!(HostValue::Number(0.0), HostValue::Number(-0.0));
    }

    #[test]
    fn int_and_date_do_not_collide() {
        assert_ne!(HostValue::Int(5), HostValue::Date(5));
    }

    #[test]
    fn enum_equality_covers_all_parts() {
        let red = EnumValue::new("Color", "Red", 0);
        assert_eq!(HostValue::from(red.clone()), HostValue::Enum(red.clone()));
        assert_ne!(red, EnumValue::new("Color", "Red", 1));
        assert_eq!(red.to_string(), "Color.Red");
        assert_eq!(HostValue::Enum(red).type_name(), "Color");
    }
}
