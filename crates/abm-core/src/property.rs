//! Immutable property definitions.

use crate::{CoreError, CoreResult, PropertyValue, ValueType};

/// Describes one per-agent property: its value type, optional default,
/// whether assignment times are tracked, and whether values may change after
/// their initial assignment.
///
/// Definitions are created once (normally while building plugin data) and
/// never mutated.  Construct with [`PropertyDefinition::builder`].
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDefinition {
    value_type: ValueType,
    default:    Option<PropertyValue>,
    track_time: bool,
    mutable:    bool,
}

impl PropertyDefinition {
    pub fn builder(value_type: ValueType) -> PropertyDefinitionBuilder {
        PropertyDefinitionBuilder {
            value_type,
            default:    None,
            track_time: false,
            mutable:    true,
        }
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Value every agent has until one is assigned.  `None` means a value
    /// must be supplied explicitly for every agent.
    #[inline]
    pub fn default_value(&self) -> Option<&PropertyValue> {
        self.default.as_ref()
    }

    #[inline]
    pub fn tracks_time(&self) -> bool {
        self.track_time
    }

    #[inline]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Check `value` against this definition's type.
    #[inline]
    pub fn check(&self, value: &PropertyValue) -> CoreResult<()> {
        self.value_type.check(value)
    }
}

/// Fluent builder for [`PropertyDefinition`].
pub struct PropertyDefinitionBuilder {
    value_type: ValueType,
    default:    Option<PropertyValue>,
    track_time: bool,
    mutable:    bool,
}

impl PropertyDefinitionBuilder {
    pub fn default_value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Record the simulation time of every assignment.
    pub fn track_time(mut self, track: bool) -> Self {
        self.track_time = track;
        self
    }

    /// Forbid changes after an agent's initial value is assigned.
    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// `IncompatibleValue` if the default does not match the value type, and
    /// `Definition` for an enum type with zero variants.
    pub fn build(self) -> CoreResult<PropertyDefinition> {
        if let ValueType::Enum { variants: 0 } = self.value_type {
            return Err(CoreError::Definition("enum type needs at least one variant".into()));
        }
        if let Some(default) = &self.default {
            self.value_type.check(default)?;
        }
        Ok(PropertyDefinition {
            value_type: self.value_type,
            default:    self.default,
            track_time: self.track_time,
            mutable:    self.mutable,
        })
    }
}
