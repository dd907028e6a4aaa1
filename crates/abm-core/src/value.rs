//! Property values, value types, labels and comparison operators.
//!
//! # Design
//!
//! Property values are a closed tagged variant.  Compatibility between a value
//! and a property definition is checked by exactly one function,
//! [`ValueType::check`], which containers, filters, property definitions and
//! plugin-data builders all call.
//!
//! [`Label`] is the hashable, ordered counterpart used as a partition bucket
//! key and as an event-label key.  Floating-point and object values have no
//! label form; labelers that need them map the value to a `Label` explicitly
//! (e.g. binning a double into an age group).

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::{AgentIndex, CoreError, CoreResult, PropertyId};

// ── ObjectHandle ──────────────────────────────────────────────────────────────

/// Opaque, reference-counted payload for object-typed properties.
///
/// Two handles are equal only when they point at the same allocation, so
/// cloning a handle preserves equality while two separately created handles
/// with equal content are distinct values.
#[derive(Clone)]
pub struct ObjectHandle(Arc<dyn Any + Send + Sync>);

impl ObjectHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`, or `None` if it holds another type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({:p})", Arc::as_ptr(&self.0))
    }
}

// ── ValueType ─────────────────────────────────────────────────────────────────

/// The representation a property's values take.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    /// Enumerated value; valid ordinals are `0..variants`.
    Enum { variants: u32 },
    Object,
}

impl ValueType {
    /// The single runtime type check used throughout the kernel.
    ///
    /// Returns `IncompatibleValue` if `value` is not a `self` value, or if
    /// an enum ordinal is out of range.
    pub fn check(self, value: &PropertyValue) -> CoreResult<()> {
        let ok = match (self, value) {
            (ValueType::Bool, PropertyValue::Bool(_))
            | (ValueType::Int, PropertyValue::Int(_))
            | (ValueType::Long, PropertyValue::Long(_))
            | (ValueType::Float, PropertyValue::Float(_))
            | (ValueType::Double, PropertyValue::Double(_))
            | (ValueType::Object, PropertyValue::Object(_)) => true,
            (ValueType::Enum { variants }, PropertyValue::Enum(ordinal)) => *ordinal < variants,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(CoreError::IncompatibleValue { expected: self, got: value.clone() })
        }
    }

    /// `true` if values of this type support relational operators.
    pub fn is_comparable(self) -> bool {
        !matches!(self, ValueType::Bool | ValueType::Object)
    }

    /// The value a container falls back to when a definition has no default.
    pub fn zero(self) -> Option<PropertyValue> {
        match self {
            ValueType::Bool => Some(PropertyValue::Bool(false)),
            ValueType::Int => Some(PropertyValue::Int(0)),
            ValueType::Long => Some(PropertyValue::Long(0)),
            ValueType::Float => Some(PropertyValue::Float(0.0)),
            ValueType::Double => Some(PropertyValue::Double(0.0)),
            ValueType::Enum { .. } => Some(PropertyValue::Enum(0)),
            ValueType::Object => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("bool"),
            ValueType::Int => f.write_str("int"),
            ValueType::Long => f.write_str("long"),
            ValueType::Float => f.write_str("float"),
            ValueType::Double => f.write_str("double"),
            ValueType::Enum { variants } => write!(f, "enum[{variants}]"),
            ValueType::Object => f.write_str("object"),
        }
    }
}

// ── PropertyValue ─────────────────────────────────────────────────────────────

/// A single property value.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Enum(u32),
    Object(ObjectHandle),
}

impl PropertyValue {
    /// The label form of this value, or `None` for float, double and object
    /// values.
    pub fn to_label(&self) -> Option<Label> {
        match self {
            PropertyValue::Bool(b) => Some(Label::Bool(*b)),
            PropertyValue::Int(v) => Some(Label::Int(i64::from(*v))),
            PropertyValue::Long(v) => Some(Label::Int(*v)),
            PropertyValue::Enum(v) => Some(Label::Enum(*v)),
            PropertyValue::Float(_) | PropertyValue::Double(_) | PropertyValue::Object(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(i64::from(*v)),
            PropertyValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(f64::from(*v)),
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<u32> {
        match self {
            PropertyValue::Enum(v) => Some(*v),
            _ => None,
        }
    }

    /// Evaluate `self <op> other`.
    ///
    /// Both values must already have passed the same [`ValueType::check`];
    /// mismatched variants compare unequal and never satisfy a relational
    /// operator.  Relational operators on non-comparable values are rejected
    /// at validation time by [`Equality::validate`], so here they evaluate to
    /// `false`.
    pub fn compare(&self, op: Equality, other: &PropertyValue) -> bool {
        match op {
            Equality::Equal => self == other,
            Equality::NotEqual => self != other,
            _ => match self.partial_order(other) {
                None => false,
                Some(ord) => op.accepts(ord),
            },
        }
    }

    fn partial_order(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Int(a), PropertyValue::Int(b)) => Some(a.cmp(b)),
            (PropertyValue::Long(a), PropertyValue::Long(b)) => Some(a.cmp(b)),
            (PropertyValue::Enum(a), PropertyValue::Enum(b)) => Some(a.cmp(b)),
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.partial_cmp(b),
            (PropertyValue::Double(a), PropertyValue::Double(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Int(a), PropertyValue::Int(b)) => a == b,
            (PropertyValue::Long(a), PropertyValue::Long(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a == b,
            (PropertyValue::Double(a), PropertyValue::Double(b)) => a == b,
            (PropertyValue::Enum(a), PropertyValue::Enum(b)) => a == b,
            (PropertyValue::Object(a), PropertyValue::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Long(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

// ── Equality ──────────────────────────────────────────────────────────────────

/// Comparison operator used by property filters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Equality {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl Equality {
    /// `true` for operators that need an ordering.
    pub fn is_relational(self) -> bool {
        !matches!(self, Equality::Equal | Equality::NotEqual)
    }

    /// Reject relational operators on types without an ordering.
    pub fn validate(self, value_type: ValueType) -> CoreResult<()> {
        if self.is_relational() && !value_type.is_comparable() {
            return Err(CoreError::NonComparable { op: self, value_type });
        }
        Ok(())
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Equality::Equal => ord == Ordering::Equal,
            Equality::NotEqual => ord != Ordering::Equal,
            Equality::LessThan => ord == Ordering::Less,
            Equality::LessThanEqual => ord != Ordering::Greater,
            Equality::GreaterThan => ord == Ordering::Greater,
            Equality::GreaterThanEqual => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for Equality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Equality::Equal => "==",
            Equality::NotEqual => "!=",
            Equality::LessThan => "<",
            Equality::LessThanEqual => "<=",
            Equality::GreaterThan => ">",
            Equality::GreaterThanEqual => ">=",
        })
    }
}

// ── Label ─────────────────────────────────────────────────────────────────────

/// A hashable, ordered label value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Bool(bool),
    Int(i64),
    Enum(u32),
    Text(Arc<str>),
    Agent(AgentIndex),
    Property(PropertyId),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Bool(v) => write!(f, "{v}"),
            Label::Int(v) => write!(f, "{v}"),
            Label::Enum(v) => write!(f, "#{v}"),
            Label::Text(v) => f.write_str(v),
            Label::Agent(v) => write!(f, "{v}"),
            Label::Property(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Label {
    fn from(v: bool) -> Self {
        Label::Bool(v)
    }
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Label::Int(v)
    }
}
