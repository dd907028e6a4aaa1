//! Filters — which agents a partition admits.

use std::fmt;
use std::rc::Rc;

use abm_core::{AgentIndex, CoreError, Equality, PropertyId, PropertyValue};

use crate::error::PartitionResult;
use crate::sensitivity::Sensitivity;
use crate::view::PopulationView;

type Predicate<C> = Rc<dyn Fn(&C, AgentIndex) -> bool>;

pub enum Filter<C> {
    True,
    False,
    Not(Box<Filter<C>>),
    And(Vec<Filter<C>>),
    Or(Vec<Filter<C>>),
    /// `value_of(property) <op> value`.
    Property {
        property: PropertyId,
        op:       Equality,
        value:    PropertyValue,
    },
    Custom {
        predicate:     Predicate<C>,
        sensitivities: Vec<Sensitivity>,
    },
}

impl<C> Default for Filter<C> {
    fn default() -> Self {
        Filter::True
    }
}

impl<C> Clone for Filter<C> {
    fn clone(&self) -> Self {
        match self {
            Filter::True => Filter::True,
            Filter::False => Filter::False,
            Filter::Not(f) => Filter::Not(f.clone()),
            Filter::And(fs) => Filter::And(fs.clone()),
            Filter::Or(fs) => Filter::Or(fs.clone()),
            Filter::Property { property, op, value } => Filter::Property {
                property: *property,
                op:       *op,
                value:    value.clone(),
            },
            Filter::Custom { predicate, sensitivities } => Filter::Custom {
                predicate:     Rc::clone(predicate),
                sensitivities: sensitivities.clone(),
            },
        }
    }
}

impl<C> fmt::Debug for Filter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::True => f.write_str("True"),
            Filter::False => f.write_str("False"),
            Filter::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Filter::And(fs) => f.debug_tuple("And").field(fs).finish(),
            Filter::Or(fs) => f.debug_tuple("Or").field(fs).finish(),
            Filter::Property { property, op, value } => {
                write!(f, "Property({property} {op} {value:?})")
            }
            Filter::Custom { sensitivities, .. } => {
                f.debug_struct("Custom").field("sensitivities", sensitivities).finish()
            }
        }
    }
}

impl<C: PopulationView + 'static> Filter<C> {
    pub fn property(property: PropertyId, op: Equality, value: impl Into<PropertyValue>) -> Self {
        Filter::Property { property, op, value: value.into() }
    }

    pub fn custom(
        predicate: impl Fn(&C, AgentIndex) -> bool + 'static,
        sensitivities: Vec<Sensitivity>,
    ) -> Self {
        Filter::Custom { predicate: Rc::new(predicate), sensitivities }
    }

    pub fn and(self, other: Filter<C>) -> Self {
        match self {
            Filter::And(mut fs) => {
                fs.push(other);
                Filter::And(fs)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter<C>) -> Self {
        match self {
            Filter::Or(mut fs) => {
                fs.push(other);
                Filter::Or(fs)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Reject unknown properties, values of the wrong type, and relational
    /// operators on non-comparable types.
    pub fn validate(&self, view: &C) -> PartitionResult<()> {
        match self {
            Filter::True | Filter::False | Filter::Custom { .. } => Ok(()),
            Filter::Not(inner) => inner.validate(view),
            Filter::And(fs) | Filter::Or(fs) => fs.iter().try_for_each(|f| f.validate(view)),
            Filter::Property { property, op, value } => {
                let definition = view
                    .property_definition(*property)
                    .ok_or(CoreError::UnknownProperty(*property))?;
                definition.check(value)?;
                op.validate(definition.value_type())?;
                Ok(())
            }
        }
    }

    pub fn evaluate(&self, view: &C, agent: AgentIndex) -> bool {
        match self {
            Filter::True => true,
            Filter::False => false,
            Filter::Not(inner) => !inner.evaluate(view, agent),
            Filter::And(fs) => fs.iter().all(|f| f.evaluate(view, agent)),
            Filter::Or(fs) => fs.iter().any(|f| f.evaluate(view, agent)),
            Filter::Property { property, op, value } => view
                .property_value(agent, *property)
                .is_some_and(|current| current.compare(*op, value)),
            Filter::Custom { predicate, .. } => predicate(view, agent),
        }
    }

    /// Every event that can change this filter's outcome for one agent.
    pub fn sensitivities(&self) -> Vec<Sensitivity> {
        let mut out = Vec::new();
        self.collect_sensitivities(&mut out);
        out
    }

    fn collect_sensitivities(&self, out: &mut Vec<Sensitivity>) {
        match self {
            Filter::True | Filter::False => {}
            Filter::Not(inner) => inner.collect_sensitivities(out),
            Filter::And(fs) | Filter::Or(fs) => {
                for f in fs {
                    f.collect_sensitivities(out);
                }
            }
            Filter::Property { property, .. } => out.push(Sensitivity::property_update(*property)),
            Filter::Custom { sensitivities, .. } => out.extend(sensitivities.iter().cloned()),
        }
    }
}
