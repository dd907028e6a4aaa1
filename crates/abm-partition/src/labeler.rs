//! Labelers — one partition dimension each.

use std::fmt;
use std::rc::Rc;

use abm_core::{AgentIndex, CoreError, Label, PropertyId, PropertyValue, ValueType};

use crate::error::{PartitionError, PartitionResult};
use crate::sensitivity::Sensitivity;
use crate::view::PopulationView;

type LabelFn<C> = Rc<dyn Fn(&C, AgentIndex) -> PartitionResult<Label>>;

enum Source {
    /// The property's own value.
    Property(PropertyId),
    /// The property's value mapped through a function.
    Mapped(PropertyId),
    Custom,
}

pub struct Labeler<C> {
    name:          Rc<str>,
    source:        Rc<Source>,
    label:         LabelFn<C>,
    sensitivities: Vec<Sensitivity>,
}

impl<C> Clone for Labeler<C> {
    fn clone(&self) -> Self {
        Self {
            name:          Rc::clone(&self.name),
            source:        Rc::clone(&self.source),
            label:         Rc::clone(&self.label),
            sensitivities: self.sensitivities.clone(),
        }
    }
}

impl<C> fmt::Debug for Labeler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Labeler")
            .field("name", &self.name)
            .field("sensitivities", &self.sensitivities)
            .finish()
    }
}

impl<C: PopulationView + 'static> Labeler<C> {
    /// Label by a property's value.  The property must be `Bool`, `Int`,
    /// `Long` or `Enum`.
    pub fn property(property: PropertyId) -> Self {
        Self {
            name:          format!("property {}", property.0).into(),
            source:        Rc::new(Source::Property(property)),
            label:         Rc::new(move |view: &C, agent| {
                view.property_value(agent, property)
                    .and_then(|v| v.to_label())
                    .ok_or(PartitionError::UnlabelableValue { agent, property })
            }),
            sensitivities: vec![Sensitivity::property_update(property)],
        }
    }

    /// Label by a property's value mapped through `map`, e.g. binning a
    /// double into age groups.
    pub fn property_with(
        property: PropertyId,
        map: impl Fn(&PropertyValue) -> Label + 'static,
    ) -> Self {
        Self {
            name:          format!("mapped property {}", property.0).into(),
            source:        Rc::new(Source::Mapped(property)),
            label:         Rc::new(move |view: &C, agent| {
                view.property_value(agent, property)
                    .map(|v| map(&v))
                    .ok_or(PartitionError::UnlabelableValue { agent, property })
            }),
            sensitivities: vec![Sensitivity::property_update(property)],
        }
    }

    /// Label by arbitrary state.  `sensitivities` must name every event
    /// that can change the label of an agent.
    pub fn custom(
        name: &str,
        label: impl Fn(&C, AgentIndex) -> Label + 'static,
        sensitivities: Vec<Sensitivity>,
    ) -> Self {
        Self {
            name: name.into(),
            source: Rc::new(Source::Custom),
            label: Rc::new(move |view: &C, agent| Ok(label(view, agent))),
            sensitivities,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sensitivities(&self) -> &[Sensitivity] {
        &self.sensitivities
    }

    pub fn label(&self, view: &C, agent: AgentIndex) -> PartitionResult<Label> {
        (self.label)(view, agent)
    }

    /// Check the labeler against the population's property definitions.
    pub fn validate(&self, view: &C) -> PartitionResult<()> {
        match *self.source {
            Source::Property(property) => {
                let definition = view
                    .property_definition(property)
                    .ok_or(CoreError::UnknownProperty(property))?;
                match definition.value_type() {
                    ValueType::Bool | ValueType::Int | ValueType::Long | ValueType::Enum { .. } => {
                        Ok(())
                    }
                    value_type => Err(PartitionError::Unlabelable { property, value_type }),
                }
            }
            Source::Mapped(property) => {
                view.property_definition(property)
                    .ok_or(CoreError::UnknownProperty(property))?;
                Ok(())
            }
            Source::Custom => Ok(()),
        }
    }
}
