//! Event sensitivities.
//!
//! A sensitivity says "events of type `E` may change the outcome for the
//! agent this extractor returns".  An extractor returning `None` means the
//! event is irrelevant to the labeler or filter that declared it.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use abm_core::{AgentIndex, Event, PropertyId, PropertyUpdate};

type Extractor = Rc<dyn Fn(&dyn Any) -> Option<AgentIndex>>;

#[derive(Clone)]
pub struct Sensitivity {
    event_type: TypeId,
    event_name: &'static str,
    extractor:  Extractor,
}

impl Sensitivity {
    pub fn new<E: Event>(extract: impl Fn(&E) -> Option<AgentIndex> + 'static) -> Self {
        Self {
            event_type: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            extractor:  Rc::new(move |event: &dyn Any| event.downcast_ref::<E>().and_then(&extract)),
        }
    }

    /// Updates of one property.
    pub fn property_update(property: PropertyId) -> Self {
        Self::new(move |e: &PropertyUpdate| (e.property == property).then_some(e.agent))
    }

    #[inline]
    pub fn event_type(&self) -> TypeId {
        self.event_type
    }

    /// The agent `event` concerns, if it concerns this sensitivity at all.
    pub fn extract(&self, event: &dyn Any) -> Option<AgentIndex> {
        (self.extractor)(event)
    }
}

impl fmt::Debug for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sensitivity({})", self.event_name)
    }
}
