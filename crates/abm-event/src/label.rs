//! Event labels — composite routing keys for label-qualified subscriptions.
//!
//! A subscriber interested in "property 3 changed" registers for the label
//! `(PropertyUpdate, BY_PROPERTY, [Property(3)])` instead of receiving every
//! `PropertyUpdate` and discarding most of them.  At publish time the bus
//! asks each labeler registered for the event's type to derive the event's
//! label and hands the event to the subscriptions stored under that key.

use std::any::{Any, TypeId};

use abm_core::{Event, EventLabelerId, Label};

/// Hashable routing key: event type + labeler + correlating sub-keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventLabel {
    event_type: TypeId,
    labeler:    EventLabelerId,
    keys:       Vec<Label>,
}

impl EventLabel {
    /// The label `labeler` derives for events of type `E` carrying `keys`.
    pub fn new<E: Event>(labeler: EventLabelerId, keys: Vec<Label>) -> Self {
        Self { event_type: TypeId::of::<E>(), labeler, keys }
    }

    #[inline]
    pub fn event_type(&self) -> TypeId {
        self.event_type
    }

    #[inline]
    pub fn labeler(&self) -> EventLabelerId {
        self.labeler
    }

    #[inline]
    pub fn keys(&self) -> &[Label] {
        &self.keys
    }
}

/// Derives the label of an event of type `E`.
pub struct EventLabeler<E: Event> {
    id:     EventLabelerId,
    derive: Box<dyn Fn(&E) -> Vec<Label>>,
}

impl<E: Event> EventLabeler<E> {
    pub fn new(id: EventLabelerId, derive: impl Fn(&E) -> Vec<Label> + 'static) -> Self {
        Self { id, derive: Box::new(derive) }
    }

    #[inline]
    pub fn id(&self) -> EventLabelerId {
        self.id
    }

    pub(crate) fn erase(self) -> ErasedLabeler {
        let EventLabeler { id, derive } = self;
        ErasedLabeler {
            id,
            derive: Box::new(move |event: &dyn Any| {
                event
                    .downcast_ref::<E>()
                    .map(|e| EventLabel::new::<E>(id, derive(e)))
            }),
        }
    }
}

/// Type-erased labeler stored by the bus.
pub(crate) struct ErasedLabeler {
    pub(crate) id:     EventLabelerId,
    pub(crate) derive: Box<dyn Fn(&dyn Any) -> Option<EventLabel>>,
}
