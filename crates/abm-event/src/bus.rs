//! `EventBus<C>` — subscription storage and depth-first dispatch.
//!
//! Handlers are stored as `Rc<dyn Fn(&mut C, &dyn Any)>`.  [`publish`]
//! clones the matching handlers out of the bus before calling any of them,
//! so a handler may freely subscribe, unsubscribe, or publish again through
//! the `&mut C` it receives.  The set of handlers an event reaches is fixed
//! when it is published.

use std::any::{Any, TypeId};
use std::rc::Rc;

use abm_core::{Event, EventLabelerId, SubscriptionId};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{EventError, EventResult};
use crate::label::{ErasedLabeler, EventLabel, EventLabeler};

// ── EventContext ──────────────────────────────────────────────────────────────

/// Implemented by whatever owns the bus and is handed to handlers.
pub trait EventContext: Sized + 'static {
    /// Error a handler may return; aborts the publish it occurs in.
    type Error: From<EventError>;

    fn event_bus(&self) -> &EventBus<Self>;
    fn event_bus_mut(&mut self) -> &mut EventBus<Self>;
}

/// Type-erased event handler.
pub type Handler<C> = Rc<dyn Fn(&mut C, &dyn Any) -> Result<(), <C as EventContext>::Error>>;

struct Subscription<C: EventContext> {
    id:      SubscriptionId,
    handler: Handler<C>,
}

/// Where a subscription lives, for `unsubscribe`.
enum Route {
    Typed(TypeId),
    Labeled(EventLabel),
}

// ── EventBus ──────────────────────────────────────────────────────────────────

pub struct EventBus<C: EventContext> {
    next_id:   u64,
    typed:     FxHashMap<TypeId, Vec<Subscription<C>>>,
    labeled:   FxHashMap<EventLabel, Vec<Subscription<C>>>,
    labelers:  FxHashMap<TypeId, Vec<ErasedLabeler>>,
    /// Live labeled subscriptions per labeler; labels are only derived
    /// for labelers someone is listening through.
    listening: FxHashMap<EventLabelerId, usize>,
    routes:    FxHashMap<SubscriptionId, Route>,
    published: u64,
}

impl<C: EventContext> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: EventContext> EventBus<C> {
    pub fn new() -> Self {
        Self {
            next_id:   0,
            typed:     FxHashMap::default(),
            labeled:   FxHashMap::default(),
            labelers:  FxHashMap::default(),
            listening: FxHashMap::default(),
            routes:    FxHashMap::default(),
            published: 0,
        }
    }

    fn next_subscription(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    // ── Subscribing ───────────────────────────────────────────────────────

    /// Receive every event of type `E`.
    pub fn subscribe<E: Event>(
        &mut self,
        handler: impl Fn(&mut C, &E) -> Result<(), C::Error> + 'static,
    ) -> SubscriptionId {
        self.subscribe_erased(TypeId::of::<E>(), wrap(handler))
    }

    /// Receive every event whose `TypeId` is `event_type`, type-erased.
    ///
    /// Used by components that route many event types through one
    /// handler and downcast themselves.
    pub fn subscribe_erased(&mut self, event_type: TypeId, handler: Handler<C>) -> SubscriptionId {
        let id = self.next_subscription();
        self.typed
            .entry(event_type)
            .or_default()
            .push(Subscription { id, handler });
        self.routes.insert(id, Route::Typed(event_type));
        id
    }

    /// Register a labeler.  Labeler ids are unique across event types.
    pub fn add_labeler<E: Event>(&mut self, labeler: EventLabeler<E>) -> EventResult<()> {
        if self.has_labeler(labeler.id()) {
            return Err(EventError::DuplicateLabeler(labeler.id()));
        }
        self.labelers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(labeler.erase());
        Ok(())
    }

    pub fn has_labeler(&self, id: EventLabelerId) -> bool {
        self.labelers.values().flatten().any(|l| l.id == id)
    }

    /// Receive only events of type `E` whose derived label equals `label`.
    ///
    /// Fails with [`EventError::UnknownLabeler`] if the label's labeler was
    /// never registered for `E`.
    pub fn subscribe_labeled<E: Event>(
        &mut self,
        label: EventLabel,
        handler: impl Fn(&mut C, &E) -> Result<(), C::Error> + 'static,
    ) -> EventResult<SubscriptionId> {
        if label.event_type() != TypeId::of::<E>() {
            return Err(EventError::LabelTypeMismatch(label.labeler()));
        }
        let known = self
            .labelers
            .get(&label.event_type())
            .is_some_and(|ls| ls.iter().any(|l| l.id == label.labeler()));
        if !known {
            return Err(EventError::UnknownLabeler(label.labeler()));
        }

        let id = self.next_subscription();
        *self.listening.entry(label.labeler()).or_default() += 1;
        self.labeled
            .entry(label.clone())
            .or_default()
            .push(Subscription { id, handler: wrap(handler) });
        self.routes.insert(id, Route::Labeled(label));
        Ok(id)
    }

    /// Remove a subscription.  Returns `false` if it was already gone.
    ///
    /// A publish already in progress still reaches the removed handler.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(route) = self.routes.remove(&id) else {
            return false;
        };
        match route {
            Route::Typed(t) => {
                if let Some(subs) = self.typed.get_mut(&t) {
                    subs.retain(|s| s.id != id);
                    if subs.is_empty() {
                        self.typed.remove(&t);
                    }
                }
            }
            Route::Labeled(label) => {
                if let Some(n) = self.listening.get_mut(&label.labeler()) {
                    *n -= 1;
                    if *n == 0 {
                        self.listening.remove(&label.labeler());
                    }
                }
                if let Some(subs) = self.labeled.get_mut(&label) {
                    subs.retain(|s| s.id != id);
                    if subs.is_empty() {
                        self.labeled.remove(&label);
                    }
                }
            }
        }
        true
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Whether publishing an `E` right now would reach any handler.
    ///
    /// Lets publishers skip building events nobody listens to.
    pub fn has_subscribers<E: Event>(&self) -> bool {
        let t = TypeId::of::<E>();
        self.typed.contains_key(&t)
            || self
                .labelers
                .get(&t)
                .is_some_and(|ls| ls.iter().any(|l| self.listening.contains_key(&l.id)))
    }

    pub fn subscription_count(&self) -> usize {
        self.routes.len()
    }

    /// Events published through this bus so far, nested ones included.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Handlers `event` reaches, in subscription order.
    fn matching(&self, event_type: TypeId, event: &dyn Any) -> Vec<Handler<C>> {
        let mut hits: Vec<(SubscriptionId, Handler<C>)> = Vec::new();

        if let Some(subs) = self.typed.get(&event_type) {
            hits.extend(subs.iter().map(|s| (s.id, Rc::clone(&s.handler))));
        }

        if let Some(labelers) = self.labelers.get(&event_type) {
            for labeler in labelers {
                if !self.listening.contains_key(&labeler.id) {
                    continue;
                }
                let Some(label) = (labeler.derive)(event) else { continue };
                if let Some(subs) = self.labeled.get(&label) {
                    hits.extend(subs.iter().map(|s| (s.id, Rc::clone(&s.handler))));
                }
            }
        }

        hits.sort_unstable_by_key(|(id, _)| *id);
        hits.into_iter().map(|(_, h)| h).collect()
    }
}

fn wrap<C, E>(handler: impl Fn(&mut C, &E) -> Result<(), C::Error> + 'static) -> Handler<C>
where
    C: EventContext,
    E: Event,
{
    Rc::new(move |ctx: &mut C, event: &dyn Any| match event.downcast_ref::<E>() {
        Some(e) => handler(ctx, e),
        None => Ok(()),
    })
}

// ── Publishing ────────────────────────────────────────────────────────────────

/// Deliver `event` to every matching handler before returning.
///
/// Handlers run in subscription order.  The first handler error stops the
/// dispatch and is returned to the publisher.
pub fn publish<C: EventContext, E: Event>(ctx: &mut C, event: E) -> Result<(), C::Error> {
    let handlers = ctx.event_bus().matching(TypeId::of::<E>(), &event);
    ctx.event_bus_mut().published += 1;
    trace!(?event, handlers = handlers.len(), "publish");
    for handler in handlers {
        handler(ctx, &event)?;
    }
    Ok(())
}
