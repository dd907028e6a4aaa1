//! Unit tests for abm-event.

use std::cell::RefCell;
use std::rc::Rc;

use abm_core::{Event, EventLabelerId, Label};

use crate::{publish, EventBus, EventContext, EventError, EventLabel, EventLabeler};

// ── Fixtures ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Ping(u32);
impl Event for Ping {}

#[derive(Debug)]
struct Pong(u32);
impl Event for Pong {}

#[derive(Debug, PartialEq)]
enum TestError {
    Bus(EventError),
    Handler(&'static str),
}

impl From<EventError> for TestError {
    fn from(e: EventError) -> Self {
        TestError::Bus(e)
    }
}

#[derive(Default)]
struct Ctx {
    bus: EventBus<Ctx>,
    log: Vec<String>,
}

impl EventContext for Ctx {
    type Error = TestError;

    fn event_bus(&self) -> &EventBus<Self> {
        &self.bus
    }

    fn event_bus_mut(&mut self) -> &mut EventBus<Self> {
        &mut self.bus
    }
}

const BY_PARITY: EventLabelerId = EventLabelerId(1);

fn parity_labeler() -> EventLabeler<Ping> {
    EventLabeler::new(BY_PARITY, |p: &Ping| vec![Label::Bool(p.0 % 2 == 0)])
}

fn even() -> EventLabel {
    EventLabel::new::<Ping>(BY_PARITY, vec![Label::Bool(true)])
}

// ── Typed dispatch ────────────────────────────────────────────────────────────

#[cfg(test)]
mod typed {
    use super::*;

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut ctx = Ctx::default();
        for name in ["a", "b", "c"] {
            ctx.bus.subscribe(move |c: &mut Ctx, p: &Ping| {
                c.log.push(format!("{name}{}", p.0));
                Ok(())
            });
        }
        publish(&mut ctx, Ping(1)).unwrap();
        assert_eq!(ctx.log, ["a1", "b1", "c1"]);
        assert_eq!(ctx.bus.published(), 1);
    }

    #[test]
    fn other_types_not_delivered() {
        let mut ctx = Ctx::default();
        ctx.bus.subscribe(|c: &mut Ctx, _: &Pong| {
            c.log.push("pong".into());
            Ok(())
        });
        publish(&mut ctx, Ping(1)).unwrap();
        assert!(ctx.log.is_empty());
        assert!(!ctx.bus.has_subscribers::<Ping>());
        assert!(ctx.bus.has_subscribers::<Pong>());
    }

    #[test]
    fn nested_publish_completes_before_outer_continues() {
        let mut ctx = Ctx::default();
        ctx.bus.subscribe(|c: &mut Ctx, p: &Ping| {
            c.log.push("ping-1".into());
            publish(c, Pong(p.0))
        });
        ctx.bus.subscribe(|c: &mut Ctx, _: &Ping| {
            c.log.push("ping-2".into());
            Ok(())
        });
        ctx.bus.subscribe(|c: &mut Ctx, _: &Pong| {
            c.log.push("pong-1".into());
            Ok(())
        });
        ctx.bus.subscribe(|c: &mut Ctx, _: &Pong| {
            c.log.push("pong-2".into());
            Ok(())
        });

        publish(&mut ctx, Ping(0)).unwrap();
        assert_eq!(ctx.log, ["ping-1", "pong-1", "pong-2", "ping-2"]);
        assert_eq!(ctx.bus.published(), 2);
    }

    #[test]
    fn handler_error_stops_dispatch() {
        let mut ctx = Ctx::default();
        ctx.bus.subscribe(|_: &mut Ctx, _: &Ping| Err(TestError::Handler("boom")));
        ctx.bus.subscribe(|c: &mut Ctx, _: &Ping| {
            c.log.push("unreached".into());
            Ok(())
        });
        assert_eq!(publish(&mut ctx, Ping(0)), Err(TestError::Handler("boom")));
        assert!(ctx.log.is_empty());
    }
}

// ── Subscription management ───────────────────────────────────────────────────

#[cfg(test)]
mod subscriptions {
    use super::*;

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut ctx = Ctx::default();
        let id = ctx.bus.subscribe(|c: &mut Ctx, _: &Ping| {
            c.log.push("x".into());
            Ok(())
        });
        assert!(ctx.bus.unsubscribe(id));
        assert!(!ctx.bus.unsubscribe(id));
        publish(&mut ctx, Ping(0)).unwrap();
        assert!(ctx.log.is_empty());
        assert_eq!(ctx.bus.subscription_count(), 0);
    }

    #[test]
    fn unsubscribe_during_dispatch_keeps_snapshot() {
        let mut ctx = Ctx::default();
        let later = Rc::new(RefCell::new(None));
        let target = Rc::clone(&later);
        ctx.bus.subscribe(move |c: &mut Ctx, _: &Ping| {
            if let Some(id) = *target.borrow() {
                c.bus.unsubscribe(id);
            }
            c.log.push("first".into());
            Ok(())
        });
        let second = ctx.bus.subscribe(|c: &mut Ctx, _: &Ping| {
            c.log.push("second".into());
            Ok(())
        });
        *later.borrow_mut() = Some(second);

        publish(&mut ctx, Ping(0)).unwrap();
        assert_eq!(ctx.log, ["first", "second"]);

        ctx.log.clear();
        publish(&mut ctx, Ping(0)).unwrap();
        assert_eq!(ctx.log, ["first"]);
    }

    #[test]
    fn subscribe_during_dispatch_waits_for_next_publish() {
        let mut ctx = Ctx::default();
        ctx.bus.subscribe(|c: &mut Ctx, _: &Ping| {
            c.log.push("outer".into());
            c.bus.subscribe(|c: &mut Ctx, _: &Ping| {
                c.log.push("late".into());
                Ok(())
            });
            Ok(())
        });
        publish(&mut ctx, Ping(0)).unwrap();
        assert_eq!(ctx.log, ["outer"]);
    }
}

// ── Labeled subscriptions ─────────────────────────────────────────────────────

#[cfg(test)]
mod labeled {
    use super::*;

    #[test]
    fn unknown_labeler_rejected() {
        let mut ctx = Ctx::default();
        let err = ctx
            .bus
            .subscribe_labeled(even(), |_: &mut Ctx, _: &Ping| Ok(()))
            .unwrap_err();
        assert_eq!(err, EventError::UnknownLabeler(BY_PARITY));
    }

    #[test]
    fn duplicate_labeler_rejected() {
        let mut ctx = Ctx::default();
        ctx.bus.add_labeler(parity_labeler()).unwrap();
        assert_eq!(
            ctx.bus.add_labeler(parity_labeler()),
            Err(EventError::DuplicateLabeler(BY_PARITY))
        );
    }

    #[test]
    fn label_for_other_type_rejected() {
        let mut ctx = Ctx::default();
        ctx.bus.add_labeler(parity_labeler()).unwrap();
        let err = ctx
            .bus
            .subscribe_labeled(even(), |_: &mut Ctx, _: &Pong| Ok(()))
            .unwrap_err();
        assert_eq!(err, EventError::LabelTypeMismatch(BY_PARITY));
    }

    #[test]
    fn only_matching_labels_delivered() {
        let mut ctx = Ctx::default();
        ctx.bus.add_labeler(parity_labeler()).unwrap();
        assert!(!ctx.bus.has_subscribers::<Ping>());
        ctx.bus
            .subscribe_labeled(even(), |c: &mut Ctx, p: &Ping| {
                c.log.push(format!("even{}", p.0));
                Ok(())
            })
            .unwrap();
        assert!(ctx.bus.has_subscribers::<Ping>());

        for n in 0..5 {
            publish(&mut ctx, Ping(n)).unwrap();
        }
        assert_eq!(ctx.log, ["even0", "even2", "even4"]);
    }

    #[test]
    fn typed_and_labeled_merge_in_subscription_order() {
        let mut ctx = Ctx::default();
        ctx.bus.add_labeler(parity_labeler()).unwrap();
        ctx.bus
            .subscribe_labeled(even(), |c: &mut Ctx, _: &Ping| {
                c.log.push("labeled".into());
                Ok(())
            })
            .unwrap();
        ctx.bus.subscribe(|c: &mut Ctx, _: &Ping| {
            c.log.push("typed".into());
            Ok(())
        });
        publish(&mut ctx, Ping(2)).unwrap();
        assert_eq!(ctx.log, ["labeled", "typed"]);
    }

    #[test]
    fn labeled_unsubscribe_stops_delivery() {
        let mut ctx = Ctx::default();
        ctx.bus.add_labeler(parity_labeler()).unwrap();
        let id = ctx
            .bus
            .subscribe_labeled(even(), |c: &mut Ctx, _: &Ping| {
                c.log.push("x".into());
                Ok(())
            })
            .unwrap();
        assert!(ctx.bus.unsubscribe(id));
        publish(&mut ctx, Ping(0)).unwrap();
        assert!(ctx.log.is_empty());
        assert!(!ctx.bus.has_subscribers::<Ping>());
    }
}
