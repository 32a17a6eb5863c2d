//! # Change Notification
//!
//! In-process publish/subscribe keyed by entity kind. Delivery is
//! synchronous and fire-and-forget: `publish` invokes every matching handler
//! before returning, in subscription order, so two events for the same kind
//! are always observed in publish order.
//!
//! External medium writes (another instance sharing the medium) re-enter
//! through the same `publish` path as local commits, tagged
//! [`ChangeOp::External`], so subscribers never special-case a write's
//! origin.
//!
//! Handlers may subscribe, unsubscribe or publish re-entrantly; the
//! subscriber list is snapshotted per publish, so a handler added during
//! delivery first sees the next event.

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use crate::model::EntityKind;

/// What a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Created,
    Updated,
    Removed,
    Reordered,
    Restored,
    Imported,
    /// A write observed on the shared medium from another instance.
    External,
}

/// A committed change. The payload is an advisory JSON snapshot (the new
/// value, or the ids affected); consumers re-read the store for state.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: EntityKind,
    pub op: ChangeOp,
    pub payload: Value,
}

impl ChangeEvent {
    pub fn new(kind: EntityKind, op: ChangeOp, payload: Value) -> Self {
        Self { kind, op, payload }
    }
}

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

struct Subscriber {
    token: SubscriptionToken,
    kind: Option<EntityKind>,
    handler: Rc<dyn Fn(&ChangeEvent)>,
}

/// Process-wide change channel. Single-threaded; uses `RefCell` interior
/// mutability so the store can hold it behind `&self`.
#[derive(Default)]
pub struct ChangeNotifier {
    inner: RefCell<Inner>,
}

#[derive(Default)]
struct Inner {
    next_token: u64,
    subscribers: Vec<Subscriber>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events for one entity kind.
    pub fn subscribe(
        &self,
        kind: EntityKind,
        handler: impl Fn(&ChangeEvent) + 'static,
    ) -> SubscriptionToken {
        self.add_subscriber(Some(kind), Rc::new(handler))
    }

    /// Subscribe to events for every entity kind.
    pub fn subscribe_all(&self, handler: impl Fn(&ChangeEvent) + 'static) -> SubscriptionToken {
        self.add_subscriber(None, Rc::new(handler))
    }

    /// Remove a subscription. Returns false when the token is unknown
    /// (already unsubscribed).
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.token != token);
        inner.subscribers.len() != before
    }

    /// Deliver an event to every matching subscriber, synchronously, in
    /// subscription order.
    pub fn publish(&self, event: &ChangeEvent) {
        // Snapshot handlers so re-entrant subscribe/unsubscribe can't
        // invalidate the borrow mid-delivery.
        let handlers: Vec<Rc<dyn Fn(&ChangeEvent)>> = {
            let inner = self.inner.borrow();
            inner
                .subscribers
                .iter()
                .filter(|s| s.kind.is_none() || s.kind == Some(event.kind))
                .map(|s| Rc::clone(&s.handler))
                .collect()
        };
        for handler in handlers {
            handler(event);
        }
    }

    fn add_subscriber(
        &self,
        kind: Option<EntityKind>,
        handler: Rc<dyn Fn(&ChangeEvent)>,
    ) -> SubscriptionToken {
        let mut inner = self.inner.borrow_mut();
        let token = SubscriptionToken(inner.next_token);
        inner.next_token += 1;
        inner.subscribers.push(Subscriber {
            token,
            kind,
            handler,
        });
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: EntityKind, op: ChangeOp) -> ChangeEvent {
        ChangeEvent::new(kind, op, Value::Null)
    }

    #[test]
    fn test_kind_filtering() {
        let notifier = ChangeNotifier::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = Rc::clone(&seen);
        notifier.subscribe(EntityKind::Service, move |e| {
            seen_clone.borrow_mut().push(e.kind);
        });

        notifier.publish(&event(EntityKind::Service, ChangeOp::Created));
        notifier.publish(&event(EntityKind::Project, ChangeOp::Created));
        notifier.publish(&event(EntityKind::Service, ChangeOp::Removed));

        assert_eq!(*seen.borrow(), vec![EntityKind::Service, EntityKind::Service]);
    }

    #[test]
    fn test_delivery_order_per_kind() {
        let notifier = ChangeNotifier::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = Rc::clone(&seen);
        notifier.subscribe(EntityKind::BlogPost, move |e| {
            seen_clone.borrow_mut().push(e.op);
        });

        notifier.publish(&event(EntityKind::BlogPost, ChangeOp::Created));
        notifier.publish(&event(EntityKind::BlogPost, ChangeOp::Updated));
        notifier.publish(&event(EntityKind::BlogPost, ChangeOp::Removed));

        assert_eq!(
            *seen.borrow(),
            vec![ChangeOp::Created, ChangeOp::Updated, ChangeOp::Removed]
        );
    }

    #[test]
    fn test_subscribe_all_sees_every_kind() {
        let notifier = ChangeNotifier::new();
        let count = Rc::new(RefCell::new(0));

        let count_clone = Rc::clone(&count);
        notifier.subscribe_all(move |_| *count_clone.borrow_mut() += 1);

        notifier.publish(&event(EntityKind::Hero, ChangeOp::Updated));
        notifier.publish(&event(EntityKind::Settings, ChangeOp::Updated));

        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let count = Rc::new(RefCell::new(0));

        let count_clone = Rc::clone(&count);
        let token = notifier.subscribe(EntityKind::Hero, move |_| {
            *count_clone.borrow_mut() += 1;
        });

        notifier.publish(&event(EntityKind::Hero, ChangeOp::Updated));
        assert!(notifier.unsubscribe(token));
        notifier.publish(&event(EntityKind::Hero, ChangeOp::Updated));

        assert_eq!(*count.borrow(), 1);
        assert!(!notifier.unsubscribe(token));
    }

    #[test]
    fn test_multiple_subscribers_in_subscription_order() {
        let notifier = ChangeNotifier::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let seen_clone = Rc::clone(&seen);
            notifier.subscribe(EntityKind::Service, move |_| {
                seen_clone.borrow_mut().push(label);
            });
        }

        notifier.publish(&event(EntityKind::Service, ChangeOp::Created));
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reentrant_subscribe_during_publish() {
        let notifier = Rc::new(ChangeNotifier::new());
        let late_count = Rc::new(RefCell::new(0));

        let notifier_clone = Rc::clone(&notifier);
        let late_count_clone = Rc::clone(&late_count);
        notifier.subscribe(EntityKind::Hero, move |_| {
            let inner_count = Rc::clone(&late_count_clone);
            notifier_clone.subscribe(EntityKind::Hero, move |_| {
                *inner_count.borrow_mut() += 1;
            });
        });

        // The handler added mid-delivery must not see the current event.
        notifier.publish(&event(EntityKind::Hero, ChangeOp::Updated));
        assert_eq!(*late_count.borrow(), 0);

        notifier.publish(&event(EntityKind::Hero, ChangeOp::Updated));
        assert_eq!(*late_count.borrow(), 1);
    }

    #[test]
    fn test_payload_carried_through() {
        let notifier = ChangeNotifier::new();
        let seen = Rc::new(RefCell::new(Value::Null));

        let seen_clone = Rc::clone(&seen);
        notifier.subscribe(EntityKind::Service, move |e| {
            *seen_clone.borrow_mut() = e.payload.clone();
        });

        notifier.publish(&ChangeEvent::new(
            EntityKind::Service,
            ChangeOp::Removed,
            json!({"id": "abc"}),
        ));
        assert_eq!(*seen.borrow(), json!({"id": "abc"}));
    }
}
