//! Subscriptions - projections of the store state delivered to subscribers
//!
//! A [`Subscription`] is a small pipeline that turns a pair of
//! `(previous state, new state)` into zero or one projected value:
//!
//! ```text
//! (old, new) ─► select ─► skip_repeats ─► only_when ─► subscriber.new_state()
//! ```
//!
//! Stages run in the order they were added. A stage that rejects the pair ends
//! the pipeline and the subscriber is not called.

use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Receives projected state from the store
pub trait StoreSubscriber<P> {
    fn new_state(&self, state: &P);
}

/// A stage output: borrowed straight from the store state until a `select`
/// produces an owned projection
enum Value<'a, P> {
    Borrowed(&'a P),
    Owned(P),
}

impl<P> Deref for Value<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        match self {
            Value::Borrowed(value) => value,
            Value::Owned(value) => value,
        }
    }
}

type Pair<'a, P> = (Option<Value<'a, P>>, Value<'a, P>);
type Stage<S, P> = Rc<dyn for<'a> Fn(Option<&'a S>, &'a S) -> Option<Pair<'a, P>>>;

fn stage<S, P, F>(f: F) -> Stage<S, P>
where
    F: for<'a> Fn(Option<&'a S>, &'a S) -> Option<Pair<'a, P>> + 'static,
{
    Rc::new(f)
}

/// Compiled projection pipeline from store state `S` to projected value `P`
pub struct Subscription<S, P> {
    stage: Stage<S, P>,
}

impl<S: 'static> Subscription<S, S> {
    /// The full state, unfiltered
    ///
    /// The state is borrowed, never cloned, on its way to the next stage.
    pub fn identity() -> Self {
        Self {
            stage: stage(|old, new| Some((old.map(Value::Borrowed), Value::Borrowed(new)))),
        }
    }
}

impl<S: 'static, P: 'static> Subscription<S, P> {
    /// Project the value with `f`
    pub fn select<Q: 'static>(self, f: impl Fn(&P) -> Q + 'static) -> Subscription<S, Q> {
        let prev = self.stage;
        Subscription {
            stage: stage(move |old, new| {
                prev(old, new).map(|(old, new)| {
                    (old.as_deref().map(&f).map(Value::Owned), Value::Owned(f(&*new)))
                })
            }),
        }
    }

    /// Suppress the notification when `eq` says the projected value did not change
    pub fn skip_repeats_by(self, eq: impl Fn(&P, &P) -> bool + 'static) -> Self {
        self.retain(move |old, new| !matches!(old, Some(old) if eq(old, new)))
    }

    /// Suppress the notification when the projected value did not change
    pub fn skip_repeats(self) -> Self
    where
        P: PartialEq,
    {
        self.skip_repeats_by(|old, new| old == new)
    }

    /// Deliver only when `predicate` holds for `(old, new)`
    ///
    /// `old` is `None` for the initial notification.
    pub fn only_when(self, predicate: impl Fn(Option<&P>, &P) -> bool + 'static) -> Self {
        self.retain(predicate)
    }

    /// Suppress the notification when `predicate` holds for a previous and new value
    ///
    /// The initial notification has no previous value and is never skipped.
    pub fn skip_when(self, predicate: impl Fn(&P, &P) -> bool + 'static) -> Self {
        self.retain(move |old, new| !matches!(old, Some(old) if predicate(old, new)))
    }

    fn retain(self, keep: impl Fn(Option<&P>, &P) -> bool + 'static) -> Self {
        let prev = self.stage;
        Self {
            stage: stage(move |old, new| {
                prev(old, new).filter(|(old, new)| keep(old.as_deref(), &**new))
            }),
        }
    }

    /// Run the pipeline and hand the projected value to `deliver`
    ///
    /// `deliver` is not called when the notification is suppressed.
    fn deliver(&self, old: Option<&S>, new: &S, deliver: impl FnOnce(&P)) {
        if let Some((_, value)) = (self.stage)(old, new) {
            deliver(&*value);
        }
    }

    /// Run the pipeline; `None` means the notification is suppressed
    pub fn project(&self, old: Option<&S>, new: &S) -> Option<P>
    where
        P: Clone,
    {
        let mut projected = None;
        self.deliver(old, new, |value| projected = Some(value.clone()));
        projected
    }
}

/// One subscriber bound to its compiled pipeline
///
/// The box only holds a weak reference, so it never keeps a subscriber alive.
pub(crate) struct SubscriptionBox<S> {
    identity: usize,
    alive: Box<dyn Fn() -> bool>,
    notify: Box<dyn Fn(Option<&S>, &S)>,
}

impl<S: 'static> SubscriptionBox<S> {
    pub(crate) fn new<P, Sub>(subscriber: &Rc<Sub>, subscription: Subscription<S, P>) -> Self
    where
        P: 'static,
        Sub: StoreSubscriber<P> + ?Sized + 'static,
    {
        let weak = Rc::downgrade(subscriber);
        let liveness: Weak<Sub> = weak.clone();

        Self {
            identity: identity_of(subscriber),
            alive: Box::new(move || liveness.strong_count() > 0),
            notify: Box::new(move |old: Option<&S>, new: &S| {
                let Some(subscriber) = weak.upgrade() else {
                    return;
                };
                subscription.deliver(old, new, |projected| subscriber.new_state(projected));
            }),
        }
    }

    pub(crate) fn identity(&self) -> usize {
        self.identity
    }

    pub(crate) fn is_alive(&self) -> bool {
        (self.alive)()
    }

    pub(crate) fn notify(&self, old: Option<&S>, new: &S) {
        (self.notify)(old, new)
    }
}

/// Address of the subscriber allocation
///
/// Stable while any `Weak` to it exists, so a live box never collides with a
/// newer subscriber.
pub(crate) fn identity_of<Sub: ?Sized>(subscriber: &Rc<Sub>) -> usize {
    Rc::as_ptr(subscriber) as *const () as usize
}
