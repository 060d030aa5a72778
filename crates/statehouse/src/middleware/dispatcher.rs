//! Weak handles to the store for middleware and effects
//!
//! Middleware closures and subscribers may outlive the store. Both handles in
//! this module only hold a `Weak` reference, so once the store is dropped they
//! degrade to no-ops instead of keeping it alive.

use std::rc::Weak;

/// What the handles need from the store, with the environment type erased
pub(crate) trait DispatchTarget<S, A> {
    /// Run an action through the full middleware chain
    fn dispatch(&self, action: A);

    /// Snapshot of the current state
    fn current_state(&self) -> Option<S>;
}

/// Dispatches actions back into the store
///
/// Actions dispatched here re-enter the middleware chain from the beginning,
/// so every middleware observes them.
pub struct Dispatcher<S, A> {
    store: Weak<dyn DispatchTarget<S, A>>,
}

impl<S, A> Dispatcher<S, A> {
    pub(crate) fn new(store: Weak<dyn DispatchTarget<S, A>>) -> Self {
        Self { store }
    }

    /// Dispatch an action through the store
    ///
    /// Does nothing if the store has been dropped.
    pub fn dispatch(&self, action: A) {
        match self.store.upgrade() {
            Some(store) => store.dispatch(action),
            None => log::warn!("Dispatcher: store dropped, ignoring action"),
        }
    }

    /// Whether the store this handle points at still exists
    pub fn is_connected(&self) -> bool {
        self.store.strong_count() > 0
    }
}

impl<S, A> Clone for Dispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Weak::clone(&self.store),
        }
    }
}

/// Reads the current state of the store
pub struct StateReader<S, A> {
    store: Weak<dyn DispatchTarget<S, A>>,
}

impl<S, A> StateReader<S, A> {
    pub(crate) fn new(store: Weak<dyn DispatchTarget<S, A>>) -> Self {
        Self { store }
    }

    /// Current state, or `None` if the store is gone or has no state yet
    pub fn get(&self) -> Option<S> {
        self.store.upgrade()?.current_state()
    }
}

impl<S, A> Clone for StateReader<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Weak::clone(&self.store),
        }
    }
}
