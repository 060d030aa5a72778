//! Middleware system for the store
//!
//! Middleware sits between `Store::dispatch` and the reducer, allowing
//! logging, action rewriting, blocking and other cross-cutting concerns to be
//! handled in a composable way.
//!
//! ## Design
//!
//! ```text
//! dispatch(action) → middleware[0] → middleware[1] → … → reducer → state
//! ```
//!
//! Each middleware wraps the next-inner dispatch function and returns a new
//! one. The chain is built by folding the list from last to first, so
//! `middleware[0]` is the outermost wrapper and sees every action first.
//! [`Middleware::wrap`] runs once per chain rebuild, not once per action.
//!
//! Each middleware can:
//! - Inspect actions and read the state via [`StateReader`]
//! - Dispatch new actions via the [`Dispatcher`]
//! - Rewrite the action before passing it on
//! - Block the action by not calling `next`
//!
//! ## Example
//!
//! ```rust
//! use statehouse::middleware::{dispatch_fn, DispatchFn, MiddlewareApi};
//!
//! fn double(_api: MiddlewareApi<i32, i32>, next: DispatchFn<i32>) -> DispatchFn<i32> {
//!     dispatch_fn(move |action: i32| next(action * 2))
//! }
//! ```

use std::rc::{Rc, Weak};

mod dispatcher;
mod filter;
mod intercept;
mod logging;

pub(crate) use dispatcher::DispatchTarget;
pub use dispatcher::{Dispatcher, StateReader};
pub use filter::FilterMiddleware;
pub use intercept::{intercept, Intercept, Interceptor};
pub use logging::LoggingMiddleware;

/// A dispatch function: the head of the chain, or any link in it
pub type DispatchFn<A> = Rc<dyn Fn(A)>;

/// Wrap a closure into a [`DispatchFn`]
pub fn dispatch_fn<A>(f: impl Fn(A) + 'static) -> DispatchFn<A> {
    Rc::new(f)
}

/// Store accessors handed to each middleware when the chain is built
///
/// Both handles are weak; see [`Dispatcher`] and [`StateReader`].
pub struct MiddlewareApi<S, A> {
    pub dispatcher: Dispatcher<S, A>,
    pub state: StateReader<S, A>,
}

impl<S, A> MiddlewareApi<S, A> {
    pub(crate) fn new(store: Weak<dyn DispatchTarget<S, A>>) -> Self {
        Self {
            dispatcher: Dispatcher::new(Weak::clone(&store)),
            state: StateReader::new(store),
        }
    }
}

impl<S, A> Clone for MiddlewareApi<S, A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            state: self.state.clone(),
        }
    }
}

/// Middleware trait - transforms the downstream dispatch function
///
/// Closures with the signature
/// `Fn(MiddlewareApi<S, A>, DispatchFn<A>) -> DispatchFn<A>` implement it.
pub trait Middleware<S, A> {
    /// Build the dispatch function that runs before `next`
    ///
    /// # Parameters
    /// - `api`: Weak store accessors (dispatch + read state)
    /// - `next`: The next-inner dispatch function
    ///
    /// # Returns
    /// The dispatch function the outer link (or the store) will call
    fn wrap(&self, api: MiddlewareApi<S, A>, next: DispatchFn<A>) -> DispatchFn<A>;
}

impl<S, A, F> Middleware<S, A> for F
where
    F: Fn(MiddlewareApi<S, A>, DispatchFn<A>) -> DispatchFn<A>,
{
    fn wrap(&self, api: MiddlewareApi<S, A>, next: DispatchFn<A>) -> DispatchFn<A> {
        self(api, next)
    }
}

/// Fold the middleware list around `base`, last to first
pub(crate) fn compose<S, A>(
    middleware: &[Box<dyn Middleware<S, A>>],
    api: &MiddlewareApi<S, A>,
    base: DispatchFn<A>,
) -> DispatchFn<A> {
    middleware
        .iter()
        .rev()
        .fold(base, |next, m| m.wrap(api.clone(), next))
}
