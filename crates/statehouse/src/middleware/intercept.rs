//! Interceptors - the "observe, maybe consume" shape of middleware
//!
//! Most middleware only needs to look at an action, maybe dispatch something
//! else, and decide whether the action continues down the chain. An
//! [`Interceptor`] expresses exactly that; [`intercept`] turns it into a
//! [`Middleware`].

use super::{dispatch_fn, DispatchFn, Dispatcher, Middleware, MiddlewareApi};
use std::rc::Rc;

/// Observes actions before they reach the reducer
pub trait Interceptor<S, A> {
    /// Handle an action
    ///
    /// - `action`: The action to process
    /// - `state`: Current state (snapshot), `None` before the first state exists
    /// - `dispatcher`: Use to dispatch actions that re-enter the middleware chain
    ///
    /// Returns `true` to continue the chain, `false` to consume the action
    fn handle(&self, action: &A, state: Option<&S>, dispatcher: &Dispatcher<S, A>) -> bool;
}

/// Middleware adapter for an [`Interceptor`]
pub struct Intercept<I> {
    interceptor: Rc<I>,
}

/// Use an [`Interceptor`] as middleware
pub fn intercept<I>(interceptor: I) -> Intercept<I> {
    Intercept {
        interceptor: Rc::new(interceptor),
    }
}

impl<S, A, I> Middleware<S, A> for Intercept<I>
where
    S: 'static,
    A: 'static,
    I: Interceptor<S, A> + 'static,
{
    fn wrap(&self, api: MiddlewareApi<S, A>, next: DispatchFn<A>) -> DispatchFn<A> {
        let interceptor = Rc::clone(&self.interceptor);
        dispatch_fn(move |action: A| {
            let state = api.state.get();
            if interceptor.handle(&action, state.as_ref(), &api.dispatcher) {
                next(action);
            }
        })
    }
}
