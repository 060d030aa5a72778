//! FilterMiddleware - drops actions before they reach the reducer

use super::{dispatch_fn, DispatchFn, Middleware, MiddlewareApi};
use std::rc::Rc;

/// Blocks every action for which the predicate returns `true`
pub struct FilterMiddleware<P> {
    name: &'static str,
    blocked: Rc<P>,
}

impl<P> FilterMiddleware<P> {
    /// `name` only shows up in the logs
    pub fn new(name: &'static str, blocked: P) -> Self {
        Self {
            name,
            blocked: Rc::new(blocked),
        }
    }
}

impl<S, A, P> Middleware<S, A> for FilterMiddleware<P>
where
    A: 'static,
    P: Fn(&A) -> bool + 'static,
{
    fn wrap(&self, _api: MiddlewareApi<S, A>, next: DispatchFn<A>) -> DispatchFn<A> {
        let name = self.name;
        let blocked = Rc::clone(&self.blocked);
        dispatch_fn(move |action: A| {
            if blocked(&action) {
                log::debug!("FilterMiddleware({}): action blocked", name);
                return;
            }
            next(action);
        })
    }
}
