use super::{dispatch_fn, DispatchFn, Middleware, MiddlewareApi};
use std::fmt::Debug;

/// LoggingMiddleware - logs all actions passing through
pub struct LoggingMiddleware {
    level: log::Level,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self {
            level: log::Level::Debug,
        }
    }

    /// Log at `level` instead of `Debug`
    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Middleware<S, A> for LoggingMiddleware
where
    A: Debug + 'static,
{
    fn wrap(&self, _api: MiddlewareApi<S, A>, next: DispatchFn<A>) -> DispatchFn<A> {
        let level = self.level;
        dispatch_fn(move |action: A| {
            log::log!(level, "Action: {:?}", action);
            next(action);
        })
    }
}
