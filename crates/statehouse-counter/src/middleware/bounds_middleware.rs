//! Bounds Middleware
//!
//! Keeps the counter from going negative:
//! - Consumes Decrement while the counter is at zero
//! - Turns the consumed Decrement into a Reset when the counter is somehow
//!   already negative (e.g. a remote value below zero)

use crate::actions::Action;
use crate::state::CounterState;
use statehouse::{Dispatcher, Interceptor};

/// Bounds middleware - blocks decrements below zero
pub struct BoundsMiddleware;

impl BoundsMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BoundsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Interceptor<CounterState, Action> for BoundsMiddleware {
    fn handle(
        &self,
        action: &Action,
        state: Option<&CounterState>,
        dispatcher: &Dispatcher<CounterState, Action>,
    ) -> bool {
        let counter = state.map(|s| s.counter).unwrap_or_default();
        match action {
            Action::Decrement if counter == 0 => {
                log::info!("BoundsMiddleware: counter already at zero, ignoring Decrement");
                false
            }
            Action::Decrement if counter < 0 => {
                log::warn!("BoundsMiddleware: counter is negative ({}), resetting", counter);
                dispatcher.dispatch(Action::Reset);
                false
            }
            _ => true,
        }
    }
}
