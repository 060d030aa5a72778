//! Errors raised inside the synchronous dispatch path

use thiserror::Error;

/// Invariant violations detected by the store.
///
/// These are caller bugs, not runtime conditions. The store never hands them
/// back to the caller: it logs the error and panics with its message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// An action was dispatched while the reducer was still running.
    #[error("reentrant dispatch: an action was dispatched while a reducer was running")]
    ReentrantDispatch,

    /// The reducer was reached before the store had any state.
    #[error("missing state: the store has neither an initial state nor a bootstrap action")]
    MissingState,
}

impl StoreError {
    /// Abort the current dispatch.
    pub(crate) fn raise(self) -> ! {
        log::error!("Store invariant violated: {}", self);
        panic!("{}", self)
    }
}
