//! Single-writer observable state store
//!
//! This crate provides a Redux-style store:
//! - One state value, replaced (never mutated in place) by a reducer
//! - An ordered middleware chain in front of the reducer
//! - Subscriptions with projection and change suppression
//! - Effect jobs: async follow-up work whose result is dispatched back
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌─────────┐   ┌─────────────┐
//! │ dispatch │──►│ middleware[0..n]   │──►│ reducer │──►│ subscribers │
//! └──────────┘   └────────────────────┘   └─────────┘   └─────────────┘
//!      ▲                                       │
//!      │                                       ▼
//!      └──────── Ok(action) ──────────── EffectJob (spawn_local)
//! ```
//!
//! # Example
//!
//! ```rust
//! use statehouse::{EffectJob, Store, StoreSubscriber};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct State {
//!     counter: i32,
//! }
//!
//! enum Action {
//!     Increment,
//! }
//!
//! fn reduce(state: &mut State, action: Action, _env: &mut ()) -> Option<EffectJob<Action>> {
//!     match action {
//!         Action::Increment => state.counter += 1,
//!     }
//!     None
//! }
//!
//! struct Last(Cell<i32>);
//!
//! impl StoreSubscriber<i32> for Last {
//!     fn new_state(&self, counter: &i32) {
//!         self.0.set(*counter);
//!     }
//! }
//!
//! let store = Store::builder(reduce, ()).state(State::default()).build();
//! let last = Rc::new(Last(Cell::new(-1)));
//! store.subscribe_with(&last, |s| s.select(|state| state.counter));
//!
//! store.dispatch(Action::Increment);
//! assert_eq!(last.0.get(), 1);
//! ```

pub mod effect;
pub mod error;
pub mod middleware;
pub mod store;
pub mod subscription;

pub use effect::{effect, EffectJob, EffectRegistry, JobId};
pub use error::StoreError;
pub use middleware::{
    dispatch_fn, intercept, DispatchFn, Dispatcher, FilterMiddleware, Interceptor,
    LoggingMiddleware, Middleware, MiddlewareApi, StateReader,
};
pub use store::{Reducer, Store, StoreBuilder};
pub use subscription::{StoreSubscriber, Subscription};

pub use statehouse_config::StoreConfig;
