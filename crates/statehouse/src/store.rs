//! Store - holds the state and runs the dispatch loop
//!
//! ```text
//! dispatch(action)
//!   → middleware chain (middleware[0] outermost)
//!   → reducer(&mut state, action, &mut environment) → Option<EffectJob>
//!   → replace state → notify subscribers
//!   → dispatches queued by subscribers during the notification
//!   → spawn effect job (its action re-enters dispatch later)
//! ```
//!
//! The store is single-thread affine: it is built on `Rc`/`RefCell` and is
//! therefore neither `Send` nor `Sync`. Effect jobs are spawned with
//! [`tokio::task::spawn_local`], so a store that runs effects must live inside
//! a [`tokio::task::LocalSet`].

use crate::effect::{EffectJob, EffectRegistry};
use crate::error::StoreError;
use crate::middleware::{
    compose, dispatch_fn, DispatchFn, DispatchTarget, Dispatcher, Middleware, MiddlewareApi,
};
use crate::subscription::{identity_of, StoreSubscriber, Subscription, SubscriptionBox};
use statehouse_config::StoreConfig;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Transition function: updates the state in place and may return an effect job
pub type Reducer<S, A, E> = Box<dyn Fn(&mut S, A, &mut E) -> Option<EffectJob<A>>>;

type StateEq<S> = fn(&S, &S) -> bool;

struct StoreInner<S, A, E> {
    self_ref: Weak<StoreInner<S, A, E>>,
    state: RefCell<Option<S>>,
    environment: RefCell<E>,
    reducer: Reducer<S, A, E>,
    middleware: RefCell<Vec<Box<dyn Middleware<S, A>>>>,
    head: RefCell<DispatchFn<A>>,
    dispatching: Cell<bool>,
    notifying: Cell<bool>,
    deferred: RefCell<VecDeque<A>>,
    subscriptions: RefCell<Vec<Rc<SubscriptionBox<S>>>>,
    jobs: RefCell<EffectRegistry>,
    auto_skip_repeats: bool,
    state_eq: Option<StateEq<S>>,
}

impl<S, A, E> StoreInner<S, A, E>
where
    S: Clone + 'static,
    A: 'static,
    E: 'static,
{
    fn dispatch(&self, action: A) {
        // Every subscriber sees a state before the next one is produced
        if self.notifying.get() {
            log::debug!("Store: deferring dispatch until notification completes");
            self.deferred.borrow_mut().push_back(action);
            return;
        }

        // Clone the head so a nested dispatch or a middleware swap never
        // finds the cell borrowed
        let head = self.head.borrow().clone();
        head(action);
    }

    fn rebuild_pipeline(&self) {
        let store = Weak::clone(&self.self_ref);
        let base = dispatch_fn(move |action: A| {
            if let Some(store) = store.upgrade() {
                store.reduce(action);
            }
        });

        let target: Weak<dyn DispatchTarget<S, A>> = self.self_ref.clone();
        let api = MiddlewareApi::new(target);
        let middleware = self.middleware.borrow();
        let head = compose(&middleware, &api, base);
        log::debug!("Store: pipeline built with {} middleware", middleware.len());
        drop(middleware);

        *self.head.borrow_mut() = head;
    }

    /// Innermost dispatch: run the reducer and publish the result
    fn reduce(&self, action: A) {
        if self.dispatching.get() {
            StoreError::ReentrantDispatch.raise();
        }
        self.dispatching.set(true);

        let current = self.state.borrow().clone();
        let Some(mut next) = current else {
            StoreError::MissingState.raise();
        };

        let job = {
            let mut environment = self.environment.borrow_mut();
            (self.reducer)(&mut next, action, &mut *environment)
        };

        // Cleared before publishing so subscribers may dispatch
        self.dispatching.set(false);
        self.replace_state(next);

        if let Some(job) = job {
            self.spawn_effect(job);
        }
    }

    fn replace_state(&self, next: S) {
        let current = next.clone();
        let previous = self.state.replace(Some(next));

        self.notifying.set(true);
        self.notify_subscribers(previous.as_ref(), &current);
        self.notifying.set(false);

        self.drain_deferred();
    }

    fn drain_deferred(&self) {
        loop {
            let Some(action) = self.deferred.borrow_mut().pop_front() else {
                break;
            };
            self.dispatch(action);
        }
    }

    fn notify_subscribers(&self, old: Option<&S>, new: &S) {
        let snapshot = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let before = subscriptions.len();
            subscriptions.retain(|subscription| subscription.is_alive());
            let pruned = before - subscriptions.len();
            if pruned > 0 {
                log::debug!("Store: pruned {} released subscriber(s)", pruned);
            }
            subscriptions.clone()
        };

        for subscription in snapshot {
            // A subscriber notified earlier in this pass may have removed it
            if self.is_registered(&subscription) {
                subscription.notify(old, new);
            }
        }
    }

    fn is_registered(&self, subscription: &Rc<SubscriptionBox<S>>) -> bool {
        self.subscriptions
            .borrow()
            .iter()
            .any(|entry| Rc::ptr_eq(entry, subscription))
    }

    fn add_subscription(&self, subscription: SubscriptionBox<S>) {
        let subscription = Rc::new(subscription);
        {
            let mut subscriptions = self.subscriptions.borrow_mut();
            subscriptions.retain(|entry| entry.identity() != subscription.identity());
            subscriptions.push(Rc::clone(&subscription));
        }

        let current = self.state.borrow().clone();
        if let Some(state) = current {
            subscription.notify(None, &state);
        }
    }

    fn spawn_effect(&self, job: EffectJob<A>) {
        let id = self.jobs.borrow_mut().next_id();
        let store = Weak::clone(&self.self_ref);

        let handle = tokio::task::spawn_local(async move {
            let outcome = job.await;

            let Some(store) = store.upgrade() else {
                log::debug!("Store dropped before {} finished, discarding result", id);
                return;
            };
            if !store.jobs.borrow_mut().complete(id) {
                log::debug!("{} was cancelled, discarding result", id);
                return;
            }

            match outcome {
                Ok(action) => store.dispatch(action),
                Err(e) => log::error!("Effect {} failed: {:#}", id, e),
            }
        });

        self.jobs.borrow_mut().register(id, handle.abort_handle());
    }
}

impl<S, A, E> DispatchTarget<S, A> for StoreInner<S, A, E>
where
    S: Clone + 'static,
    A: 'static,
    E: 'static,
{
    fn dispatch(&self, action: A) {
        StoreInner::dispatch(self, action);
    }

    fn current_state(&self) -> Option<S> {
        self.state.borrow().clone()
    }
}

impl<S, A, E> Drop for StoreInner<S, A, E> {
    fn drop(&mut self) {
        let cancelled = self.jobs.get_mut().cancel_all();
        if cancelled > 0 {
            log::debug!("Store dropped, cancelled {} pending effect(s)", cancelled);
        }
    }
}

/// Single source of truth for the state
///
/// Cloning a `Store` clones the handle, not the state. The store is torn down
/// when the last handle is dropped; every effect job still pending is
/// cancelled at that point.
pub struct Store<S, A, E> {
    inner: Rc<StoreInner<S, A, E>>,
}

impl<S, A, E> Clone for Store<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, A, E> Store<S, A, E>
where
    S: Clone + 'static,
    A: 'static,
    E: 'static,
{
    /// Start building a store around `reducer`
    pub fn builder(
        reducer: impl Fn(&mut S, A, &mut E) -> Option<EffectJob<A>> + 'static,
        environment: E,
    ) -> StoreBuilder<S, A, E> {
        StoreBuilder::new(reducer, environment)
    }

    /// Process an action through the middleware chain and the reducer
    ///
    /// Returns once the new state has been published. Effect jobs produced by
    /// the reducer are spawned, never awaited.
    ///
    /// Called from a subscriber while a notification is in progress, the
    /// action is queued and processed as soon as every subscriber has seen the
    /// current state.
    ///
    /// # Panics
    /// - when called while a reducer is running (see [`StoreError::ReentrantDispatch`])
    /// - when the store has no state yet (see [`StoreError::MissingState`])
    pub fn dispatch(&self, action: A) {
        self.inner.dispatch(action);
    }

    /// Subscribe to the full state
    ///
    /// With auto skip-repeats enabled and a comparable state (see
    /// [`StoreBuilder::build`]) unchanged states are not delivered.
    pub fn subscribe<Sub>(&self, subscriber: &Rc<Sub>)
    where
        Sub: StoreSubscriber<S> + ?Sized + 'static,
    {
        let mut subscription = Subscription::identity();
        if let Some(eq) = self.inner.state_eq {
            subscription = subscription.skip_repeats_by(eq);
        }
        self.inner
            .add_subscription(SubscriptionBox::new(subscriber, subscription));
    }

    /// Subscribe to a projection of the state
    ///
    /// Skip-repeats on the projected value is appended automatically unless
    /// auto skip-repeats is disabled.
    pub fn subscribe_with<P, Sub, F>(&self, subscriber: &Rc<Sub>, transform: F)
    where
        P: PartialEq + 'static,
        Sub: StoreSubscriber<P> + ?Sized + 'static,
        F: FnOnce(Subscription<S, S>) -> Subscription<S, P>,
    {
        let mut subscription = transform(Subscription::identity());
        if self.inner.auto_skip_repeats {
            subscription = subscription.skip_repeats();
        }
        self.inner
            .add_subscription(SubscriptionBox::new(subscriber, subscription));
    }

    /// Subscribe to a projection without any automatic filtering
    pub fn subscribe_unfiltered<P, Sub, F>(&self, subscriber: &Rc<Sub>, transform: F)
    where
        P: 'static,
        Sub: StoreSubscriber<P> + ?Sized + 'static,
        F: FnOnce(Subscription<S, S>) -> Subscription<S, P>,
    {
        let subscription = transform(Subscription::identity());
        self.inner
            .add_subscription(SubscriptionBox::new(subscriber, subscription));
    }

    /// Remove the subscription of `subscriber`; no-op if it is not subscribed
    pub fn unsubscribe<Sub: ?Sized>(&self, subscriber: &Rc<Sub>) {
        let identity = identity_of(subscriber);
        self.inner
            .subscriptions
            .borrow_mut()
            .retain(|entry| entry.identity() != identity);
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Option<S> {
        self.inner.state.borrow().clone()
    }

    /// Read the current state without cloning it
    ///
    /// `f` must not dispatch.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.inner.state.borrow().as_ref().map(f)
    }

    pub fn with_environment<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&*self.inner.environment.borrow())
    }

    /// Mutate the environment between dispatches
    ///
    /// `f` must not dispatch.
    pub fn with_environment_mut<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut *self.inner.environment.borrow_mut())
    }

    /// Replace the middleware list and rebuild the dispatch pipeline
    ///
    /// Takes effect on the next `dispatch`.
    pub fn set_middleware(&self, middleware: Vec<Box<dyn Middleware<S, A>>>) {
        *self.inner.middleware.borrow_mut() = middleware;
        self.inner.rebuild_pipeline();
    }

    pub fn middleware_count(&self) -> usize {
        self.inner.middleware.borrow().len()
    }

    /// Number of subscriptions whose subscriber is still alive
    pub fn subscription_count(&self) -> usize {
        self.inner
            .subscriptions
            .borrow()
            .iter()
            .filter(|entry| entry.is_alive())
            .count()
    }

    /// Number of effect jobs that have neither finished nor been cancelled
    pub fn pending_jobs(&self) -> usize {
        self.inner.jobs.borrow().len()
    }

    /// Weak dispatch handle, e.g. for subscribers that react with new actions
    pub fn dispatcher(&self) -> Dispatcher<S, A> {
        let inner = Rc::downgrade(&self.inner);
        let target: Weak<dyn DispatchTarget<S, A>> = inner;
        Dispatcher::new(target)
    }

    /// Cancel every pending effect job
    ///
    /// Returns the number of cancelled jobs. The store stays usable.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.inner.jobs.borrow_mut().cancel_all();
        log::info!("Store: shutdown cancelled {} pending effect(s)", cancelled);
        cancelled
    }
}

/// Builder for [`Store`]
pub struct StoreBuilder<S, A, E> {
    reducer: Reducer<S, A, E>,
    environment: E,
    state: Option<S>,
    seed: Option<fn() -> S>,
    bootstrap: Option<A>,
    middleware: Vec<Box<dyn Middleware<S, A>>>,
    auto_skip_repeats: bool,
}

impl<S, A, E> StoreBuilder<S, A, E>
where
    S: Clone + 'static,
    A: 'static,
    E: 'static,
{
    pub fn new(
        reducer: impl Fn(&mut S, A, &mut E) -> Option<EffectJob<A>> + 'static,
        environment: E,
    ) -> Self {
        Self {
            reducer: Box::new(reducer),
            environment,
            state: None,
            seed: None,
            bootstrap: None,
            middleware: Vec::new(),
            auto_skip_repeats: true,
        }
    }

    /// Initial state
    pub fn state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    /// Append a middleware; they run in the order they were added
    pub fn middleware(mut self, middleware: impl Middleware<S, A> + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Append several boxed middleware
    pub fn middlewares(mut self, middleware: Vec<Box<dyn Middleware<S, A>>>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    pub fn auto_skip_repeats(mut self, enabled: bool) -> Self {
        self.auto_skip_repeats = enabled;
        self
    }

    /// Apply the settings from a loaded [`StoreConfig`]
    pub fn config(self, config: &StoreConfig) -> Self {
        self.auto_skip_repeats(config.auto_skip_repeats)
    }

    /// Build a store whose plain subscriptions skip unchanged states
    pub fn build(self) -> Store<S, A, E>
    where
        S: PartialEq,
    {
        let state_eq = self
            .auto_skip_repeats
            .then_some(state_eq::<S> as StateEq<S>);
        self.finish(state_eq)
    }

    /// Build a store for a state type without equality
    ///
    /// Plain subscriptions are notified on every state replacement.
    pub fn build_without_equality(self) -> Store<S, A, E> {
        self.finish(None)
    }

    fn finish(self, state_eq: Option<StateEq<S>>) -> Store<S, A, E> {
        let StoreBuilder {
            reducer,
            environment,
            state,
            seed,
            bootstrap,
            middleware,
            auto_skip_repeats,
        } = self;

        let state = state.or_else(|| seed.map(|seed| seed()));
        let inner = Rc::new_cyclic(|self_ref| StoreInner {
            self_ref: Weak::clone(self_ref),
            state: RefCell::new(state),
            environment: RefCell::new(environment),
            reducer,
            middleware: RefCell::new(middleware),
            head: RefCell::new(dispatch_fn(|_action: A| {})),
            dispatching: Cell::new(false),
            notifying: Cell::new(false),
            deferred: RefCell::new(VecDeque::new()),
            subscriptions: RefCell::new(Vec::new()),
            jobs: RefCell::new(EffectRegistry::new()),
            auto_skip_repeats,
            state_eq,
        });
        inner.rebuild_pipeline();

        let store = Store { inner };
        if let Some(action) = bootstrap {
            log::debug!("Store: dispatching bootstrap action");
            store.dispatch(action);
        }
        store
    }
}

impl<S, A, E> StoreBuilder<S, A, E>
where
    S: Clone + Default + 'static,
    A: 'static,
    E: 'static,
{
    /// Dispatch `action` during construction
    ///
    /// Without an explicit [`state`](Self::state) the reducer starts from
    /// `S::default()`.
    pub fn bootstrap(mut self, action: A) -> Self {
        self.seed = Some(S::default);
        self.bootstrap = Some(action);
        self
    }
}

fn state_eq<S: PartialEq>(old: &S, new: &S) -> bool {
    old == new
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{intercept, Interceptor, LoggingMiddleware};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct AppState {
        counter: i32,
        label: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Increment,
        Add(i32),
        Rename(&'static str),
        Touch,
        Reenter,
    }

    #[derive(Default)]
    struct Env {
        reenter: Option<Dispatcher<AppState, Action>>,
        reductions: usize,
    }

    fn reduce(state: &mut AppState, action: Action, env: &mut Env) -> Option<EffectJob<Action>> {
        env.reductions += 1;
        match action {
            Action::Increment => state.counter += 1,
            Action::Add(n) => state.counter += n,
            Action::Rename(label) => state.label = label.to_string(),
            Action::Touch => {}
            Action::Reenter => {
                if let Some(dispatcher) = &env.reenter {
                    dispatcher.dispatch(Action::Increment);
                }
            }
        }
        None
    }

    fn store() -> Store<AppState, Action, Env> {
        Store::builder(reduce, Env::default())
            .state(AppState::default())
            .build()
    }

    #[derive(Default)]
    struct Recorder<T> {
        seen: RefCell<Vec<T>>,
    }

    impl<T: Clone> StoreSubscriber<T> for Recorder<T> {
        fn new_state(&self, state: &T) {
            self.seen.borrow_mut().push(state.clone());
        }
    }

    impl<T: Clone> Recorder<T> {
        fn seen(&self) -> Vec<T> {
            self.seen.borrow().clone()
        }
    }

    #[test]
    fn test_state_is_fold_of_actions() {
        let store = store();
        let actions = vec![
            Action::Increment,
            Action::Add(5),
            Action::Rename("x"),
            Action::Add(-2),
        ];

        let mut expected = AppState::default();
        for action in actions.clone() {
            reduce(&mut expected, action, &mut Env::default());
        }
        for action in actions {
            store.dispatch(action);
        }

        assert_eq!(store.state(), Some(expected));
        assert_eq!(store.with_environment(|env| env.reductions), 4);
    }

    #[test]
    #[should_panic(expected = "reentrant dispatch")]
    fn test_dispatch_from_reducer_panics() {
        let store = store();
        let dispatcher = store.dispatcher();
        store.with_environment_mut(|env| env.reenter = Some(dispatcher));

        store.dispatch(Action::Reenter);
    }

    #[test]
    #[should_panic(expected = "missing state")]
    fn test_dispatch_without_state_panics() {
        let store = Store::builder(reduce, Env::default()).build();
        store.dispatch(Action::Increment);
    }

    #[test]
    fn test_bootstrap_action_seeds_state() {
        let store = Store::builder(reduce, Env::default())
            .bootstrap(Action::Add(10))
            .build();

        assert_eq!(store.with_state(|s| s.counter), Some(10));
    }

    #[test]
    fn test_subscribe_delivers_current_state_immediately() {
        let store = store();
        store.dispatch(Action::Add(3));

        let recorder = Rc::new(Recorder::<AppState>::default());
        store.subscribe(&recorder);

        assert_eq!(recorder.seen().len(), 1);
        assert_eq!(recorder.seen()[0].counter, 3);
    }

    #[test]
    fn test_plain_subscription_skips_unchanged_state() {
        let store = store();
        let recorder = Rc::new(Recorder::<AppState>::default());
        store.subscribe(&recorder);

        store.dispatch(Action::Touch);
        store.dispatch(Action::Touch);
        store.dispatch(Action::Increment);

        assert_eq!(recorder.seen().len(), 2);
    }

    #[test]
    fn test_auto_skip_repeats_can_be_disabled() {
        let store = Store::builder(reduce, Env::default())
            .state(AppState::default())
            .auto_skip_repeats(false)
            .build();
        let recorder = Rc::new(Recorder::<AppState>::default());
        store.subscribe(&recorder);

        store.dispatch(Action::Touch);
        store.dispatch(Action::Touch);

        assert_eq!(recorder.seen().len(), 3);
    }

    #[test]
    fn test_config_disables_auto_skip_repeats() {
        let config = StoreConfig {
            auto_skip_repeats: false,
            ..StoreConfig::default()
        };
        let store = Store::builder(reduce, Env::default())
            .state(AppState::default())
            .config(&config)
            .build();
        let recorder = Rc::new(Recorder::<i32>::default());
        store.subscribe_with(&recorder, |s| s.select(|state| state.counter));

        store.dispatch(Action::Touch);

        assert_eq!(recorder.seen(), vec![0, 0]);
    }

    #[test]
    fn test_projection_skips_repeats_automatically() {
        let store = store();
        let recorder = Rc::new(Recorder::<i32>::default());
        store.subscribe_with(&recorder, |s| s.select(|state| state.counter));

        store.dispatch(Action::Rename("a"));
        store.dispatch(Action::Increment);
        store.dispatch(Action::Rename("b"));

        assert_eq!(recorder.seen(), vec![0, 1]);
    }

    #[test]
    fn test_unfiltered_projection_sees_every_replacement() {
        let store = store();
        let recorder = Rc::new(Recorder::<i32>::default());
        store.subscribe_unfiltered(&recorder, |s| s.select(|state| state.counter));

        store.dispatch(Action::Touch);
        store.dispatch(Action::Touch);

        assert_eq!(recorder.seen(), vec![0, 0, 0]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = store();
        let recorder = Rc::new(Recorder::<AppState>::default());
        store.subscribe(&recorder);
        store.unsubscribe(&recorder);
        store.unsubscribe(&recorder); // no-op when absent

        store.dispatch(Action::Increment);

        assert_eq!(recorder.seen().len(), 1);
        assert_eq!(store.subscription_count(), 0);
    }

    #[test]
    fn test_resubscribe_replaces_entry() {
        let store = store();
        let recorder = Rc::new(Recorder::<AppState>::default());
        store.subscribe(&recorder);
        store.subscribe(&recorder);

        store.dispatch(Action::Increment);

        assert_eq!(store.subscription_count(), 1);
        // Two initial notifications, one for the change
        assert_eq!(recorder.seen().len(), 3);
    }

    #[test]
    fn test_released_subscriber_is_pruned() {
        let store = store();
        let recorder = Rc::new(Recorder::<AppState>::default());
        store.subscribe(&recorder);
        let weak = Rc::downgrade(&recorder);

        assert_eq!(Rc::strong_count(&recorder), 1);
        drop(recorder);
        assert!(weak.upgrade().is_none());

        store.dispatch(Action::Increment);
        assert_eq!(store.inner.subscriptions.borrow().len(), 0);
    }

    struct Chain {
        store: Store<AppState, Action, Env>,
        seen: RefCell<Vec<i32>>,
    }

    impl StoreSubscriber<i32> for Chain {
        fn new_state(&self, counter: &i32) {
            self.seen.borrow_mut().push(*counter);
            if *counter == 1 {
                self.store.dispatch(Action::Increment);
            }
        }
    }

    #[test]
    fn test_subscriber_may_dispatch_during_notification() {
        let store = store();
        let chain = Rc::new(Chain {
            store: store.clone(),
            seen: RefCell::new(Vec::new()),
        });
        store.subscribe_with(&chain, |s| s.select(|state| state.counter));

        store.dispatch(Action::Increment);

        assert_eq!(*chain.seen.borrow(), vec![0, 1, 2]);
        assert_eq!(store.with_state(|s| s.counter), Some(2));
    }

    #[test]
    fn test_dispatch_during_notification_never_leaves_later_subscriber_stale() {
        let store = store();
        let chain = Rc::new(Chain {
            store: store.clone(),
            seen: RefCell::new(Vec::new()),
        });
        let later = Rc::new(Recorder::<i32>::default());
        store.subscribe_with(&chain, |s| s.select(|state| state.counter));
        store.subscribe_with(&later, |s| s.select(|state| state.counter));

        store.dispatch(Action::Increment);

        assert_eq!(store.with_state(|s| s.counter), Some(2));
        assert_eq!(*chain.seen.borrow(), vec![0, 1, 2]);
        assert_eq!(later.seen(), vec![0, 1, 2]);
    }

    /// Unsubscribes `target` once the counter reaches 1
    struct Unsubscriber {
        store: Store<AppState, Action, Env>,
        target: Rc<Recorder<i32>>,
    }

    impl StoreSubscriber<i32> for Unsubscriber {
        fn new_state(&self, counter: &i32) {
            if *counter == 1 {
                self.store.unsubscribe(&self.target);
            }
        }
    }

    #[test]
    fn test_subscriber_removed_during_notification_is_skipped() {
        let store = store();
        let target = Rc::new(Recorder::<i32>::default());
        let unsubscriber = Rc::new(Unsubscriber {
            store: store.clone(),
            target: Rc::clone(&target),
        });
        store.subscribe_with(&unsubscriber, |s| s.select(|state| state.counter));
        store.subscribe_with(&target, |s| s.select(|state| state.counter));

        store.dispatch(Action::Increment);
        store.dispatch(Action::Increment);

        assert_eq!(target.seen(), vec![0]);
        assert_eq!(store.subscription_count(), 1);
    }

    /// Subscribes `recruit` once the counter reaches 1
    struct Recruiter {
        store: Store<AppState, Action, Env>,
        recruit: Rc<Recorder<i32>>,
    }

    impl StoreSubscriber<i32> for Recruiter {
        fn new_state(&self, counter: &i32) {
            if *counter == 1 {
                self.store
                    .subscribe_with(&self.recruit, |s| s.select(|state| state.counter));
            }
        }
    }

    #[test]
    fn test_subscriber_added_during_notification_joins_next_pass() {
        let store = store();
        let recruit = Rc::new(Recorder::<i32>::default());
        let recruiter = Rc::new(Recruiter {
            store: store.clone(),
            recruit: Rc::clone(&recruit),
        });
        store.subscribe_with(&recruiter, |s| s.select(|state| state.counter));

        store.dispatch(Action::Increment);
        // Only the initial notification so far
        assert_eq!(recruit.seen(), vec![1]);

        store.dispatch(Action::Increment);
        assert_eq!(recruit.seen(), vec![1, 2]);
        assert_eq!(store.subscription_count(), 2);
    }

    fn recording(
        tag: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    ) -> Box<dyn Middleware<AppState, Action>> {
        Box::new(move |_api: MiddlewareApi<AppState, Action>, next: DispatchFn<Action>| {
            let log = Rc::clone(&log);
            dispatch_fn(move |action: Action| {
                log.borrow_mut().push(format!("{tag} {action:?}"));
                next(action);
            })
        })
    }

    #[test]
    fn test_middleware_runs_in_configured_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let store = Store::builder(reduce, Env::default())
            .state(AppState::default())
            .middlewares(vec![
                recording("m1", Rc::clone(&log)),
                recording("m2", Rc::clone(&log)),
            ])
            .middleware(LoggingMiddleware::new())
            .build();

        store.dispatch(Action::Increment);
        store.dispatch(Action::Touch);

        assert_eq!(
            *log.borrow(),
            vec!["m1 Increment", "m2 Increment", "m1 Touch", "m2 Touch"]
        );
        assert_eq!(store.middleware_count(), 3);
    }

    /// Expands `Add(n)` into `n` increments
    struct Expand;

    impl Interceptor<AppState, Action> for Expand {
        fn handle(
            &self,
            action: &Action,
            _state: Option<&AppState>,
            dispatcher: &Dispatcher<AppState, Action>,
        ) -> bool {
            match action {
                Action::Add(n) => {
                    for _ in 0..*n {
                        dispatcher.dispatch(Action::Increment);
                    }
                    false
                }
                _ => true,
            }
        }
    }

    #[test]
    fn test_middleware_can_dispatch_and_consume() {
        let store = Store::builder(reduce, Env::default())
            .state(AppState::default())
            .middleware(intercept(Expand))
            .build();

        store.dispatch(Action::Add(3));

        assert_eq!(store.with_state(|s| s.counter), Some(3));
        assert_eq!(store.with_environment(|env| env.reductions), 3);
    }

    #[test]
    fn test_set_middleware_rebuilds_pipeline_once() {
        let builds = Rc::new(Cell::new(0));
        let counter = Rc::clone(&builds);
        let counting = move |_api: MiddlewareApi<AppState, Action>, next: DispatchFn<Action>| {
            counter.set(counter.get() + 1);
            next
        };

        let store = store();
        let middleware: Vec<Box<dyn Middleware<AppState, Action>>> =
            vec![Box::new(counting), Box::new(intercept(Expand))];
        store.set_middleware(middleware);
        store.dispatch(Action::Add(2));
        store.dispatch(Action::Add(1));

        assert_eq!(builds.get(), 1);
        assert_eq!(store.with_state(|s| s.counter), Some(3));

        store.set_middleware(Vec::new());
        store.dispatch(Action::Add(10));
        assert_eq!(store.with_state(|s| s.counter), Some(13));
    }

    #[test]
    fn test_middleware_handles_outlive_store() {
        let captured: Rc<RefCell<Option<MiddlewareApi<AppState, Action>>>> =
            Rc::new(RefCell::new(None));
        let slot = Rc::clone(&captured);
        let capture = move |api: MiddlewareApi<AppState, Action>, next: DispatchFn<Action>| {
            *slot.borrow_mut() = Some(api);
            next
        };

        let store = Store::builder(reduce, Env::default())
            .state(AppState::default())
            .middleware(capture)
            .build();
        store.dispatch(Action::Increment);
        drop(store);

        let api = captured.borrow_mut().take().unwrap();
        assert!(!api.dispatcher.is_connected());
        api.dispatcher.dispatch(Action::Increment);
        assert_eq!(api.state.get(), None);
    }
}
