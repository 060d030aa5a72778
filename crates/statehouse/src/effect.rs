//! Effect jobs and the registry that owns them
//!
//! A reducer may return an [`EffectJob`]: a future that eventually resolves to
//! a follow-up action (or fails). The store spawns it on the local task set,
//! keeps its abort handle in the [`EffectRegistry`] and removes the entry once
//! the job has finished.
//!
//! ```text
//! reducer ──► EffectJob ──spawn_local──► task ──Ok(action)──► dispatch
//!                              │                  └─Err(e)──► log::error!
//!                              └── AbortHandle ──► EffectRegistry
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::task::AbortHandle;

/// Asynchronous follow-up work produced by a reducer.
///
/// Jobs run on the store's thread, so they do not need to be `Send`.
pub type EffectJob<A> = Pin<Box<dyn Future<Output = anyhow::Result<A>> + 'static>>;

/// Box a future into an [`EffectJob`]
///
/// ```ignore
/// Action::Fetch => Some(effect(async move {
///     let value = client.fetch().await?;
///     Ok(Action::Loaded(value))
/// })),
/// ```
pub fn effect<A, F>(future: F) -> EffectJob<A>
where
    F: Future<Output = anyhow::Result<A>> + 'static,
{
    Box::pin(future)
}

/// Identifier of a spawned effect job, unique per store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Tracks in-flight effect jobs so they can be cancelled in bulk
#[derive(Debug, Default)]
pub struct EffectRegistry {
    next_id: u64,
    jobs: HashMap<JobId, AbortHandle>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for the next job
    pub fn next_id(&mut self) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Remember the abort handle of a running job
    pub fn register(&mut self, id: JobId, handle: AbortHandle) {
        log::debug!("EffectRegistry: registered {}", id);
        self.jobs.insert(id, handle);
    }

    /// Forget a finished job
    ///
    /// Returns `false` if the job was not registered (already cancelled).
    pub fn complete(&mut self, id: JobId) -> bool {
        self.jobs.remove(&id).is_some()
    }

    /// Abort every registered job and clear the registry
    ///
    /// Cancellation is cooperative: a job stops at its next await point.
    /// Returns the number of jobs that were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.jobs.len();
        for (id, handle) in self.jobs.drain() {
            log::debug!("EffectRegistry: cancelling {}", id);
            handle.abort();
        }
        count
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
