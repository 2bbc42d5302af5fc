//! Bounded concurrent execution of analysis tasks.
//!
//! Two independently-locked structures cooperate here: the registry (one
//! `RwLock` over the id -> record map) and the queue (one `Mutex` over the
//! id -> task map, which also guards every task's `stop`/`done`/`result`/
//! `err`/`local_state` fields). The queue never holds its own mutex while
//! calling into the registry — every registry call happens strictly after
//! the queue's guard is dropped — so the two locks are never held at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::analyzer::{Analyzer, StopSignal};
use crate::error::{CoreError, Result};
use crate::model::{UrlId, UrlState};
use crate::registry::UrlRegistry;
use crate::task::Task;

/// How long an idle worker sleeps before re-scanning for pending work. Not a
/// correctness knob, just a bound on wasted CPU.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

struct Inner<A: Analyzer + 'static> {
    tasks: Mutex<HashMap<UrlId, Task>>,
    registry: Arc<UrlRegistry>,
    analyzer: Arc<A>,
    semaphore: Arc<Semaphore>,
}

/// Observes one task's stop flag through the queue's mutex. Handed to the
/// analyzer instead of a bare shared atomic so every read is serialized with
/// the rest of the task's fields.
struct Cancellation<A: Analyzer + 'static> {
    inner: Arc<Inner<A>>,
    id: UrlId,
}

impl<A: Analyzer + 'static> StopSignal for Cancellation<A> {
    fn is_stopped(&self) -> bool {
        self.inner
            .tasks
            .lock()
            .get(&self.id)
            .map(|t| t.stop)
            .unwrap_or(true)
    }
}

/// A fixed-size pool of workers executing analysis tasks, bounded by a
/// counting semaphore of capacity `W`.
pub struct TaskQueue<A: Analyzer + 'static> {
    inner: Arc<Inner<A>>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl<A: Analyzer + 'static> Drop for TaskQueue<A> {
    fn drop(&mut self) {
        for handle in &self.worker_handles {
            handle.abort();
        }
    }
}

impl<A: Analyzer + 'static> TaskQueue<A> {
    /// Spawns `worker_count` long-running workers. `worker_count` must be in
    /// `1..=100`.
    pub fn new(worker_count: usize, registry: Arc<UrlRegistry>, analyzer: Arc<A>) -> Result<Self> {
        if !(1..=100).contains(&worker_count) {
            return Err(CoreError::InvalidConfig(format!(
                "worker_count must be in 1..=100, got {worker_count}"
            )));
        }

        let inner = Arc::new(Inner {
            tasks: Mutex::new(HashMap::new()),
            registry,
            analyzer,
            semaphore: Arc::new(Semaphore::new(worker_count)),
        });

        let worker_handles = (0..worker_count)
            .map(|idx| {
                let inner = inner.clone();
                tokio::spawn(Self::worker_loop(inner, idx))
            })
            .collect();

        Ok(Self {
            inner,
            worker_handles,
        })
    }

    /// Admits a new task, resets a terminal one, or returns the existing
    /// in-flight task unchanged. Never errors.
    #[instrument(skip(self), fields(id = record_id))]
    pub fn submit(&self, record_id: UrlId, url: &str) -> Task {
        // Read registry state before taking the queue mutex: the two locks
        // are never held together.
        let registry_state = self.inner.registry.get_state(record_id);

        let mut tasks = self.inner.tasks.lock();
        match tasks.get_mut(&record_id) {
            None => {
                let task = Task::new(record_id, url.to_string());
                tasks.insert(record_id, task.clone());
                task
            }
            Some(existing) if registry_state.is_some_and(UrlState::is_terminal) => {
                existing.reset(url.to_string());
                let snapshot = existing.clone();
                drop(tasks);
                self.inner.registry.set_state(record_id, UrlState::Pending);
                snapshot
            }
            Some(existing) => existing.clone(),
        }
    }

    /// Signals cooperative cancellation for `id`. Errors with `NotFound` if
    /// no task exists. A no-op (returning the task unchanged) if already
    /// stopped.
    #[instrument(skip(self))]
    pub fn stop(&self, id: UrlId) -> Result<Task> {
        let mut tasks = self.inner.tasks.lock();
        let task = tasks.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        if task.stop {
            return Ok(task.clone());
        }
        task.stop = true;
        task.local_state = UrlState::Stopped;
        let snapshot = task.clone();
        drop(tasks);
        self.inner.registry.set_state(id, UrlState::Stopped);
        Ok(snapshot)
    }

    pub fn get(&self, id: UrlId) -> Option<Task> {
        self.inner.tasks.lock().get(&id).cloned()
    }

    pub fn contains(&self, id: UrlId) -> bool {
        self.inner.tasks.lock().contains_key(&id)
    }

    async fn worker_loop(inner: Arc<Inner<A>>, worker_idx: usize) {
        loop {
            let permit = match inner.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // semaphore closed: queue is being torn down
            };

            let picked = {
                let mut tasks = inner.tasks.lock();
                let found_id = tasks
                    .iter()
                    .find(|(_, task)| task.local_state == UrlState::Pending)
                    .map(|(id, _)| *id);
                found_id.map(|id| {
                    let task = tasks.get_mut(&id).expect("id just found in the same scan");
                    task.local_state = UrlState::Processing;
                    (id, task.url.clone())
                })
            };

            let Some((id, url)) = picked else {
                drop(permit);
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                continue;
            };

            debug!(worker = worker_idx, id, "claimed task");
            inner.registry.set_state(id, UrlState::Processing);

            let inner = inner.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::run_and_publish(inner, id, url).await;
            });
        }
    }

    async fn run_and_publish(inner: Arc<Inner<A>>, id: UrlId, url: String) {
        let cancel = Cancellation {
            inner: inner.clone(),
            id,
        };
        let outcome = inner.analyzer.analyze(&url, &cancel).await;

        enum Publish {
            Stopped,
            Completed(crate::model::PageMetrics),
            Failed,
        }

        let action = {
            let mut tasks = inner.tasks.lock();
            let Some(task) = tasks.get_mut(&id) else {
                warn!(id, "task missing at publication time; dropping result");
                return;
            };
            let action = if task.stop {
                Publish::Stopped
            } else {
                match outcome {
                    Ok(metrics) => {
                        task.result = Some(metrics.clone());
                        task.local_state = UrlState::Completed;
                        Publish::Completed(metrics)
                    }
                    Err(err) => {
                        task.err = Some(err.to_string());
                        task.local_state = UrlState::Failed;
                        Publish::Failed
                    }
                }
            };
            task.done = true;
            action
        };

        match action {
            Publish::Stopped => inner.registry.set_state(id, UrlState::Stopped),
            Publish::Completed(metrics) => inner.registry.publish_result(id, metrics),
            Publish::Failed => inner.registry.set_state(id, UrlState::Failed),
        }
    }
}

#[cfg(test)]
mod tests;
