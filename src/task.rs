//! The per-submission execution handle tracked by the task queue.

use crate::model::{PageMetrics, UrlId, UrlState};

/// Execution handle for analyzing one URL. 1:1 with a [`crate::model::UrlRecord`].
///
/// All fields are mutated only while the owning queue's mutex is held; see
/// the queue's module docs for the locking discipline.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: UrlId,
    pub url: String,
    pub result: Option<PageMetrics>,
    pub err: Option<String>,
    pub done: bool,
    pub stop: bool,
    /// Advisory cache used only for lock-free scheduling; the registry's
    /// state is what callers observe. See the queue module for why this
    /// exists separately from the registry's state.
    pub(crate) local_state: UrlState,
}

impl Task {
    pub fn new(id: UrlId, url: String) -> Self {
        Self {
            id,
            url,
            result: None,
            err: None,
            done: false,
            stop: false,
            local_state: UrlState::Pending,
        }
    }

    /// Resets a terminal task back to a fresh pending run, keeping the id.
    pub fn reset(&mut self, url: String) {
        self.url = url;
        self.result = None;
        self.err = None;
        self.done = false;
        self.stop = false;
        self.local_state = UrlState::Pending;
    }
}
