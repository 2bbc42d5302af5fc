//! The work function invoked by the task queue: fetch + analyze one page.

mod fake;
mod http;

pub use fake::FakeAnalyzer;
pub use http::HttpAnalyzer;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PageMetrics;

/// A handle the analyzer polls at coarse checkpoints to observe cooperative
/// cancellation. Backed by the queue's own locked accessor so that reads of
/// `stop` are serialized with the rest of a task's fields rather than racing
/// through a bare shared atomic.
pub trait StopSignal: Send + Sync {
    fn is_stopped(&self) -> bool;
}

/// Implemented by the production HTTP+HTML analyzer and by fakes used in
/// queue tests. `analyze` should poll `cancel.is_stopped()` periodically and
/// return early (any `Err` is acceptable) once it observes cancellation — the
/// pool distinguishes a cooperative stop from a real analysis failure by
/// checking the task's stop flag at publication time, not by inspecting this
/// error.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, url: &str, cancel: &dyn StopSignal) -> Result<PageMetrics>;
}
