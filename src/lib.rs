//! A concurrent job-management core for analyzing submitted web page URLs.
//!
//! This crate accepts URLs, runs a bounded worker pool that fetches and
//! parses each page's HTML structure, and exposes per-URL lifecycle state
//! (pending, processing, completed, failed, stopped) to callers. The three
//! collaborating pieces are:
//!
//! - [`registry`] — the authoritative id → [`model::UrlRecord`] store.
//! - [`queue`] — the bounded worker pool that schedules and executes
//!   analyses, with cooperative cancellation and idempotent resubmission.
//! - [`analyzer`] — the work function the pool invokes per task (HTTP fetch
//!   + HTML structural analysis).
//!
//! [`api`] wires these into a minimal `axum` HTTP surface; [`config`] sources
//! process-level settings; [`error`] is the typed error surface shared by the
//! core.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use url_inspector::analyzer::HttpAnalyzer;
//! use url_inspector::queue::TaskQueue;
//! use url_inspector::registry::UrlRegistry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(UrlRegistry::new());
//!     let analyzer = Arc::new(HttpAnalyzer::new(Duration::from_secs(10))?);
//!     let queue = Arc::new(TaskQueue::new(10, registry.clone(), analyzer)?);
//!
//!     let record = registry.add("https://example.com");
//!     queue.submit(record.id, &record.url);
//!
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod queue;
pub mod registry;
pub mod task;

pub use analyzer::{Analyzer, FakeAnalyzer, HttpAnalyzer, StopSignal};
pub use config::Config;
pub use error::{CoreError, Result};
pub use model::{PageMetrics, UrlId, UrlRecord, UrlState};
pub use queue::TaskQueue;
pub use registry::UrlRegistry;
pub use task::Task;
