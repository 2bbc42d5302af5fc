//! Process-level configuration, sourced from CLI flags with environment
//! fallbacks. Read once at startup; validation of the worker count itself
//! happens at [`crate::queue::TaskQueue::new`], not here, so the invariant
//! holds regardless of how a queue is constructed.

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "url-inspector", about = "Concurrent URL analysis service")]
pub struct Config {
    /// Number of concurrent analysis workers.
    #[arg(long, env = "URL_INSPECTOR_WORKERS", default_value_t = 10)]
    pub workers: usize,

    /// Per-request HTTP client timeout, in milliseconds.
    #[arg(long, env = "URL_INSPECTOR_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Address the demonstration HTTP server binds to.
    #[arg(long, env = "URL_INSPECTOR_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
