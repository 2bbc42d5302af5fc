//! A deterministic, in-process analyzer used by queue scheduling tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{Analyzer, StopSignal};
use crate::error::{CoreError, Result};
use crate::model::PageMetrics;

/// Stands in for [`super::HttpAnalyzer`] in tests: returns a fixed metrics
/// value (or a fixed error) after sleeping for a configurable duration,
/// polling the stop signal while it sleeps so scenario tests can exercise
/// cooperative cancellation. Tracks how many analyses are in flight at once
/// so bounded-concurrency assertions don't need external instrumentation.
pub struct FakeAnalyzer {
    delay: Duration,
    fail: bool,
    poll_interval: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    metrics: Mutex<Option<PageMetrics>>,
}

impl FakeAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            poll_interval: Duration::from_millis(20),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            metrics: Mutex::new(None),
        }
    }

    pub fn failing(delay: Duration) -> Self {
        Self {
            fail: true,
            ..Self::new(delay)
        }
    }

    pub fn with_metrics(mut self, metrics: PageMetrics) -> Self {
        self.metrics = Mutex::new(Some(metrics));
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn sample_metrics(&self) -> PageMetrics {
        self.metrics.lock().clone().unwrap_or_else(default_metrics)
    }
}

fn default_metrics() -> PageMetrics {
    PageMetrics {
        html_version: "HTML5".to_string(),
        page_title: "fake".to_string(),
        heading_tags_count: Default::default(),
        internal_links: 0,
        external_links: 0,
        inaccessible_links: 0,
        has_login_form: false,
        processing_finished: Utc::now(),
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, _url: &str, cancel: &dyn StopSignal) -> Result<PageMetrics> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let mut elapsed = Duration::ZERO;
        while elapsed < self.delay {
            if cancel.is_stopped() {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                return Err(CoreError::CooperativeStop);
            }
            let step = self.poll_interval.min(self.delay - elapsed);
            tokio::time::sleep(step).await;
            elapsed += step;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            Err(CoreError::AnalysisFailure("fake analyzer configured to fail".to_string()))
        } else {
            Ok(self.sample_metrics())
        }
    }
}
