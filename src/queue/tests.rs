use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::*;
use crate::analyzer::FakeAnalyzer;
use crate::model::PageMetrics;
use crate::registry::UrlRegistry;

async fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let step = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    while waited < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    predicate()
}

#[tokio::test]
async fn s1_happy_path() {
    let registry = Arc::new(UrlRegistry::new());
    let fixture = PageMetrics {
        html_version: "HTML5".to_string(),
        page_title: "T".to_string(),
        heading_tags_count: HashMap::from([("h1".to_string(), 1)]),
        internal_links: 2,
        external_links: 0,
        inaccessible_links: 0,
        has_login_form: false,
        processing_finished: Utc::now(),
    };
    let analyzer =
        Arc::new(FakeAnalyzer::new(Duration::from_millis(50)).with_metrics(fixture.clone()));
    let queue = TaskQueue::new(2, registry.clone(), analyzer).unwrap();

    let record = registry.add("https://example.com");
    queue.submit(record.id, &record.url);

    let completed = wait_until(Duration::from_secs(2), || {
        registry.get_state(record.id) == Some(UrlState::Completed)
    })
    .await;
    assert!(completed, "task did not reach completed");

    let stored = registry.get(record.id).unwrap();
    let stamped = stored.processed_data.clone().unwrap().processing_finished;
    let expected = PageMetrics {
        processing_finished: stamped,
        ..fixture
    };
    assert_eq!(stored.processed_data, Some(expected));
}

#[tokio::test]
async fn s2_cancel_mid_flight() {
    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_secs(2)));
    let queue = TaskQueue::new(1, registry.clone(), analyzer).unwrap();

    let record = registry.add("https://example.com/slow");
    queue.submit(record.id, &record.url);

    tokio::time::sleep(Duration::from_millis(300)).await;
    queue.stop(record.id).unwrap();

    let stopped = wait_until(Duration::from_millis(800), || {
        registry.get_state(record.id) == Some(UrlState::Stopped)
    })
    .await;
    assert!(stopped, "task did not stop in time");

    let stored = registry.get(record.id).unwrap();
    assert!(stored.processed_data.is_none());
    assert!(queue.get(record.id).unwrap().done);
}

#[tokio::test]
async fn s3_bounded_concurrency() {
    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_millis(200)));
    let queue = TaskQueue::new(2, registry.clone(), analyzer.clone()).unwrap();

    let records: Vec<_> = (0..5).map(|i| registry.add(format!("https://example.com/{i}"))).collect();
    for record in &records {
        queue.submit(record.id, &record.url);
    }

    let all_done = wait_until(Duration::from_secs(3), || {
        records
            .iter()
            .all(|r| registry.get_state(r.id) == Some(UrlState::Completed))
    })
    .await;
    assert!(all_done, "not all tasks completed");

    assert!(analyzer.max_in_flight() <= 2, "exceeded worker bound");
    assert!(analyzer.max_in_flight() >= 1, "no analyses ever ran");
}

#[tokio::test]
async fn s4_reset_after_completion() {
    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_millis(50)));
    let queue = TaskQueue::new(2, registry.clone(), analyzer).unwrap();

    let record = registry.add("https://example.com/reset");
    queue.submit(record.id, &record.url);
    wait_until(Duration::from_secs(2), || {
        registry.get_state(record.id) == Some(UrlState::Completed)
    })
    .await;
    let first_finished = registry.get(record.id).unwrap().processed_data.unwrap().processing_finished;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let task = queue.submit(record.id, &record.url);
    assert_eq!(task.local_state, UrlState::Pending);
    assert_eq!(registry.get_state(record.id), Some(UrlState::Pending));

    wait_until(Duration::from_secs(2), || {
        registry.get_state(record.id) == Some(UrlState::Completed)
            && registry.get(record.id).unwrap().processed_data.unwrap().processing_finished > first_finished
    })
    .await;

    let second_finished = registry.get(record.id).unwrap().processed_data.unwrap().processing_finished;
    assert!(second_finished > first_finished);
}

#[tokio::test]
async fn s5_conflict_on_double_submit() {
    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_millis(300)));
    let queue = TaskQueue::new(2, registry.clone(), analyzer).unwrap();

    let record = registry.add("https://example.com/busy");
    queue.submit(record.id, &record.url);

    wait_until(Duration::from_secs(1), || {
        registry.get_state(record.id) == Some(UrlState::Processing)
    })
    .await;

    let resubmitted = queue.submit(record.id, &record.url);
    assert!(!resubmitted.done);
    assert_eq!(registry.get_state(record.id), Some(UrlState::Processing));
}

#[tokio::test]
async fn s6_unknown_stop() {
    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_millis(50)));
    let queue = TaskQueue::new(1, registry, analyzer).unwrap();

    let result = queue.stop(9999);
    assert!(matches!(result, Err(CoreError::NotFound(9999))));
}

#[tokio::test]
async fn construction_rejects_zero_workers() {
    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_millis(10)));
    let result = TaskQueue::new(0, registry, analyzer);
    assert!(result.is_err());
}
