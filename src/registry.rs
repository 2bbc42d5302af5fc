//! Authoritative store of every submitted URL and its processed result.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::model::{PageMetrics, UrlId, UrlRecord, UrlState};

/// Thread-safe id -> URLRecord store.
///
/// The id counter is guarded by its own short-held mutex so that allocating a
/// new id never contends with readers of the record map. All other operations
/// are total: a missing id is a silent no-op for mutators and an absent result
/// for readers, never a panic.
pub struct UrlRegistry {
    records: RwLock<HashMap<UrlId, UrlRecord>>,
    next_id: Mutex<UrlId>,
}

impl Default for UrlRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    fn allocate_id(&self) -> UrlId {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        *next_id += 1;
        id
    }

    /// Allocates a new id and inserts a `pending` record for `url`.
    pub fn add(&self, url: impl Into<String>) -> UrlRecord {
        let id = self.allocate_id();
        let record = UrlRecord {
            id,
            url: url.into(),
            state: UrlState::Pending,
            processed_data: None,
            uploaded_at: Utc::now(),
        };
        self.records.write().insert(id, record.clone());
        record
    }

    /// Overwrites the record's state. No-op if `id` is unknown. Does not
    /// validate that the transition is legal — the queue owns that.
    pub fn set_state(&self, id: UrlId, state: UrlState) {
        if let Some(record) = self.records.write().get_mut(&id) {
            record.state = state;
        }
    }

    /// Publishes a successful analysis: sets `state=completed`, stores the
    /// metrics, and stamps `processing_finished`.
    pub fn publish_result(&self, id: UrlId, mut metrics: PageMetrics) {
        metrics.processing_finished = Utc::now();
        if let Some(record) = self.records.write().get_mut(&id) {
            record.state = UrlState::Completed;
            record.processed_data = Some(metrics);
        }
    }

    pub fn get(&self, id: UrlId) -> Option<UrlRecord> {
        self.records.read().get(&id).cloned()
    }

    pub fn list(&self) -> Vec<UrlRecord> {
        self.records.read().values().cloned().collect()
    }

    /// Returns the record's state, or `None` if `id` is unknown.
    pub fn get_state(&self, id: UrlId) -> Option<UrlState> {
        self.records.read().get(&id).map(|r| r.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_allocates_increasing_ids() {
        let registry = UrlRegistry::new();
        let a = registry.add("https://a.example");
        let b = registry.add("https://b.example");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.state, UrlState::Pending);
    }

    #[test]
    fn set_state_is_noop_for_unknown_id() {
        let registry = UrlRegistry::new();
        registry.set_state(42, UrlState::Processing);
        assert_eq!(registry.get_state(42), None);
    }

    #[test]
    fn publish_result_sets_completed_and_stamps_time() {
        let registry = UrlRegistry::new();
        let record = registry.add("https://a.example");
        let metrics = PageMetrics {
            html_version: "HTML5".into(),
            page_title: "Title".into(),
            heading_tags_count: HashMap::new(),
            internal_links: 0,
            external_links: 0,
            inaccessible_links: 0,
            has_login_form: false,
            processing_finished: Utc::now() - chrono::Duration::days(1),
        };
        let before = Utc::now();
        registry.publish_result(record.id, metrics);
        let after = registry.get(record.id).unwrap();
        assert_eq!(after.state, UrlState::Completed);
        let stamped = after.processed_data.unwrap().processing_finished;
        assert!(stamped >= before);
    }

    #[test]
    fn list_returns_all_records() {
        let registry = UrlRegistry::new();
        registry.add("https://a.example");
        registry.add("https://b.example");
        assert_eq!(registry.list().len(), 2);
    }
}
