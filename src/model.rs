//! Shared data types for the registry, queue, and analyzer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monotonically assigned, process-unique id for a submitted URL.
pub type UrlId = u64;

/// Lifecycle state of a URLRecord / Task pair.
///
/// Transitions are confined to `pending -> processing`, `processing -> {completed,
/// failed, stopped}`, and any terminal state back to `pending` via explicit
/// resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlState {
    Pending,
    Processing,
    Stopped,
    Completed,
    Failed,
}

impl UrlState {
    pub fn is_terminal(self) -> bool {
        matches!(self, UrlState::Stopped | UrlState::Completed | UrlState::Failed)
    }
}

/// Structural metrics produced by analyzing one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub html_version: String,
    pub page_title: String,
    pub heading_tags_count: HashMap<String, u32>,
    pub internal_links: u32,
    pub external_links: u32,
    pub inaccessible_links: u32,
    pub has_login_form: bool,
    pub processing_finished: DateTime<Utc>,
}

/// A submitted URL and everything the registry knows about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: UrlId,
    pub url: String,
    pub state: UrlState,
    pub processed_data: Option<PageMetrics>,
    pub uploaded_at: DateTime<Utc>,
}
