//! Production analyzer: HTTP fetch + HTML structural analysis via `reqwest`
//! and `scraper`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use tracing::{instrument, warn};

use super::{Analyzer, StopSignal};
use crate::error::{CoreError, Result};
use crate::model::PageMetrics;

/// Detects the doctype declaration the way the original implementation did:
/// a document that *opens* with a doctype whose text contains the token
/// `html` (case-insensitive) is reported as `HTML5`; a doctype without that
/// token, or no doctype at all, is reported as `HTML 4.01`. Only the leading
/// declaration counts — the literal substring `<!doctype` appearing later in
/// the body (inside a comment, a script string, or user content) must not be
/// mistaken for the document's own doctype.
fn detect_html_version(body: &str) -> String {
    let lower = body.trim_start().to_ascii_lowercase();
    if !lower.starts_with("<!doctype") {
        return "HTML 4.01".to_string();
    }
    let end = lower.find('>').unwrap_or(lower.len());
    if lower[..end].contains("html") {
        "HTML5".to_string()
    } else {
        "HTML 4.01".to_string()
    }
}

/// Fetches a page over HTTP and reports its structural metrics, probing each
/// external link for reachability along the way.
pub struct HttpAnalyzer {
    client: reqwest::Client,
}

impl HttpAnalyzer {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::AnalysisFailure(e.to_string()))?;
        Ok(Self { client })
    }

    /// A link is inaccessible if the probe errors outright or returns a
    /// status in `[400, 600)`.
    async fn is_inaccessible(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                (400..600).contains(&code)
            }
            Err(_) => true,
        }
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    #[instrument(skip(self, cancel), fields(url = url))]
    async fn analyze(&self, url: &str, cancel: &dyn StopSignal) -> Result<PageMetrics> {
        if cancel.is_stopped() {
            return Err(CoreError::CooperativeStop);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::AnalysisFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::AnalysisFailure(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::AnalysisFailure(e.to_string()))?;

        if cancel.is_stopped() {
            return Err(CoreError::CooperativeStop);
        }

        let html_version = detect_html_version(&body);
        let document = Html::parse_document(&body);

        let title_selector = Selector::parse("title").expect("static selector");
        let page_title = document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();

        let mut heading_tags_count = HashMap::new();
        for level in 1..=6u8 {
            let tag = format!("h{level}");
            let selector = Selector::parse(&tag).expect("static selector");
            heading_tags_count.insert(tag, document.select(&selector).count() as u32);
        }

        let link_selector = Selector::parse("a[href]").expect("static selector");
        let mut internal_links = 0u32;
        let mut external_hrefs = Vec::new();
        for el in document.select(&link_selector) {
            if let Some(href) = el.value().attr("href") {
                if href.starts_with("http") {
                    external_hrefs.push(href.to_string());
                } else {
                    internal_links += 1;
                }
            }
        }

        let mut inaccessible_links = 0u32;
        for href in &external_hrefs {
            if cancel.is_stopped() {
                return Err(CoreError::CooperativeStop);
            }
            if self.is_inaccessible(href).await {
                inaccessible_links += 1;
            }
        }

        let form_selector = Selector::parse("form[action]").expect("static selector");
        let has_login_form = document
            .select(&form_selector)
            .any(|el| el.value().attr("action").is_some_and(|a| a.contains("login")));

        if cancel.is_stopped() {
            warn!(url, "analysis completed but stop was observed; pool will discard result");
            return Err(CoreError::CooperativeStop);
        }

        Ok(PageMetrics {
            html_version,
            page_title,
            heading_tags_count,
            internal_links,
            external_links: external_hrefs.len() as u32,
            inaccessible_links,
            has_login_form,
            processing_finished: Utc::now(),
        })
    }
}
