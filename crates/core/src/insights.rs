//! Advisory browsing-trend insights.
//!
//! After a successful upload the engine hands the history collection to an
//! [`InsightAnalyzer`] on a detached task: analysis failures are logged and
//! swallowed, never affecting the sync outcome. Results are published on a
//! `watch` channel the UI layer can poll or subscribe to.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::InsightError;

/// Maximum number of history records handed to the analyzer.
pub const MAX_INSIGHT_RECORDS: usize = 50;

/// A history record reduced to the fields the analyzer may see.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryDigest {
    pub title: String,
    pub url: String,
}

/// Advisory analysis result: a human-readable summary plus a short list of
/// recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncInsights {
    pub summary: String,
    pub recommendations: Vec<String>,
}

/// Trend-analysis collaborator contract.
#[async_trait]
pub trait InsightAnalyzer: Send + Sync {
    async fn analyze(&self, history: &[HistoryDigest]) -> Result<SyncInsights, InsightError>;
}

/// Reduce raw history records to at most [`MAX_INSIGHT_RECORDS`] digests,
/// keeping only title and URL.
pub fn digest_history(history: &[Value]) -> Vec<HistoryDigest> {
    history
        .iter()
        .take(MAX_INSIGHT_RECORDS)
        .map(|record| HistoryDigest {
            title: record
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            url: record
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Built-in analyzer
// ---------------------------------------------------------------------------

/// Analyzer that summarizes browsing trends from domain frequency, keeping
/// the engine self-contained when no external analysis service is wired in.
#[derive(Debug, Default)]
pub struct TrendAnalyzer;

#[async_trait]
impl InsightAnalyzer for TrendAnalyzer {
    async fn analyze(&self, history: &[HistoryDigest]) -> Result<SyncInsights, InsightError> {
        if history.is_empty() {
            return Err(InsightError::AnalysisFailed {
                reason: "no history records to analyze".into(),
            });
        }

        let mut domains: HashMap<String, usize> = HashMap::new();
        for record in history {
            if let Some(domain) = domain_of(&record.url) {
                *domains.entry(domain).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = domains.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let summary = format!(
            "{} recent pages across {} sites",
            history.len(),
            ranked.len()
        );
        let recommendations = ranked
            .iter()
            .take(3)
            .map(|(domain, count)| format!("You visited {} {} times recently", domain, count))
            .collect();

        Ok(SyncInsights {
            summary,
            recommendations,
        })
    }
}

/// Host portion of a URL, or `None` when there is none.
fn domain_of(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
