//! Keyword search collector.
//!
//! Issues one sub-query per configured keyword against a SearxNG-style JSON
//! search endpoint and flattens the results into one item sequence. A failed
//! keyword is logged and skipped; the remaining keywords still run.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::collect::Collector;
use crate::item::Item;

/// Results taken per keyword. Two headlines per query keeps the prompt
/// focused, matching the briefing format downstream.
const RESULTS_PER_KEYWORD: usize = 2;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Searches a JSON search endpoint for each configured keyword.
pub struct SearchCollector {
    endpoint: String,
    keywords: Vec<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
}

impl SearchCollector {
    pub fn new(endpoint: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            keywords,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn search_keyword(&self, keyword: &str) -> Result<Vec<Item>, reqwest::Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", keyword), ("format", "json")])
            .send()
            .await?
            .error_for_status()?;

        let parsed: SearchResponse = response.json().await?;

        Ok(parsed
            .results
            .into_iter()
            .take(RESULTS_PER_KEYWORD)
            .map(|r| {
                let mut item = Item::new(keyword, r.title, r.content);
                if let Some(date) = r.published_date {
                    item = item.with_timestamp(date);
                }
                item
            })
            .collect())
    }
}

#[async_trait]
impl Collector for SearchCollector {
    fn name(&self) -> &str {
        "search"
    }

    async fn collect(&self) -> Vec<Item> {
        let mut items = Vec::new();
        for keyword in &self.keywords {
            match self.search_keyword(keyword).await {
                Ok(found) => items.extend(found),
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "Search sub-query failed; skipping");
                }
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_response_shape() {
        let json = r#"{
            "results": [
                {"title": "Fed holds rates", "content": "No change expected.", "publishedDate": "2026-08-24"},
                {"title": "PSTG earnings", "content": "Beat on revenue."},
                {"title": "Third result", "content": "dropped by the per-keyword cap... eventually"}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 3);
        assert_eq!(parsed.results[0].title, "Fed holds rates");
        assert_eq!(parsed.results[0].published_date.as_deref(), Some("2026-08-24"));
        assert!(parsed.results[1].published_date.is_none());
    }

    #[test]
    fn parses_empty_response() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_empty_not_error() {
        let collector = SearchCollector::new(
            "http://127.0.0.1:1/search",
            vec!["US stock market news today".to_string()],
        );
        let items = collector.collect().await;
        assert!(items.is_empty());
    }
}
