//! Web search backed by daedra
//!
//! This module provides the search collaborator used by the research steps,
//! via the daedra crate, which uses DuckDuckGo as the search backend and
//! converts fetched pages to markdown.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One search engine hit before its page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Search and page retrieval.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search for `query`, returning at most `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Fetch a page as markdown.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// DuckDuckGo search through daedra
pub struct DaedraSearch;

impl DaedraSearch {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DaedraSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearch for DaedraSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Search query is empty".to_string()));
        }

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: limit,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => Ok(response
                .data
                .iter()
                .take(limit)
                .map(|r| SearchHit {
                    title: r.title.to_string(),
                    url: r.url.to_string(),
                    description: r.description.to_string(),
                })
                .collect()),
            Err(e) => Err(AppError::Search(format!("Search failed: {}", e))),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        match daedra::tools::fetch::fetch_page(&fetch_args).await {
            Ok(page_content) => Ok(page_content.content),
            Err(e) => Err(AppError::Search(format!(
                "Failed to fetch {}: {}",
                url, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let search = DaedraSearch::new();
        let result = search.search("   ", 5).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
