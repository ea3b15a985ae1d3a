//! Web search client.
//!
//! Queries the DuckDuckGo instant-answer API and flattens the abstract,
//! direct results and related topics into one ranked list.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::error::{Result, ToolError};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com";

/// Safe-search level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeSearch {
    /// Filter explicit results.
    Strict,
    /// Filter the most explicit results.
    Moderate,
    /// No filtering.
    #[default]
    Off,
}

impl SafeSearch {
    /// Value of the `kp` query parameter.
    fn as_param(self) -> &'static str {
        match self {
            Self::Strict => "1",
            Self::Moderate => "-1",
            Self::Off => "-2",
        }
    }
}

/// Options recognized by [`WebSearchClient::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Region code such as `us-en` or `wt-wt`.
    pub region: String,

    /// Safe-search level.
    pub safe_search: SafeSearch,

    /// Maximum number of results; `None` keeps everything returned.
    pub max_results: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            region: "us-en".to_string(),
            safe_search: SafeSearch::Off,
            max_results: Some(20),
        }
    }
}

impl SearchOptions {
    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the safe-search level.
    pub fn with_safe_search(mut self, safe_search: SafeSearch) -> Self {
        self.safe_search = safe_search;
        self
    }

    /// Set the result limit.
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Short title.
    pub title: String,

    /// Link to the source.
    pub href: String,

    /// Snippet text.
    pub body: String,
}

/// Client for the web search API.
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Memoized result lists.
    cache: ResponseCache<Vec<SearchResult>>,
}

impl WebSearchClient {
    /// Create a client for the public API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            cache: ResponseCache::new(1024),
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the result cache with an empty one of the given capacity.
    pub fn with_cache_capacity(mut self, max_entries: usize) -> Self {
        self.cache = ResponseCache::new(max_entries);
        self
    }

    /// The result cache.
    pub fn cache(&self) -> &ResponseCache<Vec<SearchResult>> {
        &self.cache
    }

    fn cache_key(keywords: &str, options: &SearchOptions) -> String {
        let max_results = options
            .max_results
            .map_or_else(|| "all".to_string(), |n| n.to_string());
        format!(
            "search|{keywords}|{}|{}|{max_results}",
            options.region,
            options.safe_search.as_param()
        )
    }

    /// Search for `keywords`; with `cache` set, a memoized result list for
    /// the same keywords and options is reused and a fresh one remembered.
    pub async fn search(
        &self,
        keywords: &str,
        options: &SearchOptions,
        cache: bool,
    ) -> Result<Vec<SearchResult>> {
        let key = Self::cache_key(keywords, options);
        if cache {
            if let Some(results) = self.cache.get(&key).await {
                debug!("Cache hit for search: {keywords}");
                return Ok(results);
            }
        }

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", keywords),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kl", options.region.as_str()),
                ("kp", options.safe_search.as_param()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ToolError::InvalidResponse(format!(
                "search API returned {status}"
            )));
        }

        let body = response.text().await?;
        let answer: InstantAnswer = serde_json::from_str(&body)?;
        let mut results = answer.into_results();
        if let Some(limit) = options.max_results {
            results.truncate(limit);
        }

        info!("Search for {keywords} returned {} results", results.len());

        if cache {
            self.cache.put(key, results.clone()).await;
        }
        Ok(results)
    }
}

impl Default for WebSearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Instant-answer API response format.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    results: Vec<Topic>,
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Topic {
    text: String,
    #[serde(rename = "FirstURL")]
    first_url: String,
}

/// Related topics are either plain topics or named groups of topics.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<Topic>,
    },
    Single(Topic),
}

impl Topic {
    fn into_result(self) -> Option<SearchResult> {
        if self.text.is_empty() || self.first_url.is_empty() {
            return None;
        }
        let title = self
            .text
            .split_once(" - ")
            .map_or(self.text.as_str(), |(title, _)| title)
            .to_string();
        Some(SearchResult {
            title,
            href: self.first_url,
            body: self.text,
        })
    }
}

impl InstantAnswer {
    fn into_results(self) -> Vec<SearchResult> {
        let mut results = Vec::new();
        if !self.abstract_text.is_empty() && !self.abstract_url.is_empty() {
            results.push(SearchResult {
                title: self.heading,
                href: self.abstract_url,
                body: self.abstract_text,
            });
        }

        results.extend(self.results.into_iter().filter_map(Topic::into_result));
        for related in self.related_topics {
            match related {
                RelatedTopic::Single(topic) => results.extend(topic.into_result()),
                RelatedTopic::Group { topics } => {
                    results.extend(topics.into_iter().filter_map(Topic::into_result));
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "Heading": "Rust (programming language)",
            "AbstractText": "Rust is a general-purpose programming language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "Results": [
                { "Text": "Official site - Rust", "FirstURL": "https://www.rust-lang.org/" }
            ],
            "RelatedTopics": [
                { "Text": "Cargo - Rust package manager", "FirstURL": "https://duckduckgo.com/Cargo" },
                {
                    "Name": "See also",
                    "Topics": [
                        { "Text": "Ferris - The Rust mascot", "FirstURL": "https://duckduckgo.com/Ferris" },
                        { "Text": "", "FirstURL": "" }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_results_are_flattened_in_order() {
        let answer: InstantAnswer = serde_json::from_value(sample()).unwrap();
        let results = answer.into_results();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Rust (programming language)", "Official site", "Cargo", "Ferris"]
        );
        assert_eq!(results[2].href, "https://duckduckgo.com/Cargo");
        assert_eq!(results[2].body, "Cargo - Rust package manager");
    }

    #[tokio::test]
    async fn test_search_sends_options_and_truncates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "rust language"))
            .and(query_param("format", "json"))
            .and(query_param("kl", "uk-en"))
            .and(query_param("kp", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample()))
            .expect(1)
            .mount(&server)
            .await;

        let client = WebSearchClient::new().with_base_url(server.uri());
        let options = SearchOptions::default()
            .with_region("uk-en")
            .with_safe_search(SafeSearch::Strict)
            .with_max_results(Some(2));
        let results = client.search("rust language", &options, false).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].href, "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn test_cache_key_covers_options() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample()))
            .expect(2)
            .mount(&server)
            .await;

        let client = WebSearchClient::new().with_base_url(server.uri());
        let options = SearchOptions::default();
        client.search("rust", &options, true).await.unwrap();
        client.search("rust", &options, true).await.unwrap();
        client
            .search("rust", &options.clone().with_region("de-de"), true)
            .await
            .unwrap();

        assert_eq!(client.cache().stats().await.entries, 2);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = WebSearchClient::new().with_base_url(server.uri());
        let result = client.search("rust", &SearchOptions::default(), false).await;
        assert!(matches!(result, Err(ToolError::InvalidResponse(_))));
    }
}
