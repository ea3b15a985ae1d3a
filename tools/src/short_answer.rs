//! Scientific short-answer client.
//!
//! Wraps the Wolfram|Alpha short-answer API, which replies to a natural
//! language question with a single line of plain text.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::error::Result;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.wolframalpha.com";

/// A question and the text the service answered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswer {
    /// The question as asked.
    pub query: String,

    /// The service's reply.
    pub response: String,
}

/// Client for the short-answer API.
#[derive(Debug, Clone)]
pub struct ShortAnswerClient {
    /// Application id issued by the service.
    app_id: String,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Memoized answers.
    cache: ResponseCache<ShortAnswer>,
}

impl ShortAnswerClient {
    /// Create a client for the given application id.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
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

    /// Replace the answer cache with an empty one of the given capacity.
    pub fn with_cache_capacity(mut self, max_entries: usize) -> Self {
        self.cache = ResponseCache::new(max_entries);
        self
    }

    /// The answer cache.
    pub fn cache(&self) -> &ResponseCache<ShortAnswer> {
        &self.cache
    }

    fn cache_key(query: &str) -> String {
        format!("get_short_answer|{query}")
    }

    /// Ask `query`; with `cache` set, a memoized answer is reused and a fresh
    /// one is remembered.
    ///
    /// The service reports questions it cannot answer through a non-success
    /// status with an explanatory body. That body is returned as the answer.
    pub async fn get_short_answer(&self, query: &str, cache: bool) -> Result<ShortAnswer> {
        let key = Self::cache_key(query);
        if cache {
            if let Some(answer) = self.cache.get(&key).await {
                debug!("Cache hit for short answer: {query}");
                return Ok(answer);
            }
        }

        let response = self
            .client
            .get(format!("{}/v1/result", self.base_url))
            .query(&[("i", query), ("appid", self.app_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("Short-answer API returned {status} for {query}: {text}");
        }

        let answer = ShortAnswer {
            query: query.to_string(),
            response: text,
        };
        if cache {
            self.cache.put(key, answer.clone()).await;
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_answer_is_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/result"))
            .and(query_param("i", "distance to the moon"))
            .and(query_param("appid", "APP"))
            .respond_with(ResponseTemplate::new(200).set_body_string("about 384400 kilometers"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ShortAnswerClient::new("APP").with_base_url(server.uri());
        let answer = client
            .get_short_answer("distance to the moon", false)
            .await
            .unwrap();

        assert_eq!(
            answer,
            ShortAnswer {
                query: "distance to the moon".to_string(),
                response: "about 384400 kilometers".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unanswerable_body_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/result"))
            .respond_with(ResponseTemplate::new(501).set_body_string("No short answer available"))
            .mount(&server)
            .await;

        let client = ShortAnswerClient::new("APP").with_base_url(server.uri());
        let answer = client.get_short_answer("meaning of life", false).await.unwrap();
        assert_eq!(answer.response, "No short answer available");
    }

    #[tokio::test]
    async fn test_cached_answer_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/result"))
            .respond_with(ResponseTemplate::new(200).set_body_string("4"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ShortAnswerClient::new("APP").with_base_url(server.uri());
        let first = client.get_short_answer("2+2", true).await.unwrap();
        let second = client.get_short_answer("2+2", true).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.cache().stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_uncached_calls_always_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/result"))
            .respond_with(ResponseTemplate::new(200).set_body_string("4"))
            .expect(2)
            .mount(&server)
            .await;

        let client = ShortAnswerClient::new("APP").with_base_url(server.uri());
        client.get_short_answer("2+2", false).await.unwrap();
        client.get_short_answer("2+2", false).await.unwrap();

        assert_eq!(client.cache().stats().await.entries, 0);
    }
}
