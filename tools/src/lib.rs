//! # Tools
//!
//! External lookups a language-model agent can call alongside retrieval:
//!
//! - **Short answers**: one-line answers to scientific and factual questions
//! - **Web search**: instant-answer results with explicit search options
//!
//! Every call takes a `cache` flag. When set, responses are memoized in a
//! bounded in-memory [`ResponseCache`] keyed by the full request.

pub mod cache;
pub mod error;
pub mod short_answer;
pub mod web_search;

pub use cache::{CacheStats, ResponseCache};
pub use error::{Result, ToolError};
pub use short_answer::{ShortAnswer, ShortAnswerClient};
pub use web_search::{SafeSearch, SearchOptions, SearchResult, WebSearchClient};
