use async_trait::async_trait;
use regex::Regex;

use super::error::Result;
use super::record::ProbeOutcome;

/// Everything known about one credential type: how to find it, how to pull
/// a candidate out of matched text, and how to ask the issuing service
/// whether it is still live. Descriptors are static for the process
/// lifetime and owned by the `ProviderRegistry`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Uppercased identifier, e.g. "OPENAI".
    fn key_type(&self) -> &str;

    /// Detection pattern for this credential type.
    fn pattern(&self) -> &Regex;

    /// Platform code-search query that surfaces candidate files.
    fn search_query(&self) -> &str;

    /// Endpoint probed to confirm liveness.
    fn verification_endpoint(&self) -> &str;

    /// Pull a candidate credential out of a matched text fragment.
    fn extract_key(&self, fragment: &str) -> Option<String> {
        self.pattern().find(fragment).map(|m| m.as_str().to_string())
    }

    /// Lightweight authenticated call against the issuing service,
    /// classified into a `ProbeOutcome`. Only process-level failures
    /// (e.g. a lost worker task) surface as errors.
    async fn probe(&self, key: &str) -> Result<ProbeOutcome>;
}

/// One match returned by the platform's code search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub repo_full_name: String,
    pub file_path: String,
    pub html_url: String,
    /// Matched text fragments, when the platform supplied them.
    pub fragments: Vec<String>,
    /// Raw-content URL used when no fragments are available.
    pub download_url: String,
}

/// One page of code-search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub total_count: u64,
    pub hits: Vec<SearchHit>,
}

/// The hosting platform's code-search capability. Implementations must
/// signal rate limiting as `KeyCopError::RateLimited`, distinct from
/// other platform errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeSearch: Send + Sync {
    /// Fetch one page of results for the query. Pages are 1-based.
    async fn search_page(&self, query: &str, page: usize, per_page: usize) -> Result<SearchPage>;

    /// Download the full decoded content behind a hit.
    async fn file_content(&self, hit: &SearchHit) -> Result<String>;
}

/// The hosting platform's issue-creation capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Login of the account that owns the repository.
    async fn repo_owner(&self, repo_full_name: &str) -> Result<String>;

    /// Open a disclosure issue; returns the issue's viewable URL.
    async fn create_issue(&self, repo_full_name: &str, title: &str, body: &str)
        -> Result<String>;
}
