use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::error::{KeyCopError, Result};
use crate::core::traits::{CodeSearch, IssueTracker, SearchHit, SearchPage};
use crate::utils::{HttpClient, HttpResponse, RateLimiter};

#[derive(Debug, Deserialize)]
struct GitHubSearchResponse {
    total_count: u64,
    items: Vec<GitHubSearchItem>,
}

#[derive(Debug, Deserialize)]
struct GitHubSearchItem {
    path: String,
    html_url: String,
    repository: GitHubRepository,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    text_matches: Option<Vec<TextMatch>>,
}

#[derive(Debug, Deserialize)]
struct TextMatch {
    fragment: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    full_name: String,
    #[serde(default = "default_branch")]
    default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
struct GitHubRepoResponse {
    owner: GitHubOwner,
}

#[derive(Debug, Deserialize)]
struct GitHubOwner {
    login: String,
}

/// Thin client over the GitHub REST API, covering the three capabilities
/// the pipeline consumes: code search, raw file download, and issue
/// creation (plus the owner lookup notification needs).
pub struct GitHubClient {
    token: String,
    base_url: String,
    pacing: RateLimiter,
}

impl GitHubClient {
    pub fn new(token: String, base_url: String, rate_limit_delay_ms: u64) -> Self {
        Self {
            token,
            base_url,
            pacing: RateLimiter::with_delay(Duration::from_millis(rate_limit_delay_ms)),
        }
    }

    async fn get(&self, url: String, headers: Vec<(String, String)>) -> Result<HttpResponse> {
        self.pacing.wait().await;
        tokio::task::spawn_blocking({
            let client = HttpClient::new();
            move || {
                let header_refs: Vec<(&str, &str)> =
                    headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                client.get(&url, &header_refs)
            }
        })
        .await
        .map_err(|e| KeyCopError::Unknown(format!("Task join error: {}", e)))?
    }

    async fn post(&self, url: String, headers: Vec<(String, String)>, body: String) -> Result<HttpResponse> {
        self.pacing.wait().await;
        tokio::task::spawn_blocking({
            let client = HttpClient::new();
            move || {
                let header_refs: Vec<(&str, &str)> =
                    headers.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                client.post(&url, &header_refs, &body)
            }
        })
        .await
        .map_err(|e| KeyCopError::Unknown(format!("Task join error: {}", e)))?
    }

    fn api_headers(&self) -> Vec<(String, String)> {
        vec![
            ("Accept".to_string(), "application/vnd.github.v3+json".to_string()),
            ("User-Agent".to_string(), "keycop".to_string()),
            ("Authorization".to_string(), format!("token {}", self.token)),
        ]
    }
}

#[async_trait]
impl CodeSearch for GitHubClient {
    async fn search_page(&self, query: &str, page: usize, per_page: usize) -> Result<SearchPage> {
        let url = format!(
            "{}/search/code?q={}&per_page={}&page={}",
            self.base_url,
            urlencoding::encode(query),
            per_page,
            page
        );

        // The text-match media type returns matched fragments inline, which
        // usually saves a raw-content download per hit.
        let headers = vec![
            (
                "Accept".to_string(),
                "application/vnd.github.text-match+json".to_string(),
            ),
            ("User-Agent".to_string(), "keycop".to_string()),
            ("Authorization".to_string(), format!("token {}", self.token)),
        ];

        debug!("Fetching search page {} for query: {}", page, query);
        let response = self.get(url, headers).await?;

        if response.is_rate_limited() {
            return Err(KeyCopError::RateLimited(format!(
                "GitHub search returned HTTP {} on page {}",
                response.status_code, page
            )));
        }
        if !response.is_success() {
            return Err(KeyCopError::Platform(format!(
                "GitHub search returned HTTP {}: {}",
                response.status_code,
                response.text().unwrap_or_default()
            )));
        }

        let parsed: GitHubSearchResponse = response.json()?;
        info!(
            "Search page {} returned {} of {} total results",
            page,
            parsed.items.len(),
            parsed.total_count
        );

        let hits = parsed
            .items
            .into_iter()
            .map(|item| {
                let download_url = item.download_url.unwrap_or_else(|| {
                    format!(
                        "https://raw.githubusercontent.com/{}/{}/{}",
                        item.repository.full_name, item.repository.default_branch, item.path
                    )
                });
                let fragments = item
                    .text_matches
                    .map(|matches| matches.into_iter().map(|m| m.fragment).collect())
                    .unwrap_or_default();

                SearchHit {
                    repo_full_name: item.repository.full_name,
                    file_path: item.path,
                    html_url: item.html_url,
                    fragments,
                    download_url,
                }
            })
            .collect();

        Ok(SearchPage {
            total_count: parsed.total_count,
            hits,
        })
    }

    async fn file_content(&self, hit: &SearchHit) -> Result<String> {
        debug!("Downloading file content: {}", hit.download_url);

        let response = self.get(hit.download_url.clone(), Vec::new()).await?;

        if response.is_not_found() {
            return Err(KeyCopError::NotFound(format!(
                "File not found (likely deleted): {}",
                hit.file_path
            )));
        }
        if !response.is_success() {
            return Err(KeyCopError::Http(format!(
                "Failed to download {}: HTTP {}",
                hit.file_path, response.status_code
            )));
        }

        response.text()
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn repo_owner(&self, repo_full_name: &str) -> Result<String> {
        let url = format!("{}/repos/{}", self.base_url, repo_full_name);
        let response = self.get(url, self.api_headers()).await?;

        if response.is_not_found() {
            return Err(KeyCopError::NotFound(format!(
                "Repository {}",
                repo_full_name
            )));
        }
        if !response.is_success() {
            return Err(KeyCopError::Platform(format!(
                "Repository lookup for {} returned HTTP {}",
                repo_full_name, response.status_code
            )));
        }

        let repo: GitHubRepoResponse = response.json()?;
        Ok(repo.owner.login)
    }

    async fn create_issue(
        &self,
        repo_full_name: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        let url = format!("{}/repos/{}/issues", self.base_url, repo_full_name);
        let payload = json!({
            "title": title,
            "body": body,
            "labels": ["security", "leaked-credentials"],
        });

        let response = self
            .post(url, self.api_headers(), payload.to_string())
            .await?;

        match response.status_code {
            201 => {
                let created: serde_json::Value = response.json()?;
                let issue_url = created["html_url"].as_str().unwrap_or("unknown").to_string();
                info!("Created issue: {}", issue_url);
                Ok(issue_url)
            }
            410 => {
                warn!("Issues are disabled for {}", repo_full_name);
                Err(KeyCopError::Platform(format!(
                    "Issues disabled for {}",
                    repo_full_name
                )))
            }
            404 => Err(KeyCopError::NotFound(format!(
                "Repository {}",
                repo_full_name
            ))),
            403 => Err(KeyCopError::Platform(format!(
                "Permission denied creating issue for {}",
                repo_full_name
            ))),
            status => Err(KeyCopError::Platform(format!(
                "Failed to create issue for {} (HTTP {}): {}",
                repo_full_name,
                status,
                response.text().unwrap_or_else(|_| "unknown error".to_string())
            ))),
        }
    }
}

// URL encoding utility (simple implementation)
mod urlencoding {
    pub fn encode(s: &str) -> String {
        s.chars()
            .map(|c| match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => c.to_string(),
                ' ' => "+".to_string(),
                _ => format!("%{:02X}", c as u8),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encoding() {
        assert_eq!(urlencoding::encode("hello world"), "hello+world");
        assert_eq!(urlencoding::encode("foo@bar"), "foo%40bar");
        assert_eq!(
            urlencoding::encode("\"OPENAI_API_KEY=sk-\""),
            "%22OPENAI_API_KEY%3Dsk-%22"
        );
    }

    #[test]
    fn test_search_response_parsing() {
        let raw = r#"{
            "total_count": 2,
            "items": [{
                "path": ".env",
                "html_url": "https://github.com/octocat/hello-world/blob/main/.env",
                "repository": {"full_name": "octocat/hello-world", "default_branch": "main"},
                "text_matches": [{"fragment": "OPENAI_API_KEY=sk-abc"}]
            }]
        }"#;

        let parsed: GitHubSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.total_count, 2);
        assert_eq!(parsed.items[0].repository.full_name, "octocat/hello-world");
        assert_eq!(
            parsed.items[0].text_matches.as_ref().unwrap()[0].fragment,
            "OPENAI_API_KEY=sk-abc"
        );
    }

    #[test]
    fn test_missing_download_url_defaults_to_raw() {
        let raw = r#"{
            "total_count": 1,
            "items": [{
                "path": "config.py",
                "html_url": "https://github.com/octocat/hello-world/blob/main/config.py",
                "repository": {"full_name": "octocat/hello-world"}
            }]
        }"#;

        let parsed: GitHubSearchResponse = serde_json::from_str(raw).unwrap();
        let item = &parsed.items[0];
        assert!(item.download_url.is_none());
        assert_eq!(item.repository.default_branch, "main");
    }
}
