use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::config::SearchConfig;
use crate::core::error::{KeyCopError, Result};
use crate::core::record::{KeyRecord, EXTRACTION_SENTINEL};
use crate::core::traits::{CodeSearch, KeyProvider, SearchHit};
use crate::providers::ProviderRegistry;
use crate::store::JsonStore;

/// Counters reported at the end of a search run.
#[derive(Debug, Default, Clone)]
pub struct SearchSummary {
    pub total_count: u64,
    pub processed: usize,
    pub new_records: usize,
    pub skipped: usize,
}

/// Discovers candidate leaks for one credential type and appends them to
/// the discovery log. Appends happen per match, so a crash mid-run loses
/// at most the in-flight item.
pub struct Searcher {
    registry: Arc<ProviderRegistry>,
    client: Arc<dyn CodeSearch>,
    store: Arc<JsonStore>,
    config: SearchConfig,
}

impl Searcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        client: Arc<dyn CodeSearch>,
        store: Arc<JsonStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            registry,
            client,
            store,
            config,
        }
    }

    pub async fn search_leaked_keys(&self, key_type: &str) -> Result<SearchSummary> {
        let provider = self.registry.resolve(key_type)?;
        let query = provider.search_query().to_string();
        info!(
            "Searching for {} keys with query: {}",
            provider.key_type(),
            query
        );

        // Known locations are loaded once per run; appends below extend the
        // set so one run can never duplicate itself either.
        let mut known: HashSet<(String, String)> = self
            .store
            .read_all()
            .iter()
            .map(|r| {
                let (repo, path) = r.location();
                (repo.to_string(), path.to_string())
            })
            .collect();

        let mut summary = SearchSummary::default();
        let mut page = 1usize;
        let mut total_pages = 1usize;
        let mut rate_limit_strikes = 0u32;

        while page <= total_pages {
            let page_data = match self
                .client
                .search_page(&query, page, self.config.per_page)
                .await
            {
                Ok(data) => {
                    rate_limit_strikes = 0;
                    data
                }
                Err(KeyCopError::RateLimited(msg)) => {
                    rate_limit_strikes += 1;
                    if rate_limit_strikes > self.config.max_rate_limit_retries {
                        return Err(KeyCopError::RateLimited(format!(
                            "page {} still rate limited after {} retries: {}",
                            page, self.config.max_rate_limit_retries, msg
                        )));
                    }
                    warn!(
                        "Rate limit hit on page {} ({}). Cooling down for {}s before retrying",
                        page, msg, self.config.cooldown_secs
                    );
                    sleep(Duration::from_secs(self.config.cooldown_secs)).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if page == 1 {
                summary.total_count = page_data.total_count;
                // The platform serves at most max_results per query, so
                // anything past that window is unreachable.
                let reachable = (page_data.total_count as usize).min(self.config.max_results);
                total_pages =
                    ((reachable + self.config.per_page - 1) / self.config.per_page).max(1);
                info!(
                    "{} total results, fetching {} page(s)",
                    page_data.total_count, total_pages
                );
            }

            for hit in &page_data.hits {
                summary.processed += 1;

                let location = (hit.repo_full_name.clone(), hit.file_path.clone());
                if known.contains(&location) {
                    debug!(
                        "Skipping already known location {}/{}",
                        hit.repo_full_name, hit.file_path
                    );
                    summary.skipped += 1;
                    continue;
                }

                let record = self.record_for(provider.as_ref(), hit).await?;
                info!(
                    "Found new potential {} key in {}/{}",
                    record.key_type, record.repo_full_name, record.file_path
                );
                self.store.append(record)?;
                known.insert(location);
                summary.new_records += 1;
            }

            if page < total_pages {
                debug!("Waiting {}s between search pages", self.config.page_delay_secs);
                sleep(Duration::from_secs(self.config.page_delay_secs)).await;
            }
            page += 1;
        }

        Ok(summary)
    }

    /// Build the record for a fresh hit. Matched fragments are preferred;
    /// without them the full decoded content is fetched and scanned, which
    /// also makes the line number available. A hit whose candidate cannot
    /// be extracted is still recorded, with a sentinel in place of the key.
    async fn record_for(&self, provider: &dyn KeyProvider, hit: &SearchHit) -> Result<KeyRecord> {
        let (snippet, extracted, line_number) = if !hit.fragments.is_empty() {
            let snippet = hit.fragments.join("\n---\n");
            let extracted = hit
                .fragments
                .iter()
                .find_map(|fragment| provider.extract_key(fragment))
                .unwrap_or_else(|| EXTRACTION_SENTINEL.to_string());
            (snippet, extracted, None)
        } else {
            match self.client.file_content(hit).await {
                Ok(content) => {
                    if let Some(m) = provider.pattern().find(&content) {
                        let line = line_of(&content, m.start());
                        let key = m.as_str().to_string();
                        (content, key, Some(line))
                    } else {
                        (content, EXTRACTION_SENTINEL.to_string(), None)
                    }
                }
                Err(KeyCopError::NotFound(_)) => {
                    warn!(
                        "Content for {}/{} is gone; recording without a candidate",
                        hit.repo_full_name, hit.file_path
                    );
                    (String::new(), EXTRACTION_SENTINEL.to_string(), None)
                }
                Err(e) => return Err(e),
            }
        };

        Ok(KeyRecord::new(
            hit.repo_full_name.clone(),
            hit.file_path.clone(),
            hit.html_url.clone(),
            snippet,
            extracted,
            provider.key_type().to_string(),
            line_number,
        ))
    }
}

/// 1-based line of a byte offset.
fn line_of(content: &str, byte_pos: usize) -> usize {
    content[..byte_pos].bytes().filter(|b| *b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::KeyStatus;
    use crate::core::traits::{MockCodeSearch, MockKeyProvider, SearchPage};
    use regex::Regex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const KEY_A: &str = "sk-aaaaaaaaaa";
    const KEY_B: &str = "sk-bbbbbbbbbb";

    fn test_provider() -> MockKeyProvider {
        let mut provider = MockKeyProvider::new();
        provider.expect_key_type().return_const("OPENAI".to_string());
        provider
            .expect_search_query()
            .return_const("\"OPENAI_API_KEY=sk-\"".to_string());
        provider
            .expect_pattern()
            .return_const(Regex::new(r"sk-[a-z0-9]{10}").unwrap());
        provider.expect_extract_key().returning(|fragment| {
            Regex::new(r"sk-[a-z0-9]{10}")
                .unwrap()
                .find(fragment)
                .map(|m| m.as_str().to_string())
        });
        provider
    }

    fn registry() -> Arc<ProviderRegistry> {
        Arc::new(ProviderRegistry::new(vec![Arc::new(test_provider())]))
    }

    fn fast_config() -> SearchConfig {
        SearchConfig {
            per_page: 100,
            max_results: 1000,
            cooldown_secs: 0,
            page_delay_secs: 0,
            max_rate_limit_retries: 10,
        }
    }

    fn hit(repo: &str, path: &str, fragment: &str) -> SearchHit {
        SearchHit {
            repo_full_name: repo.to_string(),
            file_path: path.to_string(),
            html_url: format!("https://github.com/{}/blob/main/{}", repo, path),
            fragments: vec![fragment.to_string()],
            download_url: format!("https://raw.githubusercontent.com/{}/main/{}", repo, path),
        }
    }

    fn searcher(client: MockCodeSearch, store: Arc<JsonStore>, config: SearchConfig) -> Searcher {
        Searcher::new(registry(), Arc::new(client), store, config)
    }

    #[tokio::test]
    async fn test_search_appends_found_records() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let mut client = MockCodeSearch::new();
        client.expect_search_page().returning(|_, _, _| {
            Ok(SearchPage {
                total_count: 2,
                hits: vec![
                    hit("a/one", ".env", &format!("OPENAI_API_KEY={}", KEY_A)),
                    hit("b/two", "config.py", &format!("key = \"{}\"", KEY_B)),
                ],
            })
        });

        let summary = searcher(client, store.clone(), fast_config())
            .search_leaked_keys("OPENAI")
            .await
            .unwrap();

        assert_eq!(summary.new_records, 2);
        let records = store.read_all();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.status == KeyStatus::Found));
        assert_eq!(records[0].extracted_key, KEY_A);
        assert_eq!(records[1].extracted_key, KEY_B);
        assert!(records[0].line_number.is_none());
    }

    #[tokio::test]
    async fn test_rerun_skips_known_locations() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        for _ in 0..2 {
            let mut client = MockCodeSearch::new();
            client.expect_search_page().returning(|_, _, _| {
                Ok(SearchPage {
                    total_count: 1,
                    hits: vec![hit("a/one", ".env", &format!("OPENAI_API_KEY={}", KEY_A))],
                })
            });
            searcher(client, store.clone(), fast_config())
                .search_leaked_keys("OPENAI")
                .await
                .unwrap();
        }

        assert_eq!(store.read_all().len(), 1);
    }

    #[tokio::test]
    async fn test_same_location_twice_in_one_run_yields_one_record() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let mut client = MockCodeSearch::new();
        client.expect_search_page().returning(|_, _, _| {
            let repeated = hit("a/one", ".env", &format!("OPENAI_API_KEY={}", KEY_A));
            Ok(SearchPage {
                total_count: 2,
                hits: vec![repeated.clone(), repeated],
            })
        });

        let summary = searcher(client, store.clone(), fast_config())
            .search_leaked_keys("OPENAI")
            .await
            .unwrap();

        assert_eq!(summary.new_records, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(store.read_all().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_same_page_without_loss() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = MockCodeSearch::new();
        let calls_in_mock = calls.clone();
        client.expect_search_page().returning(move |_, page, _| {
            calls_in_mock.fetch_add(1, Ordering::SeqCst);
            match page {
                1 => Ok(SearchPage {
                    total_count: 101,
                    hits: vec![hit("a/one", ".env", &format!("OPENAI_API_KEY={}", KEY_A))],
                }),
                2 => {
                    // First attempt at page 2 is rate limited.
                    if calls_in_mock.load(Ordering::SeqCst) == 2 {
                        Err(KeyCopError::RateLimited("HTTP 403".to_string()))
                    } else {
                        Ok(SearchPage {
                            total_count: 101,
                            hits: vec![hit("b/two", ".env", &format!("key={}", KEY_B))],
                        })
                    }
                }
                _ => panic!("unexpected page {}", page),
            }
        });

        let summary = searcher(client, store.clone(), fast_config())
            .search_leaked_keys("OPENAI")
            .await
            .unwrap();

        // Page 2 was fetched exactly twice: one rate-limited attempt, one retry.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(summary.new_records, 2);
        assert_eq!(store.read_all().len(), 2);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_aborts_after_cap() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let calls = Arc::new(AtomicUsize::new(0));
        let mut client = MockCodeSearch::new();
        let calls_in_mock = calls.clone();
        client.expect_search_page().returning(move |_, _, _| {
            calls_in_mock.fetch_add(1, Ordering::SeqCst);
            Err(KeyCopError::RateLimited("HTTP 403".to_string()))
        });

        let config = SearchConfig {
            max_rate_limit_retries: 2,
            ..fast_config()
        };
        let result = searcher(client, store, config)
            .search_leaked_keys("OPENAI")
            .await;

        assert!(matches!(result, Err(KeyCopError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_platform_error_aborts_run() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let mut client = MockCodeSearch::new();
        client
            .expect_search_page()
            .returning(|_, _, _| Err(KeyCopError::Platform("HTTP 500".to_string())));

        let result = searcher(client, store, fast_config())
            .search_leaked_keys("OPENAI")
            .await;

        assert!(matches!(result, Err(KeyCopError::Platform(_))));
    }

    #[tokio::test]
    async fn test_unknown_key_type_fails_before_searching() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let mut client = MockCodeSearch::new();
        client.expect_search_page().times(0);

        let result = searcher(client, store, fast_config())
            .search_leaked_keys("STRIPE")
            .await;

        assert!(matches!(result, Err(KeyCopError::UnsupportedProvider(_))));
    }

    #[tokio::test]
    async fn test_fallback_to_full_content_keeps_line_number() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let mut bare = hit("a/one", ".env", "");
        bare.fragments.clear();

        let mut client = MockCodeSearch::new();
        let page_hit = bare.clone();
        client.expect_search_page().returning(move |_, _, _| {
            Ok(SearchPage {
                total_count: 1,
                hits: vec![page_hit.clone()],
            })
        });
        client
            .expect_file_content()
            .returning(|_| Ok(format!("# config\n\nOPENAI_API_KEY={}\n", KEY_A)));

        searcher(client, store.clone(), fast_config())
            .search_leaked_keys("OPENAI")
            .await
            .unwrap();

        let records = store.read_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].extracted_key, KEY_A);
        assert_eq!(records[0].line_number, Some(3));
        assert!(records[0].code_snippet.contains("# config"));
    }

    #[tokio::test]
    async fn test_extraction_miss_records_sentinel() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("keys.json")).unwrap());

        let mut client = MockCodeSearch::new();
        client.expect_search_page().returning(|_, _, _| {
            Ok(SearchPage {
                total_count: 1,
                hits: vec![hit("a/one", ".env", "OPENAI_API_KEY=REDACTED")],
            })
        });

        let summary = searcher(client, store.clone(), fast_config())
            .search_leaked_keys("OPENAI")
            .await
            .unwrap();

        assert_eq!(summary.new_records, 1);
        let records = store.read_all();
        assert_eq!(records[0].extracted_key, EXTRACTION_SENTINEL);
        assert!(!records[0].has_candidate());
    }

    #[test]
    fn test_line_of() {
        let content = "line 1\nline 2\nline 3\n";
        assert_eq!(line_of(content, 0), 1);
        assert_eq!(line_of(content, content.find("line 3").unwrap()), 3);
    }
}
