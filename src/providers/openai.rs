use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::core::error::{KeyCopError, Result};
use crate::core::record::ProbeOutcome;
use crate::core::traits::KeyProvider;
use crate::utils::HttpClient;

lazy_static! {
    /// OpenAI keys: "sk-", optional project prefix, then 48+ token chars.
    static ref OPENAI_PATTERN: Regex = Regex::new(r"sk-(?:proj-)?[a-zA-Z0-9_\-]{48,}").unwrap();
}

const VERIFICATION_ENDPOINT: &str = "https://api.openai.com/v1/models";

/// The "T3BlbkFJ" literal is base64 for "OpenAI" and appears inside every
/// real key, which keeps search noise down.
const SEARCH_QUERY: &str = "\"OPENAI_API_KEY=sk-\" \"T3BlbkFJ\"";

pub struct OpenAIProvider;

impl OpenAIProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyProvider for OpenAIProvider {
    fn key_type(&self) -> &str {
        "OPENAI"
    }

    fn pattern(&self) -> &Regex {
        &OPENAI_PATTERN
    }

    fn search_query(&self) -> &str {
        SEARCH_QUERY
    }

    fn verification_endpoint(&self) -> &str {
        VERIFICATION_ENDPOINT
    }

    async fn probe(&self, key: &str) -> Result<ProbeOutcome> {
        // Listing models is the cheapest authenticated call the API offers.
        let result = tokio::task::spawn_blocking({
            let client = HttpClient::new();
            let key = key.to_string();
            move || {
                client.get(
                    VERIFICATION_ENDPOINT,
                    &[
                        ("Authorization", &format!("Bearer {}", key)),
                        ("Content-Type", "application/json"),
                    ],
                )
            }
        })
        .await
        .map_err(|e| KeyCopError::Unknown(format!("Task join error: {}", e)))?;

        let outcome = match result {
            Ok(response) => {
                debug!("OpenAI probe returned HTTP {}", response.status_code);
                match response.status_code {
                    200 => ProbeOutcome::Success,
                    // Only 401 means the credential itself was rejected.
                    401 => ProbeOutcome::AuthRejected,
                    status => ProbeOutcome::Other(format!("OpenAI API returned HTTP {}", status)),
                }
            }
            Err(e) => ProbeOutcome::Other(format!("Network error probing OpenAI: {}", e)),
        };

        Ok(outcome)
    }
}
