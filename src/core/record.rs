use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder stored when no candidate credential could be pulled out of a
/// match. The record is kept anyway so the location can be audited manually.
pub const EXTRACTION_SENTINEL: &str = "key-extraction-not-implemented";

/// Lifecycle state of a discovered key. Transitions only move forward:
/// a record that has left `Found` is never written back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    Found,
    ExtractionFailed,
    UnsupportedKeyType,
    ValidActive,
    ValidInactive,
    VerificationFailed,
    Notified,
    Error,
}

/// Outcome of a provider's authenticated probe, classified so the
/// verification engine never has to pattern-match on error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The provider accepted the credential.
    Success,
    /// The provider rejected the credential itself (revoked or never valid).
    AuthRejected,
    /// Anything else: network trouble, server errors, unexpected responses.
    Other(String),
}

/// One discovered candidate leak at one repository/file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: Uuid,
    pub repo_full_name: String,
    pub file_path: String,
    pub html_url: String,
    pub code_snippet: String,
    pub extracted_key: String,
    pub key_type: String,
    pub status: KeyStatus,
    pub found_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_number: Option<usize>,
}

impl KeyRecord {
    pub fn new(
        repo_full_name: String,
        file_path: String,
        html_url: String,
        code_snippet: String,
        extracted_key: String,
        key_type: String,
        line_number: Option<usize>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            repo_full_name,
            file_path,
            html_url,
            code_snippet,
            extracted_key,
            key_type,
            status: KeyStatus::Found,
            found_at: Utc::now(),
            last_checked_at: None,
            line_number,
        }
    }

    /// Identity used for de-duplication across search runs.
    pub fn location(&self) -> (&str, &str) {
        (&self.repo_full_name, &self.file_path)
    }

    /// Whether there is an actual credential string worth probing.
    pub fn has_candidate(&self) -> bool {
        !self.extracted_key.is_empty() && self.extracted_key != EXTRACTION_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(extracted: &str) -> KeyRecord {
        KeyRecord::new(
            "octocat/hello-world".to_string(),
            ".env".to_string(),
            "https://github.com/octocat/hello-world/blob/main/.env".to_string(),
            "OPENAI_API_KEY=sk-test".to_string(),
            extracted.to_string(),
            "OPENAI".to_string(),
            None,
        )
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&KeyStatus::Found).unwrap(),
            "\"FOUND\""
        );
        assert_eq!(
            serde_json::to_string(&KeyStatus::ValidActive).unwrap(),
            "\"VALID_ACTIVE\""
        );
        assert_eq!(
            serde_json::to_string(&KeyStatus::UnsupportedKeyType).unwrap(),
            "\"UNSUPPORTED_KEY_TYPE\""
        );

        let parsed: KeyStatus = serde_json::from_str("\"EXTRACTION_FAILED\"").unwrap();
        assert_eq!(parsed, KeyStatus::ExtractionFailed);
    }

    #[test]
    fn test_record_roundtrip() {
        let original = record("sk-abc");
        let json = serde_json::to_string(&original).unwrap();
        let parsed: KeyRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, original.id);
        assert_eq!(parsed.status, KeyStatus::Found);
        assert_eq!(parsed.location(), ("octocat/hello-world", ".env"));
        assert!(parsed.last_checked_at.is_none());
    }

    #[test]
    fn test_has_candidate() {
        assert!(record("sk-abc").has_candidate());
        assert!(!record("").has_candidate());
        assert!(!record(EXTRACTION_SENTINEL).has_candidate());
    }

    #[test]
    fn test_line_number_optional_in_old_records() {
        // Records written before line numbers existed still parse.
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "repo_full_name": "octocat/hello-world",
            "file_path": ".env",
            "html_url": "https://example.com",
            "code_snippet": "snippet",
            "extracted_key": "sk-abc",
            "key_type": "OPENAI",
            "status": "FOUND",
            "found_at": "2025-01-01T00:00:00Z",
            "last_checked_at": null
        }"#;
        let parsed: KeyRecord = serde_json::from_str(json).unwrap();
        assert!(parsed.line_number.is_none());
    }
}
