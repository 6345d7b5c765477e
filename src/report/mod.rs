mod template;

pub use template::TemplateRenderer;

use std::collections::HashMap;

use crate::core::record::KeyRecord;

pub const ISSUE_TITLE: &str = "[Security Alert] Leaked API Key Found in Repository";

const DEFAULT_ISSUE_TEMPLATE: &str = include_str!("../../templates/issue.md");

/// A rendered disclosure report, ready to be filed as an issue.
#[derive(Debug, Clone)]
pub struct IssueReport {
    pub title: String,
    pub body: String,
}

impl IssueReport {
    pub fn render(record: &KeyRecord, repo_owner: &str) -> Self {
        let template = TemplateRenderer::load_or_default("issue", DEFAULT_ISSUE_TEMPLATE);

        let mut vars = HashMap::new();
        vars.insert("repo_owner".to_string(), repo_owner.to_string());
        vars.insert(
            "repo_full_name".to_string(),
            record.repo_full_name.clone(),
        );
        vars.insert("file_path".to_string(), record.file_path.clone());
        vars.insert("html_url".to_string(), record.html_url.clone());
        vars.insert("key_type".to_string(), record.key_type.clone());
        vars.insert(
            "line_number".to_string(),
            record
                .line_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        );

        Self {
            title: ISSUE_TITLE.to_string(),
            body: template.render(&vars),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line_number: Option<usize>) -> KeyRecord {
        KeyRecord::new(
            "octocat/hello-world".to_string(),
            ".env".to_string(),
            "https://github.com/octocat/hello-world/blob/main/.env".to_string(),
            "OPENAI_API_KEY=sk-abc".to_string(),
            "sk-abc".to_string(),
            "OPENAI".to_string(),
            line_number,
        )
    }

    #[test]
    fn test_report_mentions_owner_and_location() {
        let report = IssueReport::render(&record(Some(12)), "octocat");

        assert_eq!(report.title, ISSUE_TITLE);
        assert!(report.body.contains("@octocat"));
        assert!(report.body.contains("`octocat/hello-world`"));
        assert!(report.body.contains("`.env`"));
        assert!(report.body.contains("`12`"));
        assert!(report.body.contains("`OPENAI`"));
    }

    #[test]
    fn test_missing_line_number_renders_placeholder() {
        let report = IssueReport::render(&record(None), "octocat");
        assert!(report.body.contains("`N/A`"));
    }

    #[test]
    fn test_report_never_contains_the_credential() {
        let report = IssueReport::render(&record(None), "octocat");
        assert!(!report.body.contains("sk-abc"));
    }
}
