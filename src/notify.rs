use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::Result;
use crate::core::record::{KeyRecord, KeyStatus};
use crate::core::traits::IssueTracker;
use crate::report::IssueReport;
use crate::store::JsonStore;

/// Counters reported at the end of a notification pass.
#[derive(Debug, Default, Clone)]
pub struct NotifySummary {
    pub notified: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Files one disclosure issue per confirmed-live record in the valid-key
/// view. Outcomes land on the record itself, so a failure against one
/// repository never aborts the batch.
pub struct Notifier {
    tracker: Arc<dyn IssueTracker>,
    valid_store: Arc<JsonStore>,
    dry_run: bool,
}

impl Notifier {
    pub fn new(tracker: Arc<dyn IssueTracker>, valid_store: Arc<JsonStore>, dry_run: bool) -> Self {
        Self {
            tracker,
            valid_store,
            dry_run,
        }
    }

    pub async fn run_notification(&self, target_repo: Option<&str>) -> Result<NotifySummary> {
        let mut records = self.valid_store.read_all();
        let mut summary = NotifySummary::default();

        for record in records.iter_mut() {
            if record.status != KeyStatus::ValidActive {
                continue;
            }
            if let Some(target) = target_repo {
                if record.repo_full_name != target {
                    summary.skipped += 1;
                    continue;
                }
            }

            if self.dry_run {
                self.preview(record).await;
                continue;
            }

            info!("Notifying for key in {}", record.repo_full_name);
            match self.file_issue(record).await {
                Ok(issue_url) => {
                    info!("Opened disclosure issue: {}", issue_url);
                    record.status = KeyStatus::Notified;
                    summary.notified += 1;
                }
                Err(e) => {
                    warn!(
                        "Failed to create issue for {}: {}",
                        record.repo_full_name, e
                    );
                    record.status = KeyStatus::Error;
                    summary.failed += 1;
                }
            }
            record.last_checked_at = Some(Utc::now());
        }

        if !self.dry_run {
            self.valid_store.write_all(&records)?;
        }
        Ok(summary)
    }

    async fn file_issue(&self, record: &KeyRecord) -> Result<String> {
        let owner = self.tracker.repo_owner(&record.repo_full_name).await?;
        let report = IssueReport::render(record, &owner);
        self.tracker
            .create_issue(&record.repo_full_name, &report.title, &report.body)
            .await
    }

    /// Render and print the report without touching the platform or the
    /// record's status.
    async fn preview(&self, record: &KeyRecord) {
        let owner = match self.tracker.repo_owner(&record.repo_full_name).await {
            Ok(owner) => owner,
            Err(_) => "owner".to_string(),
        };
        let report = IssueReport::render(record, &owner);

        println!("\n{}", "=".repeat(70));
        println!("DRY RUN: would create issue in {}", record.repo_full_name);
        println!("Title: {}", report.title);
        println!("{}", "=".repeat(70));
        println!("{}", report.body);
        println!("{}", "=".repeat(70));
    }
}
