use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use chrono::Utc;

use crate::core::config::VerifyConfig;
use crate::core::error::Result;
use crate::core::record::{KeyRecord, KeyStatus, ProbeOutcome};
use crate::providers::ProviderRegistry;
use crate::store::JsonStore;

/// Per-outcome counters for one verification pass.
#[derive(Debug, Default, Clone)]
pub struct VerifySummary {
    pub processed: usize,
    pub valid_active: usize,
    pub valid_inactive: usize,
    pub verification_failed: usize,
    pub extraction_failed: usize,
    pub unsupported: usize,
}

impl VerifySummary {
    fn bump(&mut self, status: KeyStatus) {
        self.processed += 1;
        match status {
            KeyStatus::ValidActive => self.valid_active += 1,
            KeyStatus::ValidInactive => self.valid_inactive += 1,
            KeyStatus::VerificationFailed => self.verification_failed += 1,
            KeyStatus::ExtractionFailed => self.extraction_failed += 1,
            KeyStatus::UnsupportedKeyType => self.unsupported += 1,
            _ => {}
        }
    }
}

/// Drives `FOUND` records through the verification state machine. Records
/// that have already left `FOUND` are never touched again.
pub struct Verifier {
    registry: Arc<ProviderRegistry>,
    store: Arc<JsonStore>,
    valid_store: Arc<JsonStore>,
    probe_delay: Duration,
}

impl Verifier {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<JsonStore>,
        valid_store: Arc<JsonStore>,
        config: &VerifyConfig,
    ) -> Self {
        Self {
            registry,
            store,
            valid_store,
            probe_delay: Duration::from_millis(config.probe_delay_ms),
        }
    }

    pub async fn run_verification(&self) -> Result<VerifySummary> {
        let mut records = self.store.read_all();
        let pending = records
            .iter()
            .filter(|r| r.status == KeyStatus::Found)
            .count();
        info!(
            "{} of {} records awaiting verification",
            pending,
            records.len()
        );

        let pb = ProgressBar::new(pending as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let mut summary = VerifySummary::default();
        for record in records.iter_mut() {
            if record.status != KeyStatus::Found {
                continue;
            }

            let new_status = self.classify(record).await?;
            info!(
                "{:?} key in {}/{}",
                new_status, record.repo_full_name, record.file_path
            );

            record.status = new_status;
            record.last_checked_at = Some(Utc::now());
            summary.bump(new_status);

            // Confirmed-live records are mirrored into the valid-key view
            // so notification scans a much smaller set than the full log.
            if new_status == KeyStatus::ValidActive {
                self.valid_store.append(record.clone())?;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.store.write_all(&records)?;
        Ok(summary)
    }

    async fn classify(&self, record: &KeyRecord) -> Result<KeyStatus> {
        let provider = match self.registry.resolve(&record.key_type) {
            Ok(provider) => provider,
            Err(_) => return Ok(KeyStatus::UnsupportedKeyType),
        };

        // No candidate credential, nothing to probe.
        if !record.has_candidate() {
            return Ok(KeyStatus::ExtractionFailed);
        }

        if !self.probe_delay.is_zero() {
            sleep(self.probe_delay).await;
        }

        let status = match provider.probe(&record.extracted_key).await? {
            ProbeOutcome::Success => KeyStatus::ValidActive,
            ProbeOutcome::AuthRejected => KeyStatus::ValidInactive,
            ProbeOutcome::Other(reason) => {
                warn!(
                    "Verification probe failed for {}/{}: {}",
                    record.repo_full_name, record.file_path, reason
                );
                KeyStatus::VerificationFailed
            }
        };
        Ok(status)
    }
}
