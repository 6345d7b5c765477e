use colored::Colorize;

use crate::notify::NotifySummary;
use crate::search::SearchSummary;
use crate::verify::VerifySummary;

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn print_banner() {
        println!("{}", "=".repeat(70).bright_cyan());
        println!(
            "{}",
            "  KeyCop - Leaked API Key Disclosure Pipeline"
                .bright_cyan()
                .bold()
        );
        println!("{}", "=".repeat(70).bright_cyan());
        println!();
    }

    pub fn print_ethical_warning() {
        println!("{}", "ETHICAL USE ONLY".yellow().bold());
        println!("This tool exists for security research and responsible disclosure.");
        println!("  {} Report every confirmed key to its owner", "-".yellow());
        println!("  {} Never use discovered keys for any other purpose", "-".yellow());
        println!();
    }

    pub fn print_search_summary(key_type: &str, summary: &SearchSummary) {
        println!();
        println!("{}", "  Search complete".bright_cyan().bold());
        println!(
            "  Platform reported {} total results for {}",
            summary.total_count.to_string().bright_white(),
            key_type.bright_cyan()
        );
        println!(
            "  Processed: {}  New records: {}  Already known: {}",
            summary.processed.to_string().bright_white(),
            summary.new_records.to_string().bright_green(),
            summary.skipped.to_string().bright_black()
        );
    }

    pub fn print_verify_summary(summary: &VerifySummary) {
        println!();
        println!("{}", "  Verification complete".bright_cyan().bold());
        println!(
            "  Processed: {}",
            summary.processed.to_string().bright_white()
        );
        println!(
            "  Live: {}  Inactive: {}  Failed probes: {}",
            summary.valid_active.to_string().bright_green(),
            summary.valid_inactive.to_string().bright_black(),
            summary.verification_failed.to_string().bright_red()
        );
        println!(
            "  No candidate: {}  Unsupported type: {}",
            summary.extraction_failed.to_string().bright_yellow(),
            summary.unsupported.to_string().bright_yellow()
        );

        if summary.valid_active > 0 {
            println!();
            println!(
                "{}",
                "LIVE KEYS CONFIRMED - RESPONSIBLE DISCLOSURE REQUIRED"
                    .yellow()
                    .bold()
            );
            println!("Run `keycop notify` to open disclosure issues.");
        }
    }

    pub fn print_notify_summary(summary: &NotifySummary) {
        println!();
        println!("{}", "  Notification complete".bright_cyan().bold());
        println!(
            "  Notified: {}  Failed: {}  Skipped: {}",
            summary.notified.to_string().bright_green(),
            summary.failed.to_string().bright_red(),
            summary.skipped.to_string().bright_black()
        );
    }

    pub fn print_error(message: &str) {
        eprintln!("{} {}", "error:".bright_red().bold(), message.red());
    }

    pub fn print_success(message: &str) {
        println!("{} {}", "ok:".bright_green().bold(), message.green());
    }

    pub fn print_info(message: &str) {
        println!("{}", message);
    }
}
