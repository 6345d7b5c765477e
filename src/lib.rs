//! # KeyCop
//!
//! Finds, verifies, and responsibly discloses leaked API keys in public
//! source-code repositories.
//!
//! ## Pipeline
//!
//! Three batch stages that communicate only through the key record store:
//!
//! 1. **Search** (`search`): queries the platform's code search for one
//!    credential type, extracts candidates, and appends `FOUND` records.
//! 2. **Verify** (`verify`): probes each candidate against its issuing
//!    provider and classifies it; confirmed-live keys land in the
//!    valid-key view.
//! 3. **Notify** (`notify`): opens one disclosure issue per confirmed-live
//!    key and records the delivery outcome.
//!
//! ## Extension points
//!
//! - `KeyProvider`: one implementation per credential type (pattern,
//!   search query, extraction, liveness probe), registered in the
//!   `ProviderRegistry`.
//! - `CodeSearch` / `IssueTracker`: the hosting platform's capabilities,
//!   implemented by `GitHubClient`.

pub mod cli;
pub mod core;
pub mod notify;
pub mod platform;
pub mod providers;
pub mod report;
pub mod search;
pub mod store;
pub mod utils;
pub mod verify;

// Re-export commonly used types
pub use crate::core::{
    CodeSearch, Config, IssueTracker, KeyCopError, KeyProvider, KeyRecord, KeyStatus,
    ProbeOutcome, Result, SearchHit, SearchPage, EXTRACTION_SENTINEL,
};

pub use crate::notify::{Notifier, NotifySummary};
pub use crate::platform::GitHubClient;
pub use crate::providers::ProviderRegistry;
pub use crate::search::{SearchSummary, Searcher};
pub use crate::store::JsonStore;
pub use crate::verify::{VerifySummary, Verifier};
