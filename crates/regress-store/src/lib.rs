//! # regress-store
//!
//! Persistent memory for evaluation results.
//!
//! This crate provides:
//! - `ResultRecord` (one recorded or pending evaluation)
//! - the results log (JSONL, appended hand-outs, atomic rewrite)
//! - `ResultStore` (canonical in-memory projection, lock-scoped mutation)
//! - `ArtifactManifest` (which indices have a downloadable build)
//! - `FileOracle` (a `StateOracle` over a results file and a manifest)
//!
//! ## Data model
//!
//! ```text
//! results.jsonl (later lines win)
//!     ↕  load / save / claim_pending
//! ResultStore ──▶ FileOracle ◀── ArtifactManifest
//! ```

pub mod log;
pub mod manifest;
pub mod oracle;
pub mod record;
pub mod store;

pub use log::{LogError, append_to_log, parse_log, read_log, rewrite_log};
pub use manifest::{ArtifactManifest, ManifestError};
pub use oracle::FileOracle;
pub use record::ResultRecord;
pub use store::{ResultStore, ResultStoreError, claim_pending, lock_path, mutate_results};
