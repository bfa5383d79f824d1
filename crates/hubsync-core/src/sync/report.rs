//! Per-entry outcomes of a sync pass and the batch summary built from them.

use std::fmt;
use std::time::Duration;

use hubsync_schema::{CoreApiVersion, LibraryVersion};

use crate::error::ErrorClass;
use crate::host::LibraryId;

/// Why a catalog entry was not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The admin restricted this `major.minor` line.
    Restricted,
    /// The host core API is older than the entry requires.
    IncompatibleCoreApi {
        needed: CoreApiVersion,
        host: CoreApiVersion,
    },
    /// Content types are never installed unless already present locally.
    NotInstalled,
    /// The installed version is the same or newer.
    UpToDate { installed: LibraryVersion },
    /// Installed state could not be read.
    LookupFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restricted => f.write_str("restricted"),
            Self::IncompatibleCoreApi { needed, host } => {
                write!(f, "requires core API {needed}, host has {host}")
            }
            Self::NotInstalled => f.write_str("not installed"),
            Self::UpToDate { installed } => write!(f, "up to date ({installed})"),
            Self::LookupFailed(msg) => write!(f, "lookup failed: {msg}"),
        }
    }
}

/// Result of processing one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    Skipped { reason: SkipReason },
    InstallFailed { class: ErrorClass, message: String },
    Installed { library_id: LibraryId },
}

/// A [`SyncResult`] tagged with the entry it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub machine_name: String,
    pub offered: LibraryVersion,
    pub result: SyncResult,
}

/// Everything one pass did. Logged, never persisted.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub outcomes: Vec<SyncOutcome>,
    /// Entries in the catalog, including any not reached.
    pub catalog_size: usize,
    /// The pass stopped early because it was cancelled.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn installed(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, SyncResult::Installed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, SyncResult::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, SyncResult::InstallFailed { .. }))
    }

    /// Entries never looked at because the pass was cancelled.
    pub fn not_processed(&self) -> usize {
        self.catalog_size.saturating_sub(self.outcomes.len())
    }

    pub fn outcome(&self, machine_name: &str) -> Option<&SyncOutcome> {
        self.outcomes.iter().find(|o| o.machine_name == machine_name)
    }

    /// Emit the one-line pass summary.
    pub fn log(&self) {
        let installed = self.installed().count();
        let skipped = self.skipped().count();
        let failed = self.failed().count();
        if failed > 0 {
            tracing::warn!(
                installed,
                skipped,
                failed,
                cancelled = self.cancelled,
                elapsed_ms = self.elapsed.as_millis() as u64,
                "sync pass finished with failures"
            );
        } else {
            tracing::info!(
                installed,
                skipped,
                cancelled = self.cancelled,
                elapsed_ms = self.elapsed.as_millis() as u64,
                "sync pass finished"
            );
        }
    }
}
