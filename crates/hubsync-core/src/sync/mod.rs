//! Sync orchestration.
//!
//! A pass fetches the hub catalog once, then walks it entry by entry:
//!
//! ```text
//! entry --restricted?--> skip
//!       --core API too old?--> skip
//!       --not installed locally?--> skip
//!       --not strictly newer?--> skip
//!       --> Installer::install
//! ```
//!
//! Entries are independent: a failed install is logged and recorded, and the
//! pass moves on. Only a catalog failure aborts the pass. Entries run one at
//! a time, so at most one archive is staged at any moment.

mod lock;
mod report;

pub use lock::{PassLock, STALE_AFTER};
pub use report::{SkipReason, SyncOutcome, SyncReport, SyncResult};

use std::path::PathBuf;
use std::time::Instant;

use futures::{StreamExt, future, stream};
use hubsync_schema::{CatalogEntry, LibraryVersion, version::is_newer};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::Context;
use crate::filter::{is_core_api_compatible, is_restricted};
use crate::host::LibraryId;
use crate::hub::HubError;
use crate::install::Installer;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch content type catalog: {0}")]
    Catalog(#[from] HubError),

    #[error("Another sync pass is already running (lock: {0})")]
    AlreadyRunning(PathBuf),

    #[error("Failed to take sync lock: {0}")]
    Lock(#[source] std::io::Error),
}

/// What a pass would do with one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Update {
        library_id: LibraryId,
        installed: LibraryVersion,
    },
    Skip(SkipReason),
}

/// Drives sync passes against one host.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    ctx: Context,
    lock_path: Option<PathBuf>,
    cancel: CancellationToken,
}

impl SyncEngine {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            lock_path: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Hold an advisory lock at `path` for the duration of each pass.
    pub fn with_lock(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    /// Stop between entries once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Decide what to do with `entry`, reading installed state fresh.
    pub fn plan(&self, entry: &CatalogEntry) -> Decision {
        let registry = self.ctx.registry.as_ref();
        let offered = entry.version;

        if is_restricted(registry, &entry.id, offered.major, offered.minor) {
            return Decision::Skip(SkipReason::Restricted);
        }

        let host = registry.core_api_version();
        if !is_core_api_compatible(entry.core_api_version_needed, host) {
            return Decision::Skip(SkipReason::IncompatibleCoreApi {
                // compatibility only fails when a requirement exists
                needed: entry.core_api_version_needed.unwrap_or_default(),
                host,
            });
        }

        let library_id = match registry.library_id(&entry.id) {
            Ok(Some(id)) => id,
            Ok(None) => return Decision::Skip(SkipReason::NotInstalled),
            Err(e) => return Decision::Skip(SkipReason::LookupFailed(e.to_string())),
        };

        let installed = match registry.installed_version(library_id) {
            Ok(Some(v)) => v,
            Ok(None) => return Decision::Skip(SkipReason::NotInstalled),
            Err(e) => return Decision::Skip(SkipReason::LookupFailed(e.to_string())),
        };

        if is_newer(installed, offered) {
            Decision::Update {
                library_id,
                installed,
            }
        } else {
            Decision::Skip(SkipReason::UpToDate { installed })
        }
    }

    /// Run one full synchronization pass.
    ///
    /// Returns `Err` only when nothing could be attempted: another pass holds
    /// the lock, or the catalog could not be fetched. Per-entry failures are
    /// part of the returned report.
    pub async fn run_sync_pass(&self) -> Result<SyncReport, SyncError> {
        let lock = self
            .lock_path
            .as_deref()
            .map(PassLock::acquire)
            .transpose()?;

        let started = Instant::now();
        let reporter = &self.ctx.reporter;
        reporter.section("Checking content type hub");

        let site_identifier = uuid::Uuid::new_v4().to_string();
        let catalog = match self.ctx.hub.fetch_catalog(&site_identifier).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(error = %e, class = %e.class(), "content type catalog unavailable, aborting pass");
                reporter.error(&format!("Could not fetch catalog: {e}"));
                return Err(SyncError::Catalog(e));
            }
        };
        tracing::info!(entries = catalog.len(), "content type catalog fetched");
        reporter.info(&format!("Hub offers {} content types", catalog.len()));

        let catalog_size = catalog.len();
        let outcomes: Vec<SyncOutcome> = stream::iter(catalog.content_types)
            .take_while(|_| future::ready(!self.cancel.is_cancelled()))
            .then(|entry| {
                if let Some(lock) = &lock {
                    lock.refresh();
                }
                self.sync_entry(entry)
            })
            .collect()
            .await;

        let report = SyncReport {
            cancelled: outcomes.len() < catalog_size,
            outcomes,
            catalog_size,
            elapsed: started.elapsed(),
        };
        report.log();
        if report.cancelled {
            reporter.warning(&format!(
                "Pass cancelled, {} of {catalog_size} entries not processed",
                report.not_processed()
            ));
        }
        reporter.summary(
            report.installed().count(),
            report.skipped().count(),
            report.failed().count(),
            report.elapsed.as_secs_f64(),
        );
        Ok(report)
    }

    async fn sync_entry(&self, entry: CatalogEntry) -> SyncOutcome {
        let reporter = &self.ctx.reporter;
        let result = match self.plan(&entry) {
            Decision::Skip(reason) => {
                tracing::debug!(machine_name = %entry.id, version = %entry.version, %reason, "skipping");
                reporter.skipped(&entry.id, &reason.to_string());
                SyncResult::Skipped { reason }
            }
            Decision::Update { installed, .. } => {
                reporter.installing(&entry.id, &installed, &entry.version);
                match Installer::new(&self.ctx).install(&entry).await {
                    Ok(library_id) => {
                        reporter.done(&entry.id, &entry.version, "updated");
                        SyncResult::Installed { library_id }
                    }
                    Err(e) => {
                        tracing::error!(
                            machine_name = e.machine_name(),
                            class = %e.class(),
                            error = %e,
                            "library update failed"
                        );
                        reporter.failed(&entry.id, &e.to_string());
                        SyncResult::InstallFailed {
                            class: e.class(),
                            message: e.to_string(),
                        }
                    }
                }
            }
        };

        SyncOutcome {
            machine_name: entry.id,
            offered: entry.version,
            result,
        }
    }
}
