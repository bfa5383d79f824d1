//! Install Flow Typestate Pattern
//!
//! Models one library install as a series of explicit state transitions:
//!
//! ```text
//! FetchedArchive --[stage()]--> StagedArchive --[validate()]--> ValidatedArchive --[persist()]
//!                                     |
//!                                     +--[cleanup()]  (always, after validate/persist)
//! ```
//!
//! A package cannot be persisted before it has been validated, and a
//! `StagedArchive` removes its temp file and extraction folder when it goes
//! away, even if `cleanup()` is never reached.
//!
//! `StagedArchive` owns its data so validate, persist and cleanup can run
//! together on a blocking thread.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use hubsync_schema::CatalogEntry;

use crate::Context;
use crate::host::{
    CatalogSource, HostSession, MANAGE_LIBRARIES, MessageLevel, StagingPaths, with_elevation,
};
use crate::install::InstallError;

/// State 1: archive bytes downloaded from the hub, not yet on disk.
pub(crate) struct FetchedArchive<'e> {
    entry: &'e CatalogEntry,
    bytes: Bytes,
}

impl fmt::Debug for FetchedArchive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedArchive")
            .field("machine_name", &self.entry.id)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl<'e> FetchedArchive<'e> {
    pub(crate) async fn fetch(
        hub: &dyn CatalogSource,
        entry: &'e CatalogEntry,
    ) -> Result<Self, InstallError> {
        let bytes = hub
            .fetch_archive(&entry.id)
            .await
            .map_err(|source| InstallError::Fetch {
                machine_name: entry.id.clone(),
                source,
            })?;
        Ok(Self { entry, bytes })
    }

    /// Write the archive to the host's temp path.
    pub(crate) async fn stage(self, paths: StagingPaths) -> Result<StagedArchive, InstallError> {
        let machine_name = &self.entry.id;

        if let Some(parent) = paths.archive.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallError::write(machine_name, e))?;
        }

        if let Err(e) = tokio::fs::write(&paths.archive, &self.bytes).await {
            // Don't leave a partial archive behind.
            tokio::fs::remove_file(&paths.archive).await.ok();
            return Err(InstallError::write(machine_name, e));
        }

        tracing::debug!(
            machine_name = %machine_name,
            path = %paths.archive.display(),
            "archive staged"
        );

        Ok(StagedArchive {
            machine_name: machine_name.clone(),
            paths,
            cleaned: false,
        })
    }
}

/// State 2: archive written to the staging path.
pub(crate) struct StagedArchive {
    machine_name: String,
    paths: StagingPaths,
    cleaned: bool,
}

impl fmt::Debug for StagedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedArchive")
            .field("machine_name", &self.machine_name)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl StagedArchive {
    /// Hand the staged archive to the host validator under elevation.
    pub(crate) fn validate<'s>(
        &'s self,
        ctx: &'s Context,
    ) -> Result<ValidatedArchive<'s>, InstallError> {
        with_elevation(ctx.session.as_ref(), MANAGE_LIBRARIES, || {
            ctx.validator.validate(&self.paths)
        })
        .map_err(|e| InstallError::validation(&self.machine_name, e))?;

        tracing::debug!(machine_name = %self.machine_name, "package validated");
        Ok(ValidatedArchive {
            machine_name: &self.machine_name,
            paths: &self.paths,
            ctx,
        })
    }

    /// Delete the staged file and extraction folder, then discard whatever
    /// messages the host queued while working on this package.
    pub(crate) fn cleanup(mut self, session: &dyn HostSession) {
        for e in remove_staging(&self.paths) {
            tracing::warn!(machine_name = %self.machine_name, error = %e, "staging cleanup failed");
        }
        self.cleaned = true;

        for message in session.drain_messages() {
            match message.level {
                MessageLevel::Info => {
                    tracing::debug!(machine_name = %self.machine_name, "host: {}", message.text);
                }
                MessageLevel::Error => {
                    tracing::debug!(machine_name = %self.machine_name, "host error: {}", message.text);
                }
            }
        }
    }
}

impl Drop for StagedArchive {
    fn drop(&mut self) {
        if !self.cleaned {
            for e in remove_staging(&self.paths) {
                tracing::warn!(machine_name = %self.machine_name, error = %e, "staging cleanup failed");
            }
        }
    }
}

/// State 3: the host accepted the package.
pub(crate) struct ValidatedArchive<'s> {
    machine_name: &'s str,
    paths: &'s StagingPaths,
    ctx: &'s Context,
}

impl fmt::Debug for ValidatedArchive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedArchive")
            .field("machine_name", &self.machine_name)
            .finish_non_exhaustive()
    }
}

impl ValidatedArchive<'_> {
    /// Hand the validated package to host storage under elevation.
    pub(crate) fn persist(self) -> Result<(), InstallError> {
        let ctx = self.ctx;
        with_elevation(ctx.session.as_ref(), MANAGE_LIBRARIES, || {
            ctx.store.persist(self.paths)
        })
        .map_err(|e| InstallError::storage(self.machine_name, e))?;

        tracing::debug!(machine_name = self.machine_name, "package persisted");
        Ok(())
    }
}

/// Remove both staging locations, returning any failures other than
/// "already gone".
fn remove_staging(paths: &StagingPaths) -> Vec<std::io::Error> {
    let mut errors = Vec::new();
    if let Err(e) = remove_if_present(&paths.archive, false) {
        errors.push(e);
    }
    if let Err(e) = remove_if_present(&paths.extract_dir, true) {
        errors.push(e);
    }
    errors
}

fn remove_if_present(path: &Path, dir: bool) -> std::io::Result<()> {
    let result = if dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
