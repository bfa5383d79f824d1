//! Library installation.
//!
//! One call to [`Installer::install`] takes a single catalog entry through
//! the whole pipeline:
//!
//! 1. fetch the archive from the hub
//! 2. stage it to the host's temp path
//! 3. validate and 4. persist it, each under a temporary capability grant
//! 5. clean up the staging area and drain host messages (always)
//! 6. confirm the host registry now knows `{machine_name}-{major}.{minor}`
//! 7. patch the tutorial URL onto the library record (best effort)

mod error;
mod flow;

pub use error::InstallError;

use hubsync_schema::CatalogEntry;

use crate::Context;
use crate::host::LibraryId;
use flow::{FetchedArchive, ValidatedArchive};

/// Installs catalog entries into the host framework.
#[derive(Debug, Clone, Copy)]
pub struct Installer<'a> {
    ctx: &'a Context,
}

impl<'a> Installer<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Install the library described by `entry`, returning the identifier
    /// the host assigned to it.
    pub async fn install(&self, entry: &CatalogEntry) -> Result<LibraryId, InstallError> {
        let fetched = FetchedArchive::fetch(self.ctx.hub.as_ref(), entry).await?;
        let staged = fetched.stage(self.ctx.session.staging_paths()).await?;

        // Host validation and storage unpack and copy trees on disk.
        let ctx = self.ctx.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = staged.validate(&ctx).and_then(ValidatedArchive::persist);
            staged.cleanup(ctx.session.as_ref());
            outcome
        })
        .await
        .map_err(|e| InstallError::storage(&entry.id, format!("install task panicked: {e}")))??;

        let library_id = self.verify_registered(entry)?;
        self.patch_metadata(library_id, entry);

        tracing::info!(
            machine_name = %entry.id,
            version = %entry.version,
            library_id = %library_id,
            "library installed"
        );
        Ok(library_id)
    }

    /// The host can report success without registering anything, so look the
    /// library up again before calling it installed.
    fn verify_registered(&self, entry: &CatalogEntry) -> Result<LibraryId, InstallError> {
        let key = entry.library_key();
        match self.ctx.registry.lookup(&key) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(InstallError::post_install_check(
                &entry.id,
                format!("{key} is not registered after install"),
            )),
            Err(e) => Err(InstallError::post_install_check(
                &entry.id,
                format!("lookup of {key} failed: {e}"),
            )),
        }
    }

    fn patch_metadata(&self, library_id: LibraryId, entry: &CatalogEntry) {
        let Some(tutorial) = entry.tutorial.as_deref() else {
            return;
        };
        if let Err(e) = self.ctx.registry.set_tutorial_url(library_id, tutorial) {
            tracing::warn!(
                machine_name = %entry.id,
                library_id = %library_id,
                error = %e,
                "failed to record tutorial URL"
            );
            self.ctx
                .reporter
                .warning(&format!("{}: tutorial URL not recorded: {e}", entry.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::host::{HostSession, MANAGE_LIBRARIES};
    use crate::testing::{
        FakeHost, FakeHub, RecordingReporter, context, context_with_reporter, entry, fake_archive,
    };
    use hubsync_schema::LibraryVersion;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn setup() -> (Arc<FakeHub>, Arc<FakeHost>, Context) {
        let hub = Arc::new(FakeHub::with_catalog(vec![]));
        let host = Arc::new(FakeHost::new());
        host.registry.install("H5P.Example", LibraryVersion::new(1, 1, 0));
        hub.add_archive("H5P.Example", fake_archive("H5P.Example", "1.2.0"));
        let ctx = context(&hub, &host);
        (hub, host, ctx)
    }

    fn assert_staging_clean(host: &FakeHost) {
        let paths = host.staging_paths();
        assert!(!paths.archive.exists(), "staged archive left behind");
        assert!(!paths.extract_dir.exists(), "extraction folder left behind");
    }

    #[tokio::test]
    async fn test_install_success() {
        let (_hub, host, ctx) = setup();
        let mut e = entry("H5P.Example", 1, 2, 0);
        e.tutorial = Some("https://h5p.org/tutorial".to_string());

        let id = Installer::new(&ctx).install(&e).await.unwrap();

        let lib = host.registry.get("H5P.Example").unwrap();
        assert_eq!(lib.id, id);
        assert_eq!(lib.version, LibraryVersion::new(1, 2, 0));
        assert_eq!(lib.tutorial_url.as_deref(), Some("https://h5p.org/tutorial"));
        assert_staging_clean(&host);
        assert!(host.drain_messages().is_empty(), "host messages not drained");
        assert!(!host.has_capability(MANAGE_LIBRARIES));
        assert_eq!(host.capability_denials.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let (hub, host, ctx) = setup();
        hub.remove_archive("H5P.Example");

        let err = Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Fetch { .. }));
        assert_eq!(err.machine_name(), "H5P.Example");
        assert_eq!(err.class(), ErrorClass::Protocol);
        assert_staging_clean(&host);
    }

    #[tokio::test]
    async fn test_write_failure() {
        let (_hub, host, ctx) = setup();
        // A plain file where the staging directory should be.
        let staging_dir = host.staging_paths().archive.parent().unwrap().to_path_buf();
        std::fs::write(&staging_dir, b"not a directory").unwrap();

        let err = Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Write { .. }));
        assert_eq!(err.class(), ErrorClass::Filesystem);
        assert_eq!(
            host.registry.get("H5P.Example").unwrap().version,
            LibraryVersion::new(1, 1, 0)
        );
    }

    #[tokio::test]
    async fn test_validation_failure_cleans_up() {
        let (hub, host, ctx) = setup();
        hub.add_archive("H5P.Example", b"garbage".to_vec());

        let err = Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Validation { .. }));
        assert_staging_clean(&host);
        assert!(host.drain_messages().is_empty());
        assert!(!host.has_capability(MANAGE_LIBRARIES));
        assert_eq!(
            host.registry.get("H5P.Example").unwrap().version,
            LibraryVersion::new(1, 1, 0)
        );
    }

    #[tokio::test]
    async fn test_storage_failure_cleans_up() {
        let (_hub, host, ctx) = setup();
        host.fail_storage.store(true, Ordering::SeqCst);

        let err = Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Storage { .. }));
        assert_eq!(err.class(), ErrorClass::Storage);
        assert_staging_clean(&host);
        assert!(!host.has_capability(MANAGE_LIBRARIES));
    }

    #[tokio::test]
    async fn test_silent_noop_fails_post_install_check() {
        let (_hub, host, ctx) = setup();
        host.silent_noop.store(true, Ordering::SeqCst);

        let err = Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::PostInstallCheck { .. }));
        assert_eq!(err.class(), ErrorClass::Consistency);
        assert_staging_clean(&host);
    }

    #[tokio::test]
    async fn test_tutorial_patch_failure_is_not_fatal() {
        let (hub, host, _) = setup();
        let reporter = Arc::new(RecordingReporter::default());
        let ctx = context_with_reporter(&hub, &host, reporter.clone());
        host.registry.fail_patch.store(true, Ordering::SeqCst);
        let mut e = entry("H5P.Example", 1, 2, 0);
        e.tutorial = Some("https://h5p.org/tutorial".to_string());

        let id = Installer::new(&ctx).install(&e).await.unwrap();

        let lib = host.registry.get("H5P.Example").unwrap();
        assert_eq!(lib.id, id);
        assert_eq!(lib.version, LibraryVersion::new(1, 2, 0));
        assert!(lib.tutorial_url.is_none());
        let warnings = reporter.messages("warning");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("H5P.Example"));
    }

    #[tokio::test]
    async fn test_validator_panic_cleans_up() {
        let (_hub, host, ctx) = setup();
        host.panic_on_validate.store(true, Ordering::SeqCst);

        let err = Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap_err();

        assert_eq!(err.machine_name(), "H5P.Example");
        assert!(err.to_string().contains("panicked"));
        assert_staging_clean(&host);
        assert!(!host.has_capability(MANAGE_LIBRARIES));
        assert_eq!(
            host.registry.get("H5P.Example").unwrap().version,
            LibraryVersion::new(1, 1, 0)
        );
    }

    #[tokio::test]
    async fn test_permanent_capability_is_kept() {
        let (_hub, host, ctx) = setup();
        host.grant_capability(MANAGE_LIBRARIES);

        Installer::new(&ctx)
            .install(&entry("H5P.Example", 1, 2, 0))
            .await
            .unwrap();

        assert!(host.has_capability(MANAGE_LIBRARIES));
    }
}
