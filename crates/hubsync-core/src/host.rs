//! Host framework capabilities consumed by the sync engine.
//!
//! The engine never reaches for global state: everything it needs from the
//! content-authoring framework is one of these traits, injected through
//! [`crate::Context`].

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use hubsync_schema::{Catalog, CoreApiVersion, LibraryVersion};
use thiserror::Error;

use crate::hub::HubError;

/// Capability the validator and store require of the invoking principal.
pub const MANAGE_LIBRARIES: &str = "manage_h5p_libraries";

/// Opaque identifier the host storage assigns to an installed library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryId(pub i64);

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("package rejected: {0}")]
    Rejected(String),

    #[error("permission denied: missing capability '{0}'")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

/// Severity of a message the host accumulated while working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// A message queued by the host during validate/persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl HostMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

/// Where a downloaded archive is staged and unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    pub archive: PathBuf,
    pub extract_dir: PathBuf,
}

/// Remote source of the content type catalog and archives.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self, site_identifier: &str) -> Result<Catalog, HubError>;

    async fn fetch_archive(&self, machine_name: &str) -> Result<Bytes, HubError>;
}

/// Read and patch access to the host's installed libraries.
pub trait LibraryRegistry: Send + Sync {
    /// Identifier of the installed library with this machine name, if any.
    fn library_id(&self, machine_name: &str) -> Result<Option<LibraryId>, HostError>;

    fn installed_version(&self, id: LibraryId) -> Result<Option<LibraryVersion>, HostError>;

    /// Admin-set restriction flag for one `major.minor` line of a library.
    fn is_restricted(&self, machine_name: &str, major: u32, minor: u32)
    -> Result<bool, HostError>;

    fn core_api_version(&self) -> CoreApiVersion;

    /// Resolve a `{machine_name}-{major}.{minor}` key against the registry.
    fn lookup(&self, key: &str) -> Result<Option<LibraryId>, HostError>;

    fn set_tutorial_url(&self, id: LibraryId, url: &str) -> Result<(), HostError>;
}

/// Checks a staged archive. `Err(HostError::Rejected)` means invalid.
pub trait PackageValidator: Send + Sync {
    fn validate(&self, staged: &StagingPaths) -> Result<(), HostError>;
}

/// Saves a validated package into host storage.
pub trait PackageStore: Send + Sync {
    fn persist(&self, staged: &StagingPaths) -> Result<(), HostError>;
}

/// Per-principal session state of the host framework.
pub trait HostSession: Send + Sync {
    /// Temp paths for the next staged archive.
    fn staging_paths(&self) -> StagingPaths;

    /// Take every queued message, leaving the queue empty.
    fn drain_messages(&self) -> Vec<HostMessage>;

    fn has_capability(&self, capability: &str) -> bool;

    fn grant_capability(&self, capability: &str);

    fn revoke_capability(&self, capability: &str);
}

/// Temporarily grants a capability to the current principal.
///
/// If the principal already holds the capability nothing changes. Otherwise
/// it is granted on acquire and revoked when the scope is dropped, whatever
/// path the caller leaves by.
pub struct ElevatedScope<'a> {
    session: &'a dyn HostSession,
    capability: &'a str,
    granted: bool,
}

impl<'a> ElevatedScope<'a> {
    pub fn acquire(session: &'a dyn HostSession, capability: &'a str) -> Self {
        let granted = if session.has_capability(capability) {
            false
        } else {
            tracing::debug!(capability, "granting temporary capability");
            session.grant_capability(capability);
            true
        };
        Self {
            session,
            capability,
            granted,
        }
    }

    /// Whether this scope added the capability (and will remove it).
    pub fn granted(&self) -> bool {
        self.granted
    }
}

impl Drop for ElevatedScope<'_> {
    fn drop(&mut self) {
        if self.granted {
            tracing::debug!(capability = self.capability, "revoking temporary capability");
            self.session.revoke_capability(self.capability);
        }
    }
}

impl fmt::Debug for ElevatedScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevatedScope")
            .field("capability", &self.capability)
            .field("granted", &self.granted)
            .finish_non_exhaustive()
    }
}

/// Run `f` with `capability` held for exactly its duration.
pub fn with_elevation<T>(
    session: &dyn HostSession,
    capability: &str,
    f: impl FnOnce() -> T,
) -> T {
    let _scope = ElevatedScope::acquire(session, capability);
    f()
}
