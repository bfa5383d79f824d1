//! Shared sync context.
//!
//! Groups the host capabilities used throughout a sync pass to reduce
//! argument fatigue.

use std::fmt;
use std::sync::Arc;

use crate::Reporter;
use crate::host::{CatalogSource, HostSession, LibraryRegistry, PackageStore, PackageValidator};

/// Every external collaborator the sync engine talks to.
#[derive(Clone)]
pub struct Context {
    pub hub: Arc<dyn CatalogSource>,
    pub registry: Arc<dyn LibraryRegistry>,
    pub validator: Arc<dyn PackageValidator>,
    pub store: Arc<dyn PackageStore>,
    pub session: Arc<dyn HostSession>,
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("core_api_version", &self.registry.core_api_version())
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        hub: Arc<dyn CatalogSource>,
        registry: Arc<dyn LibraryRegistry>,
        validator: Arc<dyn PackageValidator>,
        store: Arc<dyn PackageStore>,
        session: Arc<dyn HostSession>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            hub,
            registry,
            validator,
            store,
            session,
            reporter,
        }
    }
}
