//! Local host framework.
//!
//! Implements the host traits of `hubsync-core` on top of the state
//! directory: [`LocalRegistry`] reads the library database, [`ZipValidator`]
//! unpacks and checks packages, [`DirectoryStore`] copies libraries into
//! place, and [`LocalSession`] holds capabilities and the message log.

pub mod registry;
pub mod session;
pub mod store;
pub mod validator;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use hubsync_core::host::{CatalogSource, HostError};
use hubsync_core::{Context, Reporter};
use hubsync_schema::CoreApiVersion;

pub use registry::LocalRegistry;
pub use session::LocalSession;
pub use store::DirectoryStore;
pub use validator::ZipValidator;

use crate::store::{DbError, LibraryDb};

pub(crate) fn lock_db(db: &Mutex<LibraryDb>) -> Result<MutexGuard<'_, LibraryDb>, HostError> {
    db.lock()
        .map_err(|_| HostError::Backend("library database lock poisoned".to_string()))
}

/// Where the local host keeps its state.
#[derive(Debug, Clone)]
pub struct HostLayout {
    pub db: PathBuf,
    pub libraries: PathBuf,
    pub tmp: PathBuf,
}

impl HostLayout {
    /// The layout under the hubsync home directory.
    pub fn from_home() -> Self {
        Self {
            db: crate::db_path(),
            libraries: crate::libraries_path(),
            tmp: crate::tmp_path(),
        }
    }
}

/// All host capabilities of one local site, sharing one database handle.
#[derive(Debug, Clone)]
pub struct LocalHost {
    pub db: Arc<Mutex<LibraryDb>>,
    pub registry: Arc<LocalRegistry>,
    pub validator: Arc<ZipValidator>,
    pub store: Arc<DirectoryStore>,
    pub session: Arc<LocalSession>,
}

impl LocalHost {
    pub fn open(layout: &HostLayout, core_api: CoreApiVersion) -> Result<Self, DbError> {
        if let Some(parent) = layout.db.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let db = Arc::new(Mutex::new(LibraryDb::open_at(&layout.db)?));
        let session = Arc::new(LocalSession::new(&layout.tmp));
        Ok(Self {
            registry: Arc::new(LocalRegistry::new(db.clone(), core_api)),
            validator: Arc::new(ZipValidator::new(session.clone())),
            store: Arc::new(DirectoryStore::new(
                db.clone(),
                &layout.libraries,
                session.clone(),
            )),
            session,
            db,
        })
    }

    /// Wire this host and a hub into a sync context.
    pub fn context(&self, hub: Arc<dyn CatalogSource>, reporter: Arc<dyn Reporter>) -> Context {
        Context::new(
            hub,
            self.registry.clone(),
            self.validator.clone(),
            self.store.clone(),
            self.session.clone(),
            reporter,
        )
    }
}
