//! Library registry backed by the SQLite library database.

use std::sync::{Arc, Mutex};

use hubsync_core::host::{HostError, LibraryId, LibraryRegistry};
use hubsync_schema::{CoreApiVersion, LibraryVersion};

use super::lock_db;
use crate::store::LibraryDb;

#[derive(Debug)]
pub struct LocalRegistry {
    db: Arc<Mutex<LibraryDb>>,
    core_api: CoreApiVersion,
}

impl LocalRegistry {
    pub fn new(db: Arc<Mutex<LibraryDb>>, core_api: CoreApiVersion) -> Self {
        Self { db, core_api }
    }
}

impl LibraryRegistry for LocalRegistry {
    /// Several `major.minor` lines of one library can be installed side by
    /// side; the newest line stands for the library.
    fn library_id(&self, machine_name: &str) -> Result<Option<LibraryId>, HostError> {
        Ok(lock_db(&self.db)?
            .latest_library(machine_name)?
            .map(|lib| lib.id))
    }

    fn installed_version(&self, id: LibraryId) -> Result<Option<LibraryVersion>, HostError> {
        Ok(lock_db(&self.db)?.get_library(id)?.map(|lib| lib.version))
    }

    fn is_restricted(&self, machine_name: &str, major: u32, minor: u32) -> Result<bool, HostError> {
        Ok(lock_db(&self.db)?.is_restricted(machine_name, major, minor)?)
    }

    fn core_api_version(&self) -> CoreApiVersion {
        self.core_api
    }

    fn lookup(&self, key: &str) -> Result<Option<LibraryId>, HostError> {
        Ok(lock_db(&self.db)?.find_by_key(key)?)
    }

    fn set_tutorial_url(&self, id: LibraryId, url: &str) -> Result<(), HostError> {
        Ok(lock_db(&self.db)?.set_tutorial_url(id, url)?)
    }
}
