//! Directory-backed library store.
//!
//! Each library folder from a validated package is copied to
//! `libraries/{machineName}-{major}.{minor}`, replacing any earlier copy of
//! the same line, and its row in the library database is upserted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hubsync_core::host::{HostError, HostMessage, MANAGE_LIBRARIES, PackageStore, StagingPaths};
use hubsync_schema::library_key;
use walkdir::WalkDir;

use super::lock_db;
use super::session::LocalSession;
use super::validator::read_libraries;
use crate::store::{LibraryDb, NewLibrary};

#[derive(Debug)]
pub struct DirectoryStore {
    db: Arc<Mutex<LibraryDb>>,
    libraries_dir: PathBuf,
    session: Arc<LocalSession>,
}

impl DirectoryStore {
    pub fn new(
        db: Arc<Mutex<LibraryDb>>,
        libraries_dir: impl Into<PathBuf>,
        session: Arc<LocalSession>,
    ) -> Self {
        Self {
            db,
            libraries_dir: libraries_dir.into(),
            session,
        }
    }

    fn store(&self, staged: &StagingPaths) -> Result<usize, HostError> {
        let libraries = read_libraries(&staged.extract_dir)?;
        fs::create_dir_all(&self.libraries_dir)?;

        for lib in &libraries {
            let version = lib.meta.version();
            let key = library_key(&lib.meta.machine_name, version.major, version.minor);
            let target = self.libraries_dir.join(&key);

            if target.exists() {
                fs::remove_dir_all(&target)?;
            }
            copy_dir(&lib.dir, &target)?;

            let target_str = target.display().to_string();
            let id = lock_db(&self.db)?.upsert_library(&NewLibrary {
                machine_name: &lib.meta.machine_name,
                version,
                title: lib.meta.title.as_deref(),
                path: Some(&target_str),
            })?;
            tracing::debug!(%key, library_id = %id, path = %target.display(), "library stored");
        }

        Ok(libraries.len())
    }
}

impl PackageStore for DirectoryStore {
    fn persist(&self, staged: &StagingPaths) -> Result<(), HostError> {
        self.session.require(MANAGE_LIBRARIES)?;

        match self.store(staged) {
            Ok(count) => {
                self.session
                    .push_message(HostMessage::info(format!("stored {count} libraries")));
                Ok(())
            }
            Err(e) => {
                self.session.push_message(HostMessage::error(e.to_string()));
                Err(e)
            }
        }
    }
}

fn copy_dir(src: &Path, dest: &Path) -> Result<(), HostError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| HostError::Backend(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| HostError::Backend(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
