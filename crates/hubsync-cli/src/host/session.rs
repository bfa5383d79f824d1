//! Principal session for the local host: capabilities, message log and
//! staging paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use hubsync_core::host::{HostError, HostMessage, HostSession, StagingPaths};

/// Session of the principal running hubsync.
///
/// Starts with no capabilities; the installer grants what it needs for the
/// duration of each host call.
#[derive(Debug)]
pub struct LocalSession {
    tmp_dir: PathBuf,
    capabilities: Mutex<HashSet<String>>,
    messages: Mutex<Vec<HostMessage>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LocalSession {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
            capabilities: Mutex::default(),
            messages: Mutex::default(),
        }
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn push_message(&self, message: HostMessage) {
        lock(&self.messages).push(message);
    }

    /// Fail unless the principal currently holds `capability`.
    pub fn require(&self, capability: &str) -> Result<(), HostError> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(HostError::PermissionDenied(capability.to_string()))
        }
    }
}

impl HostSession for LocalSession {
    fn staging_paths(&self) -> StagingPaths {
        let name = format!("hub-{}", uuid::Uuid::new_v4());
        StagingPaths {
            archive: self.tmp_dir.join(format!("{name}.h5p")),
            extract_dir: self.tmp_dir.join(name),
        }
    }

    fn drain_messages(&self) -> Vec<HostMessage> {
        std::mem::take(&mut *lock(&self.messages))
    }

    fn has_capability(&self, capability: &str) -> bool {
        lock(&self.capabilities).contains(capability)
    }

    fn grant_capability(&self, capability: &str) {
        lock(&self.capabilities).insert(capability.to_string());
    }

    fn revoke_capability(&self, capability: &str) {
        lock(&self.capabilities).remove(capability);
    }
}
