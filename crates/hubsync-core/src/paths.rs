//! Local state layout.
//!
//! Everything hubsync keeps on disk lives under one home directory,
//! `$HUBSYNC_HOME` when set and `~/.hubsync` otherwise:
//!
//! ```text
//! ~/.hubsync/
//! ├── config.toml   endpoint, update schedule, host core API version
//! ├── state.db      installed libraries and admin restrictions
//! ├── libraries/    one folder per installed `{machineName}-{major}.{minor}`
//! ├── tmp/          archives staged during an install, emptied afterwards
//! └── sync.lock     present while a sync pass runs
//! ```

use std::path::PathBuf;

/// Overrides the home directory, e.g. for tests or a second site.
pub const HOME_ENV: &str = "HUBSYNC_HOME";

/// The hubsync home, or `None` when neither `HUBSYNC_HOME` nor the user's
/// home directory is available.
pub fn try_hubsync_home() -> Option<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|home| home.join(".hubsync")),
    }
}

/// # Panics
///
/// Panics when [`try_hubsync_home`] finds no home directory.
pub fn hubsync_home() -> PathBuf {
    try_hubsync_home().expect("Could not determine home directory. Set HUBSYNC_HOME to override.")
}

pub fn config_path() -> PathBuf {
    hubsync_home().join("config.toml")
}

pub fn db_path() -> PathBuf {
    hubsync_home().join("state.db")
}

pub fn libraries_path() -> PathBuf {
    hubsync_home().join("libraries")
}

pub fn tmp_path() -> PathBuf {
    hubsync_home().join("tmp")
}

pub fn lock_path() -> PathBuf {
    hubsync_home().join("sync.lock")
}
