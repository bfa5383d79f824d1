//! Register command - record a library as installed without fetching it

use anyhow::{Context, Result};
use hubsync_schema::LibraryVersion;

use crate::db::{LibraryDb, NewLibrary};
use crate::ui::Output;

pub fn register(machine_name: &str, version: &str) -> Result<()> {
    let version: LibraryVersion = version
        .parse()
        .with_context(|| format!("Invalid version '{version}' (expected major.minor.patch)"))?;

    let db = LibraryDb::open().context("Failed to open library database")?;
    let id = db.upsert_library(&NewLibrary {
        machine_name,
        version,
        title: None,
        path: None,
    })?;

    tracing::debug!(machine_name, %version, library_id = %id, "library registered");
    Output::new().success(&format!("Registered {machine_name} {version}"));
    Ok(())
}
