use anyhow::{Context, Result};

use crate::db::LibraryDb;
use crate::ui::Output;

/// List all installed libraries
pub fn list() -> Result<()> {
    let db = LibraryDb::open().context("Failed to open library database")?;
    let libraries = db.list_libraries()?;
    let restrictions = db.list_restrictions()?;
    let output = Output::new();

    if libraries.is_empty() {
        println!();
        println!("  No libraries installed.");
        println!("  Run 'hubsync register <machine_name> <version>' to track one.");
        return Ok(());
    }

    output.section("Installed libraries");
    for lib in &libraries {
        let installed = chrono::DateTime::from_timestamp(lib.installed_at, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string();
        let restricted = restrictions.iter().any(|(name, major, minor)| {
            *name == lib.machine_name && (*major, *minor) == lib.version.minor_line()
        });
        let note = if restricted {
            format!("{installed}  restricted")
        } else {
            installed
        };
        output.row(&lib.machine_name, &lib.version.to_string(), &note);
    }

    println!();
    println!(
        "  {} librar{} total",
        libraries.len(),
        if libraries.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}
