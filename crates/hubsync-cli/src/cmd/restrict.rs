//! Restrict / unrestrict commands - admin flag that stops a library line
//! from being updated

use anyhow::{Context, Result, anyhow};

use crate::db::LibraryDb;
use crate::ui::Output;

pub fn restrict(machine_name: &str, line: &str) -> Result<()> {
    let (major, minor) = parse_line(line)?;
    let db = LibraryDb::open().context("Failed to open library database")?;
    db.restrict(machine_name, major, minor)?;
    Output::new().success(&format!(
        "{machine_name} {major}.{minor} will not be updated"
    ));
    Ok(())
}

pub fn unrestrict(machine_name: &str, line: &str) -> Result<()> {
    let (major, minor) = parse_line(line)?;
    let db = LibraryDb::open().context("Failed to open library database")?;
    let output = Output::new();
    if db.unrestrict(machine_name, major, minor)? {
        output.success(&format!("{machine_name} {major}.{minor} can be updated again"));
    } else {
        output.warning(&format!("{machine_name} {major}.{minor} was not restricted"));
    }
    Ok(())
}

/// Parse a `major.minor` library line.
fn parse_line(line: &str) -> Result<(u32, u32)> {
    let invalid = || anyhow!("Invalid library line '{line}' (expected major.minor, e.g. 1.16)");
    let (major, minor) = line.trim().split_once('.').ok_or_else(invalid)?;
    let major = major.parse().map_err(|_| invalid())?;
    let minor = minor.parse().map_err(|_| invalid())?;
    Ok((major, minor))
}
