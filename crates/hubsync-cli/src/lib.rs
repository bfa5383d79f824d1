//! hubsync - keep installed H5P content types current
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Runs the sync engine from `hubsync-core` against a local host: a SQLite
//! library registry, a zip package validator and a directory-backed library
//! store.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.hubsync/
//! ├── config.toml  # Endpoint, schedule, core API version
//! ├── state.db     # Installed libraries and restrictions
//! ├── libraries/   # One folder per {machineName}-{major}.{minor}
//! ├── tmp/         # Staged hub downloads
//! └── sync.lock    # Held while a pass runs
//! ```

pub mod cmd;
pub mod host;
pub mod store;
pub mod ui;

pub use crate::store::db;
pub use hubsync_core::paths::*;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hubsync")]
#[command(author, version, about = "hubsync - keep installed H5P content types current")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Hub endpoint base, overriding config.toml (e.g. hub-api.h5p.org/v1)
    #[arg(long, global = true, env = "HUBSYNC_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one sync pass now
    Sync,
    /// Run sync passes on the configured update schedule
    Schedule {
        /// Also run a pass immediately on startup
        #[arg(long)]
        now: bool,
    },
    /// Show what the hub offers and what a pass would do with it
    Catalog,
    /// List installed libraries
    List,
    /// Stop a library line from being updated
    Restrict {
        /// Library machine name (e.g. H5P.MultiChoice)
        machine_name: String,
        /// Library line as major.minor (e.g. 1.16)
        line: String,
    },
    /// Allow a restricted library line to be updated again
    Unrestrict {
        /// Library machine name
        machine_name: String,
        /// Library line as major.minor
        line: String,
    },
    /// Record a library as installed
    Register {
        /// Library machine name
        machine_name: String,
        /// Installed version as major.minor.patch
        version: String,
    },
    /// Show or edit settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print current settings
    Show,
    /// Set the hub endpoint base
    SetEndpoint {
        /// Endpoint base without trailing slash
        url: String,
    },
    /// Set how often scheduled passes run
    SetSchedule {
        /// never, daily or weekly
        schedule: String,
    },
}
