//! hubsync-core - keeps installed H5P content types current with the hub.
//!
//! # Overview
//!
//! A sync pass downloads the hub's content type catalog once and, for every
//! entry that is already installed locally, unrestricted, compatible with
//! the host core API and strictly newer, installs the offered archive
//! through the host framework.
//!
//! # Architecture
//!
//! - **Host traits**: everything owned by the host framework (registry,
//!   validator, store, session) sits behind a trait in [`host`], so the
//!   engine runs against a real site or an in-memory fake alike.
//! - **Typestate install**: `FetchedArchive` → `StagedArchive` →
//!   `ValidatedArchive` makes it impossible to persist an unvalidated
//!   archive or forget the staging cleanup.
//! - **Scoped elevation**: [`host::ElevatedScope`] grants a capability for
//!   exactly one host call and revokes it on every exit path.

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod host;
pub mod hub;
pub mod install;
pub mod paths;
pub mod reporter;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::{EndpointSource, FixedEndpoint, Settings, SettingsFile, UpdateSchedule};
pub use context::Context;
pub use error::ErrorClass;
pub use hub::{HubClient, HubError};
pub use install::{InstallError, Installer};
pub use paths::*;
pub use reporter::{NullReporter, Reporter};
pub use sync::{Decision, SyncEngine, SyncError, SyncReport};

/// User Agent string for hub requests
pub const USER_AGENT: &str = concat!("hubsync-core/", env!("CARGO_PKG_VERSION"));
