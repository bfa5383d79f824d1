//! Shared types and wire format for the content type hub.
//!
//! This crate is dependency-light so that both the sync engine and any
//! host adapters can agree on versions and catalog entries.

pub mod catalog;
pub mod version;

// Re-exports
pub use catalog::{Catalog, CatalogEntry, library_key};
pub use version::{CoreApiVersion, LibraryVersion, ParseVersionError, VersionOrdering};

/// Default hub endpoint, without scheme or trailing slash.
pub const DEFAULT_ENDPOINT_BASE: &str = "hub-api.h5p.org/v1";
