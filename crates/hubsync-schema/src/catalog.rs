//! Hub catalog wire format.
//!
//! `POST /content-types` answers with a JSON document shaped like:
//!
//! ```json
//! { "contentTypes": [ { "id": "H5P.Example", "version": { "major": 1, "minor": 2, "patch": 0 } } ] }
//! ```
//!
//! Fields the hub sends that we do not use (titles, summaries, icons, ...)
//! are ignored on decode.

use serde::{Deserialize, Serialize};

use crate::version::{CoreApiVersion, LibraryVersion};

/// The list of content types a hub makes available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "contentTypes", default)]
    pub content_types: Vec<CatalogEntry>,
}

impl Catalog {
    /// Decode a catalog from the hub's JSON response body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn len(&self) -> usize {
        self.content_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content_types.is_empty()
    }

    /// Find an entry by machine name.
    pub fn find(&self, machine_name: &str) -> Option<&CatalogEntry> {
        self.content_types.iter().find(|e| e.id == machine_name)
    }
}

/// One content type offered by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Machine name, e.g. `H5P.MultiChoice`.
    pub id: String,
    pub version: LibraryVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_api_version_needed: Option<CoreApiVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial: Option<String>,
}

impl CatalogEntry {
    /// Registry key of the library this entry installs.
    pub fn library_key(&self) -> String {
        library_key(&self.id, self.version.major, self.version.minor)
    }
}

/// Build the `{machine_name}-{major}.{minor}` key the host registry uses.
///
/// # Example
///
/// ```
/// assert_eq!(hubsync_schema::library_key("H5P.Example", 1, 2), "H5P.Example-1.2");
/// ```
pub fn library_key(machine_name: &str, major: u32, minor: u32) -> String {
    format!("{machine_name}-{major}.{minor}")
}
