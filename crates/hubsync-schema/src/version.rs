//! Library and core API versions.
//!
//! Content type libraries are versioned with plain numeric
//! `major.minor.patch` triples. The host framework exposes a separate
//! `major.minor` core API version that libraries may declare as a minimum.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a dotted version string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseVersionError {
    /// The string did not have the expected number of components.
    #[error("expected {expected} dot-separated components in '{input}'")]
    Arity { input: String, expected: usize },

    /// A component was not a non-negative integer.
    #[error("invalid version component '{0}'")]
    Component(String),
}

/// A `major.minor.patch` library version.
///
/// Field order matters: the derived `Ord` is the lexicographic order over
/// `(major, minor, patch)` that [`compare`] relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct LibraryVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl LibraryVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The `major.minor` pair used for restriction and registry keys.
    pub fn minor_line(&self) -> (u32, u32) {
        (self.major, self.minor)
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for LibraryVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_components(s, 3)?;
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// The host framework's `major.minor` core API version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CoreApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl CoreApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for CoreApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for CoreApiVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_components(s, 2)?;
        Ok(Self::new(parts[0], parts[1]))
    }
}

fn parse_components(s: &str, expected: usize) -> Result<Vec<u32>, ParseVersionError> {
    let parts = s
        .trim()
        .split('.')
        .map(|p| {
            p.parse::<u32>()
                .map_err(|_| ParseVersionError::Component(p.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if parts.len() != expected {
        return Err(ParseVersionError::Arity {
            input: s.to_string(),
            expected,
        });
    }
    Ok(parts)
}

/// How an installed version relates to the version offered by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrdering {
    /// The offered version is newer; an update is available.
    OlderInstalled,
    /// The installed version is ahead of what the hub offers.
    NewerInstalled,
    /// Identical triples.
    Equal,
}

/// Compare an installed version against an offered one.
///
/// Components are scanned major, minor, patch; the first differing
/// component decides.
pub fn compare(installed: LibraryVersion, offered: LibraryVersion) -> VersionOrdering {
    match installed.cmp(&offered) {
        Ordering::Less => VersionOrdering::OlderInstalled,
        Ordering::Greater => VersionOrdering::NewerInstalled,
        Ordering::Equal => VersionOrdering::Equal,
    }
}

/// Returns true only if `offered` is strictly newer than `installed`.
pub fn is_newer(installed: LibraryVersion, offered: LibraryVersion) -> bool {
    compare(installed, offered) == VersionOrdering::OlderInstalled
}
