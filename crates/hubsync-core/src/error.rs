//! Error classification shared by hub and install errors.

use std::fmt;

/// Broad failure class, used for log fields and report grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Network failure or timeout.
    Transport,
    /// Unexpected HTTP status or undecodable response.
    Protocol,
    /// Endpoint settings could not be read.
    Configuration,
    /// Staging write or cleanup failed.
    Filesystem,
    /// The host rejected the package.
    Validation,
    /// The host failed to persist the package.
    Storage,
    /// The host reported success but the library is not registered.
    Consistency,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Configuration => "configuration",
            Self::Filesystem => "filesystem",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Consistency => "consistency",
        })
    }
}
