//! Eligibility checks applied to each catalog entry before any version
//! comparison.

use hubsync_schema::CoreApiVersion;

use crate::host::LibraryRegistry;

/// Whether the admin blocked updates for this `major.minor` line.
///
/// Fails open: a missing record or a lookup error counts as not restricted.
pub fn is_restricted(
    registry: &dyn LibraryRegistry,
    machine_name: &str,
    major: u32,
    minor: u32,
) -> bool {
    match registry.is_restricted(machine_name, major, minor) {
        Ok(restricted) => restricted,
        Err(e) => {
            tracing::warn!(
                machine_name,
                major,
                minor,
                error = %e,
                "restriction lookup failed, treating as unrestricted"
            );
            false
        }
    }
}

/// Whether a host at `host` satisfies a library's declared core API minimum.
pub fn is_core_api_compatible(needed: Option<CoreApiVersion>, host: CoreApiVersion) -> bool {
    match needed {
        None => true,
        Some(needed) => {
            host.major > needed.major || (host.major == needed.major && host.minor >= needed.minor)
        }
    }
}
