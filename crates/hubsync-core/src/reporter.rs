//! Reporter trait for dependency injection
//!
//! This trait allows the sync engine to report progress and status without
//! being coupled to a specific terminal implementation.

use hubsync_schema::LibraryVersion;

pub trait Reporter: Send + Sync {
    /// Indicates a new phase has started (e.g. "Checking hub").
    fn section(&self, title: &str);

    /// A library is about to be updated.
    fn installing(&self, name: &str, from: &LibraryVersion, to: &LibraryVersion);

    /// Marks a library operation as successfully completed.
    fn done(&self, name: &str, version: &LibraryVersion, detail: &str);

    /// A catalog entry was not acted on.
    fn skipped(&self, name: &str, reason: &str);

    /// Marks a library update as failed with a specific reason.
    fn failed(&self, name: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of a pass.
    fn summary(&self, installed: usize, skipped: usize, failed: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn installing(&self, name: &str, from: &LibraryVersion, to: &LibraryVersion) {
        (**self).installing(name, from, to);
    }
    fn done(&self, name: &str, version: &LibraryVersion, detail: &str) {
        (**self).done(name, version, detail);
    }
    fn skipped(&self, name: &str, reason: &str) {
        (**self).skipped(name, reason);
    }
    fn failed(&self, name: &str, reason: &str) {
        (**self).failed(name, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, installed: usize, skipped: usize, failed: usize, elapsed_secs: f64) {
        (**self).summary(installed, skipped, failed, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g. scheduled passes, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn installing(&self, _: &str, _: &LibraryVersion, _: &LibraryVersion) {}
    fn done(&self, _: &str, _: &LibraryVersion, _: &str) {}
    fn skipped(&self, _: &str, _: &str) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: usize, _: usize, _: f64) {}
}
