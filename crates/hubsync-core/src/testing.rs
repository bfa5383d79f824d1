//! In-memory fakes of the host capabilities, shared by the unit tests.
//!
//! Fake archives are plain text `"{machine_name} {major}.{minor}.{patch}"`;
//! anything else is rejected by the fake validator.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use hubsync_schema::{Catalog, CatalogEntry, CoreApiVersion, LibraryVersion};
use tempfile::TempDir;

use crate::context::Context;
use crate::hub::HubError;
use crate::host::{
    CatalogSource, HostError, HostMessage, HostSession, LibraryId, LibraryRegistry,
    MANAGE_LIBRARIES, PackageStore, PackageValidator, StagingPaths,
};
use crate::reporter::{NullReporter, Reporter};

pub(crate) fn entry(id: &str, major: u32, minor: u32, patch: u32) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        version: LibraryVersion::new(major, minor, patch),
        core_api_version_needed: None,
        example: None,
        tutorial: None,
    }
}

pub(crate) fn fake_archive(machine_name: &str, version: &str) -> Vec<u8> {
    format!("{machine_name} {version}").into_bytes()
}

pub(crate) fn context(hub: &Arc<FakeHub>, host: &Arc<FakeHost>) -> Context {
    context_with_reporter(hub, host, Arc::new(NullReporter))
}

pub(crate) fn context_with_reporter(
    hub: &Arc<FakeHub>,
    host: &Arc<FakeHost>,
    reporter: Arc<dyn Reporter>,
) -> Context {
    Context::new(
        hub.clone(),
        host.registry.clone(),
        host.clone(),
        host.clone(),
        host.clone(),
        reporter,
    )
}

/// Records every reporter call as `(method, message)`.
#[derive(Default)]
pub(crate) struct RecordingReporter {
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    fn record(&self, method: &'static str, message: impl Into<String>) {
        self.calls.lock().unwrap().push((method, message.into()));
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }

    pub(crate) fn messages(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.record("section", title);
    }
    fn installing(&self, name: &str, from: &LibraryVersion, to: &LibraryVersion) {
        self.record("installing", format!("{name} {from} -> {to}"));
    }
    fn done(&self, name: &str, version: &LibraryVersion, detail: &str) {
        self.record("done", format!("{name} {version} {detail}"));
    }
    fn skipped(&self, name: &str, reason: &str) {
        self.record("skipped", format!("{name}: {reason}"));
    }
    fn failed(&self, name: &str, reason: &str) {
        self.record("failed", format!("{name}: {reason}"));
    }
    fn info(&self, msg: &str) {
        self.record("info", msg);
    }
    fn warning(&self, msg: &str) {
        self.record("warning", msg);
    }
    fn error(&self, msg: &str) {
        self.record("error", msg);
    }
    fn summary(&self, installed: usize, skipped: usize, failed: usize, _: f64) {
        self.record("summary", format!("{installed} {skipped} {failed}"));
    }
}

#[derive(Default)]
pub(crate) struct FakeHub {
    catalog: Mutex<Option<Catalog>>,
    failure_status: Mutex<Option<u16>>,
    archives: Mutex<HashMap<String, Vec<u8>>>,
    pub(crate) catalog_requests: AtomicUsize,
    archive_requests: Mutex<Vec<String>>,
}

impl FakeHub {
    pub(crate) fn with_catalog(entries: Vec<CatalogEntry>) -> Self {
        let hub = Self::default();
        *hub.catalog.lock().unwrap() = Some(Catalog {
            content_types: entries,
        });
        hub
    }

    pub(crate) fn failing(status: u16) -> Self {
        let hub = Self::default();
        *hub.failure_status.lock().unwrap() = Some(status);
        hub
    }

    pub(crate) fn add_archive(&self, machine_name: &str, bytes: Vec<u8>) {
        self.archives
            .lock()
            .unwrap()
            .insert(machine_name.to_string(), bytes);
    }

    pub(crate) fn remove_archive(&self, machine_name: &str) {
        self.archives.lock().unwrap().remove(machine_name);
    }

    pub(crate) fn archive_requests(&self) -> Vec<String> {
        self.archive_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeHub {
    async fn fetch_catalog(&self, site_identifier: &str) -> Result<Catalog, HubError> {
        assert!(!site_identifier.is_empty());
        self.catalog_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = *self.failure_status.lock().unwrap() {
            return Err(HubError::HttpStatus(status));
        }
        Ok(self.catalog.lock().unwrap().clone().unwrap_or_default())
    }

    async fn fetch_archive(&self, machine_name: &str) -> Result<Bytes, HubError> {
        self.archive_requests
            .lock()
            .unwrap()
            .push(machine_name.to_string());
        self.archives
            .lock()
            .unwrap()
            .get(machine_name)
            .cloned()
            .map(Bytes::from)
            .ok_or(HubError::HttpStatus(404))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeLibrary {
    pub(crate) id: LibraryId,
    pub(crate) version: LibraryVersion,
    pub(crate) tutorial_url: Option<String>,
}

pub(crate) struct FakeRegistry {
    libraries: Mutex<HashMap<String, FakeLibrary>>,
    restrictions: Mutex<HashSet<(String, u32, u32)>>,
    next_id: AtomicI64,
    pub(crate) core_api: Mutex<CoreApiVersion>,
    pub(crate) fail_restriction_lookup: AtomicBool,
    pub(crate) fail_patch: AtomicBool,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self {
            libraries: Mutex::default(),
            restrictions: Mutex::default(),
            next_id: AtomicI64::new(1),
            core_api: Mutex::new(CoreApiVersion::new(1, 24)),
            fail_restriction_lookup: AtomicBool::new(false),
            fail_patch: AtomicBool::new(false),
        }
    }
}

impl FakeRegistry {
    /// Record `machine_name` at `version`, replacing any earlier version.
    pub(crate) fn install(&self, machine_name: &str, version: LibraryVersion) -> LibraryId {
        let id = LibraryId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.libraries.lock().unwrap().insert(
            machine_name.to_string(),
            FakeLibrary {
                id,
                version,
                tutorial_url: None,
            },
        );
        id
    }

    pub(crate) fn get(&self, machine_name: &str) -> Option<FakeLibrary> {
        self.libraries.lock().unwrap().get(machine_name).cloned()
    }

    pub(crate) fn restrict(&self, machine_name: &str, major: u32, minor: u32) {
        self.restrictions
            .lock()
            .unwrap()
            .insert((machine_name.to_string(), major, minor));
    }
}

impl LibraryRegistry for FakeRegistry {
    fn library_id(&self, machine_name: &str) -> Result<Option<LibraryId>, HostError> {
        Ok(self.get(machine_name).map(|l| l.id))
    }

    fn installed_version(&self, id: LibraryId) -> Result<Option<LibraryVersion>, HostError> {
        Ok(self
            .libraries
            .lock()
            .unwrap()
            .values()
            .find(|l| l.id == id)
            .map(|l| l.version))
    }

    fn is_restricted(&self, machine_name: &str, major: u32, minor: u32) -> Result<bool, HostError> {
        if self.fail_restriction_lookup.load(Ordering::SeqCst) {
            return Err(HostError::Backend("restriction table missing".to_string()));
        }
        Ok(self
            .restrictions
            .lock()
            .unwrap()
            .contains(&(machine_name.to_string(), major, minor)))
    }

    fn core_api_version(&self) -> CoreApiVersion {
        *self.core_api.lock().unwrap()
    }

    fn lookup(&self, key: &str) -> Result<Option<LibraryId>, HostError> {
        Ok(self
            .libraries
            .lock()
            .unwrap()
            .iter()
            .find(|(name, l)| {
                hubsync_schema::library_key(name, l.version.major, l.version.minor) == key
            })
            .map(|(_, l)| l.id))
    }

    fn set_tutorial_url(&self, id: LibraryId, url: &str) -> Result<(), HostError> {
        if self.fail_patch.load(Ordering::SeqCst) {
            return Err(HostError::Backend("read-only database".to_string()));
        }
        let mut libraries = self.libraries.lock().unwrap();
        let lib = libraries
            .values_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| HostError::Backend(format!("no library {id}")))?;
        lib.tutorial_url = Some(url.to_string());
        Ok(())
    }
}

/// Validator, store and session of a fake host, staging under a temp dir.
pub(crate) struct FakeHost {
    dir: TempDir,
    pub(crate) registry: Arc<FakeRegistry>,
    messages: Mutex<Vec<HostMessage>>,
    capabilities: Mutex<HashSet<String>>,
    pub(crate) capability_denials: AtomicUsize,
    pub(crate) fail_storage: AtomicBool,
    pub(crate) silent_noop: AtomicBool,
    pub(crate) panic_on_validate: AtomicBool,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            registry: Arc::new(FakeRegistry::default()),
            messages: Mutex::default(),
            capabilities: Mutex::default(),
            capability_denials: AtomicUsize::new(0),
            fail_storage: AtomicBool::new(false),
            silent_noop: AtomicBool::new(false),
            panic_on_validate: AtomicBool::new(false),
        }
    }

    fn require_capability(&self) -> Result<(), HostError> {
        if self.has_capability(MANAGE_LIBRARIES) {
            Ok(())
        } else {
            self.capability_denials.fetch_add(1, Ordering::SeqCst);
            Err(HostError::PermissionDenied(MANAGE_LIBRARIES.to_string()))
        }
    }

    fn read_archive(staged: &StagingPaths) -> Result<(String, LibraryVersion), HostError> {
        let content = std::fs::read_to_string(&staged.archive)?;
        let (name, version) = content
            .split_once(' ')
            .ok_or_else(|| HostError::Rejected("not a package".to_string()))?;
        let version = version
            .parse()
            .map_err(|e| HostError::Rejected(format!("bad version: {e}")))?;
        Ok((name.to_string(), version))
    }

    fn push(&self, message: HostMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

impl PackageValidator for FakeHost {
    fn validate(&self, staged: &StagingPaths) -> Result<(), HostError> {
        self.require_capability()?;
        std::fs::create_dir_all(&staged.extract_dir)?;
        std::fs::write(staged.extract_dir.join("library.json"), b"{}")?;
        assert!(
            !self.panic_on_validate.load(Ordering::SeqCst),
            "validator crashed"
        );
        match Self::read_archive(staged) {
            Ok(_) => {
                self.push(HostMessage::info("package is valid"));
                Ok(())
            }
            Err(e) => {
                self.push(HostMessage::error(e.to_string()));
                Err(e)
            }
        }
    }
}

impl PackageStore for FakeHost {
    fn persist(&self, staged: &StagingPaths) -> Result<(), HostError> {
        self.require_capability()?;
        if self.fail_storage.load(Ordering::SeqCst) {
            self.push(HostMessage::error("disk full"));
            return Err(HostError::Backend("disk full".to_string()));
        }
        if self.silent_noop.load(Ordering::SeqCst) {
            return Ok(());
        }
        let (name, version) = Self::read_archive(staged)?;
        self.registry.install(&name, version);
        self.push(HostMessage::info(format!("installed {name} {version}")));
        Ok(())
    }
}

impl HostSession for FakeHost {
    fn staging_paths(&self) -> StagingPaths {
        let tmp = self.dir.path().join("tmp");
        StagingPaths {
            archive: tmp.join("staged.h5p"),
            extract_dir: tmp.join("staged"),
        }
    }

    fn drain_messages(&self) -> Vec<HostMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }

    fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.lock().unwrap().contains(capability)
    }

    fn grant_capability(&self, capability: &str) {
        self.capabilities
            .lock()
            .unwrap()
            .insert(capability.to_string());
    }

    fn revoke_capability(&self, capability: &str) {
        self.capabilities.lock().unwrap().remove(capability);
    }
}
