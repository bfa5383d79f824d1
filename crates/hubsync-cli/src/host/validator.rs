//! Zip package validation.
//!
//! A content type package is a zip archive with one folder per library.
//! Each folder must carry a `library.json` naming the library and its
//! version; the package is valid if at least one such folder exists and
//! every `library.json` found parses.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hubsync_core::host::{
    HostError, HostMessage, MANAGE_LIBRARIES, PackageValidator, StagingPaths,
};
use hubsync_schema::LibraryVersion;
use serde::Deserialize;
use zip::ZipArchive;

use super::session::LocalSession;

/// The fields of `library.json` hubsync cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryJson {
    pub machine_name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    #[serde(default)]
    pub title: Option<String>,
}

impl LibraryJson {
    pub fn version(&self) -> LibraryVersion {
        LibraryVersion::new(self.major_version, self.minor_version, self.patch_version)
    }
}

/// A library folder inside an extracted package.
#[derive(Debug, Clone)]
pub struct PackagedLibrary {
    pub dir: PathBuf,
    pub meta: LibraryJson,
}

/// Unpack `archive` into `dest_dir`, skipping entries that would escape it.
pub fn extract_package(archive: &Path, dest_dir: &Path) -> Result<usize, HostError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| HostError::Rejected(format!("not a zip archive: {e}")))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted = 0;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| HostError::Rejected(format!("corrupt archive entry: {e}")))?;
        let Some(relative_path) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping archive entry outside package root");
            continue;
        };

        let target = dest_dir.join(relative_path);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    Ok(extracted)
}

/// Find every `*/library.json` directly below `root`.
pub fn read_libraries(root: &Path) -> Result<Vec<PackagedLibrary>, HostError> {
    let mut libraries = Vec::new();
    let mut dirs: Vec<_> = fs::read_dir(root)?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.path())
        .collect();
    dirs.sort();

    for dir in dirs {
        let manifest = dir.join("library.json");
        if !manifest.is_file() {
            continue;
        }
        let content = fs::read(&manifest)?;
        let meta: LibraryJson = serde_json::from_slice(&content).map_err(|e| {
            HostError::Rejected(format!("invalid {}: {e}", display_relative(root, &manifest)))
        })?;
        libraries.push(PackagedLibrary { dir, meta });
    }

    Ok(libraries)
}

fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Validates staged packages by unpacking them and checking each
/// `library.json`.
#[derive(Debug)]
pub struct ZipValidator {
    session: Arc<LocalSession>,
}

impl ZipValidator {
    pub fn new(session: Arc<LocalSession>) -> Self {
        Self { session }
    }

    fn check(staged: &StagingPaths) -> Result<Vec<PackagedLibrary>, HostError> {
        extract_package(&staged.archive, &staged.extract_dir)?;
        let libraries = read_libraries(&staged.extract_dir)?;
        if libraries.is_empty() {
            return Err(HostError::Rejected(
                "package contains no library.json".to_string(),
            ));
        }
        Ok(libraries)
    }
}

impl PackageValidator for ZipValidator {
    fn validate(&self, staged: &StagingPaths) -> Result<(), HostError> {
        self.session.require(MANAGE_LIBRARIES)?;

        match Self::check(staged) {
            Ok(libraries) => {
                for lib in &libraries {
                    tracing::debug!(
                        machine_name = %lib.meta.machine_name,
                        version = %lib.meta.version(),
                        "package library ok"
                    );
                }
                self.session.push_message(HostMessage::info(format!(
                    "package is valid ({} libraries)",
                    libraries.len()
                )));
                Ok(())
            }
            Err(e) => {
                self.session.push_message(HostMessage::error(e.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hubsync_core::host::{HostSession, with_elevation};
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    /// Build a package holding one library folder per `(machine_name, version)`.
    pub(crate) fn package(libraries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, version) in libraries {
            let v: LibraryVersion = version.parse().unwrap();
            let folder = format!("{name}-{}.{}", v.major, v.minor);
            zip.start_file(format!("{folder}/library.json"), options)
                .unwrap();
            let manifest = serde_json::json!({
                "title": name,
                "machineName": name,
                "majorVersion": v.major,
                "minorVersion": v.minor,
                "patchVersion": v.patch,
            });
            zip.write_all(manifest.to_string().as_bytes()).unwrap();
            zip.start_file(format!("{folder}/scripts/main.js"), options)
                .unwrap();
            zip.write_all(b"console.log('h5p');").unwrap();
        }
        zip.start_file("h5p.json", options).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap().into_inner()
    }

    pub(crate) fn stage(session: &LocalSession, bytes: &[u8]) -> StagingPaths {
        let paths = session.staging_paths();
        fs::create_dir_all(paths.archive.parent().unwrap()).unwrap();
        fs::write(&paths.archive, bytes).unwrap();
        paths
    }

    fn setup() -> (TempDir, Arc<LocalSession>, ZipValidator) {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(LocalSession::new(dir.path().join("tmp")));
        let validator = ZipValidator::new(session.clone());
        (dir, session, validator)
    }

    #[test]
    fn test_valid_package() {
        let (_dir, session, validator) = setup();
        let staged = stage(&session, &package(&[("H5P.Example", "1.2.0")]));

        with_elevation(session.as_ref(), MANAGE_LIBRARIES, || {
            validator.validate(&staged)
        })
        .unwrap();

        assert!(staged.extract_dir.join("H5P.Example-1.2/library.json").exists());
        let libs = read_libraries(&staged.extract_dir).unwrap();
        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0].meta.version(), LibraryVersion::new(1, 2, 0));
    }

    #[test]
    fn test_requires_capability() {
        let (_dir, session, validator) = setup();
        let staged = stage(&session, &package(&[("H5P.Example", "1.2.0")]));

        assert!(matches!(
            validator.validate(&staged),
            Err(HostError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_rejects_non_zip() {
        let (_dir, session, validator) = setup();
        let staged = stage(&session, b"definitely not a zip");

        let err = with_elevation(session.as_ref(), MANAGE_LIBRARIES, || {
            validator.validate(&staged)
        })
        .unwrap_err();

        assert!(matches!(err, HostError::Rejected(_)));
        let messages = session.drain_messages();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_rejects_package_without_libraries() {
        let (_dir, session, validator) = setup();
        let staged = stage(&session, &package(&[]));

        let err = with_elevation(session.as_ref(), MANAGE_LIBRARIES, || {
            validator.validate(&staged)
        })
        .unwrap_err();

        assert!(err.to_string().contains("no library.json"));
    }

    #[test]
    fn test_rejects_incomplete_library_json() {
        let (_dir, session, validator) = setup();
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("H5P.Example-1.2/library.json", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(br#"{"machineName": "H5P.Example", "majorVersion": 1}"#)
            .unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let staged = stage(&session, &bytes);

        let err = with_elevation(session.as_ref(), MANAGE_LIBRARIES, || {
            validator.validate(&staged)
        })
        .unwrap_err();

        assert!(matches!(err, HostError::Rejected(_)));
    }
}
