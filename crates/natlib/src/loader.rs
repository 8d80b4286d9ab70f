//! Host load primitive.
//!
//! Everything past extraction is delegated here: mapping a binary into the
//! process and making its symbols callable. [`DlopenLoader`] is the
//! production implementation on top of the platform dynamic linker; the
//! [`HostLoader`] trait exists so the load protocol can be exercised against
//! fakes without dlopen'ing anything.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use libloading::Library;

use crate::error::LoadError;

/// Makes a native binary resident in the process.
///
/// Both operations are one-way: the protocol has no unload, so a successful
/// call means the binary stays mapped.
pub trait HostLoader: Send + Sync {
    /// Loads the binary at an absolute filesystem `path`.
    fn load_from_path(&self, path: &Path) -> Result<(), LoadError>;

    /// Loads `filename` via the host's library search path.
    fn load_by_name(&self, filename: &OsStr) -> Result<(), LoadError>;
}

impl<L: HostLoader + ?Sized> HostLoader for Arc<L> {
    fn load_from_path(&self, path: &Path) -> Result<(), LoadError> {
        (**self).load_from_path(path)
    }

    fn load_by_name(&self, filename: &OsStr) -> Result<(), LoadError> {
        (**self).load_by_name(filename)
    }
}

/// Loader backed by the platform dynamic linker.
///
/// Handles are retained for the lifetime of the loader, which in practice is
/// the process: dropping a handle would unmap code whose symbols the host
/// may still be executing.
#[derive(Debug, Default)]
pub struct DlopenLoader {
    retained: Mutex<Vec<Library>>,
}

impl DlopenLoader {
    /// Creates a loader with no retained handles.
    pub fn new() -> Self {
        Self::default()
    }

    fn retain(&self, library: Library) {
        self.retained
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(library);
    }
}

impl HostLoader for DlopenLoader {
    fn load_from_path(&self, path: &Path) -> Result<(), LoadError> {
        // SAFETY: loading runs the binary's initialization routines. The
        // path comes from the application's own bundle, extracted moments
        // ago; this is the crate's entire purpose.
        let library = unsafe { Library::new(path) }.map_err(|err| LoadError::HostLoadFailed {
            what: path.display().to_string(),
            message: err.to_string(),
        })?;
        tracing::debug!("mapped {}", path.display());
        self.retain(library);
        Ok(())
    }

    fn load_by_name(&self, filename: &OsStr) -> Result<(), LoadError> {
        // SAFETY: as above; the linker resolves the name through its own
        // search path.
        let library = unsafe { Library::new(filename) }.map_err(|err| LoadError::HostLoadFailed {
            what: filename.to_string_lossy().into_owned(),
            message: err.to_string(),
        })?;
        tracing::debug!("mapped {} from the search path", filename.to_string_lossy());
        self.retain(library);
        Ok(())
    }
}

/// Filename the host linker will search for, decorated with this platform's
/// prefix and suffix (`libfoo.so`, `foo.dll`, `libfoo.dylib`).
pub fn host_library_filename(name: &str, version: Option<&str>) -> OsString {
    match version {
        Some(v) => libloading::library_filename(format!("{name}-{v}")),
        None => libloading::library_filename(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_filename_uses_platform_decoration() {
        let expected = format!(
            "{}abc{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        );
        assert_eq!(host_library_filename("abc", None), OsString::from(expected));
    }

    #[test]
    fn host_filename_decorates_version_into_stem() {
        let expected = format!(
            "{}abc-1.2{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        );
        assert_eq!(
            host_library_filename("abc", Some("1.2")),
            OsString::from(expected)
        );
    }

    #[test]
    fn dlopen_rejects_non_library_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("libjunk.so");
        std::fs::write(&path, b"certainly not a shared object").expect("write");

        let loader = DlopenLoader::new();
        let err = loader.load_from_path(&path).expect_err("junk must not load");
        match err {
            LoadError::HostLoadFailed { what, message } => {
                assert!(what.contains("libjunk"));
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dlopen_reports_missing_search_path_name() {
        let loader = DlopenLoader::new();
        let filename = host_library_filename("natlib_no_such_library_exists", None);
        assert!(loader.load_by_name(&filename).is_err());
    }
}
