//! Resource access.
//!
//! The resolver never touches a packaging format directly; bundled content is
//! reached through [`ResourceProvider`]. Resource names are rooted,
//! `/`-separated paths like `/com/example/native/Linux/x86_64/libfoo.so`,
//! independent of any filesystem layout.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Read-only access to bundled resources.
pub trait ResourceProvider: Send + Sync {
    /// Whether a resource exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Opens the resource at `path` for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;
}

impl<P: ResourceProvider + ?Sized> ResourceProvider for Arc<P> {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        (**self).open(path)
    }
}

/// Provider backed by an in-memory map.
///
/// This is the embedding vehicle for payloads compiled in via
/// `include_bytes!`, and the natural fake for tests. Clones share the
/// underlying map, so resources inserted through one handle are visible to
/// all of them.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    resources: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` at `path`, replacing any previous content.
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.write_map().insert(path.into(), bytes.into());
    }

    /// Chainable variant of [`insert`](Self::insert) for construction sites.
    pub fn with(self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<u8>>> {
        self.resources.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Vec<u8>>> {
        self.resources.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceProvider for MemoryProvider {
    fn exists(&self, path: &str) -> bool {
        self.read_map().contains_key(path)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.read_map().get(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no resource at {path}"),
            )),
        }
    }
}

/// Provider serving a directory tree laid out exactly like the resource
/// namespace, i.e. the unpacked form of a bundle.
#[derive(Debug, Clone)]
pub struct DirProvider {
    root: PathBuf,
}

impl DirProvider {
    /// Creates a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl ResourceProvider for DirProvider {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.resolve(path))?))
    }
}
