//! The load protocol.
//!
//! [`LibraryResolver`] ties the other modules together: identify the
//! platform once, honor configuration, locate the bundled binary, extract it
//! to a real file, hand it to the host loader, and remember what succeeded
//! so every later call for the same key is a no-op.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::TempPath;

use crate::config::{
    KEY_DISABLED, KEY_TEMP_PATH, KEY_USE_EXTERNAL, KEY_USE_LIBRARY_PATH, LoadConfig,
};
use crate::error::LoadError;
use crate::key::LibraryKey;
use crate::loader::{DlopenLoader, HostLoader, host_library_filename};
use crate::platform::Platform;
use crate::probe::{AbiProbe, ShellAbiProbe};
use crate::provider::ResourceProvider;

/// Configures and builds a [`LibraryResolver`].
///
/// Only the resource provider is mandatory; the defaults are the production
/// pieces ([`DlopenLoader`], [`ShellAbiProbe`], host platform detection).
pub struct ResolverBuilder {
    provider: Box<dyn ResourceProvider>,
    loader: Box<dyn HostLoader>,
    probe: Box<dyn AbiProbe>,
    platform: Option<Platform>,
    properties: HashMap<String, String>,
}

impl ResolverBuilder {
    fn new(provider: impl ResourceProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            loader: Box::new(DlopenLoader::new()),
            probe: Box::new(ShellAbiProbe),
            platform: None,
            properties: HashMap::new(),
        }
    }

    /// Replaces the host loader.
    pub fn loader(mut self, loader: impl HostLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Replaces the ARM float-ABI probe.
    pub fn probe(mut self, probe: impl AbiProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Pins the platform instead of deriving it from the host. Lets
    /// packaging tools and tests resolve resources for a foreign platform.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets an override property (`{ns}.{prop}` or `{ns}.{name}.{prop}`)
    /// before the first load.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Finishes the resolver. No platform detection or I/O happens yet.
    pub fn build(self) -> LibraryResolver {
        LibraryResolver {
            provider: self.provider,
            loader: self.loader,
            probe: self.probe,
            inner: Mutex::new(Inner {
                platform: self.platform,
                loaded: HashSet::new(),
                properties: self.properties,
                extracted: Vec::new(),
            }),
        }
    }
}

impl std::fmt::Debug for ResolverBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverBuilder")
            .field("platform", &self.platform)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// State shared behind the resolver's one mutex. Holding it for the whole
/// load keeps concurrent callers from double-extracting or double-loading.
struct Inner {
    platform: Option<Platform>,
    loaded: HashSet<LibraryKey>,
    properties: HashMap<String, String>,
    extracted: Vec<TempPath>,
}

/// Resolves, extracts, and loads bundled native libraries.
///
/// One resolver instance is meant to be shared across the application
/// (typically behind an `Arc`). Successful loads are recorded per
/// [`LibraryKey`] and never repeated; failures are not recorded, so a fixed
/// environment can simply retry.
///
/// Extracted files are deleted on a best-effort basis when the resolver is
/// dropped. Loaded binaries themselves stay mapped; see [`DlopenLoader`].
///
/// # Examples
///
/// ```no_run
/// use natlib::{DirProvider, LibraryKey, LibraryResolver};
///
/// let resolver = LibraryResolver::new(DirProvider::new("assets"));
/// resolver.load(&LibraryKey::new("com.example.imaging", "turbo"))?;
/// # Ok::<(), natlib::LoadError>(())
/// ```
pub struct LibraryResolver {
    provider: Box<dyn ResourceProvider>,
    loader: Box<dyn HostLoader>,
    probe: Box<dyn AbiProbe>,
    inner: Mutex<Inner>,
}

impl LibraryResolver {
    /// Creates a resolver over `provider` with production defaults.
    pub fn new(provider: impl ResourceProvider + 'static) -> Self {
        Self::builder(provider).build()
    }

    /// Starts building a resolver over `provider`.
    pub fn builder(provider: impl ResourceProvider + 'static) -> ResolverBuilder {
        ResolverBuilder::new(provider)
    }

    /// Loads the library identified by `key`, once.
    ///
    /// Returns `Ok(())` immediately when the key already loaded during this
    /// process. Otherwise runs the full protocol: configuration checks,
    /// platform-specific resource lookup, extraction, host load. Only a load
    /// that reaches the host successfully is recorded.
    pub fn load(&self, key: &LibraryKey) -> Result<(), LoadError> {
        let mut inner = self.lock();
        if inner.loaded.contains(key) {
            tracing::trace!("{key} already loaded, skipping");
            return Ok(());
        }
        self.load_uncached(&mut inner, key)
    }

    /// Whether `key` has been successfully loaded by this resolver.
    pub fn is_loaded(&self, key: &LibraryKey) -> bool {
        self.lock().loaded.contains(key)
    }

    /// Sets an override property consulted by every subsequent load.
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().properties.insert(key.into(), value.into());
    }

    /// Removes an override property.
    pub fn clear_property(&self, key: &str) {
        self.lock().properties.remove(key);
    }

    /// The platform used for resource lookup, detecting it on first use.
    pub fn platform(&self) -> Platform {
        let mut inner = self.lock();
        self.platform_for(&mut inner)
    }

    fn load_uncached(&self, inner: &mut Inner, key: &LibraryKey) -> Result<(), LoadError> {
        tracing::debug!("loading {key}");
        let config =
            LoadConfig::for_library(self.provider.as_ref(), key, inner.properties.clone());

        if config.flag(key, KEY_DISABLED) {
            tracing::debug!("{key} disabled by configuration, reporting success");
            return Ok(());
        }

        if config.flag(key, KEY_USE_EXTERNAL) || config.flag(key, KEY_USE_LIBRARY_PATH) {
            let filename = host_library_filename(key.name(), key.version());
            tracing::debug!("{key} delegated to the host search path as {filename:?}");
            self.loader.load_by_name(&filename)?;
            inner.loaded.insert(key.clone());
            return Ok(());
        }

        let platform = self.platform_for(inner);
        let resource = self.locate_resource(key, &platform)?;
        let temp_dir = temp_dir_for(&config, key)?;
        let extracted = self.extract(inner, &resource, &temp_dir)?;
        self.loader.load_from_path(&extracted)?;
        inner.loaded.insert(key.clone());
        tracing::debug!("{key} loaded from {}", extracted.display());
        Ok(())
    }

    fn platform_for(&self, inner: &mut Inner) -> Platform {
        inner
            .platform
            .get_or_insert_with(|| {
                let platform = Platform::current(self.probe.as_ref());
                tracing::debug!("host platform identified as {platform}");
                platform
            })
            .clone()
    }

    /// Finds the resource to extract, trying the platform's canonical
    /// filename first and the legacy macOS spelling second.
    fn locate_resource(&self, key: &LibraryKey, platform: &Platform) -> Result<String, LoadError> {
        let primary = key.resource_path(platform);
        tracing::trace!("{key} candidate resource {primary}");
        if self.provider.exists(&primary) {
            return Ok(primary);
        }
        if let Some(legacy) = key.legacy_resource_path(platform) {
            tracing::trace!("{key} falling back to {legacy}");
            if self.provider.exists(&legacy) {
                return Ok(legacy);
            }
        }
        Err(LoadError::ResourceNotFound(primary))
    }

    /// Copies `resource` into a fresh uniquely-named file under `dir`,
    /// marked readable and executable. The file is retained for deletion
    /// when the resolver drops; the returned path stays valid meanwhile.
    fn extract(&self, inner: &mut Inner, resource: &str, dir: &Path) -> Result<PathBuf, LoadError> {
        let stem = resource.trim_start_matches('/').replace('/', ".");
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .tempfile_in(dir)
            .map_err(|e| LoadError::extraction(resource, e))?;
        let mut reader = self
            .provider
            .open(resource)
            .map_err(|e| LoadError::extraction(resource, e))?;
        io::copy(&mut reader, file.as_file_mut()).map_err(|e| LoadError::extraction(resource, e))?;
        set_executable(file.path()).map_err(|e| LoadError::extraction(resource, e))?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();
        inner.extracted.push(temp_path);
        tracing::debug!("extracted {resource} to {}", path.display());
        Ok(path)
    }

    /// A panic mid-load never leaves partial registry state behind (keys are
    /// only inserted after success), so a poisoned lock is safe to re-enter.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LibraryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("LibraryResolver")
            .field("platform", &inner.platform)
            .field("loaded", &inner.loaded)
            .finish_non_exhaustive()
    }
}

/// Resolves the extraction directory: the `path` property if set, the system
/// temp dir otherwise, absolutized and created if absent.
fn temp_dir_for(config: &LoadConfig, key: &LibraryKey) -> Result<PathBuf, LoadError> {
    let dir = match config.get(key, KEY_TEMP_PATH) {
        Some(configured) => PathBuf::from(configured),
        None => std::env::temp_dir(),
    };
    let dir = std::path::absolute(&dir)
        .map_err(|e| LoadError::extraction(dir.display().to_string(), e))?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| LoadError::extraction(dir.display().to_string(), e))?;
    Ok(dir)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
