//! Library identity.

use std::fmt;

use crate::platform::Platform;

/// Identity of one logical native library: a dotted hierarchical namespace,
/// a short library name, and an optional version.
///
/// Keys are the unit of idempotence. The resolver performs at most one
/// successful host load per distinct key for the life of the process, and
/// two keys differing only in version are distinct.
///
/// # Examples
///
/// ```
/// use natlib::LibraryKey;
///
/// let key = LibraryKey::new("com.example.imaging", "turbo");
/// assert_eq!(key.namespace(), "com.example.imaging");
/// assert_eq!(key.config_resource_path(), "/com/example/imaging/turbo.toml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryKey {
    namespace: String,
    name: String,
    version: Option<String>,
}

impl LibraryKey {
    /// Builds an unversioned key.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: None,
        }
    }

    /// Builds a key whose version participates in filenames and identity.
    pub fn versioned(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: Some(version.into()),
        }
    }

    /// Derives the namespace from a `module_path!()` value, mapping `::`
    /// separators to dots.
    pub fn for_module(module_path: &str, name: impl Into<String>) -> Self {
        Self::new(module_path.replace("::", "."), name)
    }

    /// The dotted namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The short library name, undecorated.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version, if this key carries one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Rooted resource path of the bundled binary for `platform`.
    ///
    /// Composed as `/{namespace-as-path}/native/{os}/{arch}/{filename}`, with
    /// namespace dots becoming path separators.
    pub fn resource_path(&self, platform: &Platform) -> String {
        format!(
            "/{}/native/{}/{}",
            self.namespace_path(),
            platform.folder_path(),
            platform.library_filename(&self.name, self.version())
        )
    }

    /// Alternate resource path under the legacy macOS filename convention.
    pub(crate) fn legacy_resource_path(&self, platform: &Platform) -> Option<String> {
        let filename = platform.legacy_library_filename(&self.name, self.version())?;
        Some(format!(
            "/{}/native/{}/{}",
            self.namespace_path(),
            platform.folder_path(),
            filename
        ))
    }

    /// Rooted resource path of this library's bundled configuration.
    pub fn config_resource_path(&self) -> String {
        format!("/{}/{}.toml", self.namespace_path(), self.name)
    }

    /// Fully-qualified per-library property key, `{namespace}.{name}.{prop}`.
    ///
    /// This is the narrow configuration scope; the broad scope is simply
    /// `{namespace}.{prop}`.
    pub fn property_key(&self, prop: &str) -> String {
        format!("{}.{}.{prop}", self.namespace, self.name)
    }

    fn namespace_path(&self) -> String {
        self.namespace.replace('.', "/")
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}
