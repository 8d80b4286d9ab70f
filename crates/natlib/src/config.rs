//! Layered load-time configuration.
//!
//! A load consults two layers of string-valued properties. Resolver
//! properties, set programmatically before the call, always win; underneath
//! them sits an optional TOML resource bundled next to the native binary
//! (`/{namespace-as-path}/{name}.toml`) holding a flat table of
//! fully-qualified keys:
//!
//! ```toml
//! "com.example.disabled" = "false"
//! "com.example.turbo.use_external" = true
//! ```
//!
//! Every property exists at two scopes, broad (`{namespace}.{prop}`) and
//! narrow (`{namespace}.{name}.{prop}`), with the narrow scope consulted
//! first. Configuration is advisory: a missing, unreadable or unparseable
//! bundled resource is an empty layer, never an error.

use std::collections::HashMap;
use std::io::Read;

use crate::key::LibraryKey;
use crate::provider::ResourceProvider;

/// Skip the load entirely and report success.
pub const KEY_DISABLED: &str = "disabled";

/// Delegate to the host's library search path instead of extracting.
pub const KEY_USE_EXTERNAL: &str = "use_external";

/// Older spelling of [`KEY_USE_EXTERNAL`], still honored.
pub const KEY_USE_LIBRARY_PATH: &str = "use_library_path";

/// Directory to extract into, overriding the system temp dir.
pub const KEY_TEMP_PATH: &str = "path";

/// Whether `value` turns a flag on. Only `"1"` and case-insensitive
/// `"true"` qualify.
pub(crate) fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Snapshot of both configuration layers for a single load attempt.
#[derive(Debug, Default)]
pub(crate) struct LoadConfig {
    overrides: HashMap<String, String>,
    bundled: HashMap<String, String>,
}

impl LoadConfig {
    /// Captures the resolver `overrides` and reads the bundled resource for
    /// `key` through `provider`.
    pub(crate) fn for_library(
        provider: &dyn ResourceProvider,
        key: &LibraryKey,
        overrides: HashMap<String, String>,
    ) -> Self {
        Self {
            overrides,
            bundled: read_bundled(provider, &key.config_resource_path()),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_layers(
        overrides: HashMap<String, String>,
        bundled: HashMap<String, String>,
    ) -> Self {
        Self { overrides, bundled }
    }

    /// Scoped lookup for `prop`: narrow scope before broad, overrides before
    /// bundled values within each scope.
    pub(crate) fn get(&self, key: &LibraryKey, prop: &str) -> Option<&str> {
        let narrow = key.property_key(prop);
        let broad = format!("{}.{prop}", key.namespace());
        for qualified in [narrow, broad] {
            if let Some(value) = self.overrides.get(&qualified) {
                return Some(value);
            }
            if let Some(value) = self.bundled.get(&qualified) {
                return Some(value);
            }
        }
        None
    }

    /// Truthy-flag lookup for `prop`. Unset means `false`.
    pub(crate) fn flag(&self, key: &LibraryKey, prop: &str) -> bool {
        self.get(key, prop).is_some_and(is_truthy)
    }
}

/// Reads and flattens the bundled configuration resource. String, boolean
/// and integer values are kept (stringified); everything else is skipped.
fn read_bundled(provider: &dyn ResourceProvider, resource: &str) -> HashMap<String, String> {
    if !provider.exists(resource) {
        return HashMap::new();
    }
    let mut raw = String::new();
    let read = provider
        .open(resource)
        .and_then(|mut r| r.read_to_string(&mut raw));
    if let Err(err) = read {
        tracing::debug!("config resource {resource} unreadable, ignoring: {err}");
        return HashMap::new();
    }
    match raw.parse::<toml::Table>() {
        Ok(table) => table
            .into_iter()
            .filter_map(|(qualified, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Integer(i) => i.to_string(),
                    other => {
                        tracing::debug!("config key {qualified} has non-scalar value {other}, skipping");
                        return None;
                    }
                };
                Some((qualified, value))
            })
            .collect(),
        Err(err) => {
            tracing::debug!("config resource {resource} unparseable, ignoring: {err}");
            HashMap::new()
        }
    }
}
