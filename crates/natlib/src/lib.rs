//! Platform-aware resolution, extraction, and loading of bundled native
//! libraries.
//!
//! Applications that ship platform-specific binaries inside their own
//! bundle need the same dance everywhere: figure out which `{os}/{arch}`
//! flavor matches the host, find the right resource, copy it out to a real
//! file the dynamic linker can see, load it, and make sure all of that
//! happens at most once per library per process. This crate packages that
//! dance behind one entry point, [`LibraryResolver::load`].
//!
//! # Architecture
//!
//! - [`platform`] canonicalizes host OS/architecture strings into the token
//!   pair used in resource paths, with [`probe`] settling the ARM float-ABI
//!   split on Linux.
//! - [`provider`] abstracts where bundled resources come from (a directory
//!   tree, an in-memory map, or anything custom).
//! - [`config`] layers override properties over per-library bundled
//!   configuration: loads can be disabled, delegated to the host search
//!   path, or pointed at a different extraction directory.
//! - [`loader`] owns the dynamic-linker boundary and keeps loaded handles
//!   resident.
//! - [`resolver`] runs the whole protocol under one lock and records which
//!   [`LibraryKey`]s have already loaded.
//!
//! # Example
//!
//! ```no_run
//! use natlib::{DirProvider, LibraryKey, LibraryResolver};
//!
//! let resolver = LibraryResolver::new(DirProvider::new("assets"));
//! let key = LibraryKey::new("com.example.imaging", "turbo");
//! resolver.load(&key)?;
//! assert!(resolver.is_loaded(&key));
//! # Ok::<(), natlib::LoadError>(())
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod loader;
pub mod platform;
pub mod probe;
pub mod provider;
pub mod resolver;

pub use config::{KEY_DISABLED, KEY_TEMP_PATH, KEY_USE_EXTERNAL, KEY_USE_LIBRARY_PATH};
pub use error::LoadError;
pub use key::LibraryKey;
pub use loader::{DlopenLoader, HostLoader, host_library_filename};
pub use platform::Platform;
pub use probe::{AbiProbe, NoProbe, ShellAbiProbe};
pub use provider::{DirProvider, MemoryProvider, ResourceProvider};
pub use resolver::{LibraryResolver, ResolverBuilder};
