//! Load failure taxonomy.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`LibraryResolver::load`](crate::LibraryResolver::load).
///
/// None of these are cached: a failed key is re-attempted from scratch on the
/// next call, since the usual causes (missing resource, temp-dir permissions,
/// search-path gaps) are fixable between calls. Configuration problems are
/// deliberately absent; a missing or unreadable bundled config resource is
/// an empty layer, not an error.
#[derive(Error, Debug)]
pub enum LoadError {
    /// No bundled binary exists at the composed resource path.
    #[error("native library resource missing: {0}")]
    ResourceNotFound(String),

    /// Preparing the temp directory or copying the resource bytes failed.
    #[error("extraction failed ({what}): {source}")]
    ExtractionFailed {
        /// The resource or directory being worked on when the error hit.
        what: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The host loader rejected the binary or the search-path lookup.
    #[error("host load of {what} failed: {message}")]
    HostLoadFailed {
        /// Extracted file path or bare search-path filename.
        what: String,
        /// Loader-reported failure detail.
        message: String,
    },
}

impl LoadError {
    pub(crate) fn extraction(what: impl Into<String>, source: io::Error) -> Self {
        Self::ExtractionFailed {
            what: what.into(),
            source,
        }
    }
}
