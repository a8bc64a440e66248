//! Error types for graph generation.
//!
//! Every error is fatal: the run stops and no graph is printed. Filtered-out
//! and already-resolved packages are normal outcomes, not errors.

use thiserror::Error;

use crate::parser::ProviderError;

/// Result type for godepgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong command-line arguments
    #[error("{0}")]
    Usage(String),

    /// The provider could not produce a descriptor
    #[error("failed to import {import_path}")]
    Resolution {
        import_path: String,
        #[source]
        source: ProviderError,
    },

    /// Writing the rendered graph failed
    #[error("failed to write graph: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a provider failure for `import_path`.
    pub fn resolution(import_path: impl Into<String>, source: ProviderError) -> Self {
        Self::Resolution {
            import_path: import_path.into(),
            source,
        }
    }
}
