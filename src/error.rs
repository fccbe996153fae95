//! Errors that abort a build.
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error raised by a loader or other user supplied code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure taxonomy for a build.
///
/// Every variant is fatal; nothing is written once one is raised.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Source file is missing or unreadable.
    #[error("failed to read {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source text is not a valid module.
    #[error("{}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// An import specifier does not resolve to a file.
    #[error("cannot find module '{specifier}' imported from {}", importer.display())]
    ModuleNotFound { specifier: String, importer: PathBuf },

    /// A loader failed, or module syntax could not be lowered.
    #[error("{loader} failed to transform {}", path.display())]
    Transform {
        loader: String,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The bundle could not be written.
    #[error("failed to write bundle to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
