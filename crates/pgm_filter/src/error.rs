//! src/error.rs
//!
//! Typed failures that end a filtering run.
//!
//! Every variant is fatal for the whole group: when the coordinator hits one,
//! it drops its endpoint and every worker unwinds on disconnection. The binary
//! maps them to a message and exit code 1.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Wrong command-line arguments. Carries the rendered usage text.
    #[error("{usage}")]
    Usage { usage: String },

    /// Opening, reading or writing an image file failed.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The filter window is not a positive size.
    #[error("Wrong size for the filter window: {filter_size} (must be >= 1)")]
    Parameter { filter_size: i64 },
}

impl FilterError {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub fn usage(usage: impl Into<String>) -> Self {
        Self::Usage {
            usage: usage.into(),
        }
    }
}
