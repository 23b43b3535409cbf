//! Error types shared by the registry, the renderers and the loader.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while building a configuration or publishing a page.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A value of the wrong type was supplied (exports, alias, attribute values)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An option or attribute name outside the recognised set
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// A page description referenced a module that is not registered
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    /// The generated main file could not be written
    #[error("Failed to write data into a file \"{}\": {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The host view failed to publish an asset
    #[error("Publish error: {0}")]
    Publish(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;
