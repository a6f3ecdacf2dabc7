//! Error types for the outer (non-RHI) layers.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or surface plumbing errors
    #[error("Window error: {0}")]
    Window(String),

    /// Vulkan errors surfaced outside the RHI layer
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Asset loading errors
    #[error("Resource error: {0}")]
    Resource(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using the top-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
