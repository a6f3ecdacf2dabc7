//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocator(#[from] gpu_allocator::AllocationError),

    /// No physical device satisfies the renderer's requirements
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// Shader loading or compilation error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Surface creation error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Swapchain creation or query error
    #[error("Swapchain error: {0}")]
    Swapchain(String),

    /// Invalid argument passed to an RHI call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
