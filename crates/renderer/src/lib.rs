//! Rendering orchestration: the swap target set, GPU-resident mesh and
//! texture state, descriptor binding, command recording, and the
//! multi-frame-in-flight draw loop.

pub mod depth_buffer;
pub mod descriptor;
pub mod frame;
pub mod renderer;
pub mod shaders;
pub mod swap_targets;
pub mod texture_set;
pub mod ubo;

pub use renderer::Renderer;

/// Number of frames the CPU may record ahead of the GPU.
///
/// Two slots let the CPU prepare frame N+1 while the GPU renders frame N;
/// the in-flight fences cap the pipeline at exactly this depth.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
