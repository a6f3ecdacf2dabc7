//! Platform layer: winit window management, Vulkan surface plumbing, and
//! keyboard/mouse state tracking.

mod input;
mod window;

pub use input::{InputState, KeyCode, MouseButton};
pub use window::{Surface, Window, required_surface_extensions};
