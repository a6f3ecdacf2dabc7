//! Core utilities shared by every layer of the renderer:
//! - Error type and result alias for the outer crates
//! - Logging initialization
//! - Frame timing

mod error;
mod logging;
mod timer;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::FrameTimer;
