//! Scene-side state: the fly camera driving the per-frame view transform.

pub mod camera;

pub use camera::Camera;
