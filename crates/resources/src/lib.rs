//! Asset loading: OBJ meshes with vertex deduplication, texture name
//! interning, and RGBA pixel decoding.
//!
//! The renderer core consumes the outputs of this crate as opaque data
//! (a flat vertex/index pair and a dense list of pixel buffers) and never
//! touches a file format itself.

mod error;

pub mod mesh;
pub mod obj;
pub mod pixels;

pub use error::{ResourceError, ResourceResult};
pub use mesh::MeshData;
pub use obj::load_obj;
pub use pixels::{TexturePixels, TextureRegistry};
