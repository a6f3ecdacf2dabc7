//! Uniform buffer data written once per frame.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Model/view/projection block at binding 0 of the descriptor layout.
///
/// Must match the vertex shader's uniform block exactly: three column-major
/// `mat4`s, 192 bytes, no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MvpUbo {
    /// Model matrix (object to world space).
    pub model: Mat4,
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Projection matrix (view to clip space, Y-flipped for Vulkan).
    pub projection: Mat4,
}

impl MvpUbo {
    /// Size of the block in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a uniform block from the three matrices.
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model,
            view,
            projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use glaze_scene::Camera;

    #[test]
    fn block_is_three_matrices() {
        assert_eq!(MvpUbo::SIZE, 192);
        assert_eq!(std::mem::align_of::<MvpUbo>(), 16);
    }

    #[test]
    fn bytes_round_trip() {
        let ubo = MvpUbo::new(
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        );

        let bytes = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), MvpUbo::SIZE);

        let back: &MvpUbo = bytemuck::from_bytes(bytes);
        assert_eq!(back.model, ubo.model);
    }

    #[test]
    fn view_tracks_camera_position_each_frame() {
        // Each iteration's uniform write must reflect the camera position
        // at the time of that iteration.
        let positions = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 3.0),
        ];

        let mut written = Vec::new();
        for position in positions {
            let camera = Camera::at(position);
            let ubo = MvpUbo::new(
                Mat4::IDENTITY,
                camera.view_matrix(),
                camera.projection_matrix(16.0 / 9.0),
            );
            written.push(ubo);
        }

        for (ubo, position) in written.iter().zip(positions) {
            // The inverse view's translation column recovers the camera position
            let eye = ubo.view.inverse().col(3).truncate();
            assert!((eye - position).length() < 1e-4);
        }
    }
}
