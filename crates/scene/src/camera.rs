//! Fly camera.

use glam::{Mat4, Vec3};

/// A first-person fly camera.
///
/// Orientation is yaw/pitch driven; `front` is derived from the angles and
/// kept normalized. The projection matrix carries the Vulkan Y flip so clip
/// space comes out right side up.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Normalized view direction.
    pub front: Vec3,
    /// World up vector.
    pub up: Vec3,
    /// Yaw angle in degrees.
    pub yaw: f32,
    /// Pitch angle in degrees, clamped to avoid gimbal flip.
    pub pitch: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            speed: 10.0,
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// Create a camera with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera at a position, looking down the default direction.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Move along the camera basis.
    ///
    /// `forward`, `right` and `up` are -1..1 input axes; the applied
    /// distance is `speed * delta` along each.
    pub fn advance(&mut self, forward: f32, right: f32, up: f32, delta: f32) {
        let step = self.speed * delta;
        let right_dir = self.front.cross(self.up).normalize_or_zero();

        self.position += self.front * (forward * step);
        self.position += right_dir * (right * step);
        self.position += self.up * (up * step);
    }

    /// Apply a mouse-look delta in degrees.
    ///
    /// Pitch is clamped to ±89 degrees so `front` never collapses onto the
    /// up vector.
    pub fn look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-89.0, 89.0);

        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();

        self.front = Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
    }

    /// View matrix looking from `position` along `front`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection for the given aspect ratio, Y-flipped for
    /// Vulkan clip space.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let mut proj = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
        proj.y_axis.y *= -1.0;
        proj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_translates_by_position() {
        let camera = Camera::at(Vec3::new(1.0, 2.0, 3.0));
        let view = camera.view_matrix();

        // Transforming the camera position into view space lands at origin
        let origin = view.transform_point3(camera.position);
        assert!(origin.length() < 1e-5);
    }

    #[test]
    fn projection_flips_y() {
        let camera = Camera::new();
        let proj = camera.projection_matrix(16.0 / 9.0);

        let unflipped = Mat4::perspective_rh(camera.fov_y, 16.0 / 9.0, camera.near, camera.far);
        assert_eq!(proj.y_axis.y, -unflipped.y_axis.y);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new();
        camera.look(0.0, 500.0);
        assert!(camera.pitch <= 89.0);

        camera.look(0.0, -500.0);
        assert!(camera.pitch >= -89.0);
    }

    #[test]
    fn advance_moves_along_front() {
        let mut camera = Camera::new();
        let start = camera.position;
        camera.advance(1.0, 0.0, 0.0, 0.1);

        let moved = camera.position - start;
        assert!(moved.dot(camera.front) > 0.0);
        assert!((moved.length() - camera.speed * 0.1).abs() < 1e-5);
    }
}
