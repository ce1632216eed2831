use glam::{Mat4, Quat, Vec3};

/// A tracked pose in world space: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at the given position with the quad's rest orientation.
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

/// Owns the clip quad's model matrix and derives the MVP for each draw.
///
/// The model matrix is fully recomputed by every [`QuadTransform::update`]
/// call; it is never partially updated.
#[derive(Debug, Clone, Default)]
pub struct QuadTransform {
    model: Mat4,
}

impl QuadTransform {
    pub fn new() -> Self {
        Self {
            model: Mat4::IDENTITY,
        }
    }

    /// Recompute the model matrix from the tracked pose and scale factor.
    ///
    /// `base` is the caller's anchor matrix (identity for a quad at its rest
    /// orientation); the quad is translated to the pose position, then
    /// uniformly scaled: `model = base * T(pose) * S(scale)`.
    pub fn update(&mut self, base: Mat4, scale_factor: f32, pose: &Pose) {
        let placed = base * Mat4::from_translation(pose.position);
        self.model = placed * Mat4::from_scale(Vec3::splat(scale_factor));
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    /// `projection * view * model`, column-vector convention.
    ///
    /// The multiplication order is fixed; reversing it silently misplaces the
    /// quad rather than erroring.
    pub fn model_view_projection(&self, camera_view: Mat4, camera_projection: Mat4) -> Mat4 {
        let model_view = camera_view * self.model;
        camera_projection * model_view
    }
}
