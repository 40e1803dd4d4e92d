/// Camera and perspective projection
use crate::error::RenderError;
use crate::geometry::{Vector, VectorExt};

/// Offset added to the near plane when a view depth has to be clamped.
pub const NEAR_EPSILON: f32 = 1e-4;

/// A point mapped to pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    /// View-space depth along the camera's forward axis (not clip-space depth)
    pub depth: f32,
    /// The view depth was at or behind the near plane and was clamped
    pub clamped: bool,
}

/// Orthonormal camera basis, derived from a [`Camera`] on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    pub origin: Vector,
    pub forward: Vector,
    pub right: Vector,
    pub up: Vector,
}

impl ViewBasis {
    /// Express a world-space point in view space (x right, y up, z forward).
    pub fn to_view(&self, point: &Vector) -> Vector {
        let rel = *point - self.origin;
        Vector::new(rel.dot(&self.right), rel.dot(&self.up), rel.dot(&self.forward))
    }
}

/// Perspective camera.
///
/// Invariants are checked once in [`Camera::new`]; the camera holds no
/// derived state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vector,
    target: Vector,
    up: Vector,
    fov: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Create a camera looking from `position` at `target`.
    ///
    /// `fov` is the vertical field of view in radians.
    pub fn new(
        position: Vector,
        target: Vector,
        up: Vector,
        fov: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, RenderError> {
        let all_finite = [position, target, up]
            .iter()
            .all(|v| v.iter().all(|c| c.is_finite()))
            && fov.is_finite()
            && near.is_finite()
            && far.is_finite();
        if !all_finite {
            return Err(RenderError::InvalidCamera(
                "camera parameters must be finite".to_string(),
            ));
        }
        if position == target {
            return Err(RenderError::InvalidCamera(
                "position and target coincide".to_string(),
            ));
        }
        let forward = (target - position).normalize_or_zero();
        if forward.cross(&up).normalize_or_zero() == Vector::zeros() {
            return Err(RenderError::InvalidCamera(
                "up vector is parallel to the view direction".to_string(),
            ));
        }
        if !(fov > 0.0 && fov < std::f32::consts::PI) {
            return Err(RenderError::InvalidCamera(format!(
                "field of view {fov} is outside (0, pi)"
            )));
        }
        if near <= 0.0 || far <= near {
            return Err(RenderError::InvalidCamera(format!(
                "clip planes near={near} far={far} must satisfy 0 < near < far"
            )));
        }

        Ok(Self {
            position,
            target,
            up,
            fov,
            near,
            far,
        })
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn target(&self) -> Vector {
        self.target
    }

    pub fn up(&self) -> Vector {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn near_plane(&self) -> f32 {
        self.near
    }

    /// Carried for configuration round-trips; projection does not clip
    /// against it.
    pub fn far_plane(&self) -> f32 {
        self.far
    }

    /// Build the view basis from the current parameters.
    pub fn basis(&self) -> ViewBasis {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(&self.up).normalize_or_zero();
        let up = right.cross(&forward);
        ViewBasis {
            origin: self.position,
            forward,
            right,
            up,
        }
    }

    /// Fixed light direction used for flat shading: along the view axis.
    pub fn light_direction(&self) -> Vector {
        self.basis().forward
    }

    /// Project a world-space point to screen space.
    pub fn project(&self, point: &Vector, width: usize, height: usize) -> Projected {
        self.project_view(&self.basis().to_view(point), width, height)
    }

    /// Project a point already expressed in view space.
    ///
    /// Depths at or behind the near plane are clamped to
    /// `near + NEAR_EPSILON` rather than rejected.
    pub fn project_view(&self, view: &Vector, width: usize, height: usize) -> Projected {
        let clamped = view.z <= self.near;
        let z = if clamped { self.near + NEAR_EPSILON } else { view.z };

        let scale = 1.0 / (self.fov / 2.0).tan();
        let aspect = width as f32 / height as f32;

        let ndc_x = view.x * scale / (z * aspect);
        let ndc_y = view.y * scale / z;

        Projected {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth: z,
            clamped,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector::new(0.0, 0.0, 5.0),
            target: Vector::new(0.0, 0.0, 0.0),
            up: Vector::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            near: 0.1,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_is_valid() {
        let camera = Camera::default();
        let checked = Camera::new(
            camera.position(),
            camera.target(),
            camera.up(),
            camera.fov(),
            camera.near_plane(),
            camera.far_plane(),
        );
        assert_eq!(checked.unwrap(), camera);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = Camera::new(
            Vector::new(3.0, 2.0, 7.0),
            Vector::new(-1.0, 0.5, 0.0),
            Vector::new(0.0, 1.0, 0.0),
            1.0,
            0.1,
            100.0,
        )
        .unwrap();
        let basis = camera.basis();
        for v in [basis.forward, basis.right, basis.up] {
            assert!((v.norm() - 1.0).abs() < 1e-5);
        }
        assert!(basis.forward.dot(&basis.right).abs() < 1e-5);
        assert!(basis.forward.dot(&basis.up).abs() < 1e-5);
        assert!(basis.right.dot(&basis.up).abs() < 1e-5);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = Camera::default();
        let p = camera.project(&Vector::zeros(), 800, 600);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
        assert!((p.depth - 5.0).abs() < 1e-6);
        assert!(!p.clamped);
    }

    #[test]
    fn test_screen_y_is_flipped() {
        let camera = Camera::default();
        let above = camera.project(&Vector::new(0.0, 1.0, 0.0), 800, 600);
        let right = camera.project(&Vector::new(1.0, 0.0, 0.0), 800, 600);
        assert!(above.y < 300.0);
        assert!(right.x > 400.0);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_target_stays_centered_on_very_wide_targets() {
        let camera = Camera::default();
        // Would wrap to a width of 1 if truncated to 32 bits
        let width = u32::MAX as usize + 2;
        let p = camera.project(&Vector::zeros(), width, 2);
        assert!((p.x / width as f32 - 0.5).abs() < 1e-6, "x = {}", p.x);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_behind_camera_is_clamped() {
        let camera = Camera::default();
        let p = camera.project(&Vector::new(0.0, 0.0, 10.0), 800, 600);
        assert!(p.clamped);
        assert_eq!(p.depth, camera.near_plane() + NEAR_EPSILON);
    }

    #[test]
    fn test_rejects_coincident_position_and_target() {
        let p = Vector::new(1.0, 1.0, 1.0);
        let result = Camera::new(p, p, Vector::new(0.0, 1.0, 0.0), 1.0, 0.1, 10.0);
        assert!(matches!(result, Err(RenderError::InvalidCamera(_))));
    }

    #[test]
    fn test_rejects_parallel_up() {
        let result = Camera::new(
            Vector::new(0.0, 5.0, 0.0),
            Vector::zeros(),
            Vector::new(0.0, 1.0, 0.0),
            1.0,
            0.1,
            10.0,
        );
        assert!(matches!(result, Err(RenderError::InvalidCamera(_))));
    }

    #[test]
    fn test_rejects_bad_planes_and_fov() {
        let up = Vector::new(0.0, 1.0, 0.0);
        let pos = Vector::new(0.0, 0.0, 5.0);
        assert!(Camera::new(pos, Vector::zeros(), up, 0.0, 0.1, 10.0).is_err());
        assert!(Camera::new(pos, Vector::zeros(), up, 1.0, 0.0, 10.0).is_err());
        assert!(Camera::new(pos, Vector::zeros(), up, 1.0, 1.0, 0.5).is_err());
    }
}
