//! Perspective camera looking at the rendered body

use glam::{DMat4, DQuat, DVec3, DVec4};

/// Right-handed perspective camera (f64 for stable unprojection)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Position in world space
    pub position: DVec3,
    /// Look-at target
    pub target: DVec3,
    /// Up hint
    pub up: DVec3,
    /// Vertical field of view (radians)
    pub fov_y: f64,
    /// Aspect ratio (width/height)
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    pub fn new(position: DVec3, target: DVec3, aspect: f64) -> Self {
        Self {
            position,
            target,
            up: DVec3::Y,
            fov_y: 45.0_f64.to_radians(),
            aspect,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Camera on +Z at `distance`, looking at the body at the origin
    pub fn facing_origin(distance: f64, fov_y_deg: f64, aspect: f64) -> Self {
        Self {
            fov_y: fov_y_deg.to_radians(),
            ..Self::new(DVec3::new(0.0, 0.0, distance), DVec3::ZERO, aspect)
        }
    }

    /// Usable for projection: finite, non-degenerate frustum, not looking
    /// along its own up vector
    pub fn is_valid(&self) -> bool {
        let finite = self.position.is_finite()
            && self.target.is_finite()
            && self.up.is_finite()
            && self.fov_y.is_finite()
            && self.aspect.is_finite()
            && self.near.is_finite()
            && self.far.is_finite();

        finite
            && self.fov_y > 0.0
            && self.fov_y < std::f64::consts::PI
            && self.aspect > 0.0
            && self.near > 0.0
            && self.far > self.near
            && (self.target - self.position).cross(self.up).length_squared() > 1e-18
    }

    /// View matrix (world to camera)
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection matrix (camera to clip, depth 0..1)
    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Forward direction (normalized)
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize()
    }

    /// Right direction (normalized)
    pub fn right(&self) -> DVec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Project a world point to normalized screen coordinates: u grows to
    /// the right, v grows downward, both in [0, 1] when on screen.
    pub fn project(&self, world_pos: DVec3) -> Option<(f64, f64, f64)> {
        let clip = self.view_projection() * world_pos.extend(1.0);

        if clip.w <= 0.0 {
            return None; // Behind camera
        }

        let ndc = clip.truncate() / clip.w;
        let u = (ndc.x + 1.0) * 0.5;
        let v = (1.0 - ndc.y) * 0.5;

        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None; // Outside frustum
        }

        Some((u, v, ndc.z))
    }

    /// Unit ray direction through a normalized screen point
    pub fn unproject_ray(&self, u: f64, v: f64) -> Option<DVec3> {
        let inverse = self.view_projection().inverse();
        let ndc = DVec4::new(2.0 * u - 1.0, 1.0 - 2.0 * v, 0.0, 1.0);
        let near = inverse * ndc;
        if near.w.abs() < f64::EPSILON {
            return None;
        }
        let on_near_plane = near.truncate() / near.w;
        (on_near_plane - self.position).try_normalize()
    }

    /// Swing the camera around its target, keeping the distance
    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        let offset = self.position - self.target;
        let yawed = DQuat::from_axis_angle(self.up.normalize(), d_yaw) * offset;
        let side = yawed.cross(self.up).try_normalize().unwrap_or(DVec3::X);
        self.position = self.target + DQuat::from_axis_angle(side, d_pitch) * yawed;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::facing_origin(3.0, 45.0, 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::default();
        let (u, v, _) = camera.project(DVec3::ZERO).unwrap();
        assert_abs_diff_eq!(u, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(v, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_center_ray_is_forward() {
        let camera = Camera::default();
        let ray = camera.unproject_ray(0.5, 0.5).unwrap();
        assert_abs_diff_eq!(ray.dot(camera.forward()), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_screen_axes() {
        let camera = Camera::default();
        let right = camera.unproject_ray(0.9, 0.5).unwrap();
        assert!(right.x > 0.0);
        let top = camera.unproject_ray(0.5, 0.1).unwrap();
        assert!(top.y > 0.0);
    }

    #[test]
    fn test_point_behind_is_rejected() {
        let camera = Camera::default();
        assert!(camera.project(DVec3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_validity() {
        assert!(Camera::default().is_valid());

        let mut camera = Camera::default();
        camera.position.x = f64::NAN;
        assert!(!camera.is_valid());

        let looking_up = Camera::new(DVec3::ZERO, DVec3::Y, 1.0);
        assert!(!looking_up.is_valid());
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        camera.orbit(0.7, 0.2);
        assert_abs_diff_eq!(camera.position.length(), 3.0, epsilon = 1e-9);
        assert!(camera.position.x.abs() > 0.1);
    }
}
