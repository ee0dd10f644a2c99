use glam::{Mat4, Vec3};

/// Camera looking down -Z at the plane from `distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub distance: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            distance: 2.0,
            fov_y_degrees: 65.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn at_distance(distance: f32) -> Self {
        Self {
            distance,
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
    }

    /// Right-handed perspective with wgpu's [0, 1] depth range.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn plane_center_lands_inside_depth_range() {
        let camera = Camera::at_distance(10.0);
        let clip = camera.projection(0.5) * camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;
        assert!((0.0..1.0).contains(&depth), "depth {depth}");
    }

    #[test]
    fn farther_camera_shrinks_the_plane() {
        let corner = Vec4::new(1.0, 1.0, 0.0, 1.0);
        let project = |d: f32| {
            let c = Camera::at_distance(d);
            let clip = c.projection(1.0) * c.view_matrix() * corner;
            clip.x / clip.w
        };
        assert!(project(2.0) > project(20.0));
    }

    #[test]
    fn degenerate_aspect_falls_back() {
        let camera = Camera::default();
        assert_eq!(camera.projection(0.0), camera.projection(1.0));
    }
}
