//! Perspective camera math shared by label placement and picking.
//!
//! The scene never talks to the renderer directly; it projects through a
//! [`ViewCamera`] the viewport keeps in sync with the Bevy camera.

use bevy::prelude::*;

use crate::config::ExplorerConfig;

/// A projected world point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Clip-space w. Negative or zero means behind the camera.
    pub clip_w: f32,
    /// Normalized device coordinates, depth in [0, 1] between the planes.
    pub ndc: Vec3,
}

impl ProjectedPoint {
    /// In front of the camera, before the far plane and inside the frustum
    /// sides.
    pub fn is_visible(&self) -> bool {
        self.clip_w > 0.0
            && self.ndc.z < 1.0
            && (-1.0..=1.0).contains(&self.ndc.x)
            && (-1.0..=1.0).contains(&self.ndc.y)
    }
}

/// Half-line used for pointer picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl PickRay {
    /// Distance along the ray to the nearest intersection with a sphere in
    /// front of the origin.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            // Origin inside the sphere.
            Some(far)
        } else {
            None
        }
    }
}

/// Right-handed perspective camera looking from `eye` at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Viewport size in logical pixels.
    pub viewport: Vec2,
}

impl ViewCamera {
    pub fn new(eye: Vec3, target: Vec3, fov_degrees: f32, viewport: Vec2) -> Self {
        Self {
            eye,
            target,
            fov_y: fov_degrees.to_radians(),
            near: 0.1,
            far: 1000.0,
            viewport,
        }
    }

    /// Camera at the configured eye, looking at the origin.
    pub fn from_config(config: &ExplorerConfig, viewport: Vec2) -> Self {
        Self {
            near: config.near,
            far: config.far,
            ..Self::new(config.camera_eye(), Vec3::ZERO, config.fov_degrees, viewport)
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        }
    }

    /// Update the viewport after a window resize.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect(), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn project(&self, world: Vec3) -> ProjectedPoint {
        let clip = self.view_projection() * world.extend(1.0);
        let ndc = if clip.w.abs() > f32::EPSILON {
            clip.truncate() / clip.w
        } else {
            Vec3::splat(f32::INFINITY)
        };
        ProjectedPoint {
            clip_w: clip.w,
            ndc,
        }
    }

    /// NDC to viewport pixels, origin top-left, y down.
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.viewport.x,
            (-ndc.y * 0.5 + 0.5) * self.viewport.y,
        )
    }

    /// Viewport pixels to NDC.
    pub fn screen_to_ndc(&self, pixels: Vec2) -> Vec2 {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            pixels.x / self.viewport.x * 2.0 - 1.0,
            -(pixels.y / self.viewport.y * 2.0 - 1.0),
        )
    }

    /// Screen position of a world point, or `None` when it is off screen.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let projected = self.project(world);
        projected
            .is_visible()
            .then(|| self.ndc_to_screen(projected.ndc.truncate()))
    }

    /// Ray from the near plane through an NDC position.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> PickRay {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).normalize_or_zero();
        PickRay {
            origin: near,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> ViewCamera {
        ViewCamera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 60.0, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let cam = camera();
        let screen = cam.world_to_screen(Vec3::ZERO).unwrap();
        assert!((screen - Vec2::new(400.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn test_points_above_target_appear_higher_on_screen() {
        let cam = camera();
        let screen = cam.world_to_screen(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(screen.y < 300.0, "screen y grows downward");
    }

    #[test]
    fn test_points_behind_camera_are_hidden() {
        let cam = camera();
        let behind = cam.project(Vec3::new(0.0, 0.0, 20.0));
        assert!(behind.clip_w < 0.0);
        assert!(!behind.is_visible());
        assert!(cam.world_to_screen(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_points_outside_frustum_are_hidden() {
        let cam = camera();
        assert!(cam.world_to_screen(Vec3::new(100.0, 0.0, 0.0)).is_none());
        assert!(cam.world_to_screen(Vec3::new(0.0, 0.0, -5000.0)).is_none(), "beyond far plane");
    }

    #[test]
    fn test_screen_ndc_round_trip() {
        let cam = camera();
        let px = Vec2::new(123.0, 456.0);
        let back = cam.ndc_to_screen(cam.screen_to_ndc(px));
        assert!((back - px).length() < 1e-3);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let cam = camera();
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert!((ray.origin.z - 9.9).abs() < 1e-3);
    }

    #[test]
    fn test_from_config_takes_clip_planes() {
        let mut config = ExplorerConfig::default();
        config.near = 2.0;
        config.far = 50.0;
        let cam = ViewCamera::from_config(&config, Vec2::new(800.0, 600.0));
        assert_eq!((cam.near, cam.far), (2.0, 50.0));
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!(((ray.origin - cam.eye).length() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_ray_through_projected_point_hits_it() {
        let cam = ViewCamera::new(Vec3::new(0.0, 50.0, 90.0), Vec3::ZERO, 60.0, Vec2::new(1280.0, 720.0));
        let point = Vec3::new(25.0, 0.0, 0.0);
        let ndc = cam.project(point).ndc.truncate();
        let ray = cam.ray_from_ndc(ndc);
        let t = ray.intersect_sphere(point, 1.0).unwrap();
        let hit = ray.origin + ray.direction * t;
        assert!((hit - point).length() <= 1.0 + 1e-3);
    }

    #[test]
    fn test_sphere_intersection_cases() {
        let ray = PickRay {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert!((ray.intersect_sphere(Vec3::ZERO, 2.0).unwrap() - 8.0).abs() < 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(5.0, 0.0, 0.0), 2.0).is_none());
        assert!(ray.intersect_sphere(Vec3::new(0.0, 0.0, 20.0), 2.0).is_none(), "behind origin");
        let inside = ray.intersect_sphere(Vec3::new(0.0, 0.0, 10.0), 1.0).unwrap();
        assert!((inside - 1.0).abs() < 1e-5);
    }
}
