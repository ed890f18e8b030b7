//! Orbit camera controller for the explorer views.
//!
//! Rotates around the orbit anchor.
//! - Left mouse drag: rotate camera (azimuth and elevation)
//! - Scroll wheel: zoom in/out, clamped to the view's distance bounds

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;

use crate::camera::ViewCamera;
use crate::config::ExplorerConfig;

/// Orbit state for the explorer camera.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (radians)
    pub azimuth: f32,
    /// Vertical angle (radians), clamped to avoid gimbal lock
    pub elevation: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Mouse sensitivity for rotation
    pub sensitivity: f32,
    /// Zoom sensitivity
    pub zoom_sensitivity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 10.0,
            azimuth: 0.0,
            elevation: 0.5,
            min_distance: 1.0,
            max_distance: 100.0,
            sensitivity: 0.005,
            zoom_sensitivity: 1.0,
        }
    }
}

impl OrbitCamera {
    /// Orbit that starts at `eye` looking at `target`.
    pub fn from_eye(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length();
        let elevation = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation,
            ..default()
        }
    }

    /// Orbit matching the configured eye and distance bounds.
    pub fn from_config(config: &ExplorerConfig) -> Self {
        let mut orbit = Self::from_eye(config.camera_eye(), Vec3::ZERO);
        orbit.min_distance = config.min_distance;
        orbit.max_distance = config.max_distance;
        orbit.distance = config.clamp_distance(orbit.distance);
        orbit
    }

    /// Calculate the camera position based on current orbit parameters.
    pub fn calculate_position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Apply a drag delta in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation = (self.elevation + delta.y * self.sensitivity).clamp(-1.4, 1.4);
    }

    /// Apply scroll lines; positive zooms in.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll * self.zoom_sensitivity)
            .clamp(self.min_distance, self.max_distance);
    }

    /// Point the projection camera at the current orbit position.
    pub fn apply_to(&self, camera: &mut ViewCamera) {
        camera.eye = self.calculate_position();
        camera.target = self.target;
    }
}

/// System that updates orbit cameras based on mouse input.
pub fn orbit_camera_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    for (mut orbit, mut transform) in query.iter_mut() {
        if mouse_button.pressed(MouseButton::Left) {
            orbit.rotate(mouse_motion.delta);
        }

        let scroll = mouse_scroll.delta.y;
        if scroll != 0.0 {
            orbit.zoom(scroll);
        }

        transform.translation = orbit.calculate_position();
        transform.look_at(orbit.target, Vec3::Y);
    }
}

/// Bundle for spawning an orbit camera.
#[derive(Bundle)]
pub struct OrbitCameraBundle {
    pub camera: Camera3d,
    pub projection: Projection,
    pub orbit: OrbitCamera,
    pub transform: Transform,
}

impl OrbitCameraBundle {
    pub fn from_config(config: &ExplorerConfig) -> Self {
        let orbit = OrbitCamera::from_config(config);
        let position = orbit.calculate_position();
        Self {
            camera: Camera3d::default(),
            projection: Projection::Perspective(PerspectiveProjection {
                fov: config.fov_degrees.to_radians(),
                near: config.near,
                far: config.far,
                ..default()
            }),
            transform: Transform::from_translation(position).looking_at(orbit.target, Vec3::Y),
            orbit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewPreset;

    #[test]
    fn test_from_eye_reproduces_eye() {
        for eye in [
            Vec3::new(0.0, 50.0, 90.0),
            Vec3::new(0.0, 0.0, 22.0),
            Vec3::new(-7.0, 3.0, 4.0),
        ] {
            let orbit = OrbitCamera::from_eye(eye, Vec3::ZERO);
            assert!((orbit.calculate_position() - eye).length() < 1e-3, "eye {:?}", eye);
        }
    }

    #[test]
    fn test_zoom_respects_view_bounds() {
        let mut orbit = OrbitCamera::from_config(&ExplorerConfig::for_view(ViewPreset::PlanetDetail));
        assert!((orbit.distance - 22.0).abs() < 1e-4);
        orbit.zoom(100.0);
        assert_eq!(orbit.distance, 12.0);
        orbit.zoom(-100.0);
        assert_eq!(orbit.distance, 40.0);
    }

    #[test]
    fn test_rotation_clamps_elevation() {
        let mut orbit = OrbitCamera::default();
        orbit.rotate(Vec2::new(0.0, 10_000.0));
        assert_eq!(orbit.elevation, 1.4);
    }

    #[test]
    fn test_apply_to_view_camera() {
        let config = ExplorerConfig::default();
        let orbit = OrbitCamera::from_config(&config);
        let mut camera = ViewCamera::from_config(&config, Vec2::new(100.0, 100.0));
        camera.eye = Vec3::ZERO;
        orbit.apply_to(&mut camera);
        assert!((camera.eye - config.camera_eye()).length() < 1e-3);
    }
}
