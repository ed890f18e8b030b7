//! Per-frame orbital motion and label placement.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::descriptor::BodyId;
use crate::scene::{orbit_position, Scene};

/// Where a body's label should be drawn this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub body_id: BodyId,
    pub text: String,
    /// Viewport pixels, origin top-left. `None` hides the label.
    pub screen: Option<Vec2>,
}

impl LabelPlacement {
    pub fn is_visible(&self) -> bool {
        self.screen.is_some()
    }
}

impl Scene {
    /// Advance orbits and spins by `dt` reference frames (1.0 is one frame
    /// at 60 Hz). Does nothing once the scene is disposed.
    pub fn tick(&mut self, dt: f32) {
        if self.is_disposed() || !dt.is_finite() {
            return;
        }
        let speed = self.config.speed_multiplier;
        let spin = self.config.spin_multiplier;

        for body in &mut self.bodies {
            if !body.is_anchor {
                let step = body.descriptor.angular_speed * speed * dt;
                body.angle = (body.angle + step).rem_euclid(TAU);
                body.position = orbit_position(body.descriptor.orbit_distance, body.angle);
            }
            body.spin = (body.spin + body.spin_rate * spin * dt).rem_euclid(TAU);
            body.cloud_spin = (body.cloud_spin + body.cloud_spin_rate * spin * dt).rem_euclid(TAU);
        }
    }

    /// Project every labelled body's anchor through the current camera.
    pub fn label_placements(&self) -> Vec<LabelPlacement> {
        let include_anchor = self.config.include_anchor_in_labels;
        self.bodies
            .iter()
            .filter(|body| include_anchor || !body.is_anchor)
            .map(|body| LabelPlacement {
                body_id: body.id.clone(),
                text: body.name().to_string(),
                screen: self.camera.world_to_screen(body.label_anchor()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExplorerConfig, ViewPreset};
    use crate::descriptor::{CelestialBodyDescriptor, SurfaceClass};

    fn scene_with(config: ExplorerConfig) -> Scene {
        let bodies = vec![
            CelestialBodyDescriptor::star("Sol", 8.0).with_seed(1u32),
            CelestialBodyDescriptor::planet("Jove", 2.0, SurfaceClass::GasGiant, 25.0, 0.0008)
                .with_seed(2u32),
            CelestialBodyDescriptor::planet("Terra", 1.5, SurfaceClass::Rocky, 40.0, 0.00053)
                .with_seed(3u32)
                .with_initial_angle(6.2),
        ];
        Scene::compose(bodies, &config.with_starfield(0, 1.0)).unwrap()
    }

    fn scene() -> Scene {
        scene_with(ExplorerConfig::default())
    }

    #[test]
    fn test_angles_advance_and_stay_on_orbit() {
        let mut scene = scene();
        for _ in 0..500 {
            scene.tick(1.0);
        }
        let jove = scene.body(&BodyId::from("Jove")).unwrap();
        assert!((jove.angle - 0.4).abs() < 1e-3);
        let p = jove.position;
        assert!(((p.x * p.x + p.z * p.z).sqrt() - 25.0).abs() < 1e-3);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_angles_wrap() {
        let mut scene = scene();
        for _ in 0..1000 {
            scene.tick(1.0);
        }
        let terra = scene.body(&BodyId::from("Terra")).unwrap();
        let expected = (6.2f32 + 1000.0 * 0.00053).rem_euclid(TAU);
        assert!((terra.angle - expected).abs() < 1e-3);
        assert!(terra.angle < TAU);
    }

    #[test]
    fn test_dt_scales_motion() {
        let mut a = scene();
        let mut b = scene();
        a.tick(2.0);
        b.tick(1.0);
        b.tick(1.0);
        let ja = a.body(&BodyId::from("Jove")).unwrap().angle;
        let jb = b.body(&BodyId::from("Jove")).unwrap().angle;
        assert!((ja - jb).abs() < 1e-6);
    }

    #[test]
    fn test_speed_multiplier() {
        let mut scene = scene_with(ExplorerConfig::default().with_speed_multiplier(10.0));
        scene.tick(1.0);
        let jove = scene.body(&BodyId::from("Jove")).unwrap();
        assert!((jove.angle - 0.008).abs() < 1e-6);
    }

    #[test]
    fn test_anchor_stays_put_and_planets_spin() {
        let mut scene = scene();
        scene.tick(1.0);
        let sol = scene.anchor().unwrap();
        assert_eq!(sol.position, Vec3::ZERO);
        assert_eq!(sol.spin, 0.0);
        let jove = scene.body(&BodyId::from("Jove")).unwrap();
        assert!((jove.spin - 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_detail_view_spins_anchor_and_clouds() {
        let bodies = vec![CelestialBodyDescriptor::planet("Terra", 6.0, SurfaceClass::Rocky, 0.0, 0.0)
            .with_seed(3u32)];
        let config = ExplorerConfig::for_view(ViewPreset::PlanetDetail)
            .with_tier(crate::config::QualityTier::Overview)
            .with_starfield(0, 1.0);
        let mut scene = Scene::compose(bodies, &config).unwrap();
        scene.tick(10.0);
        let terra = scene.anchor().unwrap();
        assert!((terra.spin - 0.009).abs() < 1e-6);
        assert!((terra.cloud_spin - 0.015).abs() < 1e-6);
    }

    #[test]
    fn test_disposed_scene_ignores_tick() {
        let mut scene = scene();
        scene.dispose();
        scene.tick(1.0);
        assert!(scene.bodies().is_empty());
    }

    #[test]
    fn test_labels_include_anchor_by_default() {
        let scene = scene();
        let labels = scene.label_placements();
        assert_eq!(labels.len(), 3);
        let sol = labels.iter().find(|l| l.text == "Sol").unwrap();
        let screen = sol.screen.expect("star label is on screen");
        // Label sits above the star, which projects near the center.
        assert!((screen.x - 640.0).abs() < 1.0);
        assert!(screen.y < 360.0);
    }

    #[test]
    fn test_labels_can_exclude_anchor() {
        let scene = scene_with(ExplorerConfig::default().with_anchor_labels(false));
        let labels = scene.label_placements();
        assert_eq!(labels.len(), 2);
        assert!(labels.iter().all(|l| l.text != "Sol"));
    }

    #[test]
    fn test_label_hidden_behind_camera() {
        let mut scene = scene();
        scene.camera_mut().eye = Vec3::new(0.0, 0.0, 5.0);
        scene.camera_mut().target = Vec3::new(0.0, 0.0, 10.0);
        let labels = scene.label_placements();
        let sol = labels.iter().find(|l| l.text == "Sol").unwrap();
        assert!(!sol.is_visible());
    }
}
