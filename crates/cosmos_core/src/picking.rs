//! Pointer hover and click selection.
//!
//! The host feeds pointer positions; [`Scene::update_hover`] casts a ray
//! from the camera and keeps the nearest body it hits. A click while
//! hovering yields a [`NavigationIntent`].

use bevy::prelude::*;

use crate::descriptor::BodyId;
use crate::scene::{Scene, SceneBody};

/// Request to navigate to the detail page of a clicked body.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub body_id: BodyId,
}

impl Scene {
    /// Pointer position in viewport pixels, origin top-left.
    pub fn set_pointer_pixels(&mut self, x: f32, y: f32) {
        self.pointer = Some(self.camera.screen_to_ndc(Vec2::new(x, y)));
    }

    /// Pointer position in normalized device coordinates.
    pub fn set_pointer_ndc(&mut self, ndc: Vec2) {
        self.pointer = Some(ndc);
    }

    /// Pointer left the viewport.
    pub fn clear_pointer(&mut self) {
        self.pointer = None;
        self.hovered = None;
    }

    pub fn pointer_ndc(&self) -> Option<Vec2> {
        self.pointer
    }

    fn is_pickable(&self, body: &SceneBody) -> bool {
        !body.is_anchor || self.config.include_anchor_in_picking
    }

    /// Index of the nearest pickable body under `ndc`.
    fn pick_index(&self, ndc: Vec2) -> Option<usize> {
        let ray = self.camera.ray_from_ndc(ndc);
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| self.is_pickable(body))
            .filter_map(|(i, body)| {
                ray.intersect_sphere(body.position, body.radius())
                    .map(|t| (i, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Body under an NDC position, ignoring the stored pointer.
    pub fn pick_at_ndc(&self, ndc: Vec2) -> Option<&SceneBody> {
        if self.is_disposed() {
            return None;
        }
        self.pick_index(ndc).map(|i| &self.bodies[i])
    }

    /// Re-cast the pointer ray and return the hovered body, if any.
    pub fn update_hover(&mut self) -> Option<&BodyId> {
        self.hovered = match self.pointer {
            Some(ndc) if !self.is_disposed() => self.pick_index(ndc),
            _ => None,
        };
        self.hovered.map(|i| &self.bodies[i].id)
    }

    pub fn hovered(&self) -> Option<&SceneBody> {
        self.hovered.and_then(|i| self.bodies.get(i))
    }

    /// Confirm a click on the hovered body.
    pub fn click(&self) -> Option<NavigationIntent> {
        if self.is_disposed() {
            return None;
        }
        self.hovered().map(|body| {
            info!("Navigating to '{}'", body.id);
            NavigationIntent {
                body_id: body.id.clone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplorerConfig;
    use crate::descriptor::{CelestialBodyDescriptor, SurfaceClass};

    fn scene(config: ExplorerConfig) -> Scene {
        let bodies = vec![
            CelestialBodyDescriptor::star("Sol", 8.0).with_seed(1u32),
            CelestialBodyDescriptor::planet("Jove", 2.0, SurfaceClass::GasGiant, 25.0, 0.0008)
                .with_seed(2u32),
            CelestialBodyDescriptor::planet("Terra", 1.5, SurfaceClass::Rocky, 40.0, 0.00053)
                .with_seed(3u32)
                .with_initial_angle(std::f32::consts::PI),
        ];
        Scene::compose(bodies, &config.with_starfield(0, 1.0)).unwrap()
    }

    fn screen_of(scene: &Scene, id: &str) -> Vec2 {
        let body = scene.body(&BodyId::from(id)).unwrap();
        scene.camera().world_to_screen(body.position).unwrap()
    }

    #[test]
    fn test_hover_and_click_planet() {
        let mut scene = scene(ExplorerConfig::default());
        let at = screen_of(&scene, "Jove");
        scene.set_pointer_pixels(at.x, at.y);
        assert_eq!(scene.update_hover().map(BodyId::as_str), Some("Jove"));
        assert_eq!(
            scene.click(),
            Some(NavigationIntent {
                body_id: BodyId::from("Jove")
            })
        );
    }

    #[test]
    fn test_empty_space_hovers_nothing() {
        let mut scene = scene(ExplorerConfig::default());
        scene.set_pointer_ndc(Vec2::new(0.95, 0.95));
        assert!(scene.update_hover().is_none());
        assert!(scene.click().is_none());
    }

    #[test]
    fn test_anchor_excluded_by_default() {
        let mut scene = scene(ExplorerConfig::default());
        let at = screen_of(&scene, "Sol");
        scene.set_pointer_pixels(at.x, at.y);
        assert!(scene.update_hover().is_none());
    }

    #[test]
    fn test_anchor_included_when_configured() {
        let mut scene = scene(ExplorerConfig::default().with_anchor_picking(true));
        let at = screen_of(&scene, "Sol");
        scene.set_pointer_pixels(at.x, at.y);
        assert_eq!(scene.update_hover().map(BodyId::as_str), Some("Sol"));
    }

    #[test]
    fn test_clear_pointer_drops_hover() {
        let mut scene = scene(ExplorerConfig::default());
        let at = screen_of(&scene, "Terra");
        scene.set_pointer_pixels(at.x, at.y);
        assert!(scene.update_hover().is_some());
        scene.clear_pointer();
        assert!(scene.hovered().is_none());
        assert!(scene.click().is_none());
    }

    #[test]
    fn test_disposed_scene_ignores_picking() {
        let mut scene = scene(ExplorerConfig::default());
        let at = screen_of(&scene, "Jove");
        scene.dispose();
        scene.set_pointer_pixels(at.x, at.y);
        assert!(scene.update_hover().is_none());
        assert!(scene.pick_at_ndc(Vec2::ZERO).is_none());
    }
}
