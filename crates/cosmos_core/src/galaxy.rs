//! Galaxy point clouds.
//!
//! Spiral galaxies are arms of points wound around the core, shading from a
//! warm core to blue edges. Everything else is drawn as an irregular,
//! flattened blob with a few offset clumps.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::palette::color_from_hex;
use crate::rng::SurfaceRng;
use crate::starfield::point_mesh;

/// Radians of rotation about Y per reference frame.
pub const GALAXY_ROTATION_RATE: f32 = 0.001;
/// Fixed tilt about Z.
pub const GALAXY_TILT: f32 = 0.1;

const CORE_COLOR: u32 = 0xFF6030;
const EDGE_COLOR: u32 = 0x1B3984;
const IRREGULAR_COLORS: [u32; 4] = [0xFFFFFF, 0xAACCFF, 0xFFCCAA, 0xFFAAAA];

/// Shape family of a galaxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalaxyKind {
    Spiral,
    Irregular,
}

impl GalaxyKind {
    /// Labels mentioning "spiral" (any case) are spirals.
    pub fn from_type_label(label: &str) -> Self {
        if label.to_lowercase().contains("spiral") {
            GalaxyKind::Spiral
        } else {
            GalaxyKind::Irregular
        }
    }
}

/// Shape parameters for spiral arms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralParams {
    pub count: usize,
    pub radius: f32,
    pub branches: usize,
    /// Extra winding per unit radius.
    pub spin: f32,
    /// Scatter away from the arm, as a fraction of the radius.
    pub randomness: f32,
    /// Exponent that concentrates scatter near the arm.
    pub randomness_power: i32,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            count: 20_000,
            radius: 10.0,
            branches: 3,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3,
        }
    }
}

/// A generated galaxy ready to draw and rotate.
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyCloud {
    pub kind: GalaxyKind,
    pub points: Vec<Vec3>,
    /// One color per point.
    pub colors: Vec<Srgba>,
    /// Current rotation about Y.
    pub rotation: f32,
    pub point_size: f32,
}

impl GalaxyCloud {
    pub fn generate(kind: GalaxyKind, rng: &mut dyn SurfaceRng) -> Self {
        match kind {
            GalaxyKind::Spiral => Self::spiral(SpiralParams::default(), rng),
            GalaxyKind::Irregular => Self::irregular(8_000, rng),
        }
    }

    pub fn spiral(params: SpiralParams, rng: &mut dyn SurfaceRng) -> Self {
        let core = color_from_hex(CORE_COLOR);
        let edge = color_from_hex(EDGE_COLOR);
        let branches = params.branches.max(1);

        let mut points = Vec::with_capacity(params.count);
        let mut colors = Vec::with_capacity(params.count);
        for i in 0..params.count {
            let r = rng.next_f32() * params.radius;
            let spin_angle = r * params.spin;
            let branch_angle = (i % branches) as f32 / branches as f32 * TAU;

            let mut scatter = || {
                let magnitude = rng.next_f32().powi(params.randomness_power);
                let sign = if rng.next_f64() < 0.5 { 1.0 } else { -1.0 };
                magnitude * sign * params.randomness * r
            };
            let (sx, sy, sz) = (scatter(), scatter(), scatter());

            let angle = spin_angle + branch_angle;
            points.push(Vec3::new(angle.cos() * r + sx, sy * 0.5, angle.sin() * r + sz));

            let t = if params.radius > 0.0 { r / params.radius } else { 0.0 };
            colors.push(core.mix(&edge, t));
        }

        Self {
            kind: GalaxyKind::Spiral,
            points,
            colors,
            rotation: 0.0,
            point_size: 0.15,
        }
    }

    pub fn irregular(count: usize, rng: &mut dyn SurfaceRng) -> Self {
        let palette: Vec<Srgba> = IRREGULAR_COLORS.iter().map(|&c| color_from_hex(c)).collect();

        let mut points = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        for _ in 0..count {
            let theta = TAU * rng.next_f32();
            let phi = (2.0 * rng.next_f32() - 1.0).clamp(-1.0, 1.0).acos();
            let r = 12.0 * rng.next_f32().sqrt();

            let mut p = Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin() * 0.6,
                r * phi.cos(),
            );
            if rng.chance_above(0.5) {
                p.x += rng.next_signed(4.0);
                p.z += rng.next_signed(4.0);
            }
            points.push(p);
            colors.push(palette[rng.next_index(palette.len())]);
        }

        Self {
            kind: GalaxyKind::Irregular,
            points,
            colors,
            rotation: 0.0,
            point_size: 0.15,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Advance the slow rotation by `dt` reference frames.
    pub fn tick(&mut self, dt: f32) {
        self.rotation = (self.rotation + GALAXY_ROTATION_RATE * dt).rem_euclid(TAU);
    }

    /// Rotation about Y followed by the fixed tilt.
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation) * Quat::from_rotation_z(GALAXY_TILT)
    }

    pub fn to_mesh(&self) -> Mesh {
        point_mesh(
            &self.points,
            self.colors.iter().map(|c| LinearRgba::from(*c).to_f32_array()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;

    #[test]
    fn test_kind_from_label() {
        assert_eq!(GalaxyKind::from_type_label("Barred Spiral"), GalaxyKind::Spiral);
        assert_eq!(GalaxyKind::from_type_label("SPIRAL"), GalaxyKind::Spiral);
        assert_eq!(GalaxyKind::from_type_label("Elliptical"), GalaxyKind::Irregular);
        assert_eq!(GalaxyKind::from_type_label(""), GalaxyKind::Irregular);
    }

    #[test]
    fn test_spiral_shape() {
        let mut rng = SeededRandom::from_state(3);
        let galaxy = GalaxyCloud::generate(GalaxyKind::Spiral, &mut rng);
        assert_eq!(galaxy.len(), 20_000);
        assert_eq!(galaxy.colors.len(), 20_000);
        for p in &galaxy.points {
            // Scatter is at most randomness * r per axis and y is halved.
            assert!(p.y.abs() <= 0.1 * 10.0 + 1e-4);
            assert!(Vec2::new(p.x, p.z).length() <= 10.0 * (1.0 + 0.2 * 2f32.sqrt()) + 1e-3);
        }
    }

    #[test]
    fn test_irregular_shape() {
        let mut rng = SeededRandom::from_state(3);
        let galaxy = GalaxyCloud::generate(GalaxyKind::Irregular, &mut rng);
        assert_eq!(galaxy.len(), 8_000);
        for p in &galaxy.points {
            assert!(p.y.abs() <= 12.0 * 0.6 + 1e-4);
        }
        let white = color_from_hex(0xFFFFFF);
        assert!(galaxy.colors.iter().any(|c| *c == white));
    }

    #[test]
    fn test_rotation_advances_and_wraps() {
        let mut galaxy = GalaxyCloud::irregular(4, &mut SeededRandom::from_state(1));
        galaxy.tick(1.0);
        assert!((galaxy.rotation - 0.001).abs() < 1e-7);
        galaxy.rotation = TAU - 0.0005;
        galaxy.tick(1.0);
        assert!(galaxy.rotation < 0.001);
    }

    #[test]
    fn test_mesh_vertex_count() {
        let galaxy = GalaxyCloud::irregular(16, &mut SeededRandom::from_state(1));
        assert_eq!(galaxy.to_mesh().count_vertices(), 16);
    }
}
