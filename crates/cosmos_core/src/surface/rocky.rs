//! Rocky planet surfaces: continents, craters, polar caps and an optional
//! cloud layer.

use std::f32::consts::PI;

use bevy::color::Srgba;

use super::buffer::SurfaceBuffer;
use super::{PaintedSurface, REFERENCE_SIZE};
use crate::palette::{derive_palette, jitter_hsl, offset_hsl, pick, to_rgba8};
use crate::rng::SurfaceRng;

const GRAIN: f32 = 5.0;
const CRATERS: usize = 120;
const ROUGHNESS_SPLATS: usize = 1200;
/// Caps are drawn when the draw exceeds this, so 40% of rocky bodies get them.
const POLAR_CAP_THRESHOLD: f64 = 0.6;

/// Cloud layers are painted at half resolution, authored for 1024.
const CLOUD_REFERENCE_SIZE: f32 = 1024.0;

pub(super) fn paint(base: Srgba, size: usize, rng: &mut dyn SurfaceRng) -> PaintedSurface {
    let scale = size as f32 / REFERENCE_SIZE;
    let extent = size as f32;
    let palette = derive_palette(base, rng);

    let mut color = SurfaceBuffer::square(size);
    let ground = jitter_hsl(palette[0], rng, 0.01, 0.025, 0.02);
    let highlands = offset_hsl(pick(&palette, rng), 0.02, -0.04, 0.06);
    color.fill_vertical_gradient(highlands, ground);

    // Continents
    let splats = rng.next_count(1200, 2000);
    for _ in 0..splats {
        let x = rng.next_f32() * extent;
        let y = rng.next_f32() * extent;
        let radius = rng.next_range(6.0, 120.0) * scale;
        let shade = rng.next_signed(0.06);
        let tint = pick(&palette, rng);
        let dh = rng.next_signed(0.05);
        let ds = rng.next_signed(0.1);
        let tint = offset_hsl(tint, dh, ds, shade);
        let alpha = rng.next_range(0.08, 0.30);
        color.fill_circle(x, y, radius, to_rgba8(tint, alpha));
    }

    // Craters: a dark bowl plus a highlight offset toward the light
    for _ in 0..CRATERS {
        let x = rng.next_f32() * extent;
        let y = rng.next_f32() * extent;
        let r = rng.next_range(6.0, 66.0) * scale;
        let depth = rng.next_range(0.05, 0.30);
        let bowl_rotation = rng.next_f32() * PI;
        color.fill_ellipse(x, y, r, r * 0.7, bowl_rotation, [0, 0, 0, alpha8(depth)]);

        let glint = rng.next_range(0.02, 0.10);
        let rim_rotation = rng.next_f32() * PI;
        color.fill_ellipse(
            x - r * 0.15,
            y - r * 0.15,
            r * 0.5,
            r * 0.35,
            rim_rotation,
            [255, 255, 255, alpha8(glint)],
        );
    }

    paint_polar_caps(&mut color, rng);
    color.add_grain(GRAIN, rng);

    let mut roughness = SurfaceBuffer::with_color(size, size, [0xC0, 0xC0, 0xC0, 255]);
    for _ in 0..ROUGHNESS_SPLATS {
        let x = rng.next_f32() * extent;
        let y = rng.next_f32() * extent;
        let radius = rng.next_range(4.0, 40.0) * scale;
        let gray = rng.next_range(120.0, 180.0) as u8;
        let alpha = rng.next_range(0.08, 0.26);
        roughness.fill_circle(x, y, radius, [gray, gray, gray, alpha8(alpha)]);
    }

    let clouds = if rng.chance_above(0.45) {
        Some(paint_clouds((size / 2).max(1), rng))
    } else {
        None
    };

    PaintedSurface {
        color,
        roughness,
        clouds,
    }
}

/// White fades from both poles. Returns whether caps were drawn.
fn paint_polar_caps(color: &mut SurfaceBuffer, rng: &mut dyn SurfaceRng) -> bool {
    if !rng.chance_above(POLAR_CAP_THRESHOLD) {
        return false;
    }
    let extent = color.height as f32;
    let cap = extent * rng.next_range(0.06, 0.24);
    color.fill_vertical_fade(0.0, cap, [255, 255, 255], 0.95, 0.0);
    color.fill_vertical_fade(extent, extent - cap, [255, 255, 255], 0.95, 0.0);
    true
}

/// Soft white patches over a transparent background, blurred.
fn paint_clouds(size: usize, rng: &mut dyn SurfaceRng) -> SurfaceBuffer {
    let scale = size as f32 / CLOUD_REFERENCE_SIZE;
    let extent = size as f32;
    // White with zero alpha so blending and blurring never darken edges.
    let mut clouds = SurfaceBuffer::with_color(size, size, [255, 255, 255, 0]);

    let patches = rng.next_count(220, 400);
    for _ in 0..patches {
        let x = rng.next_f32() * extent;
        let y = rng.next_f32() * extent;
        let radius = rng.next_range(10.0, 190.0) * scale;
        let alpha = rng.next_range(0.05, 0.40);
        clouds.fill_circle(x, y, radius, [255, 255, 255, alpha8(alpha)]);
    }

    clouds.box_blur(((6.0 * scale).round() as usize).max(1));
    clouds
}

fn alpha8(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}
