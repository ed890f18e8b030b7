//! Star photospheres: a flat base with dark speckles.

use bevy::color::Srgba;

use super::buffer::SurfaceBuffer;
use super::PaintedSurface;
use crate::palette::to_rgba8;
use crate::rng::SurfaceRng;

/// Star speckles are authored for a 256 pixel wide texture.
const STAR_REFERENCE_SIZE: f32 = 256.0;
const SPECKLES: usize = 50;
const GRAIN: f32 = 4.0;

pub(super) fn paint(base: Srgba, size: usize, rng: &mut dyn SurfaceRng) -> PaintedSurface {
    let scale = size as f32 / STAR_REFERENCE_SIZE;
    let extent = size as f32;

    let mut color = SurfaceBuffer::with_color(size, size, to_rgba8(base, 1.0));
    for _ in 0..SPECKLES {
        let x = rng.next_f32() * extent;
        let y = rng.next_f32() * extent;
        let radius = rng.next_f32() * 5.0 * scale;
        color.fill_circle(x, y, radius, [0, 0, 0, 51]);
    }
    color.add_grain(GRAIN, rng);

    PaintedSurface {
        color,
        roughness: SurfaceBuffer::with_color(size, size, [255, 255, 255, 255]),
        clouds: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::color_from_hex;
    use crate::rng::SeededRandom;

    #[test]
    fn test_star_stays_close_to_base_color() {
        let mut rng = SeededRandom::from_state(8);
        let surface = paint(color_from_hex(0xFFAA00), 64, &mut rng);

        let mut red_total = 0u64;
        for pixel in surface.color.data.chunks_exact(4) {
            red_total += pixel[0] as u64;
            assert_eq!(pixel[3], 255);
        }
        let mean_red = red_total as f64 / (64.0 * 64.0);
        assert!(mean_red > 200.0, "mean red {} should stay near 255", mean_red);
        assert!(surface.clouds.is_none());
    }
}
