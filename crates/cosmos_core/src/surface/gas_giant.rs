//! Banded gas giant surfaces.

use std::f32::consts::{PI, TAU};

use bevy::color::Srgba;

use super::buffer::SurfaceBuffer;
use super::draw::GradientStop;
use super::{PaintedSurface, REFERENCE_SIZE};
use crate::palette::{derive_palette, jitter_hsl, offset_hsl, pick};
use crate::rng::SurfaceRng;

/// Grain amplitude on the 0..=255 channel scale.
const GRAIN: f32 = 9.0;

/// Gloss streaks painted into the roughness map.
const ROUGHNESS_STREAKS: usize = 400;

/// Sinusoid with a whole number of cycles across the buffer so the ribbon
/// edge meets itself at the U seam.
fn seamless_frequency(reference_freq: f32, size: usize) -> (f32, f32) {
    let cycles = (reference_freq * REFERENCE_SIZE / TAU).round().max(1.0);
    (cycles, cycles * TAU / size.max(1) as f32)
}

pub(super) fn paint(base: Srgba, size: usize, rng: &mut dyn SurfaceRng) -> PaintedSurface {
    let scale = size as f32 / REFERENCE_SIZE;
    let extent = size as f32;
    let palette = derive_palette(base, rng);

    let mut color = SurfaceBuffer::square(size);
    let top = offset_hsl(palette[0], rng.next_signed(0.01), 0.02, -0.02);
    let bottom_base = pick(&palette, rng);
    let bottom = offset_hsl(bottom_base, rng.next_signed(0.025), 0.0, 0.05);
    color.fill_vertical_gradient(top, bottom);

    let band_count = rng.next_count(8, 14);
    let band_step = extent / band_count as f32;
    for i in 0..band_count {
        let band = i as f32;
        let y = band * band_step;
        let height = band_step * rng.next_range(0.5, 2.3);

        let col_a = pick(&palette, rng);
        let col_b = pick(&palette, rng);
        let top_color = jitter_hsl(col_a, rng, 0.03, 0.05, 0.03);
        let bottom_color = jitter_hsl(col_b, rng, 0.03, 0.05, 0.03);

        let amplitude = rng.next_range(8.0, 36.0) * scale;
        let (cycles, freq) = seamless_frequency(rng.next_range(0.002, 0.012), size);
        let phase = rng.next_range(0.0, 2.0);
        let envelope = (band * 0.15).sin();

        let edge: Vec<f32> = (0..size)
            .map(|x| y + (x as f32 * freq + band * 0.4 + phase).sin() * amplitude * envelope)
            .collect();
        color.fill_ribbon(&edge, y + height, top_color, bottom_color, y, y + height);

        let streak_alpha = rng.next_range(0.02, 0.08);
        let streak_offset = height * rng.next_range(0.1, 0.9);
        let streak_freq = (cycles * 1.5).round().max(1.0) * TAU / extent.max(1.0);
        let stride = ((8.0 * scale).round() as usize).max(1);
        let mut points: Vec<(f32, f32)> = (0..=size)
            .step_by(stride)
            .map(|x| {
                let x = x as f32;
                (x, y + streak_offset + (x * streak_freq + band).sin() * amplitude * 0.25)
            })
            .collect();
        if let Some(&(last_x, _)) = points.last() {
            if last_x < extent {
                points.push((extent, y + streak_offset + band.sin() * amplitude * 0.25));
            }
        }
        color.stroke_polyline(&points, [255, 255, 255, (streak_alpha * 255.0).round() as u8]);
    }

    let storm_count = rng.next_count(1, 5);
    let mut storms = Vec::with_capacity(storm_count);
    for _ in 0..storm_count {
        let x = rng.next_f32() * extent;
        let y = rng.next_f32() * extent;
        let rx = rng.next_range(40.0, 260.0) * scale;
        let ry = rng.next_range(20.0, 120.0) * scale;
        let light = rng.next_range(0.12, 0.34);
        let dark = rng.next_range(0.06, 0.18);
        let rotation = rng.next_f32() * PI;
        let stops = [
            GradientStop::new(0.0, [255, 255, 255], light),
            GradientStop::new(0.6, [0, 0, 0], dark),
            GradientStop::new(1.0, [0, 0, 0], 0.0),
        ];
        color.fill_ellipse_radial(x, y, rx, ry, rotation, &stops);
        storms.push((x, y));
    }

    color.add_grain(GRAIN, rng);

    let mut roughness = SurfaceBuffer::with_color(size, size, [0xB0, 0xB0, 0xB0, 255]);
    for _ in 0..ROUGHNESS_STREAKS {
        let y = (rng.next_f32() * extent) as usize;
        let gray = rng.next_range(80.0, 200.0) as u8;
        let alpha = rng.next_range(0.03, 0.10);
        roughness.fill_row_fade(y, gray, gray.saturating_add(10), alpha, 0.0);
    }
    for (x, y) in storms {
        let radius = rng.next_range(40.0, 220.0) * scale;
        roughness.fill_circle(x, y, radius, [40, 40, 40, 77]);
    }

    PaintedSurface {
        color,
        roughness,
        clouds: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::color_from_hex;
    use crate::rng::{Seed, SeededRandom};

    #[test]
    fn test_seamless_frequency_has_whole_cycles() {
        let (cycles, freq) = seamless_frequency(0.006, 512);
        assert_eq!(cycles, 2.0);
        assert!((freq * 512.0 - 2.0 * TAU).abs() < 1e-3);

        let (cycles, _) = seamless_frequency(0.0001, 512);
        assert_eq!(cycles, 1.0, "at least one cycle");
    }

    #[test]
    fn test_band_frequencies_snap_to_few_cycles_and_close_the_seam() {
        for reference in [0.002, 0.004, 0.008, 0.012] {
            let (cycles, freq) = seamless_frequency(reference, 256);
            assert!((1.0..=4.0).contains(&cycles), "{} -> {}", reference, cycles);
            let edge = |x: f32| (x * freq + 0.7).sin();
            assert!((edge(0.0) - edge(256.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_gas_giant_is_opaque_and_has_no_clouds() {
        let mut rng = SeededRandom::from_seed(&Seed::from("Jove"));
        let surface = paint(color_from_hex(0xCC9966), 64, &mut rng);
        assert!(surface.clouds.is_none());
        assert_eq!(surface.color.width, 64);
        assert!(surface.color.data.chunks_exact(4).all(|p| p[3] == 255));
        assert!(surface.roughness.data.chunks_exact(4).all(|p| p[3] == 255));
    }
}
