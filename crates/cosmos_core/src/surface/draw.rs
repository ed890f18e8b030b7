//! Rasterization primitives used by the painters.
//!
//! Horizontal coordinates wrap around the buffer so features that cross the
//! U seam of a sphere continue on the other side. Vertical coordinates clip.

use bevy::color::Srgba;

use super::buffer::SurfaceBuffer;
use crate::rng::SurfaceRng;

/// A color stop for radial gradients. Channels are 0..=255, alpha is 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub rgb: [f32; 3],
    pub alpha: f32,
}

impl GradientStop {
    pub fn new(offset: f32, rgb: [u8; 3], alpha: f32) -> Self {
        Self {
            offset,
            rgb: [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32],
            alpha,
        }
    }
}

/// Sample a sorted stop list at `t`.
pub fn sample_stops(stops: &[GradientStop], t: f32) -> [u8; 4] {
    let Some(first) = stops.first() else {
        return [0, 0, 0, 0];
    };
    let mut lo = *first;
    let mut hi = *first;
    for stop in stops {
        if stop.offset <= t {
            lo = *stop;
            hi = *stop;
        } else {
            hi = *stop;
            break;
        }
    }
    let span = hi.offset - lo.offset;
    let k = if span > 0.0 {
        ((t - lo.offset) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mix = |a: f32, b: f32| a + (b - a) * k;
    [
        mix(lo.rgb[0], hi.rgb[0]).round().clamp(0.0, 255.0) as u8,
        mix(lo.rgb[1], hi.rgb[1]).round().clamp(0.0, 255.0) as u8,
        mix(lo.rgb[2], hi.rgb[2]).round().clamp(0.0, 255.0) as u8,
        (mix(lo.alpha, hi.alpha).clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

/// Linear interpolation between two colors, returned as opaque RGBA bytes.
pub fn lerp_rgba8(a: Srgba, b: Srgba, t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: f32, y: f32| ((x + (y - x) * t) * 255.0).round().clamp(0.0, 255.0) as u8;
    [
        mix(a.red, b.red),
        mix(a.green, b.green),
        mix(a.blue, b.blue),
        255,
    ]
}

fn scale_alpha(color: [u8; 4], coverage: f32) -> [u8; 4] {
    [
        color[0],
        color[1],
        color[2],
        (color[3] as f32 * coverage).round() as u8,
    ]
}

impl SurfaceBuffer {
    #[inline]
    fn wrap_x(&self, x: i64) -> usize {
        x.rem_euclid(self.width as i64) as usize
    }

    fn row_span(&self, cy: f32, extent: f32) -> (usize, usize) {
        let y0 = (cy - extent).floor().max(0.0) as usize;
        let y1 = ((cy + extent).ceil().max(0.0) as usize).min(self.height);
        (y0, y1)
    }

    /// Fill with a top-to-bottom gradient.
    pub fn fill_vertical_gradient(&mut self, top: Srgba, bottom: Srgba) {
        let denom = (self.height.max(2) - 1) as f32;
        for y in 0..self.height {
            let color = lerp_rgba8(top, bottom, y as f32 / denom);
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Blend a disc with a one-pixel soft edge.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        if radius <= 0.0 || self.width == 0 {
            return;
        }
        let (y0, y1) = self.row_span(cy, radius + 1.0);
        let x0 = (cx - radius - 1.0).floor() as i64;
        let x1 = (cx + radius + 1.0).ceil() as i64;
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            for xi in x0..x1 {
                let dx = xi as f32 + 0.5 - cx;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let x = self.wrap_x(xi);
                    self.blend_pixel(x, y, scale_alpha(color, coverage));
                }
            }
        }
    }

    /// Blend a rotated ellipse whose color depends on the normalized
    /// elliptical radius `t` (0 at the center, 1 at the rim).
    pub fn fill_ellipse_with<F>(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        rotation: f32,
        mut shade: F,
    ) where
        F: FnMut(f32) -> [u8; 4],
    {
        if rx <= 0.0 || ry <= 0.0 || self.width == 0 {
            return;
        }
        let extent = rx.max(ry);
        let (sin, cos) = rotation.sin_cos();
        let (y0, y1) = self.row_span(cy, extent);
        let x0 = (cx - extent).floor() as i64;
        let x1 = (cx + extent).ceil() as i64;
        for y in y0..y1 {
            let dy = y as f32 + 0.5 - cy;
            for xi in x0..x1 {
                let dx = xi as f32 + 0.5 - cx;
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                let d = (u / rx) * (u / rx) + (v / ry) * (v / ry);
                if d <= 1.0 {
                    let x = self.wrap_x(xi);
                    self.blend_pixel(x, y, shade(d.sqrt()));
                }
            }
        }
    }

    /// Blend a solid rotated ellipse.
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32, color: [u8; 4]) {
        self.fill_ellipse_with(cx, cy, rx, ry, rotation, |_| color);
    }

    /// Blend a rotated ellipse shaded by a radial gradient.
    pub fn fill_ellipse_radial(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        rotation: f32,
        stops: &[GradientStop],
    ) {
        self.fill_ellipse_with(cx, cy, rx, ry, rotation, |t| sample_stops(stops, t));
    }

    /// Fill a ribbon whose top edge is `top_edge[x]` (one entry per column)
    /// down to `bottom`. The fill is a vertical gradient running from
    /// `gradient_top` to `gradient_bottom`.
    pub fn fill_ribbon(
        &mut self,
        top_edge: &[f32],
        bottom: f32,
        top_color: Srgba,
        bottom_color: Srgba,
        gradient_top: f32,
        gradient_bottom: f32,
    ) {
        let span = (gradient_bottom - gradient_top).max(f32::EPSILON);
        let bottom_row = (bottom.ceil().max(0.0) as usize).min(self.height);
        for (x, &edge) in top_edge.iter().enumerate().take(self.width) {
            let start = edge.round().max(0.0) as usize;
            for y in start..bottom_row {
                let t = (y as f32 - gradient_top) / span;
                self.set_pixel(x, y, lerp_rgba8(top_color, bottom_color, t));
            }
        }
    }

    /// Blend a one-pixel line through the given points.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], color: [u8; 4]) {
        if self.width == 0 {
            return;
        }
        for pair in points.windows(2) {
            let (ax, ay) = pair[0];
            let (bx, by) = pair[1];
            let steps = (bx - ax).abs().max((by - ay).abs()).ceil().max(1.0) as usize;
            for step in 0..steps {
                let t = step as f32 / steps as f32;
                let x = (ax + (bx - ax) * t).round() as i64;
                let y = (ay + (by - ay) * t).round();
                if y >= 0.0 && (y as usize) < self.height {
                    let x = self.wrap_x(x);
                    self.blend_pixel(x, y as usize, color);
                }
            }
        }
    }

    /// Blend a one-pixel row whose alpha fades from `alpha_left` to
    /// `alpha_right` across the width. Gray levels are blended likewise.
    pub fn fill_row_fade(&mut self, y: usize, gray_left: u8, gray_right: u8, alpha_left: f32, alpha_right: f32) {
        if y >= self.height {
            return;
        }
        let denom = (self.width.max(2) - 1) as f32;
        for x in 0..self.width {
            let t = x as f32 / denom;
            let gray = (gray_left as f32 + (gray_right as f32 - gray_left as f32) * t).round() as u8;
            let alpha = alpha_left + (alpha_right - alpha_left) * t;
            self.blend_pixel(x, y, [gray, gray, gray, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8]);
        }
    }

    /// Blend full-width rows between `y_start` and `y_end` with alpha fading
    /// linearly from `alpha_start` (at `y_start`) to `alpha_end`. Works in
    /// either vertical direction.
    pub fn fill_vertical_fade(&mut self, y_start: f32, y_end: f32, rgb: [u8; 3], alpha_start: f32, alpha_end: f32) {
        let lo = y_start.min(y_end);
        let hi = y_start.max(y_end);
        let span = (y_end - y_start).abs().max(f32::EPSILON);
        let (r0, r1) = (lo.floor().max(0.0) as usize, (hi.ceil().max(0.0) as usize).min(self.height));
        for y in r0..r1 {
            let t = ((y as f32 + 0.5 - y_start).abs() / span).clamp(0.0, 1.0);
            let alpha = alpha_start + (alpha_end - alpha_start) * t;
            let color = [rgb[0], rgb[1], rgb[2], (alpha.clamp(0.0, 1.0) * 255.0).round() as u8];
            for x in 0..self.width {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Add the same random offset in `±amplitude` to the RGB channels of each
    /// pixel, clamped to 0..=255. Alpha is untouched.
    pub fn add_grain(&mut self, amplitude: f32, rng: &mut dyn SurfaceRng) {
        for pixel in self.data.chunks_exact_mut(4) {
            let noise = rng.next_signed(amplitude);
            for channel in &mut pixel[..3] {
                *channel = (*channel as f32 + noise).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Separable box blur over all four channels. Wraps horizontally and
    /// clamps vertically.
    pub fn box_blur(&mut self, radius: usize) {
        if radius == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let (w, h) = (self.width, self.height);
        let window = (2 * radius + 1) as u32;
        let mut scratch = vec![0u8; self.data.len()];

        for y in 0..h {
            for x in 0..w {
                let mut sum = [0u32; 4];
                for k in 0..window as i64 {
                    let sx = self.wrap_x(x as i64 + k - radius as i64);
                    let idx = (y * w + sx) * 4;
                    for c in 0..4 {
                        sum[c] += self.data[idx + c] as u32;
                    }
                }
                let out = (y * w + x) * 4;
                for c in 0..4 {
                    scratch[out + c] = ((sum[c] + window / 2) / window) as u8;
                }
            }
        }

        for y in 0..h {
            for x in 0..w {
                let mut sum = [0u32; 4];
                for k in 0..window as i64 {
                    let sy = (y as i64 + k - radius as i64).clamp(0, h as i64 - 1) as usize;
                    let idx = (sy * w + x) * 4;
                    for c in 0..4 {
                        sum[c] += scratch[idx + c] as u32;
                    }
                }
                let out = (y * w + x) * 4;
                for c in 0..4 {
                    self.data[out + c] = ((sum[c] + window / 2) / window) as u8;
                }
            }
        }
    }
}
