//! Palette derivation around a body's base color.
//!
//! Painters never use a single flat color: they pick from a small palette of
//! HSL-shifted variants so bodies look textured but keep one hue family.

use bevy::color::{ColorToPacked, Hsla, Srgba};

use crate::rng::SurfaceRng;

/// Maximum hue shift per variant, in turns.
pub const HUE_JITTER: f32 = 0.06;

/// Maximum saturation shift per variant.
pub const SATURATION_JITTER: f32 = 0.1;

/// Maximum lightness shift per variant.
pub const LIGHTNESS_JITTER: f32 = 0.09;

/// Number of variants added by [`derive_palette`].
pub const DEFAULT_VARIANTS: usize = 3;

/// Unpack a 24-bit RGB value.
pub fn color_from_hex(hex: u32) -> Srgba {
    Srgba::rgb_u8(
        ((hex >> 16) & 0xFF) as u8,
        ((hex >> 8) & 0xFF) as u8,
        (hex & 0xFF) as u8,
    )
}

/// Shift a color in HSL space. `dh` is in turns; saturation and lightness are
/// clamped to [0, 1] and hue wraps.
pub fn offset_hsl(color: Srgba, dh: f32, ds: f32, dl: f32) -> Srgba {
    let hsla = Hsla::from(color);
    let shifted = Hsla::new(
        (hsla.hue + dh * 360.0).rem_euclid(360.0),
        (hsla.saturation + ds).clamp(0.0, 1.0),
        (hsla.lightness + dl).clamp(0.0, 1.0),
        hsla.alpha,
    );
    Srgba::from(shifted)
}

/// Random HSL jitter within the given half-widths.
pub fn jitter_hsl(color: Srgba, rng: &mut dyn SurfaceRng, dh: f32, ds: f32, dl: f32) -> Srgba {
    let h = rng.next_signed(dh);
    let s = rng.next_signed(ds);
    let l = rng.next_signed(dl);
    offset_hsl(color, h, s, l)
}

/// Base color followed by three jittered variants.
pub fn derive_palette(base: Srgba, rng: &mut dyn SurfaceRng) -> Vec<Srgba> {
    derive_palette_with(base, DEFAULT_VARIANTS, rng)
}

/// Base color followed by `variants` jittered variants (clamped to 1..=3).
pub fn derive_palette_with(base: Srgba, variants: usize, rng: &mut dyn SurfaceRng) -> Vec<Srgba> {
    let variants = variants.clamp(1, DEFAULT_VARIANTS);
    let mut palette = Vec::with_capacity(variants + 1);
    palette.push(base);
    for _ in 0..variants {
        palette.push(jitter_hsl(
            base,
            rng,
            HUE_JITTER,
            SATURATION_JITTER,
            LIGHTNESS_JITTER,
        ));
    }
    palette
}

/// Pick a palette entry.
pub fn pick(palette: &[Srgba], rng: &mut dyn SurfaceRng) -> Srgba {
    palette[rng.next_index(palette.len())]
}

/// Convert to straight-alpha RGBA bytes with an explicit alpha.
pub fn to_rgba8(color: Srgba, alpha: f32) -> [u8; 4] {
    let [r, g, b, _] = color.to_u8_array();
    [r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8]
}
