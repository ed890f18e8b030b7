//! Procedural surface painting.
//!
//! `paint_surface` selects a painter by [`SurfaceClass`] and rasterizes a
//! square color buffer, a companion roughness buffer and, for some rocky
//! worlds, a translucent cloud layer. All randomness comes from the supplied
//! stream, so two fresh streams with the same seed paint identical bytes.
//!
//! Feature sizes are authored against a 2048 pixel buffer and scaled to the
//! requested resolution; feature counts do not depend on resolution.

pub mod buffer;
pub mod draw;
mod gas_giant;
mod rocky;
mod star;

pub use buffer::{SurfaceBuffer, TextureEncoding};
pub use draw::GradientStop;

use crate::descriptor::SurfaceClass;
use crate::palette::color_from_hex;
use crate::rng::SurfaceRng;

/// Resolution the painters' pixel constants were authored at.
pub const REFERENCE_SIZE: f32 = 2048.0;

/// Output of one painter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintedSurface {
    pub color: SurfaceBuffer,
    /// Grayscale, lighter is rougher.
    pub roughness: SurfaceBuffer,
    /// Translucent white cloud layer at half resolution.
    pub clouds: Option<SurfaceBuffer>,
}

/// Paint a body surface of `size`×`size` pixels.
pub fn paint_surface(
    class: SurfaceClass,
    base_color: u32,
    size: usize,
    rng: &mut dyn SurfaceRng,
) -> PaintedSurface {
    let base = color_from_hex(base_color);
    match class {
        SurfaceClass::GasGiant => gas_giant::paint(base, size, rng),
        SurfaceClass::Rocky => rocky::paint(base, size, rng),
        SurfaceClass::Star => star::paint(base, size, rng),
    }
}
