//! Normal map derivation and per-body material bundles.

use bevy::prelude::*;

use crate::descriptor::SurfaceClass;
use crate::error::CosmosResult;
use crate::rng::SurfaceRng;
use crate::surface::{paint_surface, PaintedSurface, SurfaceBuffer, TextureEncoding};

/// Build a tangent-space normal map from the luminance of `color`.
///
/// Gradients use the left/right and up/down neighbours with wraparound
/// addressing, so the map tiles in both directions. A surface that gets
/// brighter to the right tilts x positive; brighter downward tilts y positive.
pub fn build_normal_map(color: &SurfaceBuffer, strength: f32) -> SurfaceBuffer {
    let (w, h) = (color.width, color.height);
    let mut normal = SurfaceBuffer::new(w, h);

    for y in 0..h {
        for x in 0..w {
            let (xi, yi) = (x as isize, y as isize);
            let left = color.luminance_wrapped(xi - 1, yi);
            let right = color.luminance_wrapped(xi + 1, yi);
            let up = color.luminance_wrapped(xi, yi - 1);
            let down = color.luminance_wrapped(xi, yi + 1);

            let n = Vec3::new((right - left) * strength, (down - up) * strength, 1.0).normalize();
            normal.set_pixel(x, y, [encode_signed(n.x), encode_signed(n.y), encode_unit(n.z), 255]);
        }
    }

    normal
}

#[inline]
fn encode_signed(c: f32) -> u8 {
    ((c * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn encode_unit(c: f32) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Fixed PBR scalars for a surface class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialScalars {
    pub roughness: f32,
    pub metalness: f32,
    /// Rendered unlit at full brightness.
    pub emissive: bool,
}

impl MaterialScalars {
    pub fn for_class(class: SurfaceClass) -> Self {
        match class {
            SurfaceClass::Rocky => Self {
                roughness: 0.9,
                metalness: 0.02,
                emissive: false,
            },
            SurfaceClass::GasGiant => Self {
                roughness: 0.45,
                metalness: 0.05,
                emissive: false,
            },
            SurfaceClass::Star => Self {
                roughness: 1.0,
                metalness: 0.0,
                emissive: true,
            },
        }
    }
}

/// Everything needed to shade one body.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAsset {
    pub class: SurfaceClass,
    pub color: SurfaceBuffer,
    pub roughness: SurfaceBuffer,
    pub normal: SurfaceBuffer,
    pub clouds: Option<SurfaceBuffer>,
    pub scalars: MaterialScalars,
}

impl MaterialAsset {
    /// Bundle a painted surface with its normal map and class scalars.
    pub fn from_painted(class: SurfaceClass, painted: PaintedSurface) -> Self {
        let normal = build_normal_map(&painted.color, class.normal_strength());
        Self {
            class,
            color: painted.color,
            roughness: painted.roughness,
            normal,
            clouds: painted.clouds,
            scalars: MaterialScalars::for_class(class),
        }
    }

    pub fn has_clouds(&self) -> bool {
        self.clouds.is_some()
    }

    /// Total bytes held by all maps.
    pub fn byte_len(&self) -> usize {
        self.color.byte_len()
            + self.roughness.byte_len()
            + self.normal.byte_len()
            + self.clouds.as_ref().map_or(0, SurfaceBuffer::byte_len)
    }

    /// Drop all pixel storage. Returns the number of bytes released.
    pub fn release(&mut self) -> usize {
        let bytes = self.byte_len();
        self.color.release();
        self.roughness.release();
        self.normal.release();
        self.clouds = None;
        bytes
    }

    /// Upload color, normal and roughness into Bevy images.
    pub fn to_images(&self) -> CosmosResult<MaterialImages> {
        Ok(MaterialImages {
            color: self.color.to_image(TextureEncoding::Srgb)?,
            normal: self.normal.to_image(TextureEncoding::Linear)?,
            roughness: self.roughness.to_image(TextureEncoding::Linear)?,
            clouds: self
                .clouds
                .as_ref()
                .map(|c| c.to_image(TextureEncoding::Srgb))
                .transpose()?,
        })
    }
}

/// GPU-ready images for a [`MaterialAsset`].
pub struct MaterialImages {
    pub color: Image,
    pub normal: Image,
    pub roughness: Image,
    pub clouds: Option<Image>,
}

/// Paint a surface and derive its maps.
pub fn build_material_asset(
    class: SurfaceClass,
    base_color: u32,
    size: usize,
    rng: &mut dyn SurfaceRng,
) -> MaterialAsset {
    let painted = paint_surface(class, base_color, size, rng);
    MaterialAsset::from_painted(class, painted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;

    #[test]
    fn test_flat_input_gives_straight_up_normals() {
        let flat = SurfaceBuffer::with_color(8, 8, [90, 140, 30, 255]);
        let normal = build_normal_map(&flat, 2.5);
        for pixel in normal.data.chunks_exact(4) {
            assert_eq!(pixel, [128, 128, 255, 255]);
        }
    }

    #[test]
    fn test_gradient_tilts_normals_and_wraps() {
        let mut buf = SurfaceBuffer::with_color(4, 4, [0, 0, 0, 255]);
        for y in 0..4 {
            buf.set_pixel(3, y, [255, 255, 255, 255]);
        }
        let normal = build_normal_map(&buf, 1.0);
        // Column 0 sees the bright column 3 on its left through the seam.
        assert!(normal.get_pixel(0, 1)[0] < 128);
        // Column 2 sees it on its right.
        assert!(normal.get_pixel(2, 1)[0] > 128);
        assert_eq!(normal.get_pixel(1, 1)[0], 128);
    }

    #[test]
    fn test_left_to_right_ramp_tilts_x_positive() {
        let mut buf = SurfaceBuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                let v = (x * 30) as u8;
                buf.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        let normal = build_normal_map(&buf, 1.0);
        // Interior columns only; the ramp wraps from bright back to dark.
        for x in 1..7 {
            let pixel = normal.get_pixel(x, 4);
            assert!(pixel[0] > 128, "column {} x = {}", x, pixel[0]);
            assert_eq!(pixel[1], 128);
        }
    }

    #[test]
    fn test_top_to_bottom_ramp_tilts_y_positive() {
        let mut buf = SurfaceBuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                let v = (y * 30) as u8;
                buf.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        let normal = build_normal_map(&buf, 1.0);
        for y in 1..7 {
            let pixel = normal.get_pixel(4, y);
            assert!(pixel[1] > 128, "row {} y = {}", y, pixel[1]);
            assert_eq!(pixel[0], 128);
        }
    }

    #[test]
    fn test_scalars_per_class() {
        let star = MaterialScalars::for_class(SurfaceClass::Star);
        assert!(star.emissive);
        assert_eq!(star.roughness, 1.0);
        let rocky = MaterialScalars::for_class(SurfaceClass::Rocky);
        assert_eq!((rocky.roughness, rocky.metalness), (0.9, 0.02));
        let gas = MaterialScalars::for_class(SurfaceClass::GasGiant);
        assert_eq!((gas.roughness, gas.metalness), (0.45, 0.05));
    }

    #[test]
    fn test_release_frees_all_maps() {
        let mut rng = SeededRandom::from_state(4);
        let mut asset = build_material_asset(SurfaceClass::GasGiant, 0xCC9966, 16, &mut rng);
        assert_eq!(asset.byte_len(), 16 * 16 * 4 * 3);
        assert_eq!(asset.release(), 16 * 16 * 4 * 3);
        assert_eq!(asset.byte_len(), 0);
        assert!(asset.to_images().is_err(), "released maps cannot be uploaded");
    }

    #[test]
    fn test_images_use_expected_encodings() {
        let mut rng = SeededRandom::from_state(4);
        let asset = build_material_asset(SurfaceClass::Star, 0xFFAA00, 8, &mut rng);
        let images = asset.to_images().unwrap();
        assert_eq!(
            images.color.texture_descriptor.format,
            bevy::render::render_resource::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            images.normal.texture_descriptor.format,
            bevy::render::render_resource::TextureFormat::Rgba8Unorm
        );
        assert!(images.clouds.is_none());
    }
}
