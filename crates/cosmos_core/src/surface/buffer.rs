//! RGBA surface buffer shared by the painters and the map builder.

use std::path::Path;

use bevy::asset::RenderAssetUsages;
use bevy::image::{Image, ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::error::{CosmosError, CosmosResult};

/// How the bytes of a buffer should be interpreted on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureEncoding {
    /// Color data, stored in sRGB.
    Srgb,
    /// Data maps (normal, roughness), stored linear.
    Linear,
}

/// RGBA8 pixel grid.
///
/// Stores pixels in row-major order with 4 bytes per pixel (RGBA, straight
/// alpha).
#[derive(Clone, PartialEq, Eq)]
pub struct SurfaceBuffer {
    /// Raw RGBA pixel data.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl std::fmt::Debug for SurfaceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl SurfaceBuffer {
    /// Create a new buffer filled with transparent black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height * 4],
            width,
            height,
        }
    }

    /// Create a square buffer filled with transparent black.
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Create a buffer filled with a solid color.
    pub fn with_color(width: usize, height: usize, color: [u8; 4]) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.fill(color);
        buffer
    }

    /// Set a pixel at (x, y) to the given RGBA color.
    ///
    /// Does nothing if coordinates are out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: [u8; 4]) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.data[idx..idx + 4].copy_from_slice(&color);
        }
    }

    /// Get the RGBA color at (x, y).
    ///
    /// Returns transparent black if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> [u8; 4] {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            [
                self.data[idx],
                self.data[idx + 1],
                self.data[idx + 2],
                self.data[idx + 3],
            ]
        } else {
            [0, 0, 0, 0]
        }
    }

    /// Get the pixel at signed coordinates, wrapping on both axes.
    #[inline]
    pub fn get_wrapped(&self, x: isize, y: isize) -> [u8; 4] {
        let x = x.rem_euclid(self.width as isize) as usize;
        let y = y.rem_euclid(self.height as isize) as usize;
        self.get_pixel(x, y)
    }

    /// Rec. 601 luminance of a pixel in [0, 1].
    #[inline]
    pub fn luminance_wrapped(&self, x: isize, y: isize) -> f32 {
        let [r, g, b, _] = self.get_wrapped(x, y);
        (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
    }

    /// Blend a pixel with alpha compositing (source over destination).
    ///
    /// Uses standard Porter-Duff "source over" compositing.
    #[inline]
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }

        let src_a = color[3] as f32 / 255.0;
        if src_a == 0.0 {
            return;
        }
        if src_a == 1.0 {
            self.set_pixel(x, y, color);
            return;
        }

        let dst = self.get_pixel(x, y);
        let dst_a = dst[3] as f32 / 255.0;

        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a == 0.0 {
            self.set_pixel(x, y, [0, 0, 0, 0]);
            return;
        }

        let blend = |s: u8, d: u8| -> u8 {
            let s = s as f32 / 255.0;
            let d = d as f32 / 255.0;
            let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
            (out * 255.0).round().clamp(0.0, 255.0) as u8
        };

        self.set_pixel(
            x,
            y,
            [
                blend(color[0], dst[0]),
                blend(color[1], dst[1]),
                blend(color[2], dst[2]),
                (out_a * 255.0).round() as u8,
            ],
        );
    }

    /// Fill entire buffer with a color.
    pub fn fill(&mut self, color: [u8; 4]) {
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Release the pixel storage.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.width = 0;
        self.height = 0;
    }

    /// Number of bytes held by the buffer.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    fn check_upload(&self) -> CosmosResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CosmosError::Resource(format!(
                "cannot upload empty {}x{} surface",
                self.width, self.height
            )));
        }
        if self.data.len() != self.width * self.height * 4 {
            return Err(CosmosError::Resource(format!(
                "surface data is {} bytes, expected {} for {}x{}",
                self.data.len(),
                self.width * self.height * 4,
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Convert into a Bevy image with repeat addressing on both axes.
    pub fn to_image(&self, encoding: TextureEncoding) -> CosmosResult<Image> {
        self.check_upload()?;

        let size = Extent3d {
            width: self.width as u32,
            height: self.height as u32,
            depth_or_array_layers: 1,
        };
        let format = match encoding {
            TextureEncoding::Srgb => TextureFormat::Rgba8UnormSrgb,
            TextureEncoding::Linear => TextureFormat::Rgba8Unorm,
        };

        let mut image = Image::new(
            size,
            TextureDimension::D2,
            self.data.clone(),
            format,
            RenderAssetUsages::default(),
        );
        image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            address_mode_u: ImageAddressMode::Repeat,
            address_mode_v: ImageAddressMode::Repeat,
            ..ImageSamplerDescriptor::linear()
        });
        Ok(image)
    }

    /// Write the buffer as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> CosmosResult<()> {
        self.check_upload()?;
        let image = image::RgbaImage::from_raw(
            self.width as u32,
            self.height as u32,
            self.data.clone(),
        )
        .ok_or_else(|| CosmosError::Resource("surface dimensions do not match data".into()))?;
        image.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buf = SurfaceBuffer::new(4, 4);
        assert_eq!(buf.width, 4);
        assert_eq!(buf.height, 4);
        assert_eq!(buf.data.len(), 64);
        assert_eq!(buf.get_pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_set_get_pixel() {
        let mut buf = SurfaceBuffer::square(4);
        buf.set_pixel(1, 2, [255, 128, 64, 255]);
        assert_eq!(buf.get_pixel(1, 2), [255, 128, 64, 255]);
        assert_eq!(buf.get_pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buf = SurfaceBuffer::square(4);
        buf.set_pixel(10, 10, [255, 0, 0, 255]);
        assert_eq!(buf.get_pixel(10, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn test_wrapped_access() {
        let mut buf = SurfaceBuffer::square(4);
        buf.set_pixel(3, 0, [9, 9, 9, 255]);
        buf.set_pixel(0, 3, [7, 7, 7, 255]);
        assert_eq!(buf.get_wrapped(-1, 0), [9, 9, 9, 255]);
        assert_eq!(buf.get_wrapped(0, -1), [7, 7, 7, 255]);
        assert_eq!(buf.get_wrapped(4, 4), buf.get_pixel(0, 0));
    }

    #[test]
    fn test_blend_opaque() {
        let mut buf = SurfaceBuffer::square(2);
        buf.set_pixel(0, 0, [100, 100, 100, 255]);
        buf.blend_pixel(0, 0, [200, 200, 200, 255]);
        assert_eq!(buf.get_pixel(0, 0), [200, 200, 200, 255]);
    }

    #[test]
    fn test_blend_transparent() {
        let mut buf = SurfaceBuffer::square(2);
        buf.set_pixel(0, 0, [100, 100, 100, 255]);
        buf.blend_pixel(0, 0, [200, 200, 200, 0]);
        assert_eq!(buf.get_pixel(0, 0), [100, 100, 100, 255]);
    }

    #[test]
    fn test_blend_semi_transparent() {
        let mut buf = SurfaceBuffer::square(2);
        buf.set_pixel(0, 0, [0, 0, 0, 255]);
        buf.blend_pixel(0, 0, [255, 255, 255, 128]);
        let result = buf.get_pixel(0, 0);
        assert!(result[0] > 100 && result[0] < 150);
        assert_eq!(result[3], 255);
    }

    #[test]
    fn test_blend_onto_transparent_keeps_source_color() {
        let mut buf = SurfaceBuffer::with_color(2, 2, [255, 255, 255, 0]);
        buf.blend_pixel(1, 1, [255, 255, 255, 64]);
        assert_eq!(buf.get_pixel(1, 1), [255, 255, 255, 64]);
    }

    #[test]
    fn test_luminance_of_white_and_black() {
        let mut buf = SurfaceBuffer::square(2);
        buf.fill([255, 255, 255, 255]);
        assert!((buf.luminance_wrapped(0, 0) - 1.0).abs() < 1e-4);
        buf.fill([0, 0, 0, 255]);
        assert_eq!(buf.luminance_wrapped(1, 1), 0.0);
    }

    #[test]
    fn test_to_image_formats() {
        let buf = SurfaceBuffer::with_color(8, 8, [10, 20, 30, 255]);
        let color = buf.to_image(TextureEncoding::Srgb).unwrap();
        assert_eq!(color.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
        assert_eq!(color.width(), 8);

        let data = buf.to_image(TextureEncoding::Linear).unwrap();
        assert_eq!(data.texture_descriptor.format, TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_released_buffer_cannot_upload() {
        let mut buf = SurfaceBuffer::square(4);
        buf.release();
        assert_eq!(buf.byte_len(), 0);
        assert!(matches!(
            buf.to_image(TextureEncoding::Srgb),
            Err(CosmosError::Resource(_))
        ));
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.png");
        let mut buf = SurfaceBuffer::square(4);
        buf.set_pixel(2, 1, [1, 2, 3, 255]);
        buf.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }
}
