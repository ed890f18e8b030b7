//! Background starfield: points scattered uniformly in a cube around the
//! origin, drawn as a point list mesh.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;

use crate::palette::color_from_hex;
use crate::rng::SurfaceRng;

/// Point cloud plus the look of its points.
#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    pub points: Vec<Vec3>,
    /// 24-bit RGB shared by every point.
    pub color: u32,
    pub opacity: f32,
    pub point_size: f32,
}

impl Starfield {
    /// `count` white points uniform in a cube of side `extent`.
    pub fn generate(count: usize, extent: f32, rng: &mut dyn SurfaceRng) -> Self {
        let points = (0..count)
            .map(|_| {
                let x = rng.next_signed(extent * 0.5);
                let y = rng.next_signed(extent * 0.5);
                let z = rng.next_signed(extent * 0.5);
                Vec3::new(x, y, z)
            })
            .collect();
        Self {
            points,
            color: 0xFFFFFF,
            opacity: 0.85,
            point_size: 0.5,
        }
    }

    /// Dim gray backdrop used behind galaxy clouds.
    pub fn dim(count: usize, extent: f32, rng: &mut dyn SurfaceRng) -> Self {
        Self {
            color: 0x444444,
            opacity: 0.5,
            ..Self::generate(count, extent, rng)
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop the point storage.
    pub fn release(&mut self) -> usize {
        let count = self.points.len();
        self.points = Vec::new();
        count
    }

    /// Point list mesh with a per-vertex color carrying the opacity.
    pub fn to_mesh(&self) -> Mesh {
        let rgba = LinearRgba::from(color_from_hex(self.color).with_alpha(self.opacity)).to_f32_array();
        point_mesh(&self.points, std::iter::repeat(rgba))
    }
}

/// Build a point list mesh from positions and per-point linear colors.
pub(crate) fn point_mesh<I>(points: &[Vec3], colors: I) -> Mesh
where
    I: IntoIterator<Item = [f32; 4]>,
{
    let positions: Vec<[f32; 3]> = points.iter().map(|p| p.to_array()).collect();
    let colors: Vec<[f32; 4]> = colors.into_iter().take(points.len()).collect();
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;

    #[test]
    fn test_points_stay_inside_cube() {
        let mut rng = SeededRandom::from_state(99);
        let field = Starfield::generate(1500, 400.0, &mut rng);
        assert_eq!(field.len(), 1500);
        for p in &field.points {
            assert!(p.abs().max_element() <= 200.0, "{:?} outside cube", p);
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = Starfield::generate(50, 10.0, &mut SeededRandom::from_state(5));
        let b = Starfield::generate(50, 10.0, &mut SeededRandom::from_state(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_dim_variant() {
        let field = Starfield::dim(10, 10.0, &mut SeededRandom::from_state(1));
        assert_eq!(field.color, 0x444444);
        assert_eq!(field.opacity, 0.5);
    }

    #[test]
    fn test_mesh_has_one_vertex_per_point() {
        let field = Starfield::generate(32, 10.0, &mut SeededRandom::from_state(2));
        let mesh = field.to_mesh();
        assert_eq!(mesh.count_vertices(), 32);
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::PointList);
    }

    #[test]
    fn test_release() {
        let mut field = Starfield::generate(8, 10.0, &mut SeededRandom::from_state(2));
        assert_eq!(field.release(), 8);
        assert!(field.is_empty());
    }
}
