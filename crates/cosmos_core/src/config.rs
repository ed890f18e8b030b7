//! Explorer configuration: quality tiers, view presets and the tunables the
//! composer, animator and viewport read.
//!
//! ## Usage
//!
//! ```ignore
//! let config = ExplorerConfig::for_view(ViewPreset::PlanetDetail)
//!     .with_speed_multiplier(2.0)
//!     .with_anchor_picking(true);
//! app.insert_resource(config);
//! ```

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::descriptor::SurfaceClass;
use crate::error::CosmosResult;

/// Texture resolution used when painting surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Many small bodies on screen.
    Overview,
    /// A single body filling the view.
    Detail,
}

impl QualityTier {
    /// Square buffer dimension in pixels.
    pub fn resolution(self) -> usize {
        match self {
            QualityTier::Overview => 256,
            QualityTier::Detail => 2048,
        }
    }
}

/// The three visualizations the explorer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPreset {
    /// Star at the center with orbiting planets.
    StarSystem,
    /// One planet filling the view.
    PlanetDetail,
    /// Galaxy point cloud.
    Galaxy,
}

impl ViewPreset {
    pub fn fov_degrees(self) -> f32 {
        match self {
            ViewPreset::PlanetDetail => 45.0,
            ViewPreset::StarSystem | ViewPreset::Galaxy => 60.0,
        }
    }

    /// Initial camera position. The camera always looks at the origin.
    pub fn eye(self) -> Vec3 {
        match self {
            ViewPreset::StarSystem => Vec3::new(0.0, 50.0, 90.0),
            ViewPreset::PlanetDetail => Vec3::new(0.0, 0.0, 22.0),
            ViewPreset::Galaxy => Vec3::new(0.0, 15.0, 25.0),
        }
    }

    /// (min, max) orbit camera distance.
    pub fn distance_bounds(self) -> (f32, f32) {
        match self {
            ViewPreset::StarSystem => (20.0, 300.0),
            ViewPreset::PlanetDetail => (12.0, 40.0),
            ViewPreset::Galaxy => (5.0, 60.0),
        }
    }

    pub fn tier(self) -> QualityTier {
        match self {
            ViewPreset::PlanetDetail => QualityTier::Detail,
            ViewPreset::StarSystem | ViewPreset::Galaxy => QualityTier::Overview,
        }
    }

    pub fn far_plane(self) -> f32 {
        match self {
            ViewPreset::Galaxy => 2000.0,
            ViewPreset::StarSystem | ViewPreset::PlanetDetail => 1000.0,
        }
    }

    /// Clear color as 24-bit RGB.
    pub fn background(self) -> u32 {
        match self {
            ViewPreset::StarSystem => 0x0A0F1E,
            ViewPreset::PlanetDetail => 0x050505,
            ViewPreset::Galaxy => 0x020207,
        }
    }

    /// Radians of axial spin per reference frame.
    ///
    /// In the system view only orbiting bodies spin, all at the same rate.
    /// In the detail view the rate depends on the surface class.
    pub fn spin_rate(self, class: SurfaceClass, is_anchor: bool) -> f32 {
        match self {
            ViewPreset::StarSystem | ViewPreset::Galaxy => {
                if is_anchor {
                    0.0
                } else {
                    0.01
                }
            }
            ViewPreset::PlanetDetail => match class {
                SurfaceClass::GasGiant => 0.0035,
                SurfaceClass::Rocky => 0.0009,
                SurfaceClass::Star => 0.0,
            },
        }
    }

    /// Spin rate of a cloud shell, which drifts independently in the detail
    /// view and rides with its body otherwise.
    pub fn cloud_spin_rate(self, body_rate: f32) -> f32 {
        match self {
            ViewPreset::PlanetDetail => 0.0015,
            ViewPreset::StarSystem | ViewPreset::Galaxy => body_rate,
        }
    }
}

/// Configuration for a composed scene and its viewport.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub view: ViewPreset,
    /// Texture resolution tier.
    pub tier: QualityTier,
    /// Multiplies every orbital angular speed.
    pub speed_multiplier: f32,
    /// Multiplies every axial spin rate.
    pub spin_multiplier: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Initial camera position.
    pub camera_eye: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    pub near: f32,
    pub far: f32,
    /// Gap between a body's surface and its label anchor.
    pub label_offset: f32,
    /// Whether the orbit anchor gets a screen label.
    pub include_anchor_in_labels: bool,
    /// Whether the orbit anchor can be hovered and clicked.
    pub include_anchor_in_picking: bool,
    pub starfield_count: usize,
    /// Side of the cube the starfield fills.
    pub starfield_extent: f32,
    /// Point light intensity in lumens for a star anchor.
    pub light_intensity: f32,
    pub light_range: f32,
    /// Directional illuminance in lux when the anchor is not a star.
    pub sun_illuminance: f32,
    pub ambient_brightness: f32,
    /// 24-bit RGB clear color.
    pub background: u32,
    /// Seed for the starfield. `None` scatters stars differently each run.
    pub starfield_seed: Option<u32>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::for_view(ViewPreset::StarSystem)
    }
}

impl ExplorerConfig {
    /// Defaults for one of the three views.
    pub fn for_view(view: ViewPreset) -> Self {
        let (min_distance, max_distance) = view.distance_bounds();
        let eye = view.eye();
        Self {
            view,
            tier: view.tier(),
            speed_multiplier: 1.0,
            spin_multiplier: 1.0,
            fov_degrees: view.fov_degrees(),
            camera_eye: eye.to_array(),
            min_distance,
            max_distance,
            near: 0.1,
            far: view.far_plane(),
            label_offset: 2.0,
            include_anchor_in_labels: true,
            include_anchor_in_picking: false,
            starfield_count: 1500,
            starfield_extent: 400.0,
            light_intensity: 4_000_000.0,
            light_range: 600.0,
            sun_illuminance: 10_000.0,
            ambient_brightness: match view {
                ViewPreset::PlanetDetail => 60.0,
                ViewPreset::StarSystem | ViewPreset::Galaxy => 120.0,
            },
            background: view.background(),
            starfield_seed: None,
        }
    }

    pub fn with_tier(mut self, tier: QualityTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_speed_multiplier(mut self, multiplier: f32) -> Self {
        self.speed_multiplier = multiplier;
        self
    }

    pub fn with_spin_multiplier(mut self, multiplier: f32) -> Self {
        self.spin_multiplier = multiplier;
        self
    }

    pub fn with_distance_bounds(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn with_label_offset(mut self, offset: f32) -> Self {
        self.label_offset = offset;
        self
    }

    pub fn with_anchor_labels(mut self, include: bool) -> Self {
        self.include_anchor_in_labels = include;
        self
    }

    pub fn with_anchor_picking(mut self, include: bool) -> Self {
        self.include_anchor_in_picking = include;
        self
    }

    pub fn with_starfield(mut self, count: usize, extent: f32) -> Self {
        self.starfield_count = count;
        self.starfield_extent = extent;
        self
    }

    pub fn with_starfield_seed(mut self, seed: u32) -> Self {
        self.starfield_seed = Some(seed);
        self
    }

    pub fn with_camera_eye(mut self, eye: Vec3) -> Self {
        self.camera_eye = eye.to_array();
        self
    }

    pub fn camera_eye(&self) -> Vec3 {
        Vec3::from_array(self.camera_eye)
    }

    /// Square texture size for the configured tier.
    pub fn resolution(&self) -> usize {
        self.tier.resolution()
    }

    /// Distance clamped to the configured bounds.
    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }

    pub fn parse_json(text: &str) -> CosmosResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> CosmosResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_json(&text)
    }
}
