//! Core library for Cosmos Explorer.
//!
//! This crate provides:
//! - Deterministic seeded random streams for procedural content
//! - Procedural surface painting for stars, gas giants and rocky planets
//! - Derived normal and roughness maps and a per-scene texture cache
//! - Scene composition, orbital animation and label projection
//! - Pointer picking that turns clicks into navigation intents
//! - Starfield and galaxy point clouds
//! - A Bevy viewport plugin that mirrors scenes into entities
//! - Configuration presets for the explorer views

pub mod animator;
pub mod camera;
pub mod config;
pub mod derived_maps;
pub mod descriptor;
pub mod error;
pub mod galaxy;
pub mod layout;
pub mod orbit_camera;
pub mod palette;
pub mod picking;
pub mod rng;
pub mod scene;
pub mod starfield;
pub mod surface;
pub mod texture_cache;
pub mod viewport;

pub use animator::LabelPlacement;
pub use camera::{PickRay, ProjectedPoint, ViewCamera};
pub use config::{ExplorerConfig, QualityTier, ViewPreset};
pub use derived_maps::{
    build_material_asset, build_normal_map, MaterialAsset, MaterialImages, MaterialScalars,
};
pub use descriptor::{
    load_system_json, parse_color_hex, parse_system_json, validate_system, BodyId, BodyKind,
    CelestialBodyDescriptor, SurfaceClass, SystemFile, DETAIL_RADIUS, MAX_COLOR_HEX,
};
pub use error::{ConfigurationError, CosmosError, CosmosResult};
pub use galaxy::{GalaxyCloud, GalaxyKind, SpiralParams};
pub use layout::{PlanetRecord, StarRecord, StarSystemLayout};
pub use orbit_camera::{orbit_camera_system, OrbitCamera, OrbitCameraBundle};
pub use palette::{color_from_hex, derive_palette};
pub use picking::NavigationIntent;
pub use rng::{hash_seed_string, make_generator, EntropyRandom, Seed, SeededRandom, SurfaceRng};
pub use scene::{
    AmbientSettings, BodyMesh, DisposeReport, OrbitRing, Scene, SceneBody, SceneLight, Shell,
};
pub use starfield::Starfield;
pub use surface::{paint_surface, GradientStop, PaintedSurface, SurfaceBuffer, TextureEncoding};
pub use texture_cache::{TextureCache, TextureKey};
pub use viewport::{
    BodyLabel, BodyVisual, CosmosViewportPlugin, ViewportCommand, ViewportState, ViewportStatus,
};
