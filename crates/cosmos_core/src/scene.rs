//! Scene composition.
//!
//! A [`Scene`] owns everything built from one descriptor set: the bodies
//! with their painted materials, orbit rings, lights, the starfield backdrop
//! and the texture cache. It holds no renderer state; the viewport plugin
//! mirrors it into Bevy entities.
//!
//! ## Usage
//!
//! ```ignore
//! let mut scene = Scene::compose(descriptors, &ExplorerConfig::default())?;
//! scene.tick(1.0);
//! for label in scene.label_placements() { ... }
//! let report = scene.dispose();
//! ```

use std::f32::consts::TAU;
use std::sync::Arc;

use bevy::prelude::*;

use crate::camera::ViewCamera;
use crate::config::ExplorerConfig;
use crate::derived_maps::{build_material_asset, MaterialAsset};
use crate::descriptor::{validate_system, BodyId, CelestialBodyDescriptor, SurfaceClass};
use crate::error::ConfigurationError;
use crate::rng::{make_generator, EntropyRandom, SeededRandom, SurfaceRng};
use crate::starfield::Starfield;
use crate::texture_cache::{TextureCache, TextureKey};

/// Cloud shell radius relative to the body.
pub const CLOUD_SHELL_SCALE: f32 = 1.0133;
/// Atmosphere shell radius relative to the body.
pub const ATMOSPHERE_SHELL_SCALE: f32 = 1.0667;
pub const ATMOSPHERE_OPACITY: f32 = 0.12;
/// Half width of an orbit ring.
pub const RING_HALF_WIDTH: f32 = 0.1;
pub const RING_OPACITY: f32 = 0.1;

const DEFAULT_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
const AMBIENT_COLOR: u32 = 0x404040;
const SUN_POSITION: Vec3 = Vec3::new(50.0, 20.0, 30.0);
const RIM_POSITION: Vec3 = Vec3::new(-50.0, 50.0, -10.0);
const RIM_COLOR: u32 = 0x4455FF;

/// Translucent shell drawn just above a body's surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Shell {
    /// Textured with the material's cloud map.
    Clouds { radius: f32 },
    /// Flat tinted glow seen from inside.
    Atmosphere { radius: f32, color: u32, opacity: f32 },
}

impl Shell {
    pub fn radius(&self) -> f32 {
        match self {
            Shell::Clouds { radius } | Shell::Atmosphere { radius, .. } => *radius,
        }
    }
}

/// Renderable description of one body.
#[derive(Debug, Clone)]
pub struct BodyMesh {
    pub radius: f32,
    pub material: Arc<MaterialAsset>,
    pub shell: Option<Shell>,
}

/// A body placed in the scene.
#[derive(Debug, Clone)]
pub struct SceneBody {
    pub descriptor: CelestialBodyDescriptor,
    pub id: BodyId,
    pub is_anchor: bool,
    /// Orbital angle in [0, 2π).
    pub angle: f32,
    /// Axial rotation in [0, 2π).
    pub spin: f32,
    /// Cloud shell rotation in [0, 2π).
    pub cloud_spin: f32,
    pub spin_rate: f32,
    pub cloud_spin_rate: f32,
    pub position: Vec3,
    pub mesh: BodyMesh,
    /// Height of the label anchor above the body center.
    pub label_height: f32,
}

impl SceneBody {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn radius(&self) -> f32 {
        self.mesh.radius
    }

    /// World position of the label anchor.
    pub fn label_anchor(&self) -> Vec3 {
        self.position + Vec3::Y * self.label_height
    }

    /// Transform with the current axial spin.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_rotation_y(self.spin))
    }
}

/// Position on a circular orbit in the XZ plane.
pub fn orbit_position(distance: f32, angle: f32) -> Vec3 {
    Vec3::new(distance * angle.cos(), 0.0, distance * angle.sin())
}

/// Thin annulus marking an orbit.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitRing {
    pub body: BodyId,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub opacity: f32,
}

impl OrbitRing {
    fn for_distance(body: BodyId, distance: f32) -> Self {
        Self {
            body,
            inner_radius: (distance - RING_HALF_WIDTH).max(0.0),
            outer_radius: distance + RING_HALF_WIDTH,
            opacity: RING_OPACITY,
        }
    }
}

/// Light sources of a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneLight {
    /// Emitted by a star anchor.
    Point {
        position: Vec3,
        color: u32,
        intensity: f32,
        range: f32,
    },
    /// Distant light shining from `position` toward the origin.
    Directional {
        position: Vec3,
        color: u32,
        illuminance: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientSettings {
    pub color: u32,
    pub brightness: f32,
}

/// What [`Scene::dispose`] released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub bodies: usize,
    pub rings: usize,
    pub lights: usize,
    pub starfield_points: usize,
    pub textures: usize,
}

impl DisposeReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Composed explorer scene.
pub struct Scene {
    pub(crate) config: ExplorerConfig,
    descriptors: Vec<CelestialBodyDescriptor>,
    pub(crate) bodies: Vec<SceneBody>,
    anchor: usize,
    rings: Vec<OrbitRing>,
    lights: Vec<SceneLight>,
    ambient: AmbientSettings,
    starfield: Starfield,
    cache: TextureCache,
    pub(crate) camera: ViewCamera,
    pub(crate) pointer: Option<Vec2>,
    pub(crate) hovered: Option<usize>,
    disposed: bool,
}

impl Scene {
    /// Validate `descriptors` and build every body, ring and light.
    ///
    /// Painting happens here, once per distinct texture key.
    pub fn compose(
        descriptors: Vec<CelestialBodyDescriptor>,
        config: &ExplorerConfig,
    ) -> Result<Self, ConfigurationError> {
        let anchor = validate_system(&descriptors)?;
        let resolution = config.resolution();
        let mut cache = TextureCache::new();

        let bodies: Vec<SceneBody> = descriptors
            .iter()
            .map(|descriptor| compose_body(descriptor, config, resolution, &mut cache))
            .collect();

        let rings = bodies
            .iter()
            .filter(|b| !b.is_anchor)
            .map(|b| OrbitRing::for_distance(b.id.clone(), b.descriptor.orbit_distance))
            .collect::<Vec<_>>();

        let lights = lights_for_anchor(&bodies[anchor], config);

        let mut star_rng: Box<dyn SurfaceRng> = match config.starfield_seed {
            Some(seed) => Box::new(SeededRandom::from_state(seed)),
            None => Box::new(EntropyRandom::new()),
        };
        let starfield =
            Starfield::generate(config.starfield_count, config.starfield_extent, star_rng.as_mut());

        info!(
            "Composed scene: {} bodies around '{}', {} textures at {}px",
            bodies.len(),
            bodies[anchor].name(),
            cache.len(),
            resolution
        );

        Ok(Self {
            config: config.clone(),
            descriptors,
            bodies,
            anchor,
            rings,
            lights,
            ambient: AmbientSettings {
                color: AMBIENT_COLOR,
                brightness: config.ambient_brightness,
            },
            starfield,
            cache,
            camera: ViewCamera::from_config(config, DEFAULT_VIEWPORT),
            pointer: None,
            hovered: None,
            disposed: false,
        })
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn descriptors(&self) -> &[CelestialBodyDescriptor] {
        &self.descriptors
    }

    pub fn bodies(&self) -> &[SceneBody] {
        &self.bodies
    }

    pub fn body(&self, id: &BodyId) -> Option<&SceneBody> {
        self.bodies.iter().find(|b| &b.id == id)
    }

    pub fn anchor(&self) -> Option<&SceneBody> {
        self.bodies.get(self.anchor)
    }

    /// Bodies other than the anchor.
    pub fn orbiting(&self) -> impl Iterator<Item = &SceneBody> {
        self.bodies.iter().filter(|b| !b.is_anchor)
    }

    pub fn rings(&self) -> &[OrbitRing] {
        &self.rings
    }

    pub fn lights(&self) -> &[SceneLight] {
        &self.lights
    }

    pub fn ambient(&self) -> AmbientSettings {
        self.ambient
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    pub fn texture_cache(&self) -> &TextureCache {
        &self.cache
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ViewCamera {
        &mut self.camera
    }

    /// Resize the projection after the host viewport changed.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.camera.resize(width, height);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release bodies, rings, lights, the starfield and the texture cache.
    ///
    /// A disposed scene ignores ticks and picking. Calling this twice
    /// releases nothing the second time.
    pub fn dispose(&mut self) -> DisposeReport {
        if self.disposed {
            return DisposeReport::default();
        }
        let report = DisposeReport {
            bodies: self.bodies.len(),
            rings: self.rings.len(),
            lights: self.lights.len(),
            starfield_points: self.starfield.release(),
            // Bodies go first so the cache holds the last reference.
            textures: {
                self.bodies.clear();
                self.cache.dispose()
            },
        };
        self.rings.clear();
        self.lights.clear();
        self.pointer = None;
        self.hovered = None;
        self.disposed = true;
        info!(
            "Disposed scene: {} bodies, {} textures",
            report.bodies, report.textures
        );
        report
    }

    /// Tear down and rebuild from the retained descriptor set, keeping the
    /// camera.
    pub fn reinitialize(&mut self) -> Result<DisposeReport, ConfigurationError> {
        let report = self.dispose();
        let camera = self.camera;
        let descriptors = std::mem::take(&mut self.descriptors);
        let rebuilt = Scene::compose(descriptors.clone(), &self.config);
        match rebuilt {
            Ok(mut scene) => {
                scene.camera = camera;
                *self = scene;
                Ok(report)
            }
            Err(err) => {
                self.descriptors = descriptors;
                Err(err)
            }
        }
    }
}

fn compose_body(
    descriptor: &CelestialBodyDescriptor,
    config: &ExplorerConfig,
    resolution: usize,
    cache: &mut TextureCache,
) -> SceneBody {
    let class = descriptor.surface_class;
    let color = descriptor.resolved_base_color();
    let key = TextureKey::new(class, color, resolution);
    let material = cache.get_or_create(key, || {
        debug!("Painting {:?} surface for '{}'", class, descriptor.name);
        let mut rng = make_generator(descriptor.seed.as_ref());
        build_material_asset(class, color, resolution, rng.as_mut())
    });

    let radius = descriptor.radius;
    let shell = match class {
        SurfaceClass::Rocky if material.has_clouds() => Some(Shell::Clouds {
            radius: radius * CLOUD_SHELL_SCALE,
        }),
        SurfaceClass::GasGiant => Some(Shell::Atmosphere {
            radius: radius * ATMOSPHERE_SHELL_SCALE,
            color,
            opacity: ATMOSPHERE_OPACITY,
        }),
        _ => None,
    };

    let is_anchor = descriptor.is_anchor();
    let angle = descriptor.initial_angle.rem_euclid(TAU);
    let position = if is_anchor {
        Vec3::ZERO
    } else {
        orbit_position(descriptor.orbit_distance, angle)
    };
    let spin_rate = config.view.spin_rate(class, is_anchor);

    SceneBody {
        descriptor: descriptor.clone(),
        id: descriptor.body_id(),
        is_anchor,
        angle,
        spin: 0.0,
        cloud_spin: 0.0,
        spin_rate,
        cloud_spin_rate: config.view.cloud_spin_rate(spin_rate),
        position,
        mesh: BodyMesh {
            radius,
            material,
            shell,
        },
        label_height: radius + config.label_offset,
    }
}

fn lights_for_anchor(anchor: &SceneBody, config: &ExplorerConfig) -> Vec<SceneLight> {
    if anchor.descriptor.surface_class == SurfaceClass::Star {
        vec![SceneLight::Point {
            position: anchor.position,
            color: 0xFFFFFF,
            intensity: config.light_intensity,
            range: config.light_range,
        }]
    } else {
        vec![
            SceneLight::Directional {
                position: SUN_POSITION,
                color: 0xFFFFFF,
                illuminance: config.sun_illuminance,
            },
            SceneLight::Directional {
                position: RIM_POSITION,
                color: RIM_COLOR,
                illuminance: config.sun_illuminance * 0.5,
            },
        ]
    }
}
