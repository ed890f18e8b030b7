//! Bevy plugin that mounts a composed [`Scene`] (or a galaxy cloud) into the
//! app and drives it from the frame loop.
//!
//! The host sends [`ViewportCommand`] messages to mount, rebuild or tear
//! down content and listens for [`NavigationIntent`] messages on clicks.
//!
//! ## Usage
//!
//! ```ignore
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(CosmosViewportPlugin)
//!     .insert_resource(ExplorerConfig::default())
//!     .add_systems(Startup, |mut cmds: MessageWriter<ViewportCommand>| {
//!         cmds.write(ViewportCommand::MountSystem(descriptors()));
//!     })
//!     .run();
//! ```

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::render::render_resource::Face;
use bevy::window::PrimaryWindow;

use crate::animator::LabelPlacement;
use crate::config::ExplorerConfig;
use crate::derived_maps::MaterialAsset;
use crate::descriptor::{BodyId, CelestialBodyDescriptor};
use crate::error::{CosmosError, CosmosResult};
use crate::galaxy::{GalaxyCloud, GalaxyKind};
use crate::orbit_camera::{orbit_camera_system, OrbitCamera, OrbitCameraBundle};
use crate::palette::color_from_hex;
use crate::picking::NavigationIntent;
use crate::rng::{EntropyRandom, SeededRandom, SurfaceRng};
use crate::scene::{Scene, SceneLight, Shell, RING_OPACITY};
use crate::starfield::Starfield;

/// Pointer travel in pixels beyond which a press counts as a drag.
pub const CLICK_SLOP: f32 = 4.0;

/// Reference frames per second.
const REFERENCE_FPS: f32 = 60.0;

/// Plugin that renders explorer content and turns clicks into navigation.
pub struct CosmosViewportPlugin;

impl Plugin for CosmosViewportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ExplorerConfig>()
            .init_resource::<ViewportState>()
            .add_message::<ViewportCommand>()
            .add_message::<NavigationIntent>()
            .add_systems(
                Update,
                (
                    handle_viewport_commands,
                    orbit_camera_system,
                    sync_camera_to_window,
                    advance_content,
                    track_pointer,
                    emit_navigation,
                    sync_transforms,
                    place_labels,
                )
                    .chain(),
            );
    }
}

/// Requests from the host.
#[derive(Message, Debug, Clone)]
pub enum ViewportCommand {
    /// Tear down whatever is shown and compose a star system or single body.
    MountSystem(Vec<CelestialBodyDescriptor>),
    /// Tear down whatever is shown and generate a galaxy cloud.
    MountGalaxy { kind: GalaxyKind, seed: Option<u32> },
    /// Rebuild the current scene from its descriptors.
    Reinitialize,
    /// Remove everything.
    Teardown,
}

/// Lifecycle of the viewport content.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewportStatus {
    #[default]
    Empty,
    Mounted,
    /// Mounting failed; the message describes why. A scene that failed while
    /// uploading is retained so `Reinitialize` can retry it.
    Failed(String),
}

/// Entities and assets created for the mounted content.
#[derive(Default)]
struct Spawned {
    entities: Vec<Entity>,
    meshes: Vec<Handle<Mesh>>,
    materials: Vec<Handle<StandardMaterial>>,
    images: Vec<Handle<Image>>,
}

/// Content currently owned by the viewport and the Bevy handles that mirror
/// it.
#[derive(Resource, Default)]
pub struct ViewportState {
    status: ViewportStatus,
    scene: Option<Scene>,
    galaxy: Option<GalaxyCloud>,
    spawned: Spawned,
    press: Option<Vec2>,
}

impl ViewportState {
    pub fn status(&self) -> &ViewportStatus {
        &self.status
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn galaxy(&self) -> Option<&GalaxyCloud> {
        self.galaxy.as_ref()
    }

    /// Number of live entities spawned for the current content.
    pub fn entity_count(&self) -> usize {
        self.spawned.entities.len()
    }

    /// Number of meshes, materials and images owned by the current content.
    pub fn asset_count(&self) -> usize {
        self.spawned.meshes.len() + self.spawned.materials.len() + self.spawned.images.len()
    }
}

/// Anything spawned by the viewport.
#[derive(Component)]
pub struct ViewportEntity;

/// Sphere of the body at `index` in the scene.
#[derive(Component)]
pub struct BodyVisual {
    pub index: usize,
}

/// Cloud or atmosphere shell of the body at `index`.
#[derive(Component)]
pub struct ShellVisual {
    pub index: usize,
    pub clouds: bool,
}

#[derive(Component)]
pub struct GalaxyVisual;

/// Screen label of a body.
#[derive(Component)]
pub struct BodyLabel {
    pub body_id: BodyId,
}

/// Asset stores the spawners write into.
struct SpawnContext<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    images: &'a mut Assets<Image>,
}

fn handle_viewport_commands(
    mut commands: Commands,
    mut requests: MessageReader<ViewportCommand>,
    mut state: ResMut<ViewportState>,
    config: Res<ExplorerConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    for request in requests.read() {
        let mut ctx = SpawnContext {
            commands: &mut commands,
            meshes: &mut meshes,
            materials: &mut materials,
            images: &mut images,
        };
        despawn_content(&mut ctx, &mut state);

        let viewport = windows
            .single()
            .map(|w| Vec2::new(w.width(), w.height()))
            .map_err(|_| CosmosError::Resource("no primary window".into()));

        let result = match request {
            ViewportCommand::MountSystem(descriptors) => viewport.and_then(|size| {
                if let Some(mut previous) = state.scene.take() {
                    previous.dispose();
                }
                state.galaxy = None;
                let mut scene = Scene::compose(descriptors.clone(), &config)?;
                scene.set_viewport(size.x, size.y);
                state.scene = Some(scene);
                mount_scene(&mut ctx, &mut state, &config)
            }),
            ViewportCommand::MountGalaxy { kind, seed } => viewport.and_then(|_| {
                if let Some(mut previous) = state.scene.take() {
                    previous.dispose();
                }
                let mut rng: Box<dyn SurfaceRng> = match seed {
                    Some(seed) => Box::new(SeededRandom::from_state(*seed)),
                    None => Box::new(EntropyRandom::new()),
                };
                state.galaxy = Some(GalaxyCloud::generate(*kind, rng.as_mut()));
                let backdrop = Starfield::dim(1000, config.starfield_extent, rng.as_mut());
                mount_galaxy(&mut ctx, &mut state, &config, &backdrop)
            }),
            ViewportCommand::Reinitialize => {
                if state.scene.is_none() {
                    warn!("Reinitialize requested with no scene to rebuild");
                    continue;
                }
                viewport.and_then(|size| {
                    if let Some(scene) = state.scene.as_mut() {
                        scene.reinitialize()?;
                        scene.set_viewport(size.x, size.y);
                    }
                    mount_scene(&mut ctx, &mut state, &config)
                })
            }
            ViewportCommand::Teardown => {
                if let Some(mut scene) = state.scene.take() {
                    scene.dispose();
                }
                state.galaxy = None;
                state.status = ViewportStatus::Empty;
                info!("Viewport torn down");
                continue;
            }
        };

        match result {
            Ok(()) => state.status = ViewportStatus::Mounted,
            Err(err) => {
                error!("Viewport mount failed: {}", err);
                despawn_content(&mut ctx, &mut state);
                if matches!(err, CosmosError::Configuration(_)) {
                    state.scene = None;
                }
                state.status = ViewportStatus::Failed(err.to_string());
            }
        }
    }
}

/// Despawn every viewport entity and drop the assets created for them.
fn despawn_content(ctx: &mut SpawnContext, state: &mut ViewportState) {
    let spawned = std::mem::take(&mut state.spawned);
    for entity in spawned.entities {
        ctx.commands.entity(entity).despawn();
    }
    for handle in &spawned.meshes {
        ctx.meshes.remove(handle);
    }
    for handle in &spawned.materials {
        ctx.materials.remove(handle);
    }
    for handle in &spawned.images {
        ctx.images.remove(handle);
    }
    state.press = None;
}

fn spawn_camera(ctx: &mut SpawnContext, spawned: &mut Spawned, config: &ExplorerConfig) {
    ctx.commands
        .insert_resource(ClearColor(Color::from(color_from_hex(config.background))));
    spawned.entities.push(
        ctx.commands
            .spawn((OrbitCameraBundle::from_config(config), ViewportEntity))
            .id(),
    );
}

fn mount_scene(
    ctx: &mut SpawnContext,
    state: &mut ViewportState,
    config: &ExplorerConfig,
) -> CosmosResult<()> {
    let mut spawned = std::mem::take(&mut state.spawned);
    spawn_camera(ctx, &mut spawned, config);
    let result = match state.scene.as_ref() {
        Some(scene) => spawn_scene(ctx, scene, &mut spawned),
        None => Err(CosmosError::Resource("no scene to mount".into())),
    };
    state.spawned = spawned;
    result
}

fn spawn_scene(ctx: &mut SpawnContext, scene: &Scene, spawned: &mut Spawned) -> CosmosResult<()> {
    let ambient = scene.ambient();
    ctx.commands.insert_resource(AmbientLight {
        color: Color::from(color_from_hex(ambient.color)),
        brightness: ambient.brightness,
        affects_lightmapped_meshes: false,
    });

    // One upload per shared material asset.
    let mut uploaded: HashMap<*const MaterialAsset, (Handle<StandardMaterial>, Option<Handle<Image>>)> =
        HashMap::new();

    for (index, body) in scene.bodies().iter().enumerate() {
        let key = Arc::as_ptr(&body.mesh.material);
        let (material, clouds) = match uploaded.get(&key) {
            Some(entry) => entry.clone(),
            None => {
                let entry = upload_material(ctx, &body.mesh.material, spawned)?;
                uploaded.insert(key, entry.clone());
                entry
            }
        };

        let mut sphere = Sphere::new(body.radius()).mesh().uv(64, 32);
        sphere
            .generate_tangents()
            .map_err(|e| CosmosError::Resource(format!("tangent generation failed: {}", e)))?;
        let mesh = ctx.meshes.add(sphere);
        spawned.meshes.push(mesh.clone());
        spawned.entities.push(
            ctx.commands
                .spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    body.transform(),
                    BodyVisual { index },
                    ViewportEntity,
                ))
                .id(),
        );

        if let Some(shell) = &body.mesh.shell {
            spawn_shell(ctx, spawned, index, body.position, shell, clouds);
        }

        if !body.is_anchor || scene.config().include_anchor_in_labels {
            spawned.entities.push(
                ctx.commands
                    .spawn((
                        Text::new(body.name()),
                        TextFont {
                            font_size: 12.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                        Node {
                            position_type: PositionType::Absolute,
                            padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                            ..default()
                        },
                        Visibility::Hidden,
                        BodyLabel {
                            body_id: body.id.clone(),
                        },
                        ViewportEntity,
                    ))
                    .id(),
            );
        }
    }

    if !scene.rings().is_empty() {
        let ring_material = ctx.materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, RING_OPACITY),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..default()
        });
        spawned.materials.push(ring_material.clone());
        for ring in scene.rings() {
            let mesh = ctx
                .meshes
                .add(Annulus::new(ring.inner_radius, ring.outer_radius).mesh().resolution(128));
            spawned.meshes.push(mesh.clone());
            spawned.entities.push(
                ctx.commands
                    .spawn((
                        Mesh3d(mesh),
                        MeshMaterial3d(ring_material.clone()),
                        Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
                        ViewportEntity,
                    ))
                    .id(),
            );
        }
    }

    for light in scene.lights() {
        let entity = match light {
            SceneLight::Point {
                position,
                color,
                intensity,
                range,
            } => ctx.commands.spawn((
                PointLight {
                    color: Color::from(color_from_hex(*color)),
                    intensity: *intensity,
                    range: *range,
                    shadows_enabled: false,
                    ..default()
                },
                Transform::from_translation(*position),
                ViewportEntity,
            )),
            SceneLight::Directional {
                position,
                color,
                illuminance,
            } => ctx.commands.spawn((
                DirectionalLight {
                    color: Color::from(color_from_hex(*color)),
                    illuminance: *illuminance,
                    ..default()
                },
                Transform::from_translation(*position).looking_at(Vec3::ZERO, Vec3::Y),
                ViewportEntity,
            )),
        };
        spawned.entities.push(entity.id());
    }

    if !scene.starfield().is_empty() {
        spawn_points(ctx, spawned, scene.starfield().to_mesh(), AlphaMode::Blend, Quat::IDENTITY);
    }

    info!(
        "Mounted scene with {} bodies ({} entities)",
        scene.bodies().len(),
        spawned.entities.len()
    );
    Ok(())
}

fn spawn_shell(
    ctx: &mut SpawnContext,
    spawned: &mut Spawned,
    index: usize,
    position: Vec3,
    shell: &Shell,
    clouds: Option<Handle<Image>>,
) {
    let material = match shell {
        Shell::Clouds { .. } => StandardMaterial {
            base_color_texture: clouds,
            alpha_mode: AlphaMode::Blend,
            perceptual_roughness: 1.0,
            metallic: 0.0,
            double_sided: true,
            cull_mode: None,
            ..default()
        },
        Shell::Atmosphere { color, opacity, .. } => StandardMaterial {
            base_color: Color::from(color_from_hex(*color).with_alpha(*opacity)),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            cull_mode: Some(Face::Front),
            ..default()
        },
    };
    let mesh = ctx.meshes.add(Sphere::new(shell.radius()).mesh().uv(64, 32));
    let material = ctx.materials.add(material);
    spawned.meshes.push(mesh.clone());
    spawned.materials.push(material.clone());
    spawned.entities.push(
        ctx.commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::from_translation(position),
                ShellVisual {
                    index,
                    clouds: matches!(shell, Shell::Clouds { .. }),
                },
                ViewportEntity,
            ))
            .id(),
    );
}

fn upload_material(
    ctx: &mut SpawnContext,
    asset: &MaterialAsset,
    spawned: &mut Spawned,
) -> CosmosResult<(Handle<StandardMaterial>, Option<Handle<Image>>)> {
    let uploaded = asset.to_images()?;
    let color = ctx.images.add(uploaded.color);
    let normal = ctx.images.add(uploaded.normal);
    let roughness = ctx.images.add(uploaded.roughness);
    let clouds = uploaded.clouds.map(|image| ctx.images.add(image));
    spawned
        .images
        .extend([color.clone(), normal.clone(), roughness.clone()]);
    spawned.images.extend(clouds.clone());

    let material = ctx.materials.add(StandardMaterial {
        base_color_texture: Some(color),
        normal_map_texture: Some(normal),
        metallic_roughness_texture: Some(roughness),
        perceptual_roughness: asset.scalars.roughness,
        metallic: asset.scalars.metalness,
        unlit: asset.scalars.emissive,
        ..default()
    });
    spawned.materials.push(material.clone());
    Ok((material, clouds))
}

/// Spawn an unlit point cloud colored by its vertex colors.
fn spawn_points(
    ctx: &mut SpawnContext,
    spawned: &mut Spawned,
    mesh: Mesh,
    alpha_mode: AlphaMode,
    rotation: Quat,
) -> Entity {
    let mesh = ctx.meshes.add(mesh);
    let material = ctx.materials.add(StandardMaterial {
        base_color: Color::WHITE,
        alpha_mode,
        unlit: true,
        ..default()
    });
    spawned.meshes.push(mesh.clone());
    spawned.materials.push(material.clone());
    let entity = ctx
        .commands
        .spawn((
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::from_rotation(rotation),
            ViewportEntity,
        ))
        .id();
    spawned.entities.push(entity);
    entity
}

fn mount_galaxy(
    ctx: &mut SpawnContext,
    state: &mut ViewportState,
    config: &ExplorerConfig,
    backdrop: &Starfield,
) -> CosmosResult<()> {
    let Some(galaxy) = state.galaxy.as_ref() else {
        return Err(CosmosError::Resource("no galaxy to mount".into()));
    };
    let mut spawned = std::mem::take(&mut state.spawned);
    spawn_camera(ctx, &mut spawned, config);

    let cloud = spawn_points(ctx, &mut spawned, galaxy.to_mesh(), AlphaMode::Add, galaxy.orientation());
    ctx.commands.entity(cloud).insert(GalaxyVisual);
    spawn_points(ctx, &mut spawned, backdrop.to_mesh(), AlphaMode::Blend, Quat::IDENTITY);
    info!("Mounted {:?} galaxy with {} points", galaxy.kind, galaxy.len());

    state.spawned = spawned;
    Ok(())
}

/// Keep the projection camera in step with the orbit camera and the window.
fn sync_camera_to_window(
    mut state: ResMut<ViewportState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Transform, &OrbitCamera)>,
) {
    let Some(scene) = state.scene.as_mut() else {
        return;
    };
    if let Ok(window) = windows.single() {
        let size = Vec2::new(window.width(), window.height());
        if scene.camera().viewport != size {
            debug!("Viewport resized to {}x{}", size.x, size.y);
            scene.set_viewport(size.x, size.y);
        }
    }
    if let Ok((transform, orbit)) = cameras.single() {
        let camera = scene.camera_mut();
        camera.eye = transform.translation;
        camera.target = orbit.target;
    }
}

fn advance_content(time: Res<Time>, mut state: ResMut<ViewportState>) {
    let frames = time.delta_secs() * REFERENCE_FPS;
    if let Some(scene) = state.scene.as_mut() {
        scene.tick(frames);
    }
    if let Some(galaxy) = state.galaxy.as_mut() {
        galaxy.tick(frames);
    }
}

fn track_pointer(mut state: ResMut<ViewportState>, windows: Query<&Window, With<PrimaryWindow>>) {
    let Some(scene) = state.scene.as_mut() else {
        return;
    };
    match windows.single().ok().and_then(Window::cursor_position) {
        Some(cursor) => {
            scene.set_pointer_pixels(cursor.x, cursor.y);
            scene.update_hover();
        }
        None => scene.clear_pointer(),
    }
}

/// True when a press and release are close enough to count as a click.
pub fn is_click(press: Vec2, release: Vec2) -> bool {
    press.distance(release) <= CLICK_SLOP
}

fn emit_navigation(
    mut state: ResMut<ViewportState>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut intents: MessageWriter<NavigationIntent>,
) {
    let cursor = windows.single().ok().and_then(Window::cursor_position);
    if mouse_button.just_pressed(MouseButton::Left) {
        state.press = cursor;
    }
    if !mouse_button.just_released(MouseButton::Left) {
        return;
    }
    let press = state.press.take();
    let (Some(press), Some(release)) = (press, cursor) else {
        return;
    };
    if !is_click(press, release) {
        return;
    }
    if let Some(intent) = state.scene.as_ref().and_then(Scene::click) {
        intents.write(intent);
    }
}

fn sync_transforms(
    state: Res<ViewportState>,
    mut bodies: Query<(&BodyVisual, &mut Transform), (Without<ShellVisual>, Without<GalaxyVisual>)>,
    mut shells: Query<(&ShellVisual, &mut Transform), (Without<BodyVisual>, Without<GalaxyVisual>)>,
    mut galaxies: Query<&mut Transform, (With<GalaxyVisual>, Without<BodyVisual>, Without<ShellVisual>)>,
) {
    if let Some(scene) = state.scene.as_ref() {
        let all = scene.bodies();
        for (visual, mut transform) in &mut bodies {
            if let Some(body) = all.get(visual.index) {
                *transform = body.transform();
            }
        }
        for (visual, mut transform) in &mut shells {
            if let Some(body) = all.get(visual.index) {
                let spin = if visual.clouds { body.cloud_spin } else { body.spin };
                *transform = Transform::from_translation(body.position)
                    .with_rotation(Quat::from_rotation_y(spin));
            }
        }
    }
    if let Some(galaxy) = state.galaxy.as_ref() {
        for mut transform in &mut galaxies {
            transform.rotation = galaxy.orientation();
        }
    }
}

fn place_labels(
    state: Res<ViewportState>,
    mut labels: Query<(&BodyLabel, &mut Node, &mut Visibility, &ComputedNode)>,
) {
    let Some(scene) = state.scene.as_ref() else {
        return;
    };
    let placements: HashMap<BodyId, LabelPlacement> = scene
        .label_placements()
        .into_iter()
        .map(|p| (p.body_id.clone(), p))
        .collect();

    for (label, mut node, mut visibility, computed) in &mut labels {
        match placements.get(&label.body_id).and_then(|p| p.screen) {
            Some(screen) => {
                // Center the label box on the anchor.
                let half = computed.size() * computed.inverse_scale_factor() * 0.5;
                node.left = Val::Px(screen.x - half.x);
                node.top = Val::Px(screen.y - half.y);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_slop() {
        assert!(is_click(Vec2::new(10.0, 10.0), Vec2::new(12.0, 13.0)));
        assert!(!is_click(Vec2::new(10.0, 10.0), Vec2::new(30.0, 10.0)));
    }

    #[test]
    fn test_state_starts_empty() {
        let state = ViewportState::default();
        assert_eq!(state.status(), &ViewportStatus::Empty);
        assert!(state.scene().is_none());
        assert_eq!(state.entity_count(), 0);
    }
}
