use std::path::{Path, PathBuf};

use bevy::prelude::*;
use cosmos_core::{
    build_material_asset, load_system_json, make_generator, CelestialBodyDescriptor,
    CosmosResult, CosmosViewportPlugin, ExplorerConfig, GalaxyKind, NavigationIntent,
    PlanetRecord, SeededRandom, StarSystemLayout, ViewPreset, ViewportCommand, ViewportState,
};

/// Options read from the command line.
#[derive(Debug, Default)]
struct CliOptions {
    system: Option<PathBuf>,
    config: Option<PathBuf>,
    view: Option<ViewPreset>,
    galaxy: Option<GalaxyKind>,
    seed: Option<u32>,
    export_dir: Option<PathBuf>,
}

impl CliOptions {
    /// Parse command-line arguments.
    ///
    /// Supported args:
    /// - `--system <path>` - JSON system description (default: generated demo)
    /// - `--config <path>` - JSON explorer config
    /// - `--view <system|detail|galaxy>` - view preset
    /// - `--galaxy <label>` - show a galaxy of the given type label
    /// - `--seed <N>` - seed for the demo system and galaxy
    /// - `--export-textures <dir>` - write every body's maps as PNG and exit
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self::default();
        let mut i = 1; // Skip program name

        while i < args.len() {
            let value = args.get(i + 1).cloned();
            let consumed = match (args[i].as_str(), value) {
                ("--system", Some(path)) => {
                    options.system = Some(PathBuf::from(path));
                    true
                }
                ("--config", Some(path)) => {
                    options.config = Some(PathBuf::from(path));
                    true
                }
                ("--view", Some(name)) => {
                    options.view = match name.as_str() {
                        "system" => Some(ViewPreset::StarSystem),
                        "detail" => Some(ViewPreset::PlanetDetail),
                        "galaxy" => Some(ViewPreset::Galaxy),
                        other => {
                            eprintln!("Warning: unknown view '{}', using system", other);
                            None
                        }
                    };
                    true
                }
                ("--galaxy", Some(label)) => {
                    options.galaxy = Some(GalaxyKind::from_type_label(&label));
                    true
                }
                ("--seed", Some(seed)) => {
                    match seed.parse() {
                        Ok(seed) => options.seed = Some(seed),
                        Err(_) => eprintln!("Warning: --seed requires a number"),
                    }
                    true
                }
                ("--export-textures", Some(dir)) => {
                    options.export_dir = Some(PathBuf::from(dir));
                    true
                }
                (flag @ ("--system" | "--config" | "--view" | "--galaxy" | "--seed"
                | "--export-textures"), None) => {
                    eprintln!("Warning: {} requires an argument", flag);
                    false
                }
                _ => false, // Skip unknown args
            };
            i += if consumed { 2 } else { 1 };
        }

        options
    }

    fn view(&self) -> ViewPreset {
        match (self.view, self.galaxy) {
            (Some(view), _) => view,
            (None, Some(_)) => ViewPreset::Galaxy,
            (None, None) => ViewPreset::StarSystem,
        }
    }
}

/// What to show at startup and return to on Escape.
#[derive(Resource, Clone)]
struct HomeContent {
    config: ExplorerConfig,
    descriptors: Vec<CelestialBodyDescriptor>,
    galaxy: Option<GalaxyKind>,
    seed: u32,
}

impl HomeContent {
    fn command(&self) -> ViewportCommand {
        match self.galaxy {
            Some(kind) => ViewportCommand::MountGalaxy {
                kind,
                seed: Some(self.seed),
            },
            None => ViewportCommand::MountSystem(self.descriptors.clone()),
        }
    }
}

fn main() {
    let options = CliOptions::from_args();
    let seed = options.seed.unwrap_or_else(rand::random);

    let descriptors = match &options.system {
        Some(path) => match load_system_json(path) {
            Ok(bodies) => bodies,
            Err(e) => {
                eprintln!("Error: failed to load system {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => demo_system(seed),
    };

    let view = options.view();
    let config = match &options.config {
        Some(path) => match ExplorerConfig::load_json(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ExplorerConfig::for_view(view),
    };

    if let Some(dir) = &options.export_dir {
        match export_textures(&descriptors, &config, dir) {
            Ok(count) => println!("Exported {} bodies to {}", count, dir.display()),
            Err(e) => {
                eprintln!("Error: texture export failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let galaxy = match view {
        ViewPreset::Galaxy => Some(options.galaxy.unwrap_or(GalaxyKind::Spiral)),
        _ => None,
    };
    let home = HomeContent {
        config: config.clone(),
        descriptors,
        galaxy,
        seed,
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Cosmos Explorer".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(CosmosViewportPlugin)
        .insert_resource(config)
        .insert_resource(home)
        .add_systems(Startup, mount_home)
        .add_systems(Update, (open_detail_view, keyboard_shortcuts))
        .run();
}

/// A small generated system.
fn demo_system(seed: u32) -> Vec<CelestialBodyDescriptor> {
    let planets = [
        PlanetRecord::new("Aurelia"),
        PlanetRecord::new("Brontes"),
        PlanetRecord::new("Calyx"),
        PlanetRecord::new("Dione").with_type("Ice Giant"),
        PlanetRecord::new("Erebus"),
    ];
    StarSystemLayout::from_planets("Helios", &planets, &mut SeededRandom::from_state(seed))
        .into_descriptors()
}

fn mount_home(home: Res<HomeContent>, mut commands: MessageWriter<ViewportCommand>) {
    commands.write(home.command());
}

/// Clicking a planet opens it alone in the detail view.
fn open_detail_view(
    mut intents: MessageReader<NavigationIntent>,
    state: Res<ViewportState>,
    mut config: ResMut<ExplorerConfig>,
    mut commands: MessageWriter<ViewportCommand>,
) {
    let Some(intent) = intents.read().last() else {
        return;
    };
    let Some(body) = state.scene().and_then(|scene| scene.body(&intent.body_id)) else {
        return;
    };
    if body.is_anchor && config.view == ViewPreset::PlanetDetail {
        return;
    }
    info!("Opening detail view for '{}'", body.id);
    *config = ExplorerConfig::for_view(ViewPreset::PlanetDetail);
    commands.write(ViewportCommand::MountSystem(vec![body
        .descriptor
        .as_detail_anchor()]));
}

/// Escape returns home, R rebuilds the current scene.
fn keyboard_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    home: Res<HomeContent>,
    mut config: ResMut<ExplorerConfig>,
    mut commands: MessageWriter<ViewportCommand>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        *config = home.config.clone();
        commands.write(home.command());
    } else if keys.just_pressed(KeyCode::KeyR) {
        commands.write(ViewportCommand::Reinitialize);
    }
}

/// Paint every body and write its maps as PNG files.
fn export_textures(
    descriptors: &[CelestialBodyDescriptor],
    config: &ExplorerConfig,
    dir: &Path,
) -> CosmosResult<usize> {
    std::fs::create_dir_all(dir)?;
    let mut manifest = Vec::with_capacity(descriptors.len());

    for body in descriptors {
        let mut rng = make_generator(body.seed.as_ref());
        let asset = build_material_asset(
            body.surface_class,
            body.resolved_base_color(),
            config.resolution(),
            rng.as_mut(),
        );
        let stem = body.body_id().as_str().replace(|c: char| !c.is_alphanumeric(), "_");

        asset.color.save_png(dir.join(format!("{}_color.png", stem)))?;
        asset.normal.save_png(dir.join(format!("{}_normal.png", stem)))?;
        asset.roughness.save_png(dir.join(format!("{}_roughness.png", stem)))?;
        if let Some(clouds) = &asset.clouds {
            clouds.save_png(dir.join(format!("{}_clouds.png", stem)))?;
        }

        manifest.push(serde_json::json!({
            "id": body.body_id().as_str(),
            "class": body.surface_class,
            "color": format!("#{:06x}", body.resolved_base_color()),
            "resolution": config.resolution(),
            "clouds": asset.has_clouds(),
        }));
    }

    let text = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(dir.join("manifest.json"), text)?;
    Ok(descriptors.len())
}
