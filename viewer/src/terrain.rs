//! Terrain generation and surface rendering
//!
//! Updated for Bevy 0.17

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, VertexAttributeValues};
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;

use terrain_gen::{generate_terrain, place_props, GeneratedTerrain, GenerationConfig, PlacementEvent};

use crate::preview::NoisePreview;
use crate::ConfigPath;

/// Settings used for the next generation run
#[derive(Resource, Debug, Clone, Default)]
pub struct TerrainSettings(pub GenerationConfig);

/// Height field and mesh from the last successful run
#[derive(Resource, Default)]
pub struct CurrentTerrain(pub Option<GeneratedTerrain>);

/// Props scattered over the current terrain
#[derive(Resource, Default)]
pub struct CurrentPlacements(pub Vec<PlacementEvent>);

/// Work queued by the keybindings, picked up by [`regenerate_terrain`]
#[derive(Resource, Default)]
pub struct RegenerateRequest {
    pub terrain: bool,
    pub props: bool,
}

/// Marker for the terrain surface entity
#[derive(Component)]
pub struct TerrainSurface;

/// Plugin for terrain generation and rendering
pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CurrentTerrain>();
        app.init_resource::<CurrentPlacements>();
        app.insert_resource(RegenerateRequest {
            terrain: true,
            props: false,
        });
        app.add_systems(PreStartup, load_terrain_settings);
        app.add_systems(Startup, setup_scene);
        app.add_systems(
            Update,
            (handle_generation_keys, regenerate_terrain, spawn_terrain_surface).chain(),
        );
    }
}

/// Read the generation config, falling back to defaults if it can't be loaded
fn load_terrain_settings(mut commands: Commands, path: Res<ConfigPath>) {
    let config = match GenerationConfig::load(&path.0) {
        Ok(config) => {
            info!("Loaded terrain settings from {:?}", path.0);
            config
        }
        Err(e) => {
            warn!("{e}; using default terrain settings");
            GenerationConfig::default()
        }
    };
    commands.insert_resource(TerrainSettings(config));
}

/// Fixed camera looking at the map center, plus a sun
fn setup_scene(mut commands: Commands, settings: Res<TerrainSettings>) {
    let size = settings.0.map_size;
    let extent = size.width.max(size.height) as f32;

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, extent * 0.6 + settings.0.height_multiplier, extent * 0.8)
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: true,
            color: Color::srgb(1.0, 0.98, 0.92),
            ..default()
        },
        Transform::from_xyz(extent, extent, extent * 0.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    info!("Viewer scene initialized for a {}x{} map", size.width, size.height);
}

fn handle_generation_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<TerrainSettings>,
    mut request: ResMut<RegenerateRequest>,
    mut placements: ResMut<CurrentPlacements>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        request.terrain = true;
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        settings.0.noise.seed = rand::random();
        settings.0.prop_seed = rand::random();
        info!("Reseeded: noise {}, props {}", settings.0.noise.seed, settings.0.prop_seed);
        request.terrain = true;
    }

    if keyboard.just_pressed(KeyCode::KeyN) {
        settings.0.algorithm = settings.0.algorithm.next();
        info!("Noise algorithm: {:?}", settings.0.algorithm);
        request.terrain = true;
    }

    if keyboard.just_pressed(KeyCode::KeyP) {
        settings.0.prop_seed = rand::random();
        request.props = true;
    }

    if keyboard.just_pressed(KeyCode::KeyC) && !placements.0.is_empty() {
        info!("Cleared {} props", placements.0.len());
        placements.0.clear();
    }
}

/// Run the pipeline for pending requests.
///
/// A failed run logs the error and leaves the previous terrain in place.
fn regenerate_terrain(
    settings: Res<TerrainSettings>,
    mut request: ResMut<RegenerateRequest>,
    mut current: ResMut<CurrentTerrain>,
    mut placements: ResMut<CurrentPlacements>,
) {
    if request.terrain {
        request.terrain = false;
        request.props = false;

        match generate_terrain(&settings.0) {
            Ok(mut terrain) => {
                placements.0 = std::mem::take(&mut terrain.placements);
                current.0 = Some(terrain);
            }
            Err(e) => error!("Terrain generation failed: {e}"),
        }
        return;
    }

    if request.props {
        request.props = false;

        let Some(terrain) = current.0.as_ref() else {
            return;
        };
        let config = settings.0.sanitized();
        match place_props(&terrain.mesh.grid, &config.props, config.max_props, config.prop_seed) {
            Ok(events) => {
                info!("Placed {} props (seed {})", events.len(), config.prop_seed);
                placements.0 = events;
            }
            Err(e) => error!("Prop placement failed: {e}"),
        }
    }
}

/// Replace the surface entity whenever the terrain changes
fn spawn_terrain_surface(
    current: Res<CurrentTerrain>,
    preview: Res<NoisePreview>,
    surfaces: Query<Entity, With<TerrainSurface>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut commands: Commands,
) {
    if !current.is_changed() {
        return;
    }
    let Some(terrain) = current.0.as_ref() else {
        return;
    };

    for entity in surfaces.iter() {
        commands.entity(entity).despawn();
    }

    let surface = &terrain.mesh;
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());

    mesh.insert_attribute(
        Mesh::ATTRIBUTE_POSITION,
        VertexAttributeValues::Float32x3(surface.positions_array()),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_NORMAL,
        VertexAttributeValues::Float32x3(surface.normals_array()),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_UV_0,
        VertexAttributeValues::Float32x2(surface.uvs_array()),
    );
    mesh.insert_indices(Indices::U32(surface.indices.clone()));

    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.92, 1.0),
        perceptual_roughness: 0.9,
        metallic: 0.0,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(mesh)),
        MeshMaterial3d(material),
        Transform::default(),
        preview.surface_visibility(),
        TerrainSurface,
    ));
}
