//! Noise map preview - the raw height field drawn as a flat grayscale texture.
//!
//! While the preview is on, the lit surface and prop markers are hidden.

use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::mesh::{Indices, VertexAttributeValues};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, PrimitiveTopology, TextureDimension, TextureFormat};

use terrain_gen::HeightField;

use crate::props::PropMarker;
use crate::terrain::{CurrentTerrain, TerrainSurface};

/// Whether the noise map is shown instead of the surface
#[derive(Resource, Default)]
pub struct NoisePreview {
    pub enabled: bool,
}

impl NoisePreview {
    /// Visibility for the lit surface and props
    pub fn surface_visibility(&self) -> Visibility {
        if self.enabled {
            Visibility::Hidden
        } else {
            Visibility::Inherited
        }
    }

    fn preview_visibility(&self) -> Visibility {
        if self.enabled {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        }
    }
}

/// Marker for the preview plane
#[derive(Component)]
pub struct NoisePreviewPlane;

/// Plugin for the grayscale noise preview
pub struct NoisePreviewPlugin;

impl Plugin for NoisePreviewPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NoisePreview>();
        app.add_systems(Update, (toggle_preview, rebuild_preview_plane, apply_preview_visibility).chain());
    }
}

fn toggle_preview(keyboard: Res<ButtonInput<KeyCode>>, mut preview: ResMut<NoisePreview>) {
    if keyboard.just_pressed(KeyCode::KeyM) {
        preview.enabled = !preview.enabled;
        info!("Noise preview {}", if preview.enabled { "on" } else { "off" });
    }
}

/// Pixels map 1:1 onto cells, with row 0 at the top of the image
fn noise_image(heights: &HeightField) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: heights.width() as u32,
            height: heights.height() as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        heights.to_grayscale_rgba(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    image.sampler = ImageSampler::nearest();
    image
}

/// Rebuild the preview plane whenever the terrain changes.
///
/// The plane reuses the surface layout flattened to y = 0, so the texture lines
/// up with the mesh cell for cell.
fn rebuild_preview_plane(
    current: Res<CurrentTerrain>,
    preview: Res<NoisePreview>,
    planes: Query<Entity, With<NoisePreviewPlane>>,
    mut images: ResMut<Assets<Image>>,
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

    for entity in planes.iter() {
        commands.entity(entity).despawn();
    }

    let surface = &terrain.mesh;
    let flat: Vec<[f32; 3]> = surface
        .grid
        .positions()
        .iter()
        .map(|p| [p.x, 0.0, p.z])
        .collect();
    let normals = vec![[0.0, 1.0, 0.0]; flat.len()];

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, VertexAttributeValues::Float32x3(flat));
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, VertexAttributeValues::Float32x3(normals));
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_UV_0,
        VertexAttributeValues::Float32x2(surface.uvs_array()),
    );
    mesh.insert_indices(Indices::U32(surface.indices.clone()));

    let texture = images.add(noise_image(&terrain.heights));
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(texture),
        unlit: true,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(mesh)),
        MeshMaterial3d(material),
        Transform::default(),
        preview.preview_visibility(),
        NoisePreviewPlane,
    ));
}

fn apply_preview_visibility(
    preview: Res<NoisePreview>,
    mut surfaces: Query<&mut Visibility, (Or<(With<TerrainSurface>, With<PropMarker>)>, Without<NoisePreviewPlane>)>,
    mut planes: Query<&mut Visibility, With<NoisePreviewPlane>>,
) {
    if !preview.is_changed() {
        return;
    }

    for mut visibility in surfaces.iter_mut() {
        *visibility = preview.surface_visibility();
    }
    for mut visibility in planes.iter_mut() {
        *visibility = preview.preview_visibility();
    }
}
