//! Prop markers - one box per placement, sized to its footprint and tilted to the ground.

use bevy::light::NotShadowCaster;
use bevy::prelude::*;

use crate::preview::NoisePreview;
use crate::terrain::{CurrentPlacements, TerrainSettings};

/// Marker for prop entities, pointing back at the placement that produced it
#[derive(Component)]
pub struct PropMarker {
    pub sequence: usize,
}

/// Colors cycled by catalog index
const PROP_PALETTE: [Color; 6] = [
    Color::srgb(0.20, 0.55, 0.25),
    Color::srgb(0.45, 0.70, 0.30),
    Color::srgb(0.50, 0.48, 0.45),
    Color::srgb(0.70, 0.55, 0.30),
    Color::srgb(0.60, 0.30, 0.55),
    Color::srgb(0.30, 0.45, 0.70),
];

/// Box height relative to the widest footprint side
const MARKER_HEIGHT_RATIO: f32 = 1.5;

/// Plugin for prop markers
pub struct PropsPlugin;

impl Plugin for PropsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, sync_prop_markers);
    }
}

/// Respawn all markers whenever the placement list changes
fn sync_prop_markers(
    placements: Res<CurrentPlacements>,
    settings: Res<TerrainSettings>,
    preview: Res<NoisePreview>,
    markers: Query<Entity, With<PropMarker>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut commands: Commands,
) {
    if !placements.is_changed() {
        return;
    }

    for entity in markers.iter() {
        commands.entity(entity).despawn();
    }

    let catalog = &settings.0.props;
    let palette: Vec<Handle<StandardMaterial>> = (0..catalog.len())
        .map(|i| {
            materials.add(StandardMaterial {
                base_color: PROP_PALETTE[i % PROP_PALETTE.len()],
                perceptual_roughness: 0.8,
                ..default()
            })
        })
        .collect();

    for event in &placements.0 {
        let (Some(def), Some(material)) = (event.definition(catalog), palette.get(event.prop)) else {
            warn!("Placement {} refers to unknown prop {}", event.sequence, event.prop);
            continue;
        };

        let def = def.sanitized();
        let height = def.size[0].max(def.size[1]) * MARKER_HEIGHT_RATIO;
        let rotation = event.rotation();
        // Cuboids are centered, so lift by half the height along the ground normal
        let translation = event.position + event.normal * (height * 0.5);

        let mut entity = commands.spawn((
            PropMarker {
                sequence: event.sequence,
            },
            Mesh3d(meshes.add(Cuboid::new(def.size[0], height, def.size[1]))),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(translation).with_rotation(rotation),
            preview.surface_visibility(),
        ));

        // Small clutter stays out of the shadow cascades
        if height < 1.0 {
            entity.insert(NotShadowCaster);
        }
    }

    debug!("Spawned {} prop markers", placements.0.len());
}
