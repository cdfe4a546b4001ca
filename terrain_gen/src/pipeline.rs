//! One full generation run: height field, surface mesh, props.

use bevy::prelude::*;

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::grid::HeightField;
use crate::mesh::{build_surface_mesh, SurfaceMesh};
use crate::noise_field::generate_height_field;
use crate::props::{place_props, PlacementEvent};

/// Every artifact produced by [`generate_terrain`].
#[derive(Debug, Clone)]
pub struct GeneratedTerrain {
    pub heights: HeightField,
    pub mesh: SurfaceMesh,
    pub placements: Vec<PlacementEvent>,
}

impl GeneratedTerrain {
    /// Number of placements per catalog entry, in catalog order.
    pub fn placement_counts(&self, catalog_len: usize) -> Vec<usize> {
        let mut counts = vec![0; catalog_len];
        for event in &self.placements {
            if let Some(slot) = counts.get_mut(event.prop) {
                *slot += 1;
            }
        }
        counts
    }
}

/// Run the whole pipeline for `config`.
///
/// The noise and prop settings are sanitized first. A zero map dimension
/// fails with [`TerrainError::InvalidDimensions`](crate::TerrainError::InvalidDimensions).
/// An empty prop catalog skips placement with a warning, since the terrain
/// itself is still useful.
pub fn generate_terrain(config: &GenerationConfig) -> Result<GeneratedTerrain> {
    let config = config.sanitized();
    let size = config.map_size;

    let heights = generate_height_field(size.width, size.height, &config.noise, config.algorithm)?;
    let mesh = build_surface_mesh(&heights, config.height_multiplier, &config.height_curve);

    let placements = if config.props.is_empty() {
        warn!("Prop catalog is empty, skipping placement");
        Vec::new()
    } else {
        place_props(&mesh.grid, &config.props, config.max_props, config.prop_seed)?
    };

    info!(
        "Generated {}x{} terrain ({:?}, seed {}): {} triangles, {} props",
        size.width,
        size.height,
        config.algorithm,
        config.noise.seed,
        mesh.triangle_count(),
        placements.len()
    );

    Ok(GeneratedTerrain {
        heights,
        mesh,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSize;
    use crate::error::TerrainError;
    use crate::noise_field::NoiseAlgorithm;

    #[test]
    fn test_pipeline_produces_consistent_artifacts() {
        let config = GenerationConfig {
            map_size: MapSize::new(60, 40),
            ..default()
        };
        let terrain = generate_terrain(&config).unwrap();

        assert_eq!(terrain.heights.width(), 60);
        assert_eq!(terrain.mesh.vertex_count(), 60 * 40);
        assert_eq!(terrain.mesh.indices.len(), 59 * 39 * 6);
        assert!(terrain.placements.len() <= config.max_props + 1);

        let counts = terrain.placement_counts(config.props.len());
        assert_eq!(counts.iter().sum::<usize>(), terrain.placements.len());
    }

    #[test]
    fn test_pipeline_is_reproducible() {
        let config = GenerationConfig {
            map_size: MapSize::new(40, 40),
            algorithm: NoiseAlgorithm::ClassicPerlin,
            prop_seed: 5,
            ..default()
        };
        let a = generate_terrain(&config).unwrap();
        let b = generate_terrain(&config).unwrap();
        assert_eq!(a.heights, b.heights);
        assert_eq!(a.mesh.grid, b.mesh.grid);
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_empty_catalog_skips_placement() {
        let config = GenerationConfig {
            map_size: MapSize::new(16, 16),
            props: Vec::new(),
            ..default()
        };
        let terrain = generate_terrain(&config).unwrap();
        assert!(terrain.placements.is_empty());
    }

    #[test]
    fn test_zero_map_size_is_rejected() {
        let config = GenerationConfig {
            map_size: MapSize::new(0, 3),
            ..default()
        };
        assert!(matches!(
            generate_terrain(&config),
            Err(TerrainError::InvalidDimensions { width: 0, height: 3 })
        ));
    }

    #[test]
    fn test_single_row_map_has_no_triangles() {
        let config = GenerationConfig {
            map_size: MapSize::new(1, 3),
            ..default()
        };
        let terrain = generate_terrain(&config).unwrap();
        assert_eq!(terrain.mesh.vertex_count(), 3);
        assert!(terrain.mesh.indices.is_empty());
        assert!(terrain.placements.is_empty());
    }
}
