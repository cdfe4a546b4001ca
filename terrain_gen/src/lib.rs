//! Procedural terrain generation and prop placement.
//!
//! The pipeline has three stages, each a plain function of its inputs:
//!
//! 1. [`generate_height_field`] synthesizes a normalized height field from
//!    white noise or fractal Perlin noise.
//! 2. [`build_surface_mesh`] turns it into a centered triangle mesh with smooth
//!    normals.
//! 3. [`place_props`] scatters non-overlapping props over the mesh, gated by
//!    height and slope.
//!
//! [`generate_terrain`] runs all three from a [`GenerationConfig`].
//!
//! Grids are addressed `(column, row)` everywhere; see [`grid`].

pub mod config;
pub mod curve;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod noise_field;
pub mod pipeline;
pub mod props;

pub use config::{default_catalog, GenerationConfig, MapSize};
pub use curve::{HeightCurve, Keyframe, KeyframeCurve};
pub use error::{Result, TerrainError};
pub use grid::{Grid2, HeightField, OccupancyGrid};
pub use mesh::{build_surface_mesh, SurfaceMesh, VertexGrid};
pub use noise_field::{
    generate_fractal, generate_height_field, ClassicPerlin, NoiseAlgorithm, NoiseConfig, NoiseSource2D,
    ReferencePerlin,
};
pub use pipeline::{generate_terrain, GeneratedTerrain};
pub use props::{place_props, place_props_with_rng, PlacementEvent, PropDefinition, DEFAULT_MAX_PROPS};
