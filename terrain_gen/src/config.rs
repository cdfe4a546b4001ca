//! Generation settings loaded from RON.
//!
//! ```ron
//! (
//!     map_size: (width: 120, height: 120),
//!     algorithm: ReferencePerlin,
//!     noise: (seed: 7, scale: 30.0, octaves: 4),
//!     height_multiplier: 20.0,
//!     props: [
//!         (name: "tree", size: (2.0, 2.0), chance: 0.1,
//!          min_height: 0.2, max_height: 0.7, min_angle: 0.0, max_angle: 30.0),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curve::KeyframeCurve;
use crate::error::{Result, TerrainError};
use crate::noise_field::{NoiseAlgorithm, NoiseConfig};
use crate::props::{PropDefinition, DEFAULT_MAX_PROPS};

/// Map dimensions in vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: usize,
    pub height: usize,
}

impl MapSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Default for MapSize {
    fn default() -> Self {
        Self::new(250, 250)
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub map_size: MapSize,
    pub algorithm: NoiseAlgorithm,
    pub noise: NoiseConfig,
    pub height_multiplier: f32,
    pub height_curve: KeyframeCurve,
    pub props: Vec<PropDefinition>,
    pub max_props: usize,
    pub prop_seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            map_size: MapSize::default(),
            algorithm: NoiseAlgorithm::default(),
            noise: NoiseConfig::default(),
            height_multiplier: 25.0,
            height_curve: KeyframeCurve::default(),
            props: default_catalog(),
            max_props: DEFAULT_MAX_PROPS,
            prop_seed: 0,
        }
    }
}

/// A small catalog covering lowlands, slopes and peaks.
pub fn default_catalog() -> Vec<PropDefinition> {
    vec![
        PropDefinition::new("tree", [2.0, 2.0], 0.08)
            .with_height_range(0.05, 0.6)
            .with_angle_range(0.0, 30.0),
        PropDefinition::new("bush", [1.0, 1.0], 0.05)
            .with_height_range(0.02, 0.5)
            .with_angle_range(0.0, 40.0),
        PropDefinition::new("rock", [1.5, 1.5], 0.03)
            .with_height_range(0.3, 1.0)
            .with_angle_range(10.0, 70.0),
    ]
}

impl GenerationConfig {
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Copy with the noise and prop fields clamped into their valid ranges.
    ///
    /// The map size is left alone; a zero dimension is a caller error reported
    /// by generation.
    pub fn sanitized(&self) -> Self {
        Self {
            noise: self.noise.sanitized(),
            props: self.props.iter().map(PropDefinition::sanitized).collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = GenerationConfig::from_ron_str(
            r#"(
                map_size: (width: 64, height: 32),
                algorithm: ClassicPerlin,
                noise: (seed: 9, octaves: 3),
                height_multiplier: 12.0,
                height_curve: [(time: 0.0, value: 0.0), (time: 1.0, value: 2.0)],
                props: [
                    (name: "fern", size: (1.0, 1.0), chance: 0.5,
                     min_height: 0.0, max_height: 0.5, min_angle: 0.0, max_angle: 25.0),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(config.map_size, MapSize::new(64, 32));
        assert_eq!(config.algorithm, NoiseAlgorithm::ClassicPerlin);
        assert_eq!(config.noise.seed, 9);
        assert_eq!(config.noise.octaves, 3);
        // Unspecified fields fall back to defaults
        assert_eq!(config.noise.lacunarity, 2.0);
        assert_eq!(config.max_props, DEFAULT_MAX_PROPS);
        assert_eq!(config.height_curve.keys().len(), 2);
        assert_eq!(config.props[0].name, "fern");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = GenerationConfig::from_ron_str("(map_size: oops)").unwrap_err();
        assert!(matches!(err, TerrainError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = GenerationConfig::load("definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, TerrainError::ConfigRead { .. }));
    }

    #[test]
    fn test_sanitized_clamps_noise_and_props() {
        let mut config = GenerationConfig::default();
        config.map_size = MapSize::new(0, 0);
        config.noise.scale = 0.5;
        config.props = vec![PropDefinition::new("speck", [0.0, 0.0], 2.0)];

        let clean = config.sanitized();
        assert_eq!(clean.map_size, MapSize::new(0, 0));
        assert_eq!(clean.noise.scale, 1.0);
        assert_eq!(clean.props[0].chance, 1.0);
        assert!(clean.props[0].size[0] > 0.0);
    }

    #[test]
    fn test_round_trip_default_config() {
        let config = GenerationConfig::default();
        let text = ron::to_string(&config).unwrap();
        assert_eq!(GenerationConfig::from_ron_str(&text).unwrap(), config);
    }
}
