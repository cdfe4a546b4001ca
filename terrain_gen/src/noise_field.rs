//! Height field synthesis: uniform white noise and multi-octave fractal Perlin noise.
//!
//! The coherent noise function is pluggable through [`NoiseSource2D`] so two
//! Perlin implementations can be swapped and compared on identical inputs.

use bevy::prelude::*;
use ::noise::{NoiseFn, Perlin};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::{check_dimensions, Grid2, HeightField};

/// Maximum octave count accepted by [`NoiseConfig::sanitized`].
pub const MAX_OCTAVES: u32 = 10;

/// Per-octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
pub const OCTAVE_OFFSET_RANGE: i32 = 10_000;

/// Fractal noise parameters. Immutable for the duration of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: u64,
    /// Feature size in cells. Values below 1 are clamped to 1.
    pub scale: f32,
    /// Number of layers, 0..=10.
    pub octaves: u32,
    /// Amplitude decay per octave, 0..=1.
    pub persistence: f32,
    /// Frequency growth per octave, 1..=8.
    pub lacunarity: f32,
    /// Global sample offset added to every octave.
    pub offset: [f32; 2],
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 30.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0, 0.0],
        }
    }
}

impl NoiseConfig {
    /// Copy of this config with every field clamped into its valid range.
    pub fn sanitized(&self) -> Self {
        Self {
            seed: self.seed,
            scale: if self.scale.is_nan() { 1.0 } else { self.scale.max(1.0) },
            octaves: self.octaves.min(MAX_OCTAVES),
            persistence: self.persistence.clamp(0.0, 1.0),
            lacunarity: self.lacunarity.clamp(1.0, 8.0),
            offset: self.offset,
        }
    }
}

/// Which generator fills the height field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoiseAlgorithm {
    /// Independent uniform samples, no spatial coherence.
    White,
    /// Fractal noise over the `noise` crate's Perlin implementation.
    #[default]
    ReferencePerlin,
    /// Fractal noise over the in-crate [`ClassicPerlin`].
    ClassicPerlin,
}

impl NoiseAlgorithm {
    pub const ALL: [NoiseAlgorithm; 3] = [
        NoiseAlgorithm::White,
        NoiseAlgorithm::ReferencePerlin,
        NoiseAlgorithm::ClassicPerlin,
    ];

    /// The next algorithm in [`NoiseAlgorithm::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// A 2-D coherent noise function returning values roughly in `[0, 1]`.
pub trait NoiseSource2D {
    fn sample(&self, x: f32, y: f32) -> f32;
}

impl<F: Fn(f32, f32) -> f32> NoiseSource2D for F {
    fn sample(&self, x: f32, y: f32) -> f32 {
        self(x, y)
    }
}

/// Perlin noise from the `noise` crate, remapped from `[-1, 1]` to `[0, 1]`.
pub struct ReferencePerlin {
    perlin: Perlin,
}

impl ReferencePerlin {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl NoiseSource2D for ReferencePerlin {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let v = self.perlin.get([x as f64, y as f64]) as f32;
        (v * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

/// Improved Perlin noise over a seeded permutation table.
///
/// Lattice points always sample to exactly 0.5.
pub struct ClassicPerlin {
    perm: [u8; 512],
}

impl ClassicPerlin {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255u8).collect();
        table.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn hash(&self, x: usize, y: usize) -> u8 {
        self.perm[self.perm[x] as usize + y]
    }

    /// Raw noise in roughly `[-1, 1]`.
    pub fn noise(&self, x: f32, y: f32) -> f32 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let dx = x - xf;
        let dy = y - yf;

        let u = fade(dx);
        let v = fade(dy);

        let aa = grad(self.hash(xi, yi), dx, dy);
        let ba = grad(self.hash(xi + 1, yi), dx - 1.0, dy);
        let ab = grad(self.hash(xi, yi + 1), dx, dy - 1.0);
        let bb = grad(self.hash(xi + 1, yi + 1), dx - 1.0, dy - 1.0);

        lerp(lerp(aa, ba, u), lerp(ab, bb, u), v)
    }
}

impl NoiseSource2D for ClassicPerlin {
    fn sample(&self, x: f32, y: f32) -> f32 {
        (self.noise(x, y) * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Dot product with one of eight gradient directions picked by the hash.
#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

impl HeightField {
    /// Fill every cell with an independent uniform sample in `[0, 1)`, then normalize.
    pub fn uniform(width: usize, height: usize, rng: &mut impl Rng) -> Result<Self> {
        check_dimensions(width, height)?;
        let raw = Grid2::from_fn(width, height, |_, _| rng.gen::<f32>());
        Self::from_raw(raw)
    }
}

/// Multi-octave fractal noise over `source`, normalized to `[0, 1]`.
///
/// The config is sanitized first, so a scale below 1 behaves as 1. Zero
/// octaves produce an all-zero field.
pub fn generate_fractal(
    width: usize,
    height: usize,
    config: &NoiseConfig,
    source: &impl NoiseSource2D,
) -> Result<HeightField> {
    check_dimensions(width, height)?;
    let config = config.sanitized();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let offsets: Vec<Vec2> = (0..config.octaves)
        .map(|_| {
            let ox = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + config.offset[0];
            let oy = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) as f32 + config.offset[1];
            Vec2::new(ox, oy)
        })
        .collect();

    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;

    let raw = Grid2::from_fn(width, height, |x, y| {
        let cx = x as f32 - half_w;
        let cy = y as f32 - half_h;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut value = 0.0;

        for offset in &offsets {
            let sample_x = cx / config.scale * frequency + offset.x;
            let sample_y = cy / config.scale * frequency + offset.y;
            value += source.sample(sample_x, sample_y) * amplitude;

            amplitude *= config.persistence;
            frequency *= config.lacunarity;
        }

        value
    });

    HeightField::from_raw(raw)
}

/// Generate a height field with the selected algorithm.
///
/// Every algorithm is seeded from `config.seed`, so identical arguments always
/// give bit-identical fields.
pub fn generate_height_field(
    width: usize,
    height: usize,
    config: &NoiseConfig,
    algorithm: NoiseAlgorithm,
) -> Result<HeightField> {
    debug!("Generating {width}x{height} height field with {algorithm:?}");

    match algorithm {
        NoiseAlgorithm::White => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            HeightField::uniform(width, height, &mut rng)
        }
        NoiseAlgorithm::ReferencePerlin => {
            // noise::Perlin takes a 32-bit seed; fold the high half in.
            let seed = (config.seed ^ (config.seed >> 32)) as u32;
            generate_fractal(width, height, config, &ReferencePerlin::new(seed))
        }
        NoiseAlgorithm::ClassicPerlin => {
            generate_fractal(width, height, config, &ClassicPerlin::new(config.seed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerrainError;

    fn assert_normalized(field: &HeightField) {
        let (min, max) = field.min_max();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_fractal_is_normalized() {
        let config = NoiseConfig {
            seed: 7,
            ..default()
        };
        for algorithm in NoiseAlgorithm::ALL {
            let field = generate_height_field(48, 32, &config, algorithm).unwrap();
            assert_eq!(field.width(), 48);
            assert_eq!(field.height(), 32);
            assert_normalized(&field);
        }
    }

    #[test]
    fn test_same_inputs_give_identical_fields() {
        let config = NoiseConfig {
            seed: 1234,
            scale: 12.5,
            octaves: 5,
            ..default()
        };
        for algorithm in NoiseAlgorithm::ALL {
            let a = generate_height_field(40, 40, &config, algorithm).unwrap();
            let b = generate_height_field(40, 40, &config, algorithm).unwrap();
            assert_eq!(a, b, "{algorithm:?} is not reproducible");
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_height_field(32, 32, &NoiseConfig { seed: 1, ..default() }, NoiseAlgorithm::ClassicPerlin)
            .unwrap();
        let b = generate_height_field(32, 32, &NoiseConfig { seed: 2, ..default() }, NoiseAlgorithm::ClassicPerlin)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_octaves_is_flat_zero() {
        let config = NoiseConfig {
            octaves: 0,
            ..default()
        };
        let field = generate_height_field(16, 16, &config, NoiseAlgorithm::ReferencePerlin).unwrap();
        assert!(field.grid().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_scale_below_one_is_clamped() {
        let tiny = NoiseConfig {
            scale: 0.01,
            ..default()
        };
        let one = NoiseConfig {
            scale: 1.0,
            ..default()
        };
        let a = generate_height_field(20, 20, &tiny, NoiseAlgorithm::ClassicPerlin).unwrap();
        let b = generate_height_field(20, 20, &one, NoiseAlgorithm::ClassicPerlin).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sanitized_clamps_ranges() {
        let config = NoiseConfig {
            scale: -4.0,
            octaves: 99,
            persistence: 3.0,
            lacunarity: 0.2,
            ..default()
        }
        .sanitized();
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.octaves, MAX_OCTAVES);
        assert_eq!(config.persistence, 1.0);
        assert_eq!(config.lacunarity, 1.0);
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        let config = NoiseConfig::default();
        assert!(matches!(
            generate_height_field(0, 10, &config, NoiseAlgorithm::White),
            Err(TerrainError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(generate_height_field(10, 0, &config, NoiseAlgorithm::ReferencePerlin).is_err());
    }

    #[test]
    fn test_single_cell_field_is_zero() {
        let field = generate_height_field(1, 1, &NoiseConfig::default(), NoiseAlgorithm::White).unwrap();
        assert_eq!(field.get(0, 0), 0.0);
    }

    #[test]
    fn test_uniform_uses_supplied_generator() {
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        let fa = HeightField::uniform(10, 10, &mut a).unwrap();
        let fb = HeightField::uniform(10, 10, &mut b).unwrap();
        assert_eq!(fa, fb);
        assert_normalized(&fa);
    }

    #[test]
    fn test_classic_perlin_lattice_and_range() {
        let perlin = ClassicPerlin::new(42);
        assert_eq!(perlin.sample(3.0, -7.0), 0.5);
        for i in 0..200 {
            let x = i as f32 * 0.173 - 12.0;
            let y = i as f32 * 0.091 + 4.0;
            let v = perlin.sample(x, y);
            assert!((0.0..=1.0).contains(&v), "sample {v} out of range");
        }
    }

    #[test]
    fn test_pluggable_source() {
        // A closure backend that only depends on x produces a field that is
        // constant along each column.
        let source = |x: f32, _y: f32| x.sin();
        let field = generate_fractal(8, 6, &NoiseConfig::default(), &source).unwrap();
        for x in 0..8 {
            for y in 1..6 {
                assert_eq!(field.get(x, y), field.get(x, 0));
            }
        }
    }

    #[test]
    fn test_algorithm_cycle() {
        assert_eq!(NoiseAlgorithm::White.next(), NoiseAlgorithm::ReferencePerlin);
        assert_eq!(NoiseAlgorithm::ClassicPerlin.next(), NoiseAlgorithm::White);
    }
}
