//! Prop placement on the terrain surface.
//!
//! Placement walks the interior cells of the vertex grid in row-major order.
//! For each free cell it visits the prop catalog once, starting at a random
//! definition, and places the first prop whose chance roll, footprint, height
//! and slope checks all pass. Every cell of a placed footprint is then marked
//! in an occupancy grid so footprints never overlap.
//!
//! A candidate is also rejected when any cell of its footprint is already
//! claimed, not just its origin cell; this check draws no random values.
//!
//! The same generator handle drives every random draw, in a fixed order:
//! one start index per visited cell, then one chance roll per visited
//! definition.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::grid::OccupancyGrid;
use crate::mesh::VertexGrid;

/// Smallest footprint edge accepted by [`PropDefinition::sanitized`].
pub const MIN_PROP_SIZE: f32 = 0.01;

/// Default prop cap per placement pass.
pub const DEFAULT_MAX_PROPS: usize = 500;

/// Describes one kind of prop and where it is allowed to go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    pub name: String,
    /// Footprint in the XZ plane, in grid cells. Rounded up when placing.
    pub size: [f32; 2],
    /// Probability of placing this prop at any viable cell, 0..=1.
    pub chance: f32,
    /// Lowest allowed center height as a fraction of the height multiplier.
    pub min_height: f32,
    /// Highest allowed center height as a fraction of the height multiplier.
    pub max_height: f32,
    /// Flattest allowed slope in degrees from vertical up.
    pub min_angle: f32,
    /// Steepest allowed slope in degrees.
    pub max_angle: f32,
}

impl PropDefinition {
    pub fn new(name: impl Into<String>, size: [f32; 2], chance: f32) -> Self {
        Self {
            name: name.into(),
            size,
            chance,
            min_height: 0.0,
            max_height: 1.0,
            min_angle: 0.0,
            max_angle: 360.0,
        }
    }

    pub fn with_height_range(mut self, min: f32, max: f32) -> Self {
        self.min_height = min;
        self.max_height = max;
        self
    }

    pub fn with_angle_range(mut self, min: f32, max: f32) -> Self {
        self.min_angle = min;
        self.max_angle = max;
        self
    }

    /// Copy with the footprint clamped to at least [`MIN_PROP_SIZE`] per axis
    /// and the chance clamped to `0..=1`. A NaN chance never places.
    pub fn sanitized(&self) -> Self {
        Self {
            size: [self.size[0].max(MIN_PROP_SIZE), self.size[1].max(MIN_PROP_SIZE)],
            chance: if self.chance.is_nan() { 0.0 } else { self.chance.clamp(0.0, 1.0) },
            ..self.clone()
        }
    }

    /// Footprint in whole cells, each axis rounded up.
    pub fn cell_size(&self) -> UVec2 {
        UVec2::new(
            (self.size[0].ceil() as u32).max(1),
            (self.size[1].ceil() as u32).max(1),
        )
    }

    /// Allowed world-space center heights for a surface built with `height_multiplier`.
    pub fn height_range(&self, height_multiplier: f32) -> InclusiveRange {
        InclusiveRange::new(
            self.min_height * height_multiplier,
            self.max_height * height_multiplier,
        )
    }

    /// Allowed slope angles in degrees.
    pub fn angle_range(&self) -> InclusiveRange {
        InclusiveRange::new(self.min_angle, self.max_angle)
    }
}

/// Closed interval whose bounds may be given in either order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclusiveRange {
    pub min: f32,
    pub max: f32,
}

impl InclusiveRange {
    pub fn new(a: f32, b: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A prop accepted by the placer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementEvent {
    /// Index of the placed definition in the catalog.
    pub prop: usize,
    /// World-space center of the footprint, on the surface.
    pub position: Vec3,
    /// Unit surface normal at the center; the prop's up axis.
    pub normal: Vec3,
    /// Running prop count when this event was emitted.
    pub sequence: usize,
    /// Grid cell (column, row) where the footprint starts.
    pub cell: UVec2,
    /// Footprint size in cells.
    pub footprint: UVec2,
}

impl PlacementEvent {
    /// Look up the placed definition.
    pub fn definition<'a>(&self, catalog: &'a [PropDefinition]) -> Option<&'a PropDefinition> {
        catalog.get(self.prop)
    }

    /// Rotation that turns +Y into the surface normal.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_arc(Vec3::Y, self.normal)
    }

    /// True if the two footprints share at least one cell.
    pub fn overlaps(&self, other: &PlacementEvent) -> bool {
        let a_min = self.cell;
        let a_max = self.cell + self.footprint;
        let b_min = other.cell;
        let b_max = other.cell + other.footprint;
        a_min.x < b_max.x && b_min.x < a_max.x && a_min.y < b_max.y && b_min.y < a_max.y
    }
}

/// Place props with a generator seeded from `seed`.
pub fn place_props(
    grid: &VertexGrid,
    catalog: &[PropDefinition],
    max_props: usize,
    seed: u64,
) -> Result<Vec<PlacementEvent>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    place_props_with_rng(grid, catalog, max_props, &mut rng)
}

/// Place props drawing every random value from `rng`.
///
/// The pass stops once the running count exceeds `max_props`, so up to
/// `max_props + 1` events can be returned.
pub fn place_props_with_rng(
    grid: &VertexGrid,
    catalog: &[PropDefinition],
    max_props: usize,
    rng: &mut impl Rng,
) -> Result<Vec<PlacementEvent>> {
    if catalog.is_empty() {
        return Err(TerrainError::EmptyPropCatalog);
    }

    let map_width = grid.width();
    let map_height = grid.height();
    let height_multiplier = grid.height_multiplier();

    let mut occupancy = OccupancyGrid::filled(
        map_width.saturating_sub(1),
        map_height.saturating_sub(1),
        false,
    );
    let mut events = Vec::new();
    let mut count = 0usize;

    // Skip the outer ring so footprints never hang over the map edge
    'rows: for y in 1..map_height.saturating_sub(1) {
        if count > max_props {
            break;
        }

        for x in 1..map_width.saturating_sub(1) {
            if count > max_props {
                break 'rows;
            }

            if *occupancy.get(x, y) {
                continue;
            }

            // Random start so early catalog entries don't claim every good cell
            let start = rng.gen_range(0..catalog.len());

            for visited in 0..catalog.len() {
                let index = (start + visited) % catalog.len();
                let prop = &catalog[index];

                if rng.gen::<f32>() >= prop.chance {
                    continue;
                }

                let footprint = prop.cell_size();
                let (fx, fy) = (footprint.x as usize, footprint.y as usize);
                if x + fx >= map_width || y + fy >= map_height {
                    continue;
                }

                // The origin cell is free, but a wide footprint can still reach
                // into a neighbour placed earlier in this row or the row above
                if !footprint_is_free(&occupancy, x, y, fx, fy) {
                    continue;
                }

                let center = footprint_center(grid, x, y, fx, fy);
                if !prop.height_range(height_multiplier).contains(center.y) {
                    continue;
                }

                let normal = footprint_normal(grid, x, y, fx, fy);
                if !prop.angle_range().contains(slope_degrees(normal)) {
                    continue;
                }

                events.push(PlacementEvent {
                    prop: index,
                    position: center,
                    normal: normal.try_normalize().unwrap_or(Vec3::Y),
                    sequence: count,
                    cell: UVec2::new(x as u32, y as u32),
                    footprint,
                });
                mark_occupied(&mut occupancy, x, y, fx, fy);
                count += 1;
                break;
            }
        }
    }

    debug!(
        "Placed {} props over a {}x{} grid ({} definitions, limit {})",
        events.len(),
        map_width,
        map_height,
        catalog.len(),
        max_props
    );

    Ok(events)
}

fn footprint_is_free(occupancy: &OccupancyGrid, x: usize, y: usize, size_x: usize, size_y: usize) -> bool {
    (0..size_y).all(|cy| (0..size_x).all(|cx| !*occupancy.get(x + cx, y + cy)))
}

fn mark_occupied(occupancy: &mut OccupancyGrid, x: usize, y: usize, size_x: usize, size_y: usize) {
    for cy in 0..size_y {
        for cx in 0..size_x {
            occupancy.set(x + cx, y + cy, true);
        }
    }
}

/// Surface point at the middle of the footprint starting at `(x, y)`.
pub fn footprint_center(grid: &VertexGrid, x: usize, y: usize, size_x: usize, size_y: usize) -> Vec3 {
    bilerp_to_center(
        grid.position(x, y),
        grid.position(x + size_x, y),
        grid.position(x, y + size_y),
        grid.position(x + size_x, y + size_y),
    )
}

/// Estimated surface normal at the middle of the footprint starting at `(x, y)`.
///
/// Uses the vertex nearest the footprint center and its four axis neighbours:
/// one triangle normal per adjacent pair, averaged. The result is not normalized.
pub fn footprint_normal(grid: &VertexGrid, x: usize, y: usize, size_x: usize, size_y: usize) -> Vec3 {
    let cx = x + size_x / 2;
    let cy = y + size_y / 2;

    let center = grid.position(cx, cy);
    let left = grid.position(cx - 1, cy);
    let right = grid.position(cx + 1, cy);
    let ahead = grid.position(cx, cy + 1);
    let behind = grid.position(cx, cy - 1);

    let n_al = unit_normal(center, ahead, left);
    let n_lb = unit_normal(center, left, behind);
    let n_br = unit_normal(center, behind, right);
    let n_ra = unit_normal(center, right, ahead);

    bilerp_to_center(n_al, n_lb, n_br, n_ra)
}

#[inline]
fn unit_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Average of the midpoints of the bottom and top edges of a quad.
#[inline]
pub fn bilerp_to_center(bottom_left: Vec3, bottom_right: Vec3, top_left: Vec3, top_right: Vec3) -> Vec3 {
    bottom_left
        .lerp(bottom_right, 0.5)
        .lerp(top_left.lerp(top_right, 0.5), 0.5)
}

/// Angle between `normal` and world up, in degrees. Zero vectors count as flat.
pub fn slope_degrees(normal: Vec3) -> f32 {
    match normal.try_normalize() {
        Some(n) => n.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees(),
        None => 0.0,
    }
}
