//! Height field to triangle mesh conversion.
//!
//! Vertices are laid out one per height field cell and centered on the origin in
//! the XZ plane. Row `y` runs towards -Z, so the top row of the map is the far
//! edge. Each grid cell becomes two triangles with a fixed winding whose face
//! normals point up (+Y) on flat ground.
//!
//! ```text
//!   i ____ i+1
//!    |\   |
//!    | \  |
//!    |  \ |
//! i+w|___\|i+w+1
//! ```

use bevy::prelude::*;

use crate::curve::HeightCurve;
use crate::error::Result;
use crate::grid::{Grid2, HeightField};

/// Vertex positions and UVs addressed by `(column, row)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGrid {
    positions: Grid2<Vec3>,
    uvs: Grid2<Vec2>,
    /// Vertical scale the positions were built with. Prop height ranges are
    /// fractions of this value.
    height_multiplier: f32,
}

impl VertexGrid {
    /// Wrap an existing position grid. UVs follow the standard
    /// `(x / width, y / height)` mapping for its size.
    pub fn new(positions: Grid2<Vec3>, height_multiplier: f32) -> Self {
        Self {
            uvs: default_uvs(positions.width(), positions.height()),
            positions,
            height_multiplier,
        }
    }

    /// Reshape a flat row-major vertex buffer (e.g. read back from a render mesh).
    ///
    /// UVs are regenerated with the standard `(x / width, y / height)` mapping.
    pub fn from_flat(
        width: usize,
        height: usize,
        positions: Vec<Vec3>,
        height_multiplier: f32,
    ) -> Result<Self> {
        let positions = Grid2::from_flat(width, height, positions)?;
        Ok(Self::new(positions, height_multiplier))
    }

    pub fn width(&self) -> usize {
        self.positions.width()
    }

    pub fn height(&self) -> usize {
        self.positions.height()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn height_multiplier(&self) -> f32 {
        self.height_multiplier
    }

    /// Position of the vertex at column `x`, row `y`.
    #[inline]
    pub fn position(&self, x: usize, y: usize) -> Vec3 {
        *self.positions.get(x, y)
    }

    #[inline]
    pub fn uv(&self, x: usize, y: usize) -> Vec2 {
        *self.uvs.get(x, y)
    }

    pub fn positions(&self) -> &Grid2<Vec3> {
        &self.positions
    }

    pub fn uvs(&self) -> &Grid2<Vec2> {
        &self.uvs
    }
}

fn default_uvs(width: usize, height: usize) -> Grid2<Vec2> {
    Grid2::from_fn(width, height, |x, y| {
        Vec2::new(x as f32 / width as f32, y as f32 / height as f32)
    })
}

/// Triangulated terrain surface ready for upload.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub grid: VertexGrid,
    /// Three indices per triangle, six per grid cell.
    pub indices: Vec<u32>,
    /// Smooth per-vertex normals, same order as the vertex grid.
    pub normals: Vec<Vec3>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.grid.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions_array(&self) -> Vec<[f32; 3]> {
        self.grid.positions().iter().map(|p| p.to_array()).collect()
    }

    pub fn normals_array(&self) -> Vec<[f32; 3]> {
        self.normals.iter().map(|n| n.to_array()).collect()
    }

    pub fn uvs_array(&self) -> Vec<[f32; 2]> {
        self.grid.uvs().iter().map(|uv| uv.to_array()).collect()
    }
}

/// Build the terrain mesh for `heights`.
///
/// Vertex height is `h * height_multiplier * curve(h)` where `h` is the
/// normalized height of that cell.
pub fn build_surface_mesh(
    heights: &HeightField,
    height_multiplier: f32,
    curve: &(impl HeightCurve + ?Sized),
) -> SurfaceMesh {
    let width = heights.width();
    let height = heights.height();

    // Shift so the mesh is centered on the origin
    let top_left_x = (width as f32 - 1.0) / -2.0;
    let top_left_z = (height as f32 - 1.0) / 2.0;

    let positions = Grid2::from_fn(width, height, |x, y| {
        let h = heights.get(x, y);
        Vec3::new(
            top_left_x + x as f32,
            h * height_multiplier * curve.evaluate(h),
            top_left_z - y as f32,
        )
    });

    let indices = triangulate(width, height);
    let normals = recompute_normals(positions.as_slice(), &indices);

    debug!(
        "Built surface mesh: {} vertices, {} triangles",
        positions.len(),
        indices.len() / 3
    );

    SurfaceMesh {
        grid: VertexGrid {
            uvs: default_uvs(width, height),
            positions,
            height_multiplier,
        },
        indices,
        normals,
    }
}

/// Index buffer for a `width` x `height` vertex grid.
pub fn triangulate(width: usize, height: usize) -> Vec<u32> {
    let cells = width.saturating_sub(1) * height.saturating_sub(1);
    let mut indices = Vec::with_capacity(cells * 6);

    // Vertices on the right and bottom edge don't start any cell
    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let i = (y * width + x) as u32;
            let w = width as u32;

            indices.extend_from_slice(&[i, i + w + 1, i + w]);
            indices.extend_from_slice(&[i + w + 1, i, i + 1]);
        }
    }

    indices
}

/// Smooth vertex normals from a triangle list.
///
/// Each face contributes its unnormalized cross product, so larger faces weigh
/// more. Vertices that belong to no face point straight up.
pub fn recompute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = face_normal(positions[a], positions[b], positions[c]);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }

    sums.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

/// Unnormalized normal of triangle `(a, b, c)`; its length is twice the area.
#[inline]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::KeyframeCurve;
    use crate::noise_field::{generate_height_field, NoiseAlgorithm, NoiseConfig};

    fn flat_mesh(width: usize, height: usize) -> SurfaceMesh {
        build_surface_mesh(&HeightField::flat(width, height, 0.0).unwrap(), 1.0, &KeyframeCurve::default())
    }

    #[test]
    fn test_mesh_size_invariants() {
        for (w, h) in [(4, 4), (7, 3), (2, 9), (1, 5)] {
            let mesh = flat_mesh(w, h);
            assert_eq!(mesh.vertex_count(), w * h);
            assert_eq!(mesh.normals.len(), w * h);
            assert_eq!(mesh.indices.len(), (w - 1) * (h - 1) * 6);
            assert!(mesh.indices.iter().all(|&i| (i as usize) < w * h));
        }
    }

    #[test]
    fn test_four_by_four_example() {
        let mesh = flat_mesh(4, 4);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.indices.len(), 54);
        assert_eq!(&mesh.indices[..6], &[0, 5, 4, 5, 0, 1]);
    }

    #[test]
    fn test_flat_field_normals_point_up() {
        let mesh = flat_mesh(6, 5);
        let positions = mesh.grid.positions().as_slice();

        for tri in mesh.indices.chunks_exact(3) {
            let n = face_normal(
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            );
            // All vertices share y = 0, so every face is coplanar and faces up
            assert!(n.y > 0.0);
            assert!(n.x.abs() < 1e-6 && n.z.abs() < 1e-6);
        }

        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-5, "normal {n:?}");
        }
    }

    #[test]
    fn test_vertices_are_centered() {
        let mesh = flat_mesh(5, 3);
        assert_eq!(mesh.grid.position(0, 0), Vec3::new(-2.0, 0.0, 1.0));
        assert_eq!(mesh.grid.position(4, 2), Vec3::new(2.0, 0.0, -1.0));
        assert_eq!(mesh.grid.uv(4, 2), Vec2::new(0.8, 2.0 / 3.0));
    }

    #[test]
    fn test_height_uses_multiplier_and_curve() {
        let heights = HeightField::flat(3, 3, 0.5).unwrap();
        let mesh = build_surface_mesh(&heights, 10.0, &|t: f32| t * 2.0);
        // 0.5 * 10 * curve(0.5) = 0.5 * 10 * 1.0
        assert!((mesh.grid.position(1, 1).y - 5.0).abs() < 1e-6);
        assert_eq!(mesh.grid.height_multiplier(), 10.0);
    }

    #[test]
    fn test_sloped_normals_lean_downhill() {
        // Height grows with x, so normals should lean towards -X
        let grid = Grid2::from_fn(5, 5, |x, _| x as f32 / 4.0);
        let mesh = build_surface_mesh(&HeightField::from_normalized(grid).unwrap(), 4.0, &|_: f32| 1.0);
        for n in &mesh.normals {
            assert!(n.x < 0.0 && n.y > 0.0, "normal {n:?}");
        }
    }

    #[test]
    fn test_noise_mesh_indices_in_range() {
        let config = NoiseConfig {
            seed: 3,
            ..NoiseConfig::default()
        };
        let heights = generate_height_field(17, 11, &config, NoiseAlgorithm::ReferencePerlin).unwrap();
        let mesh = build_surface_mesh(&heights, 20.0, &KeyframeCurve::default());
        assert_eq!(mesh.triangle_count(), 16 * 10 * 2);
        assert!(mesh.normals.iter().all(|n| (n.length() - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_from_flat_round_trips_positions() {
        let mesh = flat_mesh(3, 2);
        let flat: Vec<Vec3> = mesh.grid.positions().iter().copied().collect();
        let grid = VertexGrid::from_flat(3, 2, flat, 1.0).unwrap();
        assert_eq!(grid, mesh.grid);
        assert!(VertexGrid::from_flat(3, 3, vec![Vec3::ZERO; 4], 1.0).is_err());
    }

    #[test]
    fn test_new_derives_uvs_from_positions() {
        let positions = Grid2::from_fn(4, 2, |x, y| Vec3::new(x as f32, 0.0, -(y as f32)));
        let grid = VertexGrid::new(positions, 3.0);
        assert_eq!(grid.uvs().width(), 4);
        assert_eq!(grid.uvs().height(), 2);
        assert_eq!(grid.uv(2, 1), Vec2::new(0.5, 0.5));
        assert_eq!(grid.height_multiplier(), 3.0);
    }
}
