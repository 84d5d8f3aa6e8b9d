//! End-to-end rasterization of a closed surface.

use approx::assert_relative_eq;
use mesh_levelset::{compute_levelset, DenseGrid, LevelsetParams};
use mesh_topology::{Node, Tri, TriMesh};

/// Axis-aligned cube from `(lo, lo, lo)` to `(hi, hi, hi)`, outward-facing
/// windings.
fn cube(lo: f32, hi: f32) -> TriMesh {
    let mut mesh = TriMesh::new();
    let corners = [
        [lo, lo, lo],
        [hi, lo, lo],
        [hi, hi, lo],
        [lo, hi, lo],
        [lo, lo, hi],
        [hi, lo, hi],
        [hi, hi, hi],
        [lo, hi, hi],
    ];
    for [x, y, z] in corners {
        mesh.add_node(Node::from_coords(x, y, z));
    }
    let faces = [
        [0, 2, 1],
        [0, 3, 2], // bottom
        [4, 5, 6],
        [4, 6, 7], // top
        [0, 1, 5],
        [0, 5, 4], // front
        [3, 7, 6],
        [3, 6, 2], // back
        [0, 4, 7],
        [0, 7, 3], // left
        [1, 2, 6],
        [1, 6, 5], // right
    ];
    for [a, b, c] in faces {
        mesh.add_tri(Tri::new(a, b, c));
    }
    mesh
}

/// Cube spanning cells 8..16 in a 24-cell grid, leaving enough margin that
/// the exterior beyond the narrow band surrounds the surface on all sides.
fn rasterized_cube() -> (DenseGrid<f32>, LevelsetParams) {
    let mesh = cube(8.0, 16.0);
    let params = LevelsetParams::default();
    let grid = compute_levelset(&mesh, [24, 24, 24], &params).unwrap();
    (grid, params)
}

#[test]
fn cube_interior_is_negative() {
    let (grid, _) = rasterized_cube();
    // Cell (12, 12, 12) is centered at the cube's center, 3.5 cells inside
    // every face.
    assert!(*grid.at(12, 12, 12) < 0.0, "got {}", grid.at(12, 12, 12));
}

#[test]
fn cube_exterior_beyond_band_is_clamped() {
    let (grid, params) = rasterized_cube();
    // The grid corners are far outside the narrow band; the flood fill must
    // have forced them to exactly +cutoff.
    assert_eq!(*grid.at(0, 0, 0), params.cutoff);
    assert_eq!(*grid.at(23, 23, 23), params.cutoff);
    assert_eq!(*grid.at(23, 0, 0), params.cutoff);
}

#[test]
fn cube_surface_straddles_zero() {
    let (grid, _) = rasterized_cube();
    // Half a cell above the top face (z = 16) vs half a cell below it.
    let above = *grid.at(12, 12, 16);
    let below = *grid.at(12, 12, 15);
    assert!(above > 0.0, "got {above}");
    assert!(below < 0.0, "got {below}");
    // Both sit within a cell of the surface.
    assert!(above < 1.5 && below > -1.5);
}

#[test]
fn cube_band_values_stay_in_range() {
    let (grid, params) = rasterized_cube();
    for &v in grid.data() {
        assert!(
            v >= -params.cutoff - 1e-4 && v <= params.cutoff + 1e-4,
            "value {v} escapes the band"
        );
    }
}

#[test]
fn narrower_kernel_sharpens_the_surface() {
    let mesh = cube(8.0, 16.0);
    let wide = compute_levelset(&mesh, [24, 24, 24], &LevelsetParams::with_sigma(2.0)).unwrap();
    let narrow = compute_levelset(&mesh, [24, 24, 24], &LevelsetParams::with_sigma(1.0)).unwrap();
    // The narrow kernel's estimate half a cell off the face is closer to the
    // true distance of 0.5: it no longer sees the other faces at all.
    let wide_err = (wide.at(12, 12, 16) - 0.5).abs();
    let narrow_err = (narrow.at(12, 12, 16) - 0.5).abs();
    assert!(narrow_err <= wide_err + 1e-3);
    assert_relative_eq!(*narrow.at(12, 12, 16), 0.5, epsilon = 0.3);
}

#[test]
fn rasterizer_ignores_stale_adjacency() {
    // No corner or ring rebuild has run; rasterization reads positions and
    // face normals only.
    let mesh = cube(8.0, 16.0);
    assert_eq!(mesh.corner_count(), 0);
    let grid = compute_levelset(&mesh, [24, 24, 24], &LevelsetParams::default()).unwrap();
    assert!(*grid.at(12, 12, 12) < 0.0);
}
