//! Signed-distance rasterization of triangle surfaces.
//!
//! Converts a [`mesh_topology::TriMesh`] into a dense narrow-band signed
//! distance grid: triangles are splatted as oriented point samples, the
//! samples are bucketed per grid cell, every cell accumulates a
//! Gaussian-weighted normal-projected distance, and a flood fill forces the
//! exterior beyond the narrow band to exactly `+cutoff`.
//!
//! The rasterizer reads only node positions and face normals - no adjacency
//! is required, so it can run on a mesh with stale corner tables. It is a
//! batch operation; there is no incremental update path.
//!
//! # Example
//!
//! ```
//! use mesh_topology::{Node, Tri, TriMesh};
//! use mesh_levelset::{compute_levelset, LevelsetParams};
//!
//! let mut mesh = TriMesh::new();
//! let a = mesh.add_node(Node::from_coords(2.0, 2.0, 4.0));
//! let b = mesh.add_node(Node::from_coords(6.0, 2.0, 4.0));
//! let c = mesh.add_node(Node::from_coords(4.0, 6.0, 4.0));
//! mesh.add_tri(Tri::new(a, b, c));
//!
//! let grid = compute_levelset(&mesh, [8, 8, 8], &LevelsetParams::default()).unwrap();
//! assert_eq!(grid.cell_count(), 512);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Grid math converts between float positions and integer cells throughout.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod grid;
mod rasterize;

pub use error::{LevelsetError, LevelsetResult};
pub use grid::DenseGrid;
pub use rasterize::{compute_levelset, LevelsetParams};
