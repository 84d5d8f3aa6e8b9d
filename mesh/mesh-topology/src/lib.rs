//! Indexed triangle-mesh topology engine.
//!
//! This crate maintains a deforming triangle surface as flat index-linked
//! arrays plus two derived adjacency caches:
//!
//! - [`TriMesh`] - owns the node/triangle/corner arrays and attribute channels
//! - [`CornerTable`] - per-corner adjacency (`next`/`prev` within a triangle,
//!   `opposite` across the shared edge)
//! - [`OneRingIndex`] - per-node cache of neighbor nodes and incident triangles
//! - [`Channel`] - length-synced per-node / per-triangle attribute side arrays
//!
//! Topology mutation (`add_node`, `add_tri`, `remove_tri`, `remove_nodes`,
//! `merge_node`, rebuilds) is single-threaded and not reentrant; one owner at
//! a time, no internal locking.
//!
//! All cross-references are integer indices into flat arrays, never owned
//! references. Removal uses the swap-with-last pattern, which depends on
//! indices staying plain data.
//!
//! # Example
//!
//! ```
//! use mesh_topology::{Node, Tri, TriMesh};
//!
//! let mut mesh = TriMesh::new();
//! let a = mesh.add_node(Node::from_coords(0.0, 0.0, 0.0));
//! let b = mesh.add_node(Node::from_coords(1.0, 0.0, 0.0));
//! let c = mesh.add_node(Node::from_coords(0.0, 1.0, 0.0));
//! mesh.add_tri(Tri::new(a, b, c));
//!
//! mesh.rebuild_corners(0, None).unwrap();
//! mesh.rebuild_lookup(0, None).unwrap();
//! assert!(mesh.sanity_check(false, None, None).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Mesh processing is index-heavy; u32 <-> usize casts are pervasive and safe
// for practical mesh sizes.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod channel;
mod compact;
mod corner;
mod error;
mod mesh;
mod node;
mod ring;
mod tri;
mod validate;

pub use channel::{Channel, IntChannel, Relocation, ScalarChannel, Vec3Channel};
pub use corner::{Corner, CornerTable};
pub use error::{TopologyError, TopologyResult};
pub use mesh::TriMesh;
pub use node::{Node, NodeFlags};
pub use ring::{OneRing, OneRingIndex};
pub use tri::{Tri, TriFlags};

// Re-export nalgebra types used in the public API.
pub use nalgebra::{Point3, Vector3};
