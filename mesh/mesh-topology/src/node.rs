//! Mesh nodes (surface vertices).

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Per-node state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct NodeFlags: u32 {
        /// Node is pinned and must not be moved by the surface tracker.
        const FIXED = 0b0000_0001;
        /// Scratch mark used by traversal passes.
        const MARKED = 0b0000_0010;
        /// Node is scheduled for removal in the next compaction batch.
        const KILL = 0b0000_0100;
        /// Node is in contact with an obstacle.
        const COLLIDE = 0b0000_1000;
    }
}

/// A surface node: position, cached normal, and state flags.
///
/// Positions and normals are single precision; the mesh stores large node
/// counts and the embedding simulation advects them every step. Reductions
/// that need more headroom (center of mass) accumulate in `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Position in grid coordinates.
    pub pos: Point3<f32>,
    /// Cached vertex normal; valid after `compute_vertex_normals`.
    pub normal: Vector3<f32>,
    /// State flags.
    pub flags: NodeFlags,
}

impl Node {
    /// Create a node at the given position with a zero normal and no flags.
    #[inline]
    #[must_use]
    pub fn new(pos: Point3<f32>) -> Self {
        Self {
            pos,
            normal: Vector3::zeros(),
            flags: NodeFlags::empty(),
        }
    }

    /// Create a node from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_topology::Node;
    ///
    /// let n = Node::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(n.pos.y, 2.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_coords(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}
