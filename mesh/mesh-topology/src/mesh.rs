//! The mesh owner: node/triangle/corner arrays, one-ring cache, and
//! registered attribute channels, kept consistent in lockstep.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::channel::Channel;
use crate::corner::{Corner, CornerTable};
use crate::error::TopologyResult;
use crate::node::Node;
use crate::ring::{OneRing, OneRingIndex};
use crate::tri::Tri;

/// An indexed triangle surface with adjacency caches and attribute channels.
///
/// Mutation is single-threaded and not reentrant: callers must serialize all
/// mutation and must not interleave reads with compaction. No internal
/// locking.
#[derive(Debug, Default)]
pub struct TriMesh {
    pub(crate) nodes: Vec<Node>,
    pub(crate) tris: Vec<Tri>,
    pub(crate) corners: CornerTable,
    pub(crate) rings: OneRingIndex,
    pub(crate) node_channels: Vec<Box<dyn Channel>>,
    pub(crate) tri_channels: Vec<Box<dyn Channel>>,
    strict: bool,
}

impl TriMesh {
    /// Create an empty mesh in non-strict mode (boundary edges tolerated).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with the given strictness. In strict mode a
    /// corner rebuild fails on any boundary edge.
    #[must_use]
    pub fn with_strict(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    /// Whether corner rebuilds require a watertight surface.
    #[inline]
    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict
    }

    // ------------------------------------------------------------------
    // Counts and accessors
    // ------------------------------------------------------------------

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn tri_count(&self) -> usize {
        self.tris.len()
    }

    /// Number of corners (3 per triangle once rebuilt).
    #[inline]
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    /// Node by id. Panics if out of range; see [`TriMesh::get_node`].
    #[inline]
    #[must_use]
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Mutable node by id.
    #[inline]
    #[must_use]
    pub fn node_mut(&mut self, id: usize) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Node by id, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get_node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Triangle by id.
    #[inline]
    #[must_use]
    pub fn tri(&self, id: usize) -> &Tri {
        &self.tris[id]
    }

    /// Triangle by id, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get_tri(&self, id: usize) -> Option<&Tri> {
        self.tris.get(id)
    }

    /// Corner by id, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn corner(&self, id: usize) -> Option<&Corner> {
        self.corners.get(id)
    }

    /// One-ring of a node, or `None` if the cache does not cover it.
    #[inline]
    #[must_use]
    pub fn one_ring(&self, node: usize) -> Option<&OneRing> {
        self.rings.get(node)
    }

    /// All nodes as a slice.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All triangles as a slice.
    #[inline]
    #[must_use]
    pub fn tris(&self) -> &[Tri] {
        &self.tris
    }

    /// The corner table.
    #[inline]
    #[must_use]
    pub fn corners(&self) -> &CornerTable {
        &self.corners
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Append a node and return its id.
    ///
    /// Ring storage grows to cover it and every registered per-node channel
    /// gets one default-initialized entry, keeping all arrays length-synced.
    pub fn add_node(&mut self, node: Node) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(node);
        self.rings.ensure_len(self.nodes.len());
        let len = self.nodes.len();
        for ch in &mut self.node_channels {
            ch.resize(len);
        }
        id
    }

    /// Append a triangle and return its id.
    ///
    /// The one-ring cache is maintained incrementally: each edge's endpoints
    /// enter each other's neighbor sets and the new triangle enters each
    /// endpoint's triangle set. No rebuild needed for pure insertion. The
    /// corner table is NOT updated; call [`TriMesh::rebuild_corners`] before
    /// relying on opposites.
    pub fn add_tri(&mut self, tri: Tri) -> u32 {
        let id = self.tris.len() as u32;
        let max_node = tri.nodes.iter().copied().max().unwrap_or(0) as usize;
        self.rings.ensure_len(self.nodes.len().max(max_node + 1));

        for j in 0..3 {
            let a = tri.nodes[j];
            let b = tri.nodes[(j + 1) % 3];
            self.rings.rings[a as usize].nodes.insert(b);
            self.rings.rings[b as usize].nodes.insert(a);
            self.rings.rings[a as usize].tris.insert(id);
        }

        self.tris.push(tri);
        let len = self.tris.len();
        for ch in &mut self.tri_channels {
            ch.resize(len);
        }
        id
    }

    /// Raw corner append, used by batch rebuild paths.
    #[inline]
    pub fn add_corner(&mut self, corner: Corner) {
        self.corners.push(corner);
    }

    /// Resize the node array (and ring storage and per-node channels).
    pub fn resize_nodes(&mut self, len: usize) {
        self.nodes.resize_with(len, Node::default);
        self.rings.truncate(len);
        self.rings.ensure_len(len);
        for ch in &mut self.node_channels {
            ch.resize(len);
        }
    }

    /// Resize the triangle array (and per-triangle channels). The corner
    /// table is left stale; rebuild it.
    pub fn resize_tris(&mut self, len: usize) {
        self.tris.resize_with(len, || Tri::new(0, 0, 0));
        for ch in &mut self.tri_channels {
            ch.resize(len);
        }
    }

    /// Empty the mesh: nodes, triangles, corners, rings, and every channel.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.tris.clear();
        self.corners.clear();
        self.rings.clear();
        for ch in &mut self.node_channels {
            ch.resize(0);
        }
        for ch in &mut self.tri_channels {
            ch.resize(0);
        }
    }

    // ------------------------------------------------------------------
    // Adjacency maintenance
    // ------------------------------------------------------------------

    /// Rebuild corners for triangles `[from, to)` (`None` = all). See
    /// [`CornerTable::rebuild`].
    ///
    /// # Errors
    ///
    /// Fails in strict mode if a corner is left without an opposite.
    pub fn rebuild_corners(&mut self, from: usize, to: Option<usize>) -> TopologyResult<()> {
        self.corners.rebuild(&self.tris, from, to, self.strict)
    }

    /// Rebuild the one-ring cache from the corners of triangles `[from, to)`
    /// (`None` = all). See [`OneRingIndex::rebuild`].
    ///
    /// # Errors
    ///
    /// Fails if the corner table is stale for the requested range; rebuild
    /// corners first.
    pub fn rebuild_lookup(&mut self, from: usize, to: Option<usize>) -> TopologyResult<()> {
        self.rings
            .rebuild(&self.corners, self.tris.len(), self.nodes.len(), from, to)
    }

    /// Cheap structural guard: if the corner table or ring cache is the
    /// wrong size for the current arrays, fully rebuild the stale structure;
    /// otherwise a no-op. Intended before operations that assume fresh
    /// topology.
    ///
    /// # Errors
    ///
    /// Propagates a strict-mode corner rebuild failure.
    pub fn rebuild_quick_check(&mut self) -> TopologyResult<()> {
        if self.corners.len() != self.tris.len() * 3 {
            debug!(
                corners = self.corners.len(),
                tris = self.tris.len(),
                "corner table stale, full rebuild"
            );
            self.rebuild_corners(0, None)?;
        }
        if self.rings.len() != self.nodes.len() {
            debug!(
                rings = self.rings.len(),
                nodes = self.nodes.len(),
                "one-ring cache stale, full rebuild"
            );
            self.rebuild_lookup(0, None)?;
        }
        Ok(())
    }

    /// Rebuild the one-ring of a single node from one of its corners, in
    /// O(degree). See [`OneRingIndex::rebuild_fast`].
    ///
    /// # Errors
    ///
    /// Fails if the node's fan is not a closed cycle.
    pub fn fast_node_lookup_rebuild(&mut self, corner: usize) -> TopologyResult<()> {
        self.rings.rebuild_fast(&self.corners, corner)
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    /// Register a per-node channel; it is resized to the current node count
    /// and returns its registration index.
    pub fn add_node_channel(&mut self, mut channel: Box<dyn Channel>) -> usize {
        channel.resize(self.nodes.len());
        self.node_channels.push(channel);
        self.node_channels.len() - 1
    }

    /// Register a per-triangle channel; it is resized to the current
    /// triangle count and returns its registration index.
    pub fn add_tri_channel(&mut self, mut channel: Box<dyn Channel>) -> usize {
        channel.resize(self.tris.len());
        self.tri_channels.push(channel);
        self.tri_channels.len() - 1
    }

    /// A registered per-node channel by registration index.
    #[must_use]
    pub fn node_channel(&self, idx: usize) -> Option<&dyn Channel> {
        self.node_channels.get(idx).map(AsRef::as_ref)
    }

    /// A registered per-node channel, mutably.
    pub fn node_channel_mut(&mut self, idx: usize) -> Option<&mut (dyn Channel + 'static)> {
        self.node_channels.get_mut(idx).map(AsMut::as_mut)
    }

    /// A registered per-triangle channel by registration index.
    #[must_use]
    pub fn tri_channel(&self, idx: usize) -> Option<&dyn Channel> {
        self.tri_channels.get(idx).map(AsRef::as_ref)
    }

    /// A registered per-triangle channel, mutably.
    pub fn tri_channel_mut(&mut self, idx: usize) -> Option<&mut (dyn Channel + 'static)> {
        self.tri_channels.get_mut(idx).map(AsMut::as_mut)
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Positions of a triangle's three nodes.
    #[inline]
    #[must_use]
    pub fn tri_points(&self, tri: usize) -> [Point3<f32>; 3] {
        let t = &self.tris[tri];
        [
            self.nodes[t.nodes[0] as usize].pos,
            self.nodes[t.nodes[1] as usize].pos,
            self.nodes[t.nodes[2] as usize].pos,
        ]
    }

    /// Unit face normal of a triangle (zero for degenerate triangles).
    #[must_use]
    pub fn tri_normal(&self, tri: usize) -> Vector3<f32> {
        let [p0, p1, p2] = self.tri_points(tri);
        let n = (p1 - p0).cross(&(p2 - p0));
        n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
    }

    /// Area of a triangle.
    #[must_use]
    pub fn tri_area(&self, tri: usize) -> f32 {
        let [p0, p1, p2] = self.tri_points(tri);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Centroid of a triangle.
    #[must_use]
    pub fn tri_center(&self, tri: usize) -> Point3<f32> {
        let [p0, p1, p2] = self.tri_points(tri);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Area-weighted center of mass over all triangles.
    ///
    /// Accumulates in `f64` to bound error over large triangle counts.
    #[must_use]
    pub fn compute_center_of_mass(&self) -> Point3<f32> {
        let mut acc = nalgebra::Vector3::<f64>::zeros();
        let mut total_area = 0.0f64;

        for t in 0..self.tris.len() {
            let area = f64::from(self.tri_area(t));
            let c = self.tri_center(t);
            acc += nalgebra::Vector3::new(f64::from(c.x), f64::from(c.y), f64::from(c.z)) * area;
            total_area += area;
        }

        if total_area <= 0.0 {
            return Point3::origin();
        }
        let c = acc / total_area;
        Point3::new(c.x as f32, c.y as f32, c.z as f32)
    }

    /// Recompute every node's normal from its incident faces.
    ///
    /// Each triangle corner contributes the face cross product weighted by
    /// the inverse product of its two incident squared edge lengths, so
    /// small, well-shaped triangles dominate over slivers. Results are
    /// normalized; isolated nodes keep a zero normal.
    pub fn compute_vertex_normals(&mut self) {
        for node in &mut self.nodes {
            node.normal = Vector3::zeros();
        }

        for t in 0..self.tris.len() {
            let ids = self.tris[t].nodes;
            let [p0, p1, p2] = self.tri_points(t);
            let p = [p0, p1, p2];
            for j in 0..3 {
                let e1 = p[(j + 1) % 3] - p[j];
                let e2 = p[(j + 2) % 3] - p[j];
                let w = e1.norm_squared() * e2.norm_squared();
                if w <= f32::EPSILON {
                    continue;
                }
                let contrib = e1.cross(&e2) / w;
                self.nodes[ids[j] as usize].normal += contrib;
            }
        }

        for node in &mut self.nodes {
            if let Some(n) = node.normal.try_normalize(f32::EPSILON) {
                node.normal = n;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ScalarChannel;
    use approx::assert_relative_eq;

    fn quad() -> TriMesh {
        let mut mesh = TriMesh::new();
        mesh.add_node(Node::from_coords(0.0, 0.0, 0.0));
        mesh.add_node(Node::from_coords(1.0, 0.0, 0.0));
        mesh.add_node(Node::from_coords(1.0, 1.0, 0.0));
        mesh.add_node(Node::from_coords(0.0, 1.0, 0.0));
        mesh.add_tri(Tri::new(0, 1, 2));
        mesh.add_tri(Tri::new(0, 2, 3));
        mesh
    }

    #[test]
    fn add_tri_maintains_rings_incrementally() {
        let mesh = quad();
        let ring0 = mesh.one_ring(0).unwrap();
        assert!(ring0.nodes.contains(&1));
        assert!(ring0.nodes.contains(&2));
        assert!(ring0.nodes.contains(&3));
        assert_eq!(ring0.tris.len(), 2);

        let ring1 = mesh.one_ring(1).unwrap();
        assert_eq!(ring1.tris.len(), 1);
        assert!(ring1.tris.contains(&0));
    }

    #[test]
    fn channels_stay_length_synced() {
        let mut mesh = quad();
        let ch = mesh.add_node_channel(Box::new(ScalarChannel::new()));
        assert_eq!(mesh.node_channel(ch).unwrap().len(), 4);

        mesh.add_node(Node::from_coords(2.0, 0.0, 0.0));
        assert_eq!(mesh.node_channel(ch).unwrap().len(), 5);

        mesh.clear();
        assert_eq!(mesh.node_channel(ch).unwrap().len(), 0);
    }

    #[test]
    fn lookup_rebuild_rejects_stale_corner_table() {
        // Triangles exist but corners were never rebuilt; the lookup rebuild
        // must error out rather than walk past the corner table.
        let mut mesh = quad();
        assert_eq!(mesh.corner_count(), 0);
        let err = mesh.rebuild_lookup(0, None).unwrap_err();
        assert!(matches!(
            err,
            crate::TopologyError::CornerCountMismatch { .. }
        ));

        mesh.rebuild_corners(0, None).unwrap();
        mesh.rebuild_lookup(0, None).unwrap();
    }

    #[test]
    fn add_corner_feeds_batch_rebuilds() {
        let mut mesh = TriMesh::new();
        mesh.add_node(Node::from_coords(0.0, 0.0, 0.0));
        mesh.add_node(Node::from_coords(1.0, 0.0, 0.0));
        mesh.add_node(Node::from_coords(0.0, 1.0, 0.0));
        mesh.add_tri(Tri::new(0, 1, 2));

        // Hand-built corner cycle for the lone triangle, all boundary.
        for j in 0..3u32 {
            mesh.add_corner(Corner {
                tri: 0,
                node: j,
                next: (j + 1) % 3,
                prev: (j + 2) % 3,
                opposite: Corner::NONE,
            });
        }

        assert_eq!(mesh.corner_count(), 3);
        mesh.sanity_check(false, None, None).unwrap();
    }

    #[test]
    fn quick_check_rebuilds_stale_structures() {
        let mut mesh = quad();
        assert_eq!(mesh.corner_count(), 0);
        mesh.rebuild_quick_check().unwrap();
        assert_eq!(mesh.corner_count(), 6);
        // A second call is a no-op.
        mesh.rebuild_quick_check().unwrap();
        assert_eq!(mesh.corner_count(), 6);
    }

    #[test]
    fn face_queries() {
        let mesh = quad();
        assert_relative_eq!(mesh.tri_area(0), 0.5);
        let n = mesh.tri_normal(0);
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        let c = mesh.tri_center(1);
        assert_relative_eq!(c.y, 1.0 / 1.5, epsilon = 1e-6);
    }

    #[test]
    fn center_of_mass_of_symmetric_quad() {
        let mesh = quad();
        let com = mesh.compute_center_of_mass();
        assert_relative_eq!(com.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(com.y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(com.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn vertex_normals_of_flat_quad_point_up() {
        let mut mesh = quad();
        mesh.compute_vertex_normals();
        for n in mesh.nodes() {
            assert_relative_eq!(n.normal.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn empty_mesh_center_of_mass_is_origin() {
        let mesh = TriMesh::new();
        assert_eq!(mesh.compute_center_of_mass(), Point3::origin());
    }
}
