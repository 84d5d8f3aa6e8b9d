//! Per-node one-ring cache.
//!
//! For each node this caches the set of directly adjacent nodes and the set
//! of incident triangles, derived from the corner table. Two maintenance
//! strategies exist and the caller picks based on how much local disruption
//! occurred: a full rebuild over a triangle range, and an O(degree) walk
//! around a single node that requires a closed local fan. Partial incremental
//! state must not be mixed with a stale full structure.

use hashbrown::HashSet;
use tracing::debug;

use crate::corner::{Corner, CornerTable};
use crate::error::{TopologyError, TopologyResult};

/// Neighborhood of one node: adjacent node ids and incident triangle ids.
///
/// Ordering within each set is irrelevant; uniqueness is required.
#[derive(Debug, Clone, Default)]
pub struct OneRing {
    /// Ids of the nodes sharing an edge with this node.
    pub nodes: HashSet<u32>,
    /// Ids of the triangles incident to this node.
    pub tris: HashSet<u32>,
}

impl OneRing {
    /// Drop all entries.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.tris.clear();
    }
}

/// The one-ring cache: one [`OneRing`] per node.
#[derive(Debug, Clone, Default)]
pub struct OneRingIndex {
    pub(crate) rings: Vec<OneRing>,
}

impl OneRingIndex {
    /// Create an empty index.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes covered.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// True if no nodes are covered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Ring of a node, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, node: usize) -> Option<&OneRing> {
        self.rings.get(node)
    }

    /// Grow ring storage to cover at least `node_count` nodes.
    pub(crate) fn ensure_len(&mut self, node_count: usize) {
        if self.rings.len() < node_count {
            self.rings.resize_with(node_count, OneRing::default);
        }
    }

    /// Truncate ring storage to `node_count` nodes.
    pub(crate) fn truncate(&mut self, node_count: usize) {
        self.rings.truncate(node_count);
    }

    /// Drop all rings.
    pub fn clear(&mut self) {
        self.rings.clear();
    }

    /// Rebuild rings from the corners of triangles `[from, to)` (`None` =
    /// all). A full rebuild (`from == 0`, `to == None`) clears every ring
    /// first; a range rebuild only inserts, so stale entries for the range
    /// must have been removed by the caller.
    ///
    /// # Errors
    ///
    /// [`TopologyError::CornerCountMismatch`] if the corner table does not
    /// cover the requested triangle range (stale table; rebuild corners
    /// first).
    pub fn rebuild(
        &mut self,
        corners: &CornerTable,
        tri_count: usize,
        node_count: usize,
        from: usize,
        to: Option<usize>,
    ) -> TopologyResult<()> {
        let full = from == 0 && to.is_none();
        let to = to.unwrap_or(tri_count).min(tri_count);
        if corners.len() < to * 3 {
            return Err(TopologyError::CornerCountMismatch {
                corners: corners.len(),
                tris: tri_count,
            });
        }
        if full {
            for ring in &mut self.rings {
                ring.clear();
            }
        }
        self.ensure_len(node_count);

        for t in from..to {
            for j in 0..3 {
                let c = &corners.corners[t * 3 + j];
                let next = corners.corners[c.next as usize].node;
                let prev = corners.corners[c.prev as usize].node;
                let ring = &mut self.rings[c.node as usize];
                ring.nodes.insert(next);
                ring.nodes.insert(prev);
                ring.tris.insert(c.tri);
            }
        }

        debug!(nodes = node_count, from, to, full, "rebuilt one-ring cache");
        Ok(())
    }

    /// Rebuild the ring of one node by walking its corner fan.
    ///
    /// Starting from `corner` (a corner at the node), repeatedly steps to the
    /// next triangle around the node via `opposite(prev(c)).next`, collecting
    /// neighbor nodes and incident triangles until the walk returns to the
    /// start. O(degree); use this after a local edit instead of a full
    /// rebuild.
    ///
    /// # Errors
    ///
    /// [`TopologyError::OpenFan`] if the walk hits a missing opposite - the
    /// local neighborhood must be a complete cycle.
    pub fn rebuild_fast(&mut self, corners: &CornerTable, corner: usize) -> TopologyResult<()> {
        let node = corners.corners[corner].node as usize;
        self.ensure_len(node + 1);
        self.rings[node].clear();

        // Walk the corners whose `next` sits at `node`: each one names the
        // previous fan neighbor (`c.node`) and the next one (`prev(c).node`).
        let start = corners.corners[corner].prev as usize;
        let mut c = start;
        loop {
            let cur = &corners.corners[c];
            let ring = &mut self.rings[node];
            ring.tris.insert(cur.tri);
            ring.nodes.insert(cur.node);
            ring.nodes.insert(corners.corners[cur.prev as usize].node);

            if cur.opposite == Corner::NONE {
                return Err(TopologyError::OpenFan { node, corner: c });
            }
            c = corners.corners[cur.opposite as usize].next as usize;
            if c == start {
                break;
            }
        }
        Ok(())
    }
}
