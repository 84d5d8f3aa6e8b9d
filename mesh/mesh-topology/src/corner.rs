//! Per-corner adjacency table.
//!
//! A corner is one (triangle, vertex-slot) instance; corner `3*t + j` belongs
//! to slot `j` of triangle `t`. `next`/`prev` cycle within the triangle and
//! `opposite` crosses to the neighboring triangle sharing the same edge in
//! reverse orientation, or is [`Corner::NONE`] at a mesh boundary.

use hashbrown::HashMap;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{TopologyError, TopologyResult};
use crate::tri::Tri;

/// One corner of one triangle, carrying the adjacency pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Corner {
    /// Owning triangle index.
    pub tri: u32,
    /// Node at this corner.
    pub node: u32,
    /// Next corner within the same triangle (cyclic).
    pub next: u32,
    /// Previous corner within the same triangle (cyclic).
    pub prev: u32,
    /// Corner on the adjacent triangle across the shared edge, or
    /// [`Corner::NONE`] at a boundary.
    pub opposite: u32,
}

impl Corner {
    /// Sentinel for a missing opposite (boundary edge).
    pub const NONE: u32 = u32::MAX;

    /// True if this corner has an opposite.
    #[inline]
    #[must_use]
    pub fn has_opposite(&self) -> bool {
        self.opposite != Self::NONE
    }
}

/// The corner table: `3 * tri_count` corners in triangle order.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CornerTable {
    pub(crate) corners: Vec<Corner>,
}

/// Unordered edge key: the two endpoint node ids, smaller first.
#[inline]
fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

impl CornerTable {
    /// Create an empty corner table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of corners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// True if the table holds no corners.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// Corner by index, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Corner> {
        self.corners.get(id)
    }

    /// All corners as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Corner] {
        &self.corners
    }

    /// Raw append, used by batch rebuild paths.
    #[inline]
    pub fn push(&mut self, corner: Corner) {
        self.corners.push(corner);
    }

    /// Drop all corners.
    #[inline]
    pub fn clear(&mut self) {
        self.corners.clear();
    }

    /// Truncate to `len` corners.
    #[inline]
    pub(crate) fn truncate(&mut self, len: usize) {
        self.corners.truncate(len);
    }

    /// Rebuild corners for triangles `[from, to)` (`None` = all).
    ///
    /// The first pass fills `tri`/`node`/`next`/`prev` from the triangle
    /// arrays and resets `opposite` to [`Corner::NONE`]. The second pass
    /// links mutual opposites:
    ///
    /// - A full rebuild pairs corners through a map keyed by the unordered
    ///   edge endpoint pair, matching each corner with the earliest unmatched
    ///   corner on the same edge. For non-manifold edges with more than two
    ///   incident triangles this reproduces the first-in-scan-order pairing
    ///   of the quadratic scan.
    /// - A partial rebuild scans forward over all corners with a larger
    ///   index, up to the end of the full table; first match wins.
    ///
    /// # Errors
    ///
    /// In strict mode, a corner left without an opposite is a fatal
    /// [`TopologyError::MissingOpposite`]; boundary edges are only legal in
    /// non-strict mode.
    pub fn rebuild(
        &mut self,
        tris: &[Tri],
        from: usize,
        to: Option<usize>,
        strict: bool,
    ) -> TopologyResult<()> {
        let to = to.unwrap_or(tris.len()).min(tris.len());
        self.corners.resize(
            tris.len() * 3,
            Corner {
                tri: 0,
                node: 0,
                next: 0,
                prev: 0,
                opposite: Corner::NONE,
            },
        );

        for (t, tri) in tris.iter().enumerate().take(to).skip(from) {
            let base = (t * 3) as u32;
            for j in 0..3u32 {
                self.corners[(base + j) as usize] = Corner {
                    tri: t as u32,
                    node: tri.nodes[j as usize],
                    next: base + (j + 1) % 3,
                    prev: base + (j + 2) % 3,
                    opposite: Corner::NONE,
                };
            }
        }

        let full = from == 0 && to == tris.len();
        if full {
            self.link_opposites_full();
        } else {
            self.link_opposites_range(from * 3, to * 3);
        }

        if strict {
            for c in (from * 3)..(to * 3) {
                if !self.corners[c].has_opposite() {
                    return Err(TopologyError::MissingOpposite {
                        corner: c,
                        tri: c / 3,
                    });
                }
            }
        }

        debug!(
            corners = self.corners.len(),
            from,
            to,
            full,
            "rebuilt corner table"
        );
        Ok(())
    }

    /// Full-table opposite matching keyed by unordered edge.
    fn link_opposites_full(&mut self) {
        let mut open: HashMap<(u32, u32), Vec<u32>> =
            HashMap::with_capacity(self.corners.len() / 2 + 1);

        for c in 0..self.corners.len() as u32 {
            let corner = self.corners[c as usize];
            let a = self.corners[corner.next as usize].node;
            let b = self.corners[corner.prev as usize].node;
            let key = edge_key(a, b);

            let slot = open.entry(key).or_default();
            if slot.is_empty() {
                slot.push(c);
            } else {
                // Earliest unmatched corner on this edge wins.
                let c2 = slot.remove(0);
                self.corners[c as usize].opposite = c2;
                self.corners[c2 as usize].opposite = c;
            }
        }
    }

    /// Reference forward scan over `[first, last)` against the full table.
    ///
    /// Quadratic over the rebuilt range; used only for local patches where
    /// the range is small.
    fn link_opposites_range(&mut self, first: usize, last: usize) {
        for c in first..last.min(self.corners.len()) {
            if self.corners[c].has_opposite() {
                continue;
            }
            let a = self.corners[self.corners[c].next as usize].node;
            let b = self.corners[self.corners[c].prev as usize].node;

            for c2 in (c + 1)..self.corners.len() {
                let a2 = self.corners[self.corners[c2].next as usize].node;
                let b2 = self.corners[self.corners[c2].prev as usize].node;
                if (a == a2 && b == b2) || (a == b2 && b == a2) {
                    self.corners[c].opposite = c2 as u32;
                    self.corners[c2].opposite = c as u32;
                    break;
                }
            }
        }
    }
}
