//! Full invariant validation.
//!
//! [`TriMesh::sanity_check`] is the designated validation entry point for
//! test harnesses: run it after any sequence of mutations. It is not meant
//! for production hot paths. Every failure is fatal; there is no recovery
//! short of rebuilding the mesh from scratch.

use hashbrown::HashSet;

use crate::corner::Corner;
use crate::error::{TopologyError, TopologyResult};
use crate::mesh::TriMesh;
use crate::ring::OneRing;

impl TriMesh {
    /// Validate every structural invariant of the mesh.
    ///
    /// Checked, in order:
    ///
    /// 1. `corner_count == 3 * tri_count` and ring storage covers all nodes;
    /// 2. every channel length matches its owner length;
    /// 3. every triangle's node ids are in range and not in `deleted_nodes`;
    /// 4. corner `3*t + j` caches `tri == t`, the right node, and
    ///    cyclic-consistent `next`/`prev`;
    /// 5. opposite links are mutual; under `strict` they must also exist;
    /// 6. every node's one-ring equals the neighborhood derived from its
    ///    incident triangles.
    ///
    /// `deleted_nodes` and `tainted_tris` name elements known to be
    /// mid-transition; they are skipped, as are ring comparisons for nodes
    /// touching a tainted triangle.
    ///
    /// # Errors
    ///
    /// The first violated invariant, with a descriptive payload.
    #[allow(clippy::too_many_lines)]
    pub fn sanity_check(
        &self,
        strict: bool,
        deleted_nodes: Option<&HashSet<u32>>,
        tainted_tris: Option<&HashSet<u32>>,
    ) -> TopologyResult<()> {
        let node_count = self.nodes.len();
        let tri_count = self.tris.len();
        let corners = self.corners.as_slice();

        let node_deleted = |n: u32| deleted_nodes.is_some_and(|s| s.contains(&n));
        let tri_tainted = |t: u32| tainted_tris.is_some_and(|s| s.contains(&t));

        // 1. Structure sizes.
        if corners.len() != tri_count * 3 {
            return Err(TopologyError::CornerCountMismatch {
                corners: corners.len(),
                tris: tri_count,
            });
        }
        if self.rings.len() != node_count {
            return Err(TopologyError::RingStorageMismatch {
                rings: self.rings.len(),
                nodes: node_count,
            });
        }

        // 2. Channel lengths.
        for (i, ch) in self.node_channels.iter().enumerate() {
            if ch.len() != node_count {
                return Err(TopologyError::ChannelLengthMismatch {
                    channel: i,
                    len: ch.len(),
                    expected: node_count,
                });
            }
        }
        for (i, ch) in self.tri_channels.iter().enumerate() {
            if ch.len() != tri_count {
                return Err(TopologyError::ChannelLengthMismatch {
                    channel: i,
                    len: ch.len(),
                    expected: tri_count,
                });
            }
        }

        // 3-5. Per-triangle and per-corner checks.
        for t in 0..tri_count {
            if tri_tainted(t as u32) {
                continue;
            }
            let tri = &self.tris[t];
            for &n in &tri.nodes {
                if n as usize >= node_count {
                    return Err(TopologyError::IndexOutOfRange {
                        kind: "node",
                        index: n as usize,
                        count: node_count,
                    });
                }
                if node_deleted(n) {
                    return Err(TopologyError::DeletedNodeReferenced {
                        tri: t,
                        node: n as usize,
                    });
                }
            }

            for j in 0..3 {
                let c = t * 3 + j;
                let corner = &corners[c];
                if corner.tri as usize != t {
                    return Err(TopologyError::CornerMismatch {
                        corner: c,
                        tri: t,
                        details: format!("owning triangle cached as {}", corner.tri),
                    });
                }
                if corner.node != tri.nodes[j] {
                    return Err(TopologyError::CornerMismatch {
                        corner: c,
                        tri: t,
                        details: format!(
                            "node cached as {} but slot holds {}",
                            corner.node, tri.nodes[j]
                        ),
                    });
                }
                let next = corner.next as usize;
                let prev = corner.prev as usize;
                if next >= corners.len() || corners[next].node != tri.nodes[(j + 1) % 3] {
                    return Err(TopologyError::CornerMismatch {
                        corner: c,
                        tri: t,
                        details: "next pointer breaks the triangle cycle".to_string(),
                    });
                }
                if prev >= corners.len() || corners[prev].node != tri.nodes[(j + 2) % 3] {
                    return Err(TopologyError::CornerMismatch {
                        corner: c,
                        tri: t,
                        details: "prev pointer breaks the triangle cycle".to_string(),
                    });
                }

                let opp = corner.opposite;
                if opp == Corner::NONE {
                    if strict {
                        return Err(TopologyError::MissingOpposite { corner: c, tri: t });
                    }
                } else {
                    let opp = opp as usize;
                    if opp >= corners.len() {
                        return Err(TopologyError::IndexOutOfRange {
                            kind: "corner",
                            index: opp,
                            count: corners.len(),
                        });
                    }
                    if corners[opp].opposite as usize != c {
                        return Err(TopologyError::OppositeNotMutual {
                            corner: c,
                            opposite: opp,
                            back: corners[opp].opposite as usize,
                        });
                    }
                }
            }
        }

        // 6. One-ring equality against the triangle arrays.
        let mut expected: Vec<OneRing> = vec![OneRing::default(); node_count];
        for (t, tri) in self.tris.iter().enumerate() {
            if tri_tainted(t as u32) {
                continue;
            }
            for j in 0..3 {
                let n = tri.nodes[j] as usize;
                let ring = &mut expected[n];
                ring.tris.insert(t as u32);
                for &other in &[tri.nodes[(j + 1) % 3], tri.nodes[(j + 2) % 3]] {
                    // Degenerate triangles (mid-merge) may repeat a node;
                    // a node is never its own neighbor.
                    if other as usize != n {
                        ring.nodes.insert(other);
                    }
                }
            }
        }

        for n in 0..node_count {
            if node_deleted(n as u32) {
                continue;
            }
            let actual = &self.rings.rings[n];
            let skip_ring = tainted_tris.is_some()
                && actual
                    .tris
                    .iter()
                    .chain(expected[n].tris.iter())
                    .any(|&t| tri_tainted(t));
            if skip_ring {
                continue;
            }
            if actual.tris != expected[n].tris {
                return Err(TopologyError::RingMismatch {
                    node: n,
                    details: format!(
                        "incident-triangle set has {} entries, expected {}",
                        actual.tris.len(),
                        expected[n].tris.len()
                    ),
                });
            }
            if actual.nodes != expected[n].nodes {
                return Err(TopologyError::RingMismatch {
                    node: n,
                    details: format!(
                        "neighbor set has {} entries, expected {}",
                        actual.nodes.len(),
                        expected[n].nodes.len()
                    ),
                });
            }
        }

        Ok(())
    }
}
