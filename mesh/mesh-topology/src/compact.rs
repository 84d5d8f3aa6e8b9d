//! Deletion and merge: mutations that must keep the triangle array, corner
//! table, one-ring cache, and every registered channel consistent in
//! lockstep.
//!
//! Triangle removal uses the swap-with-last pattern. Node removal is a batch
//! compaction driven by one explicit `old -> Option<new>` remap applied
//! uniformly to every table. Node merging folds one node into another and
//! leaves the orphaned storage for a later `remove_nodes` batch.

use tracing::debug;

use crate::channel::Relocation;
use crate::corner::Corner;
use crate::error::{TopologyError, TopologyResult};
use crate::mesh::TriMesh;

impl TriMesh {
    /// Remove triangle `t`, relocating the last triangle into its slot.
    ///
    /// The relocated triangle's corners keep their `opposite` links verbatim
    /// (`next`/`prev` are corner-local and unaffected by the swap); the
    /// mutual links of its neighbors are re-pointed at the new corner
    /// indices. The removed triangle leaves `NONE` opposites behind on its
    /// neighbors (boundary edges), so strict mode no longer holds.
    ///
    /// Requires a fresh corner table (`corner_count == 3 * tri_count`).
    ///
    /// # Errors
    ///
    /// Out-of-range index or stale corner table.
    pub fn remove_tri(&mut self, t: usize) -> TopologyResult<()> {
        let tri_count = self.tris.len();
        if t >= tri_count {
            return Err(TopologyError::IndexOutOfRange {
                kind: "triangle",
                index: t,
                count: tri_count,
            });
        }
        if self.corners.len() != tri_count * 3 {
            return Err(TopologyError::CornerCountMismatch {
                corners: self.corners.len(),
                tris: tri_count,
            });
        }

        // Unlink the dead triangle from its neighbors.
        for j in 0..3 {
            let opp = self.corners.corners[t * 3 + j].opposite;
            if opp != Corner::NONE {
                self.corners.corners[opp as usize].opposite = Corner::NONE;
            }
        }

        // Drop it from its nodes' rings; neighbor-set entries survive only
        // while some remaining triangle still spans the edge.
        let dead = self.tris[t];
        for &n in &dead.nodes {
            self.rings.rings[n as usize].tris.remove(&(t as u32));
        }
        for j in 0..3 {
            let a = dead.nodes[j];
            let b = dead.nodes[(j + 1) % 3];
            let supported = self.rings.rings[a as usize]
                .tris
                .iter()
                .any(|&ti| self.tris[ti as usize].contains(b));
            if !supported {
                self.rings.rings[a as usize].nodes.remove(&b);
                self.rings.rings[b as usize].nodes.remove(&a);
            }
        }

        // Swap-with-last relocation.
        let last = tri_count - 1;
        if t != last {
            let moved = self.tris[last];
            self.tris[t] = moved;
            for j in 0..3 {
                let c_new = t * 3 + j;
                let old = self.corners.corners[last * 3 + j];
                self.corners.corners[c_new] = Corner {
                    tri: t as u32,
                    node: old.node,
                    next: (t * 3 + (j + 1) % 3) as u32,
                    prev: (t * 3 + (j + 2) % 3) as u32,
                    opposite: old.opposite,
                };
                if old.opposite != Corner::NONE {
                    self.corners.corners[old.opposite as usize].opposite = c_new as u32;
                }
            }
            for &n in &moved.nodes {
                let ring = &mut self.rings.rings[n as usize];
                ring.tris.remove(&(last as u32));
                ring.tris.insert(t as u32);
            }
        }

        for ch in &mut self.tri_channels {
            ch.remove_swap(t);
        }
        self.tris.pop();
        self.corners.truncate(self.tris.len() * 3);

        debug!(tri = t, remaining = self.tris.len(), "removed triangle");
        Ok(())
    }

    /// Remove a batch of nodes and compact all node-indexed storage.
    ///
    /// Builds one explicit remap: survivors below the new length keep their
    /// index, tail survivors are paired one-to-one with the holes deletions
    /// opened below it, and deleted entries map to nothing. The remap is
    /// then applied uniformly to node storage, every per-node channel,
    /// every corner and triangle node reference, and the ring cache.
    ///
    /// # Errors
    ///
    /// Out-of-range ids, or a triangle still referencing a deleted node
    /// (callers must remove or re-point incident triangles first, e.g. via
    /// [`TriMesh::merge_node`]).
    pub fn remove_nodes(&mut self, deleted: &[u32]) -> TopologyResult<()> {
        if deleted.is_empty() {
            return Ok(());
        }
        let old_len = self.nodes.len();
        let mut del = deleted.to_vec();
        del.sort_unstable();
        del.dedup();
        if let Some(&worst) = del.last() {
            if worst as usize >= old_len {
                return Err(TopologyError::IndexOutOfRange {
                    kind: "node",
                    index: worst as usize,
                    count: old_len,
                });
            }
        }
        let new_len = old_len - del.len();

        // Explicit remap: old index -> new index, or None for deleted.
        let mut remap: Vec<Option<u32>> = (0..old_len as u32).map(Some).collect();
        for &d in &del {
            remap[d as usize] = None;
        }
        let mut holes = del.iter().copied().filter(|&d| (d as usize) < new_len);
        let mut moves: Vec<Relocation> = Vec::new();
        for src in new_len..old_len {
            if remap[src].is_some() {
                // One hole per tail survivor, by counting.
                if let Some(to) = holes.next() {
                    remap[src] = Some(to);
                    moves.push(Relocation {
                        from: src as u32,
                        to,
                    });
                }
            }
        }

        // Precondition: no triangle may still reference a deleted node.
        for (ti, tri) in self.tris.iter().enumerate() {
            for &n in &tri.nodes {
                if remap[n as usize].is_none() {
                    return Err(TopologyError::DeletedNodeReferenced {
                        tri: ti,
                        node: n as usize,
                    });
                }
            }
        }

        // Node storage.
        for m in &moves {
            self.nodes[m.to as usize] = self.nodes[m.from as usize];
        }
        self.nodes.truncate(new_len);

        // Channels renumber themselves from the same relocation list.
        for ch in &mut self.node_channels {
            ch.renumber(&moves, new_len);
        }

        // Triangle and corner node references.
        for tri in &mut self.tris {
            for n in &mut tri.nodes {
                if let Some(nn) = remap[*n as usize] {
                    *n = nn;
                }
            }
        }
        for c in &mut self.corners.corners {
            if let Some(nn) = remap[c.node as usize] {
                c.node = nn;
            }
        }

        // Ring storage: relocate whole rings, then remap the neighbor sets
        // of every survivor (entries for deleted nodes drop out).
        for m in &moves {
            self.rings.rings.swap(m.from as usize, m.to as usize);
        }
        self.rings.truncate(new_len);
        for ring in &mut self.rings.rings {
            if ring
                .nodes
                .iter()
                .any(|&n| remap[n as usize] != Some(n))
            {
                ring.nodes = ring
                    .nodes
                    .iter()
                    .filter_map(|&n| remap[n as usize])
                    .collect();
            }
        }

        debug!(
            deleted = del.len(),
            remaining = new_len,
            relocated = moves.len(),
            "compacted nodes"
        );
        Ok(())
    }

    /// Fold node `del` into node `keep`.
    ///
    /// Neighbors of `del` are re-linked to `keep`, incident triangles are
    /// re-pointed (triangle node arrays and corner node fields), and every
    /// per-node channel is blended with a fixed weight of one half. `del`'s
    /// node storage is NOT freed; callers batch orphans into a later
    /// [`TriMesh::remove_nodes`]. Its ring sets are cleared so the orphan
    /// remains self-consistent (no incident triangles, empty ring).
    ///
    /// # Errors
    ///
    /// Out-of-range ids.
    pub fn merge_node(&mut self, keep: u32, del: u32) -> TopologyResult<()> {
        let count = self.nodes.len();
        for id in [keep, del] {
            if id as usize >= count {
                return Err(TopologyError::IndexOutOfRange {
                    kind: "node",
                    index: id as usize,
                    count,
                });
            }
        }
        if keep == del {
            return Ok(());
        }

        let del_ring = std::mem::take(&mut self.rings.rings[del as usize]);

        for &n in &del_ring.nodes {
            self.rings.rings[n as usize].nodes.remove(&del);
            if n != keep {
                self.rings.rings[n as usize].nodes.insert(keep);
                self.rings.rings[keep as usize].nodes.insert(n);
            }
        }
        self.rings.rings[keep as usize].nodes.remove(&del);

        for &t in &del_ring.tris {
            let tri = &mut self.tris[t as usize];
            for j in 0..3 {
                if tri.nodes[j] == del {
                    tri.nodes[j] = keep;
                    let c = t as usize * 3 + j;
                    if c < self.corners.corners.len() {
                        self.corners.corners[c].node = keep;
                    }
                }
            }
            self.rings.rings[keep as usize].tris.insert(t);
        }

        for ch in &mut self.node_channels {
            ch.merge_with(keep as usize, del as usize, 0.5);
        }

        debug!(keep, del, tris = del_ring.tris.len(), "merged node");
        Ok(())
    }

    /// Nodes flagged [`crate::NodeFlags::KILL`], as a set, for feeding into
    /// [`TriMesh::remove_nodes`].
    #[must_use]
    pub fn killed_nodes(&self) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.flags.contains(crate::NodeFlags::KILL))
            .map(|(i, _)| i as u32)
            .collect();
        out.sort_unstable();
        out
    }
}
