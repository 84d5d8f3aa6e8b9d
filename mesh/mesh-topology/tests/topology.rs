//! Integration scenarios: whole-mesh construction, compaction, and merging
//! checked through `sanity_check`.

use hashbrown::HashSet;
use mesh_topology::{Node, NodeFlags, ScalarChannel, Tri, TriMesh};

/// Unit cube: 8 nodes, 12 triangles, CCW winding viewed from outside.
fn unit_cube(strict: bool) -> TriMesh {
    let mut mesh = TriMesh::with_strict(strict);

    let coords = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    for [x, y, z] in coords {
        mesh.add_node(Node::from_coords(x, y, z));
    }

    let faces = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    for [a, b, c] in faces {
        mesh.add_tri(Tri::new(a, b, c));
    }
    mesh
}

#[test]
fn cube_builds_watertight() {
    let mut mesh = unit_cube(true);
    mesh.rebuild_corners(0, None).unwrap();
    mesh.rebuild_lookup(0, None).unwrap();

    assert_eq!(mesh.node_count(), 8);
    assert_eq!(mesh.tri_count(), 12);
    assert_eq!(mesh.corner_count(), 36);
    mesh.sanity_check(true, None, None).unwrap();
}

#[test]
fn cube_every_corner_has_mutual_opposite() {
    let mut mesh = unit_cube(true);
    mesh.rebuild_corners(0, None).unwrap();

    for c in 0..mesh.corner_count() {
        let corner = mesh.corner(c).unwrap();
        assert!(corner.has_opposite());
        let back = mesh.corner(corner.opposite as usize).unwrap();
        assert_eq!(back.opposite as usize, c);
    }
}

#[test]
fn add_tri_updates_rings_without_rebuild() {
    let mut mesh = TriMesh::new();
    for i in 0..4 {
        mesh.add_node(Node::from_coords(i as f32, 0.0, 0.0));
    }
    let t = mesh.add_tri(Tri::new(0, 1, 2));

    for n in [0u32, 1, 2] {
        let ring = mesh.one_ring(n as usize).unwrap();
        assert!(ring.tris.contains(&t));
        for m in [0u32, 1, 2] {
            if m != n {
                assert!(ring.nodes.contains(&m));
            }
        }
    }
    assert!(mesh.one_ring(3).unwrap().tris.is_empty());
}

#[test]
fn fast_lookup_after_local_edit_matches_full_rebuild() {
    let mut mesh = unit_cube(true);
    mesh.rebuild_corners(0, None).unwrap();
    mesh.rebuild_lookup(0, None).unwrap();

    let before = mesh.one_ring(0).unwrap().clone();

    // Corner at node 0: find one and rebuild just that ring.
    let c = (0..mesh.corner_count())
        .find(|&c| mesh.corner(c).unwrap().node == 0)
        .unwrap();
    mesh.fast_node_lookup_rebuild(c).unwrap();

    let after = mesh.one_ring(0).unwrap();
    assert_eq!(after.nodes, before.nodes);
    assert_eq!(after.tris, before.tris);
}

#[test]
fn tetrahedron_remove_tri_leaves_boundary() {
    let mut mesh = TriMesh::new();
    mesh.add_node(Node::from_coords(0.0, 0.0, 0.0));
    mesh.add_node(Node::from_coords(1.0, 0.0, 0.0));
    mesh.add_node(Node::from_coords(0.5, 0.866, 0.0));
    mesh.add_node(Node::from_coords(0.5, 0.289, 0.816));
    mesh.add_tri(Tri::new(0, 2, 1));
    mesh.add_tri(Tri::new(0, 1, 3));
    mesh.add_tri(Tri::new(1, 2, 3));
    mesh.add_tri(Tri::new(2, 0, 3));
    mesh.rebuild_corners(0, None).unwrap();

    mesh.remove_tri(2).unwrap();

    assert_eq!(mesh.tri_count(), 3);
    assert_eq!(mesh.corner_count(), 9);
    mesh.sanity_check(false, None, None).unwrap();
    // Boundary edges now exist where the removed triangle used to be.
    assert!(mesh.sanity_check(true, None, None).is_err());
}

#[test]
fn remove_nodes_batch_from_cube() {
    let mut mesh = unit_cube(false);
    mesh.rebuild_corners(0, None).unwrap();

    // Append orphan nodes scattered through the tail.
    let orphans: Vec<u32> = (0..3)
        .map(|i| mesh.add_node(Node::from_coords(10.0 + i as f32, 0.0, 0.0)))
        .collect();
    let survivor = mesh.add_node(Node::from_coords(42.0, 0.0, 0.0));

    let old_count = mesh.node_count();
    mesh.remove_nodes(&orphans).unwrap();

    assert_eq!(mesh.node_count(), old_count - orphans.len());
    for t in mesh.tris() {
        for &n in &t.nodes {
            assert!((n as usize) < mesh.node_count());
        }
    }
    mesh.sanity_check(false, None, None).unwrap();

    // The tail survivor relocated but kept its payload.
    let relocated = (0..mesh.node_count())
        .find(|&n| (mesh.node(n).pos.x - 42.0).abs() < 1e-6)
        .unwrap();
    assert!(relocated < mesh.node_count());
    let _ = survivor;
}

#[test]
fn merge_then_compact_workflow() {
    let mut mesh = unit_cube(false);
    mesh.rebuild_corners(0, None).unwrap();
    mesh.rebuild_lookup(0, None).unwrap();

    let ring0: HashSet<u32> = mesh.one_ring(0).unwrap().nodes.clone();
    let ring1: HashSet<u32> = mesh.one_ring(1).unwrap().nodes.clone();

    mesh.merge_node(0, 1).unwrap();

    let mut expect: HashSet<u32> = ring0.union(&ring1).copied().collect();
    expect.remove(&0);
    expect.remove(&1);
    assert_eq!(mesh.one_ring(0).unwrap().nodes, expect);

    let excluded: HashSet<u32> = [1].into_iter().collect();
    mesh.sanity_check(false, Some(&excluded), None).unwrap();

    // Flag and compact the orphan the way the embedding system batches it.
    mesh.node_mut(1).flags |= NodeFlags::KILL;
    let killed = mesh.killed_nodes();
    assert_eq!(killed, vec![1]);
    mesh.remove_nodes(&killed).unwrap();

    assert_eq!(mesh.node_count(), 7);
    mesh.sanity_check(false, None, None).unwrap();
}

#[test]
fn node_channel_follows_merge_and_compaction() {
    let mut mesh = unit_cube(false);
    mesh.rebuild_corners(0, None).unwrap();

    let ch = mesh.add_node_channel(Box::new(ScalarChannel::new()));
    {
        let data = &mut mesh
            .node_channel_mut(ch)
            .unwrap()
            .as_any_mut()
            .downcast_mut::<ScalarChannel>()
            .unwrap()
            .data;
        for (i, v) in data.iter_mut().enumerate() {
            *v = i as f32;
        }
    }

    // Merge 0 <- 1: channel blends with weight one half.
    mesh.merge_node(0, 1).unwrap();
    let data = &mesh
        .node_channel(ch)
        .unwrap()
        .as_any()
        .downcast_ref::<ScalarChannel>()
        .unwrap()
        .data;
    assert!((data[0] - 0.5).abs() < 1e-6);

    mesh.remove_nodes(&[1]).unwrap();
    assert_eq!(mesh.node_channel(ch).unwrap().len(), mesh.node_count());
    mesh.sanity_check(false, None, None).unwrap();
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// A valid triangle soup: every face references distinct in-range nodes.
    fn arb_soup(max_nodes: usize, max_tris: usize) -> impl Strategy<Value = (usize, Vec<[u32; 3]>)> {
        (4..=max_nodes).prop_flat_map(move |n| {
            let tri = (0..n as u32, 0..n as u32, 0..n as u32)
                .prop_filter_map("degenerate", |(a, b, c)| {
                    (a != b && b != c && a != c).then_some([a, b, c])
                });
            (Just(n), prop::collection::vec(tri, 1..=max_tris))
        })
    }

    proptest! {
        #[test]
        fn rebuilds_always_validate((n, faces) in arb_soup(12, 24)) {
            let mut mesh = TriMesh::new();
            for i in 0..n {
                mesh.add_node(Node::from_coords(i as f32, 0.0, 0.0));
            }
            for [a, b, c] in &faces {
                mesh.add_tri(Tri::new(*a, *b, *c));
            }
            mesh.rebuild_corners(0, None).unwrap();
            mesh.rebuild_lookup(0, None).unwrap();
            mesh.sanity_check(false, None, None).unwrap();
        }

        #[test]
        fn remove_nodes_handles_arbitrary_orphan_batches(picks in prop::collection::vec(0u32..6, 1..12)) {
            let mut mesh = unit_cube(false);
            mesh.rebuild_corners(0, None).unwrap();
            for i in 0..6 {
                mesh.add_node(Node::from_coords(20.0 + i as f32, 0.0, 0.0));
            }

            // Orphan ids 8..14, drawn unsorted and with repeats.
            let batch: Vec<u32> = picks.iter().map(|&p| 8 + p).collect();
            let unique: HashSet<u32> = batch.iter().copied().collect();

            mesh.remove_nodes(&batch).unwrap();
            prop_assert_eq!(mesh.node_count(), 14 - unique.len());
            mesh.sanity_check(false, None, None).unwrap();
        }

        #[test]
        fn remove_tri_preserves_invariants((n, faces) in arb_soup(10, 16), victim in 0usize..16) {
            let mut mesh = TriMesh::new();
            for i in 0..n {
                mesh.add_node(Node::from_coords(i as f32, 1.0, 0.0));
            }
            for [a, b, c] in &faces {
                mesh.add_tri(Tri::new(*a, *b, *c));
            }
            mesh.rebuild_corners(0, None).unwrap();
            mesh.rebuild_lookup(0, None).unwrap();

            let victim = victim % mesh.tri_count();
            let before = mesh.tri_count();
            mesh.remove_tri(victim).unwrap();

            prop_assert_eq!(mesh.tri_count(), before - 1);
            prop_assert_eq!(mesh.corner_count(), 3 * mesh.tri_count());
            mesh.sanity_check(false, None, None).unwrap();
        }
    }
}
