//! Collinear merge: collapsing redundant degree-2 nodes.
//!
//! A node is redundant when it joins exactly two segments that lie on one
//! line. Merging replaces the pair with a single segment between the two
//! outer nodes. Cascades run off an explicit worklist, so the number of
//! merges in one call is bounded by the number of nodes.

use crate::geometry::segments_collinear;
use crate::model::{NodeId, SegmentId, WallId};
use crate::store::EntityStore;
use crate::validate::debug_check;
use std::collections::{HashSet, VecDeque};

/// The two segments around a redundant node and their outer endpoints.
struct MergeCandidate {
    first: SegmentId,
    second: SegmentId,
    outer_first: NodeId,
    outer_second: NodeId,
}

fn merge_candidate(store: &EntityStore, node_id: NodeId) -> Option<MergeCandidate> {
    let node = store.node(node_id)?;
    if node.degree() != 2 {
        return None;
    }
    let mut connected = node.connected_segments();
    let (first, second) = (connected.next()?, connected.next()?);

    let (Some(seg_first), Some(seg_second)) = (store.segment(first), store.segment(second)) else {
        log::warn!("Node {} lists a missing segment; skipping cleanup", node_id);
        return None;
    };
    let outer_first = seg_first.other_end(node_id)?;
    let outer_second = seg_second.other_end(node_id)?;
    if outer_first == outer_second || store.segment_between(outer_first, outer_second).is_some() {
        return None;
    }

    let line_first = store.segment_line(first)?;
    let line_second = store.segment_line(second)?;
    if !segments_collinear(line_first, line_second) {
        return None;
    }

    Some(MergeCandidate {
        first,
        second,
        outer_first,
        outer_second,
    })
}

/// True iff `node` has exactly two segments, is an endpoint of both, and the
/// two segments are collinear.
pub fn should_cleanup(store: &EntityStore, node: NodeId) -> bool {
    merge_candidate(store, node).is_some()
}

/// Collapse a redundant node. Returns the merged segment, or `None` if the
/// node is not eligible.
///
/// Wall membership of the merged segment:
/// - both segments on the same wall: it takes their place in that wall;
/// - exactly one on a wall: it joins that wall;
/// - on two different walls: it joins neither, and each wall loses its segment;
/// - neither on a wall: it stays wall-less.
pub fn merge_at(store: &mut EntityStore, node: NodeId) -> Option<SegmentId> {
    let candidate = merge_candidate(store, node)?;

    let wall_slot = |store: &EntityStore, segment: SegmentId| -> Option<(WallId, usize)> {
        let wall_id = store.segment(segment)?.wall()?;
        let index = store.wall(wall_id)?.segment_ids().iter().position(|&s| s == segment)?;
        Some((wall_id, index))
    };
    let slot_first = wall_slot(store, candidate.first);
    let slot_second = wall_slot(store, candidate.second);

    store.detach_segment(candidate.first);
    store.detach_segment(candidate.second);
    store.remove_node(node);

    let Some(merged) = store.create_segment(candidate.outer_first, candidate.outer_second) else {
        log::warn!(
            "Could not reconnect {} and {} after removing {}",
            candidate.outer_first,
            candidate.outer_second,
            node
        );
        return None;
    };

    match (slot_first, slot_second) {
        (Some((a, index_a)), Some((b, index_b))) if a == b => {
            store.attach_to_wall_at(merged, a, index_a.min(index_b));
        }
        (Some((wall, index)), None) | (None, Some((wall, index))) => {
            store.attach_to_wall_at(merged, wall, index);
        }
        (Some((a, _)), Some((b, _))) => {
            log::debug!("Merged segment {} spans walls {} and {}; left wall-less", merged, a, b);
        }
        (None, None) => {}
    }

    log::debug!(
        "Collapsed node {}: {} + {} -> {}",
        node,
        candidate.first,
        candidate.second,
        merged
    );
    debug_check(store);
    Some(merged)
}

/// Run merges off a worklist of nodes to re-check. Each merge queues the two
/// outer nodes again. Returns the nodes that were removed.
pub(crate) fn cleanup_worklist(
    store: &mut EntityStore,
    nodes: impl IntoIterator<Item = NodeId>,
) -> Vec<NodeId> {
    let mut queue: VecDeque<NodeId> = nodes.into_iter().collect();
    let mut queued: HashSet<NodeId> = queue.iter().copied().collect();
    let mut removed = Vec::new();

    while let Some(node) = queue.pop_front() {
        queued.remove(&node);
        if !store.contains_node(node) {
            continue;
        }
        let Some(merged) = merge_at(store, node) else {
            continue;
        };
        removed.push(node);

        if let Some(segment) = store.segment(merged) {
            for outer in [segment.start(), segment.end()] {
                if queued.insert(outer) {
                    queue.push_back(outer);
                }
            }
        }
    }
    removed
}

/// Try to collapse every node in the store. Returns the nodes that were
/// removed; a second call with no mutation in between returns an empty list.
pub fn batch_cleanup(store: &mut EntityStore) -> Vec<NodeId> {
    let snapshot = store.node_ids();
    let removed = cleanup_worklist(store, snapshot);
    if !removed.is_empty() {
        log::debug!("Collinear cleanup removed {} nodes", removed.len());
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WallKind;
    use crate::validate::check_invariants;

    fn chain(store: &mut EntityStore, points: &[(f64, f64)]) -> (Vec<NodeId>, Vec<SegmentId>) {
        let nodes: Vec<NodeId> = points.iter().map(|&(x, y)| store.create_node(x, y).unwrap()).collect();
        let segments = nodes
            .windows(2)
            .map(|w| store.create_segment(w[0], w[1]).unwrap())
            .collect();
        (nodes, segments)
    }

    #[test]
    fn test_should_cleanup_straight_chain() {
        let mut store = EntityStore::new();
        let (nodes, _) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        assert!(should_cleanup(&store, nodes[1]));
        assert!(!should_cleanup(&store, nodes[0]));
    }

    #[test]
    fn test_should_not_cleanup_corner() {
        let mut store = EntityStore::new();
        let (nodes, _) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        assert!(!should_cleanup(&store, nodes[1]));
        assert!(merge_at(&mut store, nodes[1]).is_none());
        assert_eq!(store.segment_count(), 2);
    }

    #[test]
    fn test_should_not_cleanup_junction() {
        let mut store = EntityStore::new();
        let (nodes, _) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let spur = store.create_node(5.0, 5.0).unwrap();
        store.create_segment(nodes[1], spur).unwrap();
        assert!(!should_cleanup(&store, nodes[1]));
    }

    #[test]
    fn test_merge_same_wall_replaces_in_place() {
        let mut store = EntityStore::new();
        let (nodes, segments) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (10.0, 5.0)]);
        let wall = store.create_wall(WallKind::Layout, &segments);

        let merged = merge_at(&mut store, nodes[1]).unwrap();
        assert_eq!(store.wall(wall).unwrap().segment_ids(), &[merged, segments[2]]);
        assert_eq!(store.segment(merged).unwrap().wall(), Some(wall));
        assert!((store.segment(merged).unwrap().length() - 10.0).abs() < 1e-12);
        check_invariants(&store).unwrap();
    }

    #[test]
    fn test_merge_one_wall() {
        let mut store = EntityStore::new();
        let (nodes, segments) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let wall = store.create_wall(WallKind::Zone, &segments[1..]);

        let merged = merge_at(&mut store, nodes[1]).unwrap();
        assert_eq!(store.segment(merged).unwrap().wall(), Some(wall));
        assert_eq!(store.wall(wall).unwrap().segment_ids(), &[merged]);
    }

    #[test]
    fn test_merge_across_walls_detaches() {
        let mut store = EntityStore::new();
        let (nodes, segments) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let first = store.create_wall(WallKind::Layout, &segments[..1]);
        let second = store.create_wall(WallKind::Zone, &segments[1..]);

        let merged = merge_at(&mut store, nodes[1]).unwrap();
        assert_eq!(store.segment(merged).unwrap().wall(), None);
        assert!(store.wall(first).unwrap().is_empty());
        assert!(store.wall(second).unwrap().is_empty());
        check_invariants(&store).unwrap();
    }

    #[test]
    fn test_batch_cleanup_collapses_long_chain_once() {
        let mut store = EntityStore::new();
        let points: Vec<(f64, f64)> = (0..6).map(|i| (i as f64 * 2.0, 0.0)).collect();
        let (nodes, _) = chain(&mut store, &points);

        let removed = batch_cleanup(&mut store);
        assert_eq!(removed.len(), 4);
        assert_eq!(store.segment_count(), 1);
        assert!(store.segment_between(nodes[0], nodes[5]).is_some());
        assert!(batch_cleanup(&mut store).is_empty());
    }

    #[test]
    fn test_cleanup_keeps_triangle_closing_edge() {
        // Merging b would duplicate the existing a-c segment.
        let mut store = EntityStore::new();
        let (nodes, _) = chain(&mut store, &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        store.create_segment(nodes[0], nodes[2]).unwrap();
        assert!(!should_cleanup(&store, nodes[1]));
    }
}
