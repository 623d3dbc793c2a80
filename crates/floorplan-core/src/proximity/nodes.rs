//! Node deduplication: folding near-coincident nodes into one.

use crate::model::{NodeId, SegmentId};
use crate::store::EntityStore;
use crate::validate::debug_check;

/// `removed` was folded into `kept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMerge {
    pub kept: NodeId,
    pub removed: NodeId,
}

/// Fold `removed` into `kept`: every segment of `removed` is re-pointed to
/// `kept`. A segment that would collapse onto `kept` or duplicate an existing
/// connection is deleted instead.
fn absorb_node(store: &mut EntityStore, kept: NodeId, removed: NodeId) {
    let Some(node) = store.node(removed) else {
        return;
    };
    let connected: Vec<SegmentId> = node.connected_segments().collect();

    for segment in connected {
        let Some(other) = store.segment(segment).and_then(|s| s.other_end(removed)) else {
            log::warn!("Node {} lists foreign segment {}; dropping reference", removed, segment);
            continue;
        };
        if other == kept || store.segment_between(kept, other).is_some() {
            log::trace!("Dropping {} while folding {} into {}", segment, removed, kept);
            store.detach_segment(segment);
            continue;
        }

        if let Some(seg) = store.segment_mut(segment) {
            if seg.start == removed {
                seg.start = kept;
            } else {
                seg.end = kept;
            }
        }
        if let Some(kept_node) = store.node_mut(kept) {
            kept_node.connected_segments.insert(segment);
        }
        store.refresh_segment_geometry(segment);
    }

    store.remove_node(removed);
}

/// Merge nodes among `candidates` that lie within `threshold` of any node in
/// the store. The lower id survives and keeps its position.
pub fn deduplicate_nodes_among(
    store: &mut EntityStore,
    candidates: &[NodeId],
    threshold: f64,
) -> Vec<NodeMerge> {
    let mut merges = Vec::new();
    let mut candidates = candidates.to_vec();
    candidates.sort();
    candidates.dedup();

    for candidate in candidates {
        let Some(position) = store.node(candidate).map(|n| n.position()) else {
            continue;
        };
        let mut nearby: Vec<NodeId> = store
            .nodes()
            .filter(|n| n.id() != candidate && n.position().distance(position) <= threshold)
            .map(|n| n.id())
            .collect();
        if nearby.is_empty() {
            continue;
        }
        nearby.push(candidate);
        nearby.sort();

        let kept = nearby[0];
        for &removed in &nearby[1..] {
            absorb_node(store, kept, removed);
            merges.push(NodeMerge { kept, removed });
        }
    }

    if !merges.is_empty() {
        log::debug!("Folded {} near-coincident nodes (threshold {})", merges.len(), threshold);
    }
    debug_check(store);
    merges
}

/// Merge every group of nodes lying within `threshold` of each other.
pub fn deduplicate_nodes(store: &mut EntityStore, threshold: f64) -> Vec<NodeMerge> {
    let all = store.node_ids();
    deduplicate_nodes_among(store, &all, threshold)
}
