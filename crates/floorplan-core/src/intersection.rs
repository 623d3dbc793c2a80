//! Splicing newly drawn segments into the existing graph.
//!
//! When a segment crosses existing geometry, both the existing segment and
//! the new one are split at a shared node so the crossing becomes a real
//! junction instead of two overlapping spans.

use crate::geometry::{distance_to_segment, segment_crossing, segments_collinear, NODE_DEDUP_EPSILON};
use crate::model::{NodeId, NodeKind, SegmentId};
use crate::store::EntityStore;
use crate::validate::debug_check;
use kurbo::Point;

/// One segment replaced by the segments listed in `replacements`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentModification {
    pub original: SegmentId,
    pub replacements: Vec<SegmentId>,
}

impl SegmentModification {
    /// Replace `original` in `segments` with its replacements, keeping order.
    /// Returns true if `original` was present.
    pub fn apply_to(&self, segments: &mut Vec<SegmentId>) -> bool {
        let Some(index) = segments.iter().position(|&s| s == self.original) else {
            return false;
        };
        segments.splice(index..=index, self.replacements.iter().copied());
        true
    }
}

/// A crossing between `segment` and an existing segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub other: SegmentId,
    pub point: Point,
    /// Parameter along `segment`, used to order crossings from its start.
    pub t: f64,
}

/// Crossings between `segment` and every other segment that does not share
/// an endpoint with it, ordered from the segment's start.
pub fn find_intersections(store: &EntityStore, segment: SegmentId) -> Vec<Crossing> {
    let (Some(subject), Some(line)) = (store.segment(segment), store.segment_line(segment)) else {
        return Vec::new();
    };

    let mut crossings: Vec<Crossing> = store
        .segments()
        .filter(|other| other.id() != segment && !other.shares_endpoint_with(subject))
        .filter_map(|other| {
            let other_line = store.segment_line(other.id())?;
            let crossing = segment_crossing(line, other_line)?;
            log::trace!("{} crosses {} at ({}, {})", segment, other.id(), crossing.point.x, crossing.point.y);
            Some(Crossing {
                other: other.id(),
                point: crossing.point,
                t: crossing.t,
            })
        })
        .collect();

    crossings.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.other.cmp(&b.other)));
    crossings
}

/// Segments lying on the same line as `segment` with overlapping extent.
/// These are never split by [`process_intersections`].
pub fn collinear_overlaps(store: &EntityStore, segment: SegmentId) -> Vec<SegmentId> {
    let Some(line) = store.segment_line(segment) else {
        return Vec::new();
    };
    let mut overlaps: Vec<SegmentId> = store
        .segments()
        .filter(|other| other.id() != segment)
        .filter_map(|other| {
            let other_line = store.segment_line(other.id())?;
            if !segments_collinear(line, other_line) {
                return None;
            }
            let direction = line.p1 - line.p0;
            let length_sq = direction.dot(direction);
            if length_sq == 0.0 {
                return None;
            }
            let t0 = (other_line.p0 - line.p0).dot(direction) / length_sq;
            let t1 = (other_line.p1 - line.p0).dot(direction) / length_sq;
            let (lo, hi) = (t0.min(t1), t0.max(t1));
            // Touching at a single endpoint is a connection, not an overlap.
            let eps = NODE_DEDUP_EPSILON / length_sq.sqrt();
            (hi > eps && lo < 1.0 - eps).then_some(other.id())
        })
        .collect();
    overlaps.sort();
    overlaps
}

/// The node among `candidates` nearest to `point`, if within
/// [`NODE_DEDUP_EPSILON`]. Ties go to the lower id.
fn nearest_within_epsilon(
    store: &EntityStore,
    candidates: impl Iterator<Item = NodeId>,
    point: Point,
) -> Option<NodeId> {
    candidates
        .filter_map(|id| Some((id, store.node(id)?.position().distance(point))))
        .filter(|&(_, d)| d <= NODE_DEDUP_EPSILON)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(id, _)| id)
}

/// The endpoint of one of `segments` lying on `point`, if any.
fn endpoint_at(store: &EntityStore, segments: &[SegmentId], point: Point) -> Option<NodeId> {
    let endpoints = segments
        .iter()
        .filter_map(|&s| store.segment(s))
        .flat_map(|s| [s.start(), s.end()]);
    nearest_within_epsilon(store, endpoints, point)
}

/// The existing node within [`NODE_DEDUP_EPSILON`] of `point`, or a new
/// node of `kind` there. Returns `None` only for a non-finite `point`.
pub(crate) fn find_or_create_node_at(store: &mut EntityStore, point: Point, kind: NodeKind) -> Option<NodeId> {
    let existing = nearest_within_epsilon(store, store.nodes().map(|n| n.id()), point);
    match existing {
        Some(id) => Some(id),
        None => store.create_node_with_kind(point, kind),
    }
}

/// Split `segment` at an existing `node`, carrying wall membership over to
/// both halves. Returns `None` if the segment is missing, `node` is already
/// one of its endpoints, or either half would have zero length.
pub(crate) fn split_segment_at_node(
    store: &mut EntityStore,
    segment: SegmentId,
    node: NodeId,
) -> Option<SegmentModification> {
    let seg = store.segment(segment)?;
    if seg.has_endpoint(node) {
        return None;
    }
    let (start, end, wall) = (seg.start(), seg.end(), seg.wall());
    let at = store.node(node)?.position();
    let line = store.segment_line(segment)?;
    if at.distance(line.p0) < NODE_DEDUP_EPSILON || at.distance(line.p1) < NODE_DEDUP_EPSILON {
        log::debug!("Not splitting {} at {}: a half would have zero length", segment, node);
        return None;
    }

    store.detach_segment(segment);
    let replacements: Vec<SegmentId> = [(start, node), (node, end)]
        .into_iter()
        .filter_map(|(a, b)| store.create_segment(a, b))
        .collect();

    if let Some(wall) = wall {
        for &replacement in &replacements {
            store.attach_to_wall(replacement, wall);
        }
    }
    if let Some(n) = store.node_mut(node) {
        if n.kind == NodeKind::Endpoint && n.degree() >= 3 {
            n.kind = NodeKind::Junction;
        }
    }

    log::debug!("Split {} at {} into {:?}", segment, node, replacements);
    Some(SegmentModification {
        original: segment,
        replacements,
    })
}

/// Split `segment` at `point` (snapped to an existing node if one is within
/// [`NODE_DEDUP_EPSILON`]). Returns the node and the modification record.
pub fn split_segment_at(
    store: &mut EntityStore,
    segment: SegmentId,
    point: Point,
) -> Option<(NodeId, SegmentModification)> {
    if !store.contains_segment(segment) {
        return None;
    }
    let node = find_or_create_node_at(store, point, NodeKind::Intersection)?;
    let modification = split_segment_at_node(store, segment, node)?;
    Some((node, modification))
}

/// Splice `segment` into the graph at every point where it crosses an
/// existing segment.
///
/// Each crossed segment is split at a shared `Intersection` node, and the
/// piece of `segment` containing that point is split there as well, so every
/// crossing ends up as a junction. Returns one record per replaced segment,
/// in the order the replacements happened.
pub fn process_intersections(store: &mut EntityStore, segment: SegmentId) -> Vec<SegmentModification> {
    let crossings = find_intersections(store, segment);
    if crossings.is_empty() {
        return Vec::new();
    }

    // Live pieces of the subject segment, in order from its start.
    let mut pieces = vec![segment];
    let mut modifications = Vec::new();

    for crossing in crossings {
        // Prefer an endpoint of the two crossing segments over any other
        // node that happens to sit at the same point.
        let mut local = pieces.clone();
        local.push(crossing.other);
        let node = match endpoint_at(store, &local, crossing.point) {
            Some(node) => node,
            None => match find_or_create_node_at(store, crossing.point, NodeKind::Intersection) {
                Some(node) => node,
                None => continue,
            },
        };

        if let Some(modification) = split_segment_at_node(store, crossing.other, node) {
            modifications.push(modification);
        }

        let point = match store.node(node) {
            Some(n) => n.position(),
            None => continue,
        };
        let containing = pieces.iter().position(|&piece| {
            store.segment(piece).is_some_and(|s| !s.has_endpoint(node))
                && store
                    .segment_line(piece)
                    .is_some_and(|line| distance_to_segment(point, line.p0, line.p1) <= NODE_DEDUP_EPSILON)
        });
        if let Some(index) = containing {
            if let Some(modification) = split_segment_at_node(store, pieces[index], node) {
                modification.apply_to(&mut pieces);
                modifications.push(modification);
            }
        }
    }

    log::debug!(
        "Spliced {} into the graph: {} pieces, {} replacements",
        segment,
        pieces.len(),
        modifications.len()
    );
    debug_check(store);
    modifications
}
