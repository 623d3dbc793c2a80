//! Integrity checks for the wall graph.
//!
//! [`check_invariants`] walks every table and reports the first broken
//! relationship. [`debug_check`] runs it under `debug_assertions` only; the
//! splicing, cleanup, deduplication and drawing passes call it on exit.

use crate::error::{TopologyError, TopologyResult};
use crate::store::EntityStore;

/// Tolerance for comparing cached segment geometry with its endpoints.
const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Verify that the store is internally consistent:
/// - node coordinates are finite;
/// - every segment has two distinct, existing endpoints that list it;
/// - every segment listed by a node references that node;
/// - segment/wall membership agrees in both directions;
/// - cached segment length and angle match the endpoints.
pub fn check_invariants(store: &EntityStore) -> TopologyResult<()> {
    for node in store.nodes() {
        if !node.x().is_finite() || !node.y().is_finite() {
            return Err(TopologyError::NonFiniteCoordinate(node.id()));
        }
        for segment_id in node.connected_segments() {
            let segment = store
                .segment(segment_id)
                .ok_or_else(|| TopologyError::InconsistentMembership(format!(
                    "node {} lists missing segment {}",
                    node.id(),
                    segment_id
                )))?;
            if !segment.has_endpoint(node.id()) {
                return Err(TopologyError::InconsistentMembership(format!(
                    "node {} lists {} which does not end at it",
                    node.id(),
                    segment_id
                )));
            }
        }
    }

    for segment in store.segments() {
        if segment.start() == segment.end() {
            return Err(TopologyError::SelfLoop(segment.start()));
        }
        for node_id in [segment.start(), segment.end()] {
            let node = store.node(node_id).ok_or(TopologyError::DanglingReference {
                segment: segment.id(),
                node: node_id,
            })?;
            if !node.is_connected_to(segment.id()) {
                return Err(TopologyError::InconsistentMembership(format!(
                    "{} does not list segment {}",
                    node_id,
                    segment.id()
                )));
            }
        }

        if let Some(wall_id) = segment.wall() {
            let wall = store.wall(wall_id).ok_or(TopologyError::WallNotFound(wall_id))?;
            if !wall.contains(segment.id()) {
                return Err(TopologyError::InconsistentMembership(format!(
                    "{} points at wall {} which does not list it",
                    segment.id(),
                    wall_id
                )));
            }
        }

        if let Some(line) = store.segment_line(segment.id()) {
            let delta = line.p1 - line.p0;
            let stale_length = (segment.length() - delta.hypot()).abs() > GEOMETRY_TOLERANCE;
            let stale_angle = delta.hypot() > 0.0
                && (segment.angle() - delta.y.atan2(delta.x)).abs() > GEOMETRY_TOLERANCE;
            if stale_length || stale_angle {
                return Err(TopologyError::StaleGeometry(segment.id()));
            }
        }
    }

    for wall in store.walls() {
        let mut seen = std::collections::HashSet::new();
        for &segment_id in wall.segment_ids() {
            if !seen.insert(segment_id) {
                return Err(TopologyError::InconsistentMembership(format!(
                    "wall {} lists {} twice",
                    wall.id(),
                    segment_id
                )));
            }
            let segment = store
                .segment(segment_id)
                .ok_or(TopologyError::SegmentNotFound(segment_id))?;
            if segment.wall() != Some(wall.id()) {
                return Err(TopologyError::InconsistentMembership(format!(
                    "wall {} lists {} which belongs to {:?}",
                    wall.id(),
                    segment_id,
                    segment.wall()
                )));
            }
        }
    }

    Ok(())
}

/// Assert the invariants in debug builds; a no-op in release builds.
#[allow(unused_variables)]
pub fn debug_check(store: &EntityStore) {
    #[cfg(debug_assertions)]
    {
        if let Err(e) = check_invariants(store) {
            debug_assert!(false, "Wall graph invariant broken: {}", e);
        }
    }
}
