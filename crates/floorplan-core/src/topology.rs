//! Structural mutators for the wall graph.
//!
//! Every public method leaves the store bidirectionally consistent: a node
//! lists exactly the segments that reference it, and a segment's wall lists
//! exactly the segments that point back at it. Invalid input is reported as
//! a sentinel (`None`/`false`) and logged, never as a panic.

use crate::collinear;
use crate::error::{TopologyError, TopologyResult};
use crate::model::{Node, NodeId, NodeKind, Segment, SegmentId, Wall, WallId, WallKind};
use crate::store::EntityStore;
use kurbo::{Line, Point};
use std::collections::BTreeSet;

/// Partial update applied by [`EntityStore::update_wall`].
#[derive(Debug, Clone, Default)]
pub struct WallUpdate {
    /// New category (changes the thickness).
    pub kind: Option<WallKind>,
    /// New visibility.
    pub visible: Option<bool>,
    /// Replacement member list. Unknown ids are dropped.
    pub segment_ids: Option<Vec<SegmentId>>,
}

impl WallUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: WallKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_segments(mut self, segment_ids: Vec<SegmentId>) -> Self {
        self.segment_ids = Some(segment_ids);
        self
    }
}

impl EntityStore {
    // --- Nodes ---

    /// Create an endpoint node at `(x, y)`.
    /// Returns `None` without consuming an id if a coordinate is not finite.
    pub fn create_node(&mut self, x: f64, y: f64) -> Option<NodeId> {
        self.create_node_with_kind(Point::new(x, y), NodeKind::Endpoint)
    }

    /// Create a node of the given kind. Returns `None` for non-finite
    /// coordinates.
    pub fn create_node_with_kind(&mut self, position: Point, kind: NodeKind) -> Option<NodeId> {
        if !position.is_finite() {
            log::debug!("create_node rejected: non-finite position ({}, {})", position.x, position.y);
            return None;
        }
        let id = self.allocate_node_id();
        self.insert_node(Node::new(id, position, kind));
        log::trace!("Created {:?} node {} at ({}, {})", kind, id, position.x, position.y);
        Some(id)
    }

    /// Move a node and refresh the cached geometry of its segments.
    /// Returns false if the node does not exist or a coordinate is not
    /// finite.
    pub fn update_node(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            log::debug!("update_node ignored: {}", TopologyError::NonFiniteCoordinate(id));
            return false;
        }
        let Some(node) = self.node_mut(id) else {
            log::debug!("update_node ignored: {}", TopologyError::NodeNotFound(id));
            return false;
        };
        node.position = Point::new(x, y);
        let connected: Vec<SegmentId> = node.connected_segments().collect();

        for segment in connected {
            if !self.refresh_segment_geometry(segment) {
                log::warn!("Skipping geometry refresh of {} while moving {}", segment, id);
            }
        }
        true
    }

    /// Delete a node together with every segment attached to it.
    /// Returns false if the node does not exist.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let connected: Vec<SegmentId> = node.connected_segments().collect();

        let mut recheck = BTreeSet::new();
        for segment in connected {
            if let Some(removed) = self.detach_segment(segment) {
                recheck.insert(removed.start);
                recheck.insert(removed.end);
            }
        }
        recheck.remove(&id);
        self.remove_node(id);
        log::debug!("Deleted node {}", id);

        collinear::cleanup_worklist(self, recheck);
        true
    }

    // --- Segments ---

    fn check_new_segment(&self, start: NodeId, end: NodeId) -> TopologyResult<Line> {
        if start == end {
            return Err(TopologyError::SelfLoop(start));
        }
        let start_node = self.node(start).ok_or(TopologyError::NodeNotFound(start))?;
        let end_node = self.node(end).ok_or(TopologyError::NodeNotFound(end))?;
        if let Some(existing) = self.segment_between(start, end) {
            return Err(TopologyError::DuplicateSegment { start, end, existing });
        }
        Ok(Line::new(start_node.position, end_node.position))
    }

    /// Create a segment between two existing, distinct nodes.
    ///
    /// Returns `None` without consuming an id when either node is missing,
    /// both ids are the same, or the two nodes are already connected.
    pub fn create_segment(&mut self, start: NodeId, end: NodeId) -> Option<SegmentId> {
        let line = match self.check_new_segment(start, end) {
            Ok(line) => line,
            Err(e) => {
                log::debug!("create_segment rejected: {}", e);
                return None;
            }
        };

        let id = self.allocate_segment_id();
        self.insert_segment(Segment::new(id, start, end, line));
        for node in [start, end] {
            if let Some(node) = self.node_mut(node) {
                node.connected_segments.insert(id);
            }
        }
        log::trace!("Created segment {} ({} -> {})", id, start, end);
        Some(id)
    }

    /// Delete a segment and re-check both former endpoints for collinear
    /// cleanup. Returns false if the segment does not exist.
    pub fn delete_segment(&mut self, id: SegmentId) -> bool {
        let Some(removed) = self.detach_segment(id) else {
            return false;
        };
        log::debug!("Deleted segment {}", id);
        collinear::cleanup_worklist(self, [removed.start, removed.end]);
        true
    }

    /// Remove a segment from its nodes, its wall and the table, without
    /// triggering any cleanup.
    pub(crate) fn detach_segment(&mut self, id: SegmentId) -> Option<Segment> {
        let segment = self.remove_segment(id)?;
        for node_id in [segment.start, segment.end] {
            match self.node_mut(node_id) {
                Some(node) => {
                    node.connected_segments.remove(&id);
                }
                None => log::warn!("Segment {} referenced missing node {}", id, node_id),
            }
        }
        if let Some(wall_id) = segment.wall {
            if let Some(wall) = self.wall_mut(wall_id) {
                wall.remove_segment(id);
            }
        }
        Some(segment)
    }

    /// The segment connecting `a` and `b`, in either direction.
    pub fn segment_between(&self, a: NodeId, b: NodeId) -> Option<SegmentId> {
        let node = self.node(a)?;
        node.connected_segments()
            .find(|&s| self.segment(s).and_then(|seg| seg.other_end(a)) == Some(b))
    }

    // --- Walls ---

    /// Create a wall owning the given segments. Unknown segment ids are
    /// skipped; a segment owned by another wall is moved to the new one.
    pub fn create_wall(&mut self, kind: WallKind, segment_ids: &[SegmentId]) -> WallId {
        let id = self.allocate_wall_id();
        self.insert_wall(Wall::new(id, kind));
        for &segment in segment_ids {
            self.attach_to_wall(segment, id);
        }
        log::debug!(
            "Created {:?} wall {} with {} segments",
            kind,
            id,
            self.wall(id).map_or(0, |w| w.segment_ids.len())
        );
        id
    }

    /// Apply a partial update. Returns false if the wall does not exist.
    pub fn update_wall(&mut self, id: WallId, update: WallUpdate) -> bool {
        let Some(wall) = self.wall_mut(id) else {
            return false;
        };
        if let Some(kind) = update.kind {
            wall.kind = kind;
        }
        if let Some(visible) = update.visible {
            wall.visible = visible;
        }
        wall.touch();

        if let Some(segment_ids) = update.segment_ids {
            let current = wall.segment_ids.clone();
            for segment in current {
                if !segment_ids.contains(&segment) {
                    self.detach_from_wall(segment);
                }
            }
            for segment in segment_ids {
                self.attach_to_wall(segment, id);
            }
        }
        true
    }

    /// Add segments to a wall. Returns false if the wall does not exist.
    pub fn add_segments_to_wall(&mut self, id: WallId, segment_ids: &[SegmentId]) -> bool {
        if !self.contains_wall(id) {
            return false;
        }
        for &segment in segment_ids {
            self.attach_to_wall(segment, id);
        }
        true
    }

    /// Remove segments from a wall; the segments themselves stay in the graph.
    /// Returns false if the wall does not exist.
    pub fn remove_segments_from_wall(&mut self, id: WallId, segment_ids: &[SegmentId]) -> bool {
        if !self.contains_wall(id) {
            return false;
        }
        for &segment in segment_ids {
            if self.segment(segment).and_then(|s| s.wall) == Some(id) {
                self.detach_from_wall(segment);
            }
        }
        true
    }

    /// Delete a wall. With `cascade_segments` its segments are deleted too,
    /// otherwise they stay in the graph without a wall.
    pub fn delete_wall(&mut self, id: WallId, cascade_segments: bool) -> bool {
        let Some(wall) = self.remove_wall(id) else {
            return false;
        };
        for &segment in &wall.segment_ids {
            if let Some(segment) = self.segment_mut(segment) {
                segment.wall = None;
            }
        }

        if cascade_segments {
            let mut recheck = BTreeSet::new();
            for &segment in &wall.segment_ids {
                if let Some(removed) = self.detach_segment(segment) {
                    recheck.insert(removed.start);
                    recheck.insert(removed.end);
                }
            }
            collinear::cleanup_worklist(self, recheck);
        }
        log::debug!(
            "Deleted wall {} ({} segments, cascade: {})",
            id,
            wall.segment_ids.len(),
            cascade_segments
        );
        true
    }

    /// Move every segment of `source` into `target` and delete `source`.
    pub fn merge_walls(&mut self, target: WallId, source: WallId) -> bool {
        if target == source || !self.contains_wall(target) {
            return false;
        }
        let Some(source_wall) = self.remove_wall(source) else {
            return false;
        };
        for segment in source_wall.segment_ids {
            if let Some(seg) = self.segment_mut(segment) {
                seg.wall = None;
            }
            self.attach_to_wall(segment, target);
        }
        log::debug!("Merged wall {} into {}", source, target);
        true
    }

    /// Make `segment` a member of `wall`, leaving any previous wall.
    /// Returns false if either record is missing.
    pub(crate) fn attach_to_wall(&mut self, segment: SegmentId, wall: WallId) -> bool {
        if !self.contains_wall(wall) {
            return false;
        }
        let Some(seg) = self.segments.get_mut(&segment) else {
            return false;
        };
        let previous = seg.wall.replace(wall);
        if let Some(previous) = previous.filter(|&p| p != wall) {
            if let Some(previous) = self.walls.get_mut(&previous) {
                previous.remove_segment(segment);
            }
        }
        if let Some(target) = self.walls.get_mut(&wall) {
            target.push_segment(segment);
        }
        true
    }

    /// Insert `segment` into `wall` at `index` (clamped), leaving any
    /// previous wall.
    pub(crate) fn attach_to_wall_at(&mut self, segment: SegmentId, wall: WallId, index: usize) -> bool {
        if !self.attach_to_wall(segment, wall) {
            return false;
        }
        if let Some(target) = self.walls.get_mut(&wall) {
            if let Some(current) = target.segment_ids.iter().position(|&s| s == segment) {
                target.segment_ids.remove(current);
                let index = index.min(target.segment_ids.len());
                target.segment_ids.insert(index, segment);
            }
        }
        true
    }

    /// Clear a segment's wall and drop it from that wall's list.
    pub(crate) fn detach_from_wall(&mut self, segment: SegmentId) {
        let Some(seg) = self.segments.get_mut(&segment) else {
            return;
        };
        if let Some(wall) = seg.wall.take() {
            if let Some(wall) = self.walls.get_mut(&wall) {
                wall.remove_segment(segment);
            }
        }
    }
}
