//! Canonical id→record tables for nodes, segments and walls.
//!
//! The store performs no validation. Structural changes go through the
//! mutators in [`topology`](crate::topology); the processors in this crate
//! borrow the store for the duration of a single call and never keep
//! references across calls.

use crate::model::{Node, NodeId, Segment, SegmentId, Wall, WallId};
use kurbo::Line;
use std::collections::HashMap;

/// Owner of every node, segment and wall record.
///
/// Ids come from a single monotonic counter shared by all three tables, so
/// an id is never handed out twice, even after its record is removed.
/// Cloning the store is the supported way to snapshot it.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) segments: HashMap<SegmentId, Segment>,
    pub(crate) walls: HashMap<WallId, Wall>,
    last_id: u64,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    pub(crate) fn allocate_node_id(&mut self) -> NodeId {
        NodeId(self.allocate())
    }

    pub(crate) fn allocate_segment_id(&mut self) -> SegmentId {
        SegmentId(self.allocate())
    }

    pub(crate) fn allocate_wall_id(&mut self) -> WallId {
        WallId(self.allocate())
    }

    /// The most recently allocated raw id (0 before any allocation).
    pub fn last_allocated_id(&self) -> u64 {
        self.last_id
    }

    // --- Lookups ---

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a segment by id.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    /// Get a wall by id.
    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(&id)
    }

    pub(crate) fn wall_mut(&mut self, id: WallId) -> Option<&mut Wall> {
        self.walls.get_mut(&id)
    }

    /// Check if a node with this id exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Check if a segment with this id exists.
    pub fn contains_segment(&self, id: SegmentId) -> bool {
        self.segments.contains_key(&id)
    }

    /// Check if a wall with this id exists.
    pub fn contains_wall(&self, id: WallId) -> bool {
        self.walls.contains_key(&id)
    }

    // --- Raw table writes ---

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    pub(crate) fn insert_segment(&mut self, segment: Segment) {
        self.segments.insert(segment.id, segment);
    }

    pub(crate) fn insert_wall(&mut self, wall: Wall) {
        self.walls.insert(wall.id, wall);
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub(crate) fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        self.segments.remove(&id)
    }

    pub(crate) fn remove_wall(&mut self, id: WallId) -> Option<Wall> {
        self.walls.remove(&id)
    }

    // --- Full scans ---

    /// Iterate over all nodes in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over all segments in arbitrary order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Iterate over all walls in arbitrary order.
    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.values()
    }

    /// All nodes, ordered by id.
    pub fn all_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// All segments, ordered by id.
    pub fn all_segments(&self) -> Vec<&Segment> {
        let mut segments: Vec<&Segment> = self.segments.values().collect();
        segments.sort_by_key(|s| s.id);
        segments
    }

    /// All walls, ordered by id.
    pub fn all_walls(&self) -> Vec<&Wall> {
        let mut walls: Vec<&Wall> = self.walls.values().collect();
        walls.sort_by_key(|w| w.id);
        walls
    }

    /// Snapshot of node ids, ordered.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Snapshot of segment ids, ordered.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        let mut ids: Vec<SegmentId> = self.segments.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Snapshot of wall ids, ordered.
    pub fn wall_ids(&self) -> Vec<WallId> {
        let mut ids: Vec<WallId> = self.walls.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of walls.
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// True when all three tables are empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.segments.is_empty() && self.walls.is_empty()
    }

    /// Drop every record. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.segments.clear();
        self.walls.clear();
    }

    // --- Derived geometry ---

    /// Current centerline of a segment, resolved from its endpoint nodes.
    pub fn segment_line(&self, id: SegmentId) -> Option<Line> {
        let segment = self.segments.get(&id)?;
        let start = self.nodes.get(&segment.start)?;
        let end = self.nodes.get(&segment.end)?;
        Some(Line::new(start.position, end.position))
    }

    /// Recompute a segment's cached length and angle from its endpoints.
    /// Returns false if the segment or one of its endpoints is missing.
    pub(crate) fn refresh_segment_geometry(&mut self, id: SegmentId) -> bool {
        let Some(line) = self.segment_line(id) else {
            return false;
        };
        match self.segments.get_mut(&id) {
            Some(segment) => {
                segment.set_geometry(line);
                true
            }
            None => false,
        }
    }
}
