//! Records held by the entity store: nodes, segments and walls.
//!
//! Relationships are plain id references resolved through
//! [`EntityStore`](crate::store::EntityStore); no record owns another.

use kurbo::{Line, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[cfg(not(target_arch = "wasm32"))]
use std::time::SystemTime;

#[cfg(target_arch = "wasm32")]
use web_time::SystemTime;

/// Identifier of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identifier of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// Identifier of a [`Wall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// How a node came to exist in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Placed explicitly by a draw point.
    #[default]
    Endpoint,
    /// Created where two segments cross.
    Intersection,
    /// An existing node that became a branch point (three or more segments).
    Junction,
}

/// A graph vertex.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) position: Point,
    pub(crate) connected_segments: BTreeSet<SegmentId>,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Point, kind: NodeKind) -> Self {
        Self {
            id,
            position,
            connected_segments: BTreeSet::new(),
            kind,
        }
    }

    /// Unique identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Position in plan units.
    pub fn position(&self) -> Point {
        self.position
    }

    /// X coordinate.
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Y coordinate.
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Segments that reference this node as an endpoint.
    pub fn connected_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.connected_segments.iter().copied()
    }

    /// Check if `segment` ends at this node.
    pub fn is_connected_to(&self, segment: SegmentId) -> bool {
        self.connected_segments.contains(&segment)
    }

    /// Number of incident segments.
    pub fn degree(&self) -> usize {
        self.connected_segments.len()
    }

    /// True when the node has no incident segments.
    pub fn is_isolated(&self) -> bool {
        self.connected_segments.is_empty()
    }
}

/// A straight edge between two distinct nodes.
///
/// `length` and `angle` are caches of the endpoint coordinates; the store
/// refreshes them whenever an endpoint moves.
#[derive(Debug, Clone)]
pub struct Segment {
    pub(crate) id: SegmentId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) wall: Option<WallId>,
    pub(crate) length: f64,
    pub(crate) angle: f64,
}

impl Segment {
    pub(crate) fn new(id: SegmentId, start: NodeId, end: NodeId, line: Line) -> Self {
        let mut segment = Self {
            id,
            start,
            end,
            wall: None,
            length: 0.0,
            angle: 0.0,
        };
        segment.set_geometry(line);
        segment
    }

    pub(crate) fn set_geometry(&mut self, line: Line) {
        let delta = line.p1 - line.p0;
        self.length = delta.hypot();
        self.angle = delta.y.atan2(delta.x);
    }

    /// Unique identifier.
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Node the segment starts at.
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Node the segment ends at.
    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Owning wall, if any.
    pub fn wall(&self) -> Option<WallId> {
        self.wall
    }

    /// Length at the time of the last endpoint update.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Direction from start to end in radians, in `(-PI, PI]`.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Check if `node` is one of the two endpoints.
    pub fn has_endpoint(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.start == node {
            Some(self.end)
        } else if self.end == node {
            Some(self.start)
        } else {
            None
        }
    }

    /// True if both segments have at least one endpoint node in common.
    pub fn shares_endpoint_with(&self, other: &Segment) -> bool {
        self.has_endpoint(other.start) || self.has_endpoint(other.end)
    }
}

/// Wall category. Each category draws with a fixed thickness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallKind {
    /// Structural layout wall.
    #[default]
    Layout,
    /// Zone divider.
    Zone,
    /// Area boundary.
    Area,
}

impl WallKind {
    pub const LAYOUT_THICKNESS: f64 = 350.0;
    pub const ZONE_THICKNESS: f64 = 250.0;
    pub const AREA_THICKNESS: f64 = 150.0;

    /// Drawn thickness in plan units.
    pub fn thickness(self) -> f64 {
        match self {
            WallKind::Layout => Self::LAYOUT_THICKNESS,
            WallKind::Zone => Self::ZONE_THICKNESS,
            WallKind::Area => Self::AREA_THICKNESS,
        }
    }
}

/// A typed aggregation of segments.
#[derive(Debug, Clone)]
pub struct Wall {
    pub(crate) id: WallId,
    pub(crate) kind: WallKind,
    pub(crate) segment_ids: Vec<SegmentId>,
    pub visible: bool,
    pub(crate) created_at: SystemTime,
    pub(crate) updated_at: SystemTime,
}

impl Wall {
    pub(crate) fn new(id: WallId, kind: WallKind) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            kind,
            segment_ids: Vec::new(),
            visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unique identifier.
    pub fn id(&self) -> WallId {
        self.id
    }

    /// Wall category.
    pub fn kind(&self) -> WallKind {
        self.kind
    }

    /// Thickness implied by the category.
    pub fn thickness(&self) -> f64 {
        self.kind.thickness()
    }

    /// Member segments in insertion order.
    pub fn segment_ids(&self) -> &[SegmentId] {
        &self.segment_ids
    }

    /// Check if `segment` is a member.
    pub fn contains(&self, segment: SegmentId) -> bool {
        self.segment_ids.contains(&segment)
    }

    /// True when the wall has no segments.
    pub fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }

    /// When the wall was created.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// When the wall or its membership last changed.
    pub fn updated_at(&self) -> SystemTime {
        self.updated_at
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }

    /// Append `segment` unless it is already listed. Returns true if added.
    pub(crate) fn push_segment(&mut self, segment: SegmentId) -> bool {
        if self.segment_ids.contains(&segment) {
            return false;
        }
        self.segment_ids.push(segment);
        self.touch();
        true
    }

    /// Remove `segment` and return the index it occupied.
    pub(crate) fn remove_segment(&mut self, segment: SegmentId) -> Option<usize> {
        let index = self.segment_ids.iter().position(|&id| id == segment)?;
        self.segment_ids.remove(index);
        self.touch();
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_thickness_by_kind() {
        assert_eq!(WallKind::Layout.thickness(), 350.0);
        assert_eq!(WallKind::Zone.thickness(), 250.0);
        assert_eq!(WallKind::Area.thickness(), 150.0);
    }

    #[test]
    fn test_segment_geometry() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(0.0, 10.0));
        let segment = Segment::new(SegmentId(3), NodeId(1), NodeId(2), line);
        assert!((segment.length() - 10.0).abs() < f64::EPSILON);
        assert!((segment.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_other_end() {
        let line = Line::new(Point::ZERO, Point::new(1.0, 0.0));
        let segment = Segment::new(SegmentId(3), NodeId(1), NodeId(2), line);
        assert_eq!(segment.other_end(NodeId(1)), Some(NodeId(2)));
        assert_eq!(segment.other_end(NodeId(2)), Some(NodeId(1)));
        assert_eq!(segment.other_end(NodeId(7)), None);
    }

    #[test]
    fn test_wall_push_is_set_like() {
        let mut wall = Wall::new(WallId(1), WallKind::Zone);
        assert!(wall.push_segment(SegmentId(4)));
        assert!(!wall.push_segment(SegmentId(4)));
        assert_eq!(wall.segment_ids(), &[SegmentId(4)]);
        assert_eq!(wall.remove_segment(SegmentId(4)), Some(0));
        assert!(wall.is_empty());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(NodeId(5).to_string(), "n5");
        assert_eq!(SegmentId(6).to_string(), "s6");
        assert_eq!(WallId(7).to_string(), "w7");
    }
}
