//! Drawing workflow boundary: turning a polyline of input points into a wall
//! spliced into the existing graph.
//!
//! Pointer handling lives in the host; this is the sequence of core calls it
//! makes once the user commits a polyline.

use crate::collinear::cleanup_worklist;
use crate::error::TopologyError;
use crate::intersection::{collinear_overlaps, process_intersections, split_segment_at, SegmentModification};
use crate::model::{NodeId, SegmentId, WallId, WallKind};
use crate::proximity::{deduplicate_nodes_among, NodeMerge};
use crate::store::EntityStore;
use crate::validate::debug_check;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a draw.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("A wall needs at least two points, got {0}")]
    TooFewPoints(usize),
    #[error("Point {index} is not finite")]
    InvalidPoint { index: usize },
    #[error("All points resolved to the same node")]
    NoSegments,
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Snapping distances for the drawing workflow.
///
/// Each tolerance resolves as `max(floor, wall_thickness × multiplier)`, so
/// thick walls snap from further away while thin walls keep a usable floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TolerancePolicy {
    /// Floor for snapping a point onto an existing segment.
    pub projection_min_px: f64,
    pub projection_multiplier: f64,
    /// Floor for reusing an existing node instead of creating one.
    pub node_reuse_min_px: f64,
    pub node_reuse_multiplier: f64,
    /// Floor for folding the drawn nodes into nearby nodes afterwards.
    pub merge_nearby_min_px: f64,
    pub merge_nearby_multiplier: f64,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self {
            projection_min_px: 10.0,
            projection_multiplier: 0.5,
            node_reuse_min_px: 12.0,
            node_reuse_multiplier: 0.5,
            merge_nearby_min_px: 5.0,
            merge_nearby_multiplier: 0.1,
        }
    }
}

impl TolerancePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, min_px: f64, multiplier: f64) -> Self {
        self.projection_min_px = min_px;
        self.projection_multiplier = multiplier;
        self
    }

    pub fn with_node_reuse(mut self, min_px: f64, multiplier: f64) -> Self {
        self.node_reuse_min_px = min_px;
        self.node_reuse_multiplier = multiplier;
        self
    }

    pub fn with_merge_nearby(mut self, min_px: f64, multiplier: f64) -> Self {
        self.merge_nearby_min_px = min_px;
        self.merge_nearby_multiplier = multiplier;
        self
    }

    /// Distance within which a point is projected onto a segment.
    pub fn projection_tolerance(&self, wall_thickness: f64) -> f64 {
        self.projection_min_px.max(wall_thickness * self.projection_multiplier)
    }

    /// Distance within which a point reuses an existing node.
    pub fn node_reuse_tolerance(&self, wall_thickness: f64) -> f64 {
        self.node_reuse_min_px.max(wall_thickness * self.node_reuse_multiplier)
    }

    /// Distance within which drawn nodes fold into nearby nodes.
    pub fn merge_nearby_tolerance(&self, wall_thickness: f64) -> f64 {
        self.merge_nearby_min_px.max(wall_thickness * self.merge_nearby_multiplier)
    }
}

/// How an input point was resolved to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointResolution {
    /// An existing node within the reuse tolerance.
    Reused(NodeId),
    /// A new node splitting an existing segment at the projected point.
    Projected(NodeId),
    /// A fresh endpoint node.
    Created(NodeId),
}

impl PointResolution {
    /// The node the point resolved to.
    pub fn node(self) -> NodeId {
        match self {
            PointResolution::Reused(id) | PointResolution::Projected(id) | PointResolution::Created(id) => id,
        }
    }
}

/// Result of a committed draw.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub wall: WallId,
    /// The wall's segments after splicing and node folding.
    pub segments: Vec<SegmentId>,
    /// How each input point was resolved.
    pub points: Vec<PointResolution>,
    /// Every segment replaced while splicing, in order.
    pub modifications: Vec<SegmentModification>,
    /// Nodes folded together after drawing.
    pub node_merges: Vec<NodeMerge>,
}

/// Commits polylines as walls using a [`TolerancePolicy`].
#[derive(Debug, Clone, Default)]
pub struct WallDrawer {
    policy: TolerancePolicy,
    merge_nearby: bool,
}

impl WallDrawer {
    pub fn new(policy: TolerancePolicy) -> Self {
        Self {
            policy,
            merge_nearby: true,
        }
    }

    /// Enable or disable folding drawn nodes into nearby nodes afterwards.
    pub fn with_merge_nearby(mut self, enabled: bool) -> Self {
        self.merge_nearby = enabled;
        self
    }

    /// Tolerances used when resolving points.
    pub fn policy(&self) -> &TolerancePolicy {
        &self.policy
    }

    /// Resolve an input point to a node: reuse a nearby node, split a nearby
    /// segment at the projected point, or create a new endpoint.
    /// Returns `None` for a non-finite point.
    pub fn resolve_point(
        &self,
        store: &mut EntityStore,
        point: Point,
        wall_thickness: f64,
        modifications: &mut Vec<SegmentModification>,
    ) -> Option<PointResolution> {
        if !point.is_finite() {
            return None;
        }
        let reuse = self.policy.node_reuse_tolerance(wall_thickness);
        if let Some(node) = store.nearest_node(point, reuse) {
            return Some(PointResolution::Reused(node));
        }

        let projection = self.policy.projection_tolerance(wall_thickness);
        if let Some(hit) = store.nearest_segment(point, projection) {
            if let Some((node, modification)) = split_segment_at(store, hit.segment, hit.foot) {
                modifications.push(modification);
                return Some(PointResolution::Projected(node));
            }
        }

        store.create_node(point.x, point.y).map(PointResolution::Created)
    }

    /// Undo point resolution for a draw that produced no segment: drop the
    /// nodes it created and merge projected splits back together.
    fn discard_resolutions(store: &mut EntityStore, resolutions: &[PointResolution]) {
        let mut projected = Vec::new();
        for resolution in resolutions {
            match *resolution {
                PointResolution::Created(node) => {
                    if store.node(node).is_some_and(|n| n.is_isolated()) {
                        store.delete_node(node);
                    }
                }
                PointResolution::Projected(node) => projected.push(node),
                PointResolution::Reused(_) => {}
            }
        }
        cleanup_worklist(store, projected);
    }

    /// Draw a wall through `points`.
    ///
    /// Input is validated before the store is touched. If every point
    /// resolves to the same node the resolution is undone and
    /// [`DrawError::NoSegments`] is returned. Otherwise there is no
    /// rollback: on error the caller abandons the draw and keeps whatever
    /// was committed.
    pub fn draw_wall(
        &self,
        store: &mut EntityStore,
        kind: WallKind,
        points: &[Point],
    ) -> Result<DrawOutcome, DrawError> {
        if points.len() < 2 {
            return Err(DrawError::TooFewPoints(points.len()));
        }
        if let Some(index) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(DrawError::InvalidPoint { index });
        }

        let thickness = kind.thickness();
        let mut modifications = Vec::new();
        let mut resolutions = Vec::with_capacity(points.len());
        let mut nodes: Vec<NodeId> = Vec::with_capacity(points.len());

        for (index, &point) in points.iter().enumerate() {
            let resolution = self
                .resolve_point(store, point, thickness, &mut modifications)
                .ok_or(DrawError::InvalidPoint { index })?;
            resolutions.push(resolution);
            if nodes.last() != Some(&resolution.node()) {
                nodes.push(resolution.node());
            }
        }

        let mut segments: Vec<SegmentId> = Vec::new();
        for pair in nodes.windows(2) {
            let Some(segment) = store.create_segment(pair[0], pair[1]) else {
                log::debug!("Skipping span {} -> {}: already connected", pair[0], pair[1]);
                continue;
            };
            let overlaps = collinear_overlaps(store, segment);
            if !overlaps.is_empty() {
                log::warn!("Segment {} overlaps collinear segments {:?}; not spliced", segment, overlaps);
            }
            segments.push(segment);

            for modification in process_intersections(store, segment) {
                modification.apply_to(&mut segments);
                modifications.push(modification);
            }
        }
        if segments.is_empty() {
            if nodes.len() < 2 {
                Self::discard_resolutions(store, &resolutions);
            }
            return Err(DrawError::NoSegments);
        }

        let wall = store.create_wall(kind, &segments);

        let node_merges = if self.merge_nearby {
            let tolerance = self.policy.merge_nearby_tolerance(thickness);
            deduplicate_nodes_among(store, &nodes, tolerance)
        } else {
            Vec::new()
        };

        let segments = store
            .wall(wall)
            .ok_or(TopologyError::WallNotFound(wall))?
            .segment_ids()
            .to_vec();

        log::debug!(
            "Drew {:?} wall {} through {} points: {} segments, {} splits",
            kind,
            wall,
            points.len(),
            segments.len(),
            modifications.len()
        );
        debug_check(store);
        Ok(DrawOutcome {
            wall,
            segments,
            points: resolutions,
            modifications,
            node_merges,
        })
    }
}
