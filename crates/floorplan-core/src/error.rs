//! Error types for topology operations.

use crate::model::{NodeId, SegmentId, WallId};
use thiserror::Error;

/// Reasons a topology operation was rejected or an invariant check failed.
///
/// Public mutators report expected rejections as sentinels (`None`/`false`)
/// and only log these; the validator and the drawing workflow return them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),
    #[error("Wall not found: {0}")]
    WallNotFound(WallId),
    #[error("Segment would start and end at {0}")]
    SelfLoop(NodeId),
    #[error("Segment {existing} already connects {start} and {end}")]
    DuplicateSegment {
        start: NodeId,
        end: NodeId,
        existing: SegmentId,
    },
    #[error("Segment {segment} references missing node {node}")]
    DanglingReference { segment: SegmentId, node: NodeId },
    #[error("Membership mismatch: {0}")]
    InconsistentMembership(String),
    #[error("Node {0} has non-finite coordinates")]
    NonFiniteCoordinate(NodeId),
    #[error("Segment {0} has stale length or angle")]
    StaleGeometry(SegmentId),
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
