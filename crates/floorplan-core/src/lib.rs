//! Floorplan Core Library
//!
//! In-memory wall topology for the floor-plan editor: nodes, segments and
//! walls kept in a planar graph, with intersection splitting, collinear
//! cleanup and proximity consolidation.

pub mod collinear;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod intersection;
pub mod model;
pub mod proximity;
pub mod query;
pub mod store;
pub mod topology;
pub mod validate;

pub use collinear::{batch_cleanup, merge_at, should_cleanup};
pub use draw::{DrawError, DrawOutcome, PointResolution, TolerancePolicy, WallDrawer};
pub use error::{TopologyError, TopologyResult};
pub use intersection::{
    Crossing, SegmentModification, collinear_overlaps, find_intersections, process_intersections,
    split_segment_at,
};
pub use model::{Node, NodeId, NodeKind, Segment, SegmentId, Wall, WallId, WallKind};
pub use proximity::{
    NodeMerge, ProximityConfig, ProximityConsolidator, ProximityEvent, ProximityScheduler, WallPair,
    WallProximity,
};
pub use query::{SegmentHit, WallHit};
pub use store::EntityStore;
pub use topology::WallUpdate;
pub use validate::check_invariants;
