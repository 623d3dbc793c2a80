//! Advisory wall-pair proximity: which visible walls run close enough to be
//! drawn as one. Computing it never touches the graph.

use crate::geometry::segment_gap;
use crate::model::WallId;
use crate::store::EntityStore;
use kurbo::{Line, Point};
use std::collections::HashMap;

/// Unordered pair of wall ids, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallPair(WallId, WallId);

impl WallPair {
    /// Create a pair; the order of `a` and `b` does not matter.
    pub fn new(a: WallId, b: WallId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn first(&self) -> WallId {
        self.0
    }

    pub fn second(&self) -> WallId {
        self.1
    }

    /// Check if `wall` is one of the pair.
    pub fn contains(&self, wall: WallId) -> bool {
        self.0 == wall || self.1 == wall
    }
}

/// Two walls within the proximity threshold of each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallProximity {
    pub pair: WallPair,
    /// Smallest segment distance observed between the two walls.
    pub distance: f64,
    /// Closest point on the first wall of the pair.
    pub from: Point,
    /// Closest point on the second wall of the pair.
    pub to: Point,
}

/// A transition in the proximity set, reported to overlay consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProximityEvent {
    /// Two walls came within the threshold.
    Created(WallProximity),
    /// Two walls that were close no longer are (or one of them is gone).
    Separated(WallPair),
}

impl ProximityEvent {
    pub fn pair(&self) -> WallPair {
        match self {
            ProximityEvent::Created(merge) => merge.pair,
            ProximityEvent::Separated(pair) => *pair,
        }
    }
}

/// Every pair of visible walls whose closest segments lie within `threshold`.
pub fn compute_wall_proximities(store: &EntityStore, threshold: f64) -> HashMap<WallPair, WallProximity> {
    let walls: Vec<(WallId, Vec<Line>)> = store
        .all_walls()
        .into_iter()
        .filter(|wall| wall.visible)
        .map(|wall| {
            let lines = wall
                .segment_ids()
                .iter()
                .filter_map(|&s| store.segment_line(s))
                .collect();
            (wall.id(), lines)
        })
        .collect();

    let mut proximities = HashMap::new();
    for (i, (wall_a, lines_a)) in walls.iter().enumerate() {
        for (wall_b, lines_b) in &walls[i + 1..] {
            let mut best: Option<WallProximity> = None;
            for &line_a in lines_a {
                for &line_b in lines_b {
                    let gap = segment_gap(line_a, line_b);
                    if gap.distance > threshold {
                        continue;
                    }
                    if best.is_none_or(|b| gap.distance < b.distance) {
                        best = Some(WallProximity {
                            pair: WallPair::new(*wall_a, *wall_b),
                            distance: gap.distance,
                            from: gap.from,
                            to: gap.to,
                        });
                    }
                }
            }
            if let Some(proximity) = best {
                proximities.insert(proximity.pair, proximity);
            }
        }
    }
    proximities
}
