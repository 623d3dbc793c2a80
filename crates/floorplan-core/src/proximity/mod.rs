//! Proximity consolidation.
//!
//! Two independent passes share one threshold:
//! - node deduplication, which mutates the graph;
//! - wall-pair proximity, an advisory index over visible walls that reports
//!   only when a pair becomes close or separates again.

mod nodes;
mod scheduler;
mod walls;

pub use nodes::{deduplicate_nodes, deduplicate_nodes_among, NodeMerge};
pub use scheduler::ProximityScheduler;
pub use walls::{compute_wall_proximities, ProximityEvent, WallPair, WallProximity};

use crate::model::WallId;
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default proximity threshold in plan units.
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 15.0;

/// Default interval between timer-driven passes, in milliseconds.
pub const DEFAULT_PROXIMITY_INTERVAL_MS: u64 = 500;

/// Configuration for the proximity passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProximityConfig {
    /// Distance at or below which two nodes fold together and two walls
    /// count as close.
    pub threshold: f64,
    /// Interval between scheduled passes.
    pub interval_ms: u64,
    /// Whether scheduled passes also deduplicate nodes.
    pub dedupe_nodes: bool,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PROXIMITY_THRESHOLD,
            interval_ms: DEFAULT_PROXIMITY_INTERVAL_MS,
            dedupe_nodes: false,
        }
    }
}

impl ProximityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_dedupe_nodes(mut self, dedupe: bool) -> Self {
        self.dedupe_nodes = dedupe;
        self
    }
}

/// Holds the current wall-pair proximity set between passes.
#[derive(Debug, Clone, Default)]
pub struct ProximityConsolidator {
    config: ProximityConfig,
    merges: HashMap<WallPair, WallProximity>,
}

impl ProximityConsolidator {
    pub fn new(config: ProximityConfig) -> Self {
        Self {
            config,
            merges: HashMap::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.config.threshold = threshold;
    }

    /// Fold near-coincident nodes together using the configured threshold.
    pub fn dedupe_nodes(&self, store: &mut EntityStore) -> Vec<NodeMerge> {
        deduplicate_nodes(store, self.config.threshold)
    }

    /// Recompute the wall-pair set from scratch and report transitions.
    ///
    /// Pairs that stay close are updated silently; only newly close pairs
    /// (`Created`) and pairs that drifted apart or vanished (`Separated`)
    /// are returned.
    pub fn refresh(&mut self, store: &EntityStore) -> Vec<ProximityEvent> {
        let next = compute_wall_proximities(store, self.config.threshold);
        let mut events = Vec::new();

        let mut separated: Vec<WallPair> = self
            .merges
            .keys()
            .filter(|pair| !next.contains_key(pair))
            .copied()
            .collect();
        separated.sort();
        events.extend(separated.into_iter().map(ProximityEvent::Separated));

        let mut created: Vec<&WallProximity> = next
            .values()
            .filter(|merge| !self.merges.contains_key(&merge.pair))
            .collect();
        created.sort_by_key(|merge| merge.pair);
        events.extend(created.into_iter().copied().map(ProximityEvent::Created));

        if !events.is_empty() {
            log::debug!("Wall proximity: {} transitions, {} active pairs", events.len(), next.len());
        }
        self.merges = next;
        events
    }

    /// Current proximity record for a pair of walls.
    pub fn merge_between(&self, a: WallId, b: WallId) -> Option<&WallProximity> {
        self.merges.get(&WallPair::new(a, b))
    }

    /// All active proximity records, ordered by pair.
    pub fn merges(&self) -> Vec<&WallProximity> {
        let mut merges: Vec<&WallProximity> = self.merges.values().collect();
        merges.sort_by_key(|merge| merge.pair);
        merges
    }

    /// Active proximity records involving `wall`.
    pub fn merges_for(&self, wall: WallId) -> Vec<&WallProximity> {
        self.merges()
            .into_iter()
            .filter(|merge| merge.pair.contains(wall))
            .collect()
    }

    /// Forget every record without reporting separations.
    pub fn reset(&mut self) {
        self.merges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WallKind;

    fn parallel_walls(store: &mut EntityStore, gap: f64) -> (WallId, WallId, [crate::model::NodeId; 2]) {
        let a0 = store.create_node(0.0, 0.0).unwrap();
        let a1 = store.create_node(10.0, 0.0).unwrap();
        let b0 = store.create_node(0.0, gap).unwrap();
        let b1 = store.create_node(10.0, gap).unwrap();
        let sa = store.create_segment(a0, a1).unwrap();
        let sb = store.create_segment(b0, b1).unwrap();
        let wa = store.create_wall(WallKind::Layout, &[sa]);
        let wb = store.create_wall(WallKind::Layout, &[sb]);
        (wa, wb, [b0, b1])
    }

    #[test]
    fn test_refresh_reports_creation_once() {
        let mut store = EntityStore::new();
        let (wa, wb, _) = parallel_walls(&mut store, 8.0);
        let mut consolidator = ProximityConsolidator::new(ProximityConfig::new().with_threshold(15.0));

        let events = consolidator.refresh(&store);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProximityEvent::Created(m) if m.pair == WallPair::new(wa, wb)));
        assert!(consolidator.refresh(&store).is_empty());
        assert_eq!(consolidator.merges().len(), 1);
    }

    #[test]
    fn test_refresh_updates_distance_silently() {
        let mut store = EntityStore::new();
        let (wa, wb, [b0, b1]) = parallel_walls(&mut store, 8.0);
        let mut consolidator = ProximityConsolidator::new(ProximityConfig::new().with_threshold(15.0));
        consolidator.refresh(&store);

        store.update_node(b0, 0.0, 6.0);
        store.update_node(b1, 10.0, 6.0);
        assert!(consolidator.refresh(&store).is_empty());
        let merge = consolidator.merge_between(wb, wa).unwrap();
        assert!((merge.distance - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_deleted_wall_separates() {
        let mut store = EntityStore::new();
        let (wa, wb, _) = parallel_walls(&mut store, 8.0);
        let mut consolidator = ProximityConsolidator::new(ProximityConfig::new().with_threshold(15.0));
        consolidator.refresh(&store);

        store.delete_wall(wb, true);
        let events = consolidator.refresh(&store);
        assert_eq!(events, vec![ProximityEvent::Separated(WallPair::new(wa, wb))]);
        assert!(consolidator.merges_for(wa).is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = ProximityConfig::default();
        assert_eq!(config.threshold, DEFAULT_PROXIMITY_THRESHOLD);
        assert_eq!(config.interval_ms, DEFAULT_PROXIMITY_INTERVAL_MS);
        assert!(!config.dedupe_nodes);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ProximityConfig = serde_json::from_str(r#"{"threshold": 40.0}"#).unwrap();
        assert_eq!(config.threshold, 40.0);
        assert_eq!(config.interval_ms, DEFAULT_PROXIMITY_INTERVAL_MS);
    }
}
