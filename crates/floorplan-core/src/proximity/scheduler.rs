//! Timer-driven proximity passes.
//!
//! The host calls [`ProximityScheduler::tick`] from its frame or timer
//! callback. A pass runs only when enabled and the interval has elapsed.
//! `tick` takes `&mut self`, so a pass can never start while another one
//! is still running.

use super::{NodeMerge, ProximityConfig, ProximityConsolidator, ProximityEvent};
use crate::store::EntityStore;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Runs proximity passes on an interval and queues their transitions.
#[derive(Debug)]
pub struct ProximityScheduler {
    consolidator: ProximityConsolidator,
    interval: Duration,
    last_run: Option<Instant>,
    running: bool,
    pending: Vec<ProximityEvent>,
}

impl ProximityScheduler {
    /// Create a stopped scheduler.
    pub fn new(config: ProximityConfig) -> Self {
        let interval = Duration::from_millis(config.interval_ms);
        Self {
            consolidator: ProximityConsolidator::new(config),
            interval,
            last_run: None,
            running: false,
            pending: Vec::new(),
        }
    }

    /// Start (or resume) scheduled passes.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop scheduled passes. The current proximity set is kept.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether scheduled passes are enabled.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Minimum time between scheduled passes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The consolidator holding the current proximity set.
    pub fn consolidator(&self) -> &ProximityConsolidator {
        &self.consolidator
    }

    /// Check if a pass is due.
    pub fn is_due(&self) -> bool {
        if !self.running {
            return false;
        }
        match self.last_run {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Run a pass if one is due. Returns the nodes folded together, or
    /// `None` if no pass ran.
    pub fn tick(&mut self, store: &mut EntityStore) -> Option<Vec<NodeMerge>> {
        if !self.is_due() {
            return None;
        }
        Some(self.run_now(store))
    }

    /// Run a pass immediately, regardless of the timer.
    pub fn run_now(&mut self, store: &mut EntityStore) -> Vec<NodeMerge> {
        let node_merges = if self.consolidator.config().dedupe_nodes {
            self.consolidator.dedupe_nodes(store)
        } else {
            Vec::new()
        };
        let events = self.consolidator.refresh(store);
        self.pending.extend(events);
        self.last_run = Some(Instant::now());
        node_merges
    }

    /// Take the transitions queued since the last call.
    pub fn drain_events(&mut self) -> Vec<ProximityEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Check if transitions are waiting to be drained.
    pub fn has_pending_events(&self) -> bool {
        !self.pending.is_empty()
    }
}
