//! Recorded election runs and their JSON form.

use ringlead_election::{Algorithm, Direction, ElectionEvent, ElectionOutcome, NodeView, Ring, RingSnapshot};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::playback::Playback;

/// Everything needed to replay one election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub algorithm: Algorithm,
    pub direction: Direction,
    /// Ring before the election, in ring order.
    pub initial: Vec<NodeView>,
    pub events: Vec<ElectionEvent>,
    pub outcome: ElectionOutcome,
}

impl Timeline {
    /// Capture the trace of a ring that has finished its election.
    pub fn record(ring: &Ring, outcome: ElectionOutcome) -> Self {
        Self {
            algorithm: ring.algorithm(),
            direction: ring.direction(),
            initial: ring.initial_views().to_vec(),
            events: ring.events(),
            outcome,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Ring state after the first `step` events.
    pub fn snapshot_at(&self, step: usize) -> RingSnapshot {
        RingSnapshot::from_events(&self.initial, &self.events, step)
    }

    /// Playback positioned before the first event.
    pub fn playback(&self) -> Playback {
        Playback::new(self.initial.clone(), self.events.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
