//! Stepping through a recorded election.

use ringlead_election::{ElectionEvent, Hop, NodeState, NodeView, RingSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// At the beginning, not running
    Stopped,
    Playing,
    Paused,
    /// Every event has been applied
    Finished,
}

/// Cursor over the steps of one election.
///
/// The cursor counts applied events: at cursor `k` the first `k` events have
/// happened, so [`Playback::snapshot`] at 0 is the ring before the election.
pub struct Playback {
    initial: Vec<NodeView>,
    events: Vec<ElectionEvent>,
    cursor: usize,
    state: PlaybackState,
    loop_enabled: bool,
}

impl Playback {
    pub fn new(initial: Vec<NodeView>, events: Vec<ElectionEvent>) -> Self {
        Self {
            initial,
            events,
            cursor: 0,
            state: PlaybackState::Stopped,
            loop_enabled: false,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_steps(&self) -> usize {
        self.events.len()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Move the cursor, clamped to the end of the timeline.
    pub fn seek(&mut self, step: usize) {
        self.cursor = step.min(self.events.len());
        if self.cursor == self.events.len() && !self.loop_enabled {
            self.state = PlaybackState::Finished;
        }
    }

    /// Move the cursor just past the `hop`-th message forward (1-based).
    ///
    /// Returns `false` and leaves the cursor alone if the run has fewer hops.
    pub fn seek_hop(&mut self, hop: usize) -> bool {
        if hop == 0 {
            self.seek(0);
            return true;
        }
        let found = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.hop().is_some())
            .nth(hop - 1)
            .map(|(index, _)| index);
        match found {
            Some(index) => {
                self.seek(index + 1);
                true
            }
            None => false,
        }
    }

    /// Move the cursor just past the step that made a node Leader.
    pub fn seek_decision(&mut self) -> Option<usize> {
        let index = self
            .events
            .iter()
            .position(|event| event.state == NodeState::Leader)?;
        self.seek(index + 1);
        Some(self.events[index].position)
    }

    pub fn play(&mut self) {
        if self.cursor >= self.events.len() {
            self.cursor = 0;
        }
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    /// Stop and rewind.
    pub fn stop(&mut self) {
        self.cursor = 0;
        self.state = PlaybackState::Stopped;
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Apply the next event and return it.
    pub fn step_forward(&mut self) -> Option<&ElectionEvent> {
        if self.cursor >= self.events.len() {
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;
        if self.cursor == self.events.len() {
            if self.loop_enabled {
                self.cursor = 0;
            } else {
                self.state = PlaybackState::Finished;
            }
        }
        self.events.get(index)
    }

    /// Undo the last applied event.
    pub fn step_backward(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.state = PlaybackState::Paused;
        }
    }

    /// Events already applied at the cursor.
    pub fn events_to_cursor(&self) -> &[ElectionEvent] {
        &self.events[..self.cursor]
    }

    /// The event the next step will apply.
    pub fn next_event(&self) -> Option<&ElectionEvent> {
        self.events.get(self.cursor)
    }

    /// Ring state at the cursor.
    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot::from_events(&self.initial, &self.events, self.cursor)
    }

    /// Fraction of the timeline applied, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.events.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.events.len() as f64
        }
    }
}

/// What a renderer needs to draw the ring at the cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub cursor: usize,
    pub total_steps: usize,
    pub state: PlaybackState,
    pub progress: f64,
    pub loop_enabled: bool,
    /// Message to animate between two nodes, if the last step sent one.
    pub hop: Option<Hop>,
    pub snapshot: RingSnapshot,
}

impl From<&Playback> for PlaybackStatus {
    fn from(playback: &Playback) -> Self {
        let snapshot = playback.snapshot();
        let hop = playback
            .events_to_cursor()
            .last()
            .and_then(ElectionEvent::hop);
        Self {
            cursor: playback.cursor,
            total_steps: playback.total_steps(),
            state: playback.state,
            progress: playback.progress(),
            loop_enabled: playback.loop_enabled,
            hop,
            snapshot,
        }
    }
}
