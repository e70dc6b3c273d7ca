//! Election trace for replay and visualization.
//!
//! Every application of the protocol at a node is recorded as an
//! [`ElectionEvent`]. Starting from the ring's initial views, the events are
//! enough to rebuild the state of every node after any step.

use crate::message::{Identifier, MessageView};
use crate::node::Step;
use crate::state::NodeState;

/// One protocol step at one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElectionEvent {
    /// Position of the step in the whole run, starting at 0.
    pub step: u64,
    /// Ring position of the acting node.
    pub position: usize,
    /// Message taken from the inbox, `None` for an activation.
    pub received: Option<MessageView>,
    /// State after the step.
    pub state: NodeState,
    /// Value after the step.
    pub value: Identifier,
    /// Stage after the step.
    pub stage: u32,
    /// Message handed on, if any.
    pub forwarded: Option<MessageView>,
    /// Receiver of the forwarded message.
    pub to: Option<usize>,
}

impl ElectionEvent {
    pub(crate) fn from_step(step: u64, position: usize, next: usize, observed: Step) -> Self {
        Self {
            step,
            position,
            received: observed.received,
            state: observed.state,
            value: observed.value,
            stage: observed.stage,
            forwarded: observed.forwarded,
            to: observed.forwarded.map(|_| next),
        }
    }

    /// The hop this step produced, if it forwarded a message.
    pub fn hop(&self) -> Option<Hop> {
        match (self.forwarded, self.to) {
            (Some(message), Some(to)) => Some(Hop {
                from: self.position,
                to,
                message,
            }),
            _ => None,
        }
    }
}

/// A message crossing one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hop {
    pub from: usize,
    pub to: usize,
    pub message: MessageView,
}

/// A node as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeView {
    pub position: usize,
    pub identifier: Identifier,
    pub value: Identifier,
    pub state: NodeState,
    pub stage: u32,
    pub pending: usize,
}

/// The ring at one point of the run, nodes in ring order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingSnapshot {
    /// Number of events applied.
    pub step: u64,
    pub nodes: Vec<NodeView>,
    /// Hops taken so far.
    pub messages: u64,
    /// Most recent hop, if any.
    pub last_hop: Option<Hop>,
}

impl RingSnapshot {
    /// Rebuild the ring from its initial views and the first `up_to` events.
    ///
    /// Events naming positions outside `initial` are ignored.
    pub fn from_events(initial: &[NodeView], events: &[ElectionEvent], up_to: usize) -> Self {
        let mut nodes = initial.to_vec();
        let mut messages = 0u64;
        let mut last_hop = None;
        let mut step = 0u64;

        for event in events.iter().take(up_to) {
            step += 1;
            let Some(node) = nodes.get_mut(event.position) else {
                continue;
            };
            node.state = event.state;
            node.value = event.value;
            node.stage = event.stage;
            if event.received.is_some() {
                node.pending = node.pending.saturating_sub(1);
            }

            if let Some(hop) = event.hop() {
                if let Some(receiver) = nodes.get_mut(hop.to) {
                    receiver.pending += 1;
                }
                messages += 1;
                last_hop = Some(hop);
            }
        }

        Self {
            step,
            nodes,
            messages,
            last_hop,
        }
    }

    /// Positions currently in `state`.
    pub fn positions_in(&self, state: NodeState) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|n| n.state == state)
            .map(|n| n.position)
            .collect()
    }

    /// `(identifier, state)` pairs in ring order.
    pub fn states(&self) -> Vec<(Identifier, NodeState)> {
        self.nodes.iter().map(|n| (n.identifier, n.state)).collect()
    }

    /// Messages still waiting in inboxes.
    pub fn in_flight(&self) -> usize {
        self.nodes.iter().map(|n| n.pending).sum()
    }
}
