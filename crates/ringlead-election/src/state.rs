//! Election state of a single ring node.

use std::fmt;

/// Where a node stands in the election. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeState {
    /// Not participating until the first message reaches it.
    Asleep,
    /// Will start a probe with its own value on its next activation.
    Originator,
    /// Holds the best value seen so far in its probe window.
    Candidate,
    /// Lost a comparison; relays traffic.
    Defeated,
    /// Its own value came back unchanged around the whole ring.
    Leader,
}

impl NodeState {
    /// Whether the node is still contending for leadership.
    pub const fn is_contending(&self) -> bool {
        matches!(self, NodeState::Originator | NodeState::Candidate)
    }

    /// Terminal state; no further messages may arrive.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Leader)
    }

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            NodeState::Asleep => "Asleep",
            NodeState::Originator => "Originator",
            NodeState::Candidate => "Candidate",
            NodeState::Defeated => "Defeated",
            NodeState::Leader => "Leader",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
