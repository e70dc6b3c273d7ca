//! Error types for ringlead-election.

use thiserror::Error;

use crate::message::Identifier;
use crate::state::NodeState;

/// Result type for election operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running an election.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A ring needs at least one node.
    #[error("ring has no nodes")]
    EmptyRing,

    /// Two nodes carry the same identifier.
    #[error("identifier {0} appears more than once in the ring")]
    DuplicateIdentifier(Identifier),

    /// The originator set is empty.
    #[error("at least one originator is required")]
    NoOriginators,

    /// More originators than nodes were requested.
    #[error("{requested} originators requested for a ring of {nodes} nodes")]
    TooManyOriginators { requested: usize, nodes: usize },

    /// An originator position does not exist in the ring.
    #[error("originator position {index} is outside a ring of {nodes} nodes")]
    OriginatorOutOfRange { index: usize, nodes: usize },

    /// The same position was selected twice.
    #[error("position {0} selected as originator more than once")]
    DuplicateOriginator(usize),

    /// The ring already ran its election.
    #[error("election already ran on this ring")]
    AlreadyElected,

    /// A node that is not an originator was asked to act without a message.
    #[error("node in state {state} acted without an incoming message")]
    MissingMessage { state: NodeState },

    /// A message reached a node that must not receive one.
    #[error("node in state {state} received a message")]
    UnexpectedMessage { state: NodeState },

    /// Every worker terminated and no node is Leader.
    #[error("election finished without a leader")]
    NoLeader,

    /// Every worker terminated and several nodes are Leader.
    #[error("election finished with {} leaders at positions {positions:?}", .positions.len())]
    MultipleLeaders { positions: Vec<usize> },

    /// A worker thread panicked before it could finish its chain.
    #[error("election worker panicked")]
    WorkerPanicked,
}

impl Error {
    /// Whether the error was raised before any worker started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyRing
                | Error::DuplicateIdentifier(_)
                | Error::NoOriginators
                | Error::TooManyOriginators { .. }
                | Error::OriginatorOutOfRange { .. }
                | Error::DuplicateOriginator(_)
        )
    }

    /// Whether the error reports a broken protocol invariant.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::NoLeader
                | Error::MultipleLeaders { .. }
                | Error::MissingMessage { .. }
                | Error::UnexpectedMessage { .. }
        )
    }
}
