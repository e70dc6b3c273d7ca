//! Ringlead Election
//!
//! Leader election on a unidirectional ring of uniquely identified nodes.
//!
//! # Protocol
//!
//! A subset of nodes wakes up as originators and sends its identifier around
//! the ring. Stages alternate between two comparisons: on odd stages the
//! smaller value survives a candidate, on even stages the larger one. A
//! surviving value moves to the next stage and keeps travelling; a losing one
//! is dropped. The node whose own value comes back to it becomes Leader.
//!
//! Two variants are provided:
//! - [`Algorithm::Basic`] relays every message until it meets a candidate.
//! - [`Algorithm::Optimized`] gives even stage `i` a budget of `F(i)` hops
//!   (Fibonacci). A message that runs out is promoted wherever it stands,
//!   and a message from a later stage defeats an outdated candidate on sight.
//!
//! # Execution
//!
//! [`Ring::elect`] runs one worker thread per originator, each following its
//! own message from node to node. [`Ring::elect_sequential`] interleaves the
//! same workers on the calling thread. Both produce the same leader and the
//! same message count for a given ring.
//!
//! ```
//! use ringlead_election::{Algorithm, Direction, Ring};
//!
//! let ring = Ring::new(vec![5, 1, 2, 1000, 3], Direction::Right, Algorithm::Basic, &[0, 4])?;
//! let outcome = ring.elect()?;
//!
//! assert_eq!(outcome.leader, 0);
//! assert_eq!(outcome.elected, 3);
//! assert_eq!(outcome.messages, 10);
//! # Ok::<(), ringlead_election::Error>(())
//! ```

mod algorithm;
mod error;
mod events;
mod message;
mod node;
mod ring;
mod state;
mod topology;

pub use algorithm::{Algorithm, Transition};
pub use error::{Error, Result};
pub use events::{ElectionEvent, Hop, NodeView, RingSnapshot};
pub use message::{budget_for_stage, fibonacci, Identifier, Message, MessageView, UNBOUNDED};
pub use node::{Node, Step};
pub use ring::{validate_originators, ElectionOutcome, Ring};
pub use state::NodeState;
pub use topology::{Direction, Link, Topology, Walk};

/// First stage of every probe.
pub const FIRST_STAGE: u32 = 1;

// Originators always open on an odd stage.
const _: () = assert!(FIRST_STAGE % 2 == 1);
