//! Election protocols.
//!
//! Both variants are pure functions of `(state, value, stage, message)`. They
//! never hold state of their own; the only thing they may change besides the
//! returned transition is the message they were handed.
//!
//! # Basic
//!
//! Extrema propagation with alternating parity. A candidate that receives a
//! value compares it against its own: odd stages keep the smaller value, even
//! stages the larger. A winning value is adopted and forwarded one stage
//! later; a losing one is dropped and the candidate is defeated.
//!
//! # Optimized
//!
//! The same comparison, with even stages bounded to `F(stage)` hops. A
//! message whose budget runs out is promoted wherever it stands, so a value
//! does not have to reach the next candidate to survive. Defeated nodes can
//! revive when such a promotion happens on them, or when an odd-stage value
//! arrives that beats the value they retained from the previous even stage.

use crate::error::{Error, Result};
use crate::message::{Identifier, Message, UNBOUNDED};
use crate::state::NodeState;
use crate::FIRST_STAGE;

/// Outcome of applying the protocol once at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State the node moves to.
    pub state: NodeState,
    /// Value the node holds afterwards.
    pub value: Identifier,
    /// Message to hand to the next node, if any.
    pub outgoing: Option<Message>,
}

impl Transition {
    fn forward(state: NodeState, value: Identifier, message: Message) -> Self {
        Self {
            state,
            value,
            outgoing: Some(message),
        }
    }

    fn halt(state: NodeState, value: Identifier) -> Self {
        Self {
            state,
            value,
            outgoing: None,
        }
    }
}

/// Election protocol selected when the ring is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Parity-alternating extrema propagation.
    #[default]
    Basic,
    /// Fibonacci-bounded stages with revival of defeated nodes.
    Optimized,
}

impl Algorithm {
    /// Short name for logs and reports.
    pub const fn name(&self) -> &'static str {
        match self {
            Algorithm::Basic => "basic",
            Algorithm::Optimized => "optimized",
        }
    }

    /// Apply the protocol at a node.
    ///
    /// `incoming` must be `None` exactly when `state` is
    /// [`NodeState::Originator`]. A transition without an outgoing message
    /// means the message was consumed here.
    pub fn act(
        &self,
        state: NodeState,
        value: Identifier,
        stage: u32,
        incoming: Option<Message>,
    ) -> Result<Transition> {
        let message = match (state, incoming) {
            (NodeState::Originator, None) => return Ok(self.originate(value)),
            (NodeState::Originator | NodeState::Leader, Some(_)) => {
                return Err(Error::UnexpectedMessage { state });
            }
            (_, None) => return Err(Error::MissingMessage { state }),
            (_, Some(message)) => message,
        };

        Ok(match self {
            Algorithm::Basic => basic(state, value, message),
            Algorithm::Optimized => optimized(state, value, stage, message),
        })
    }

    /// First message of an originator, always at [`FIRST_STAGE`].
    ///
    /// Basic carries counter 0. Optimized carries [`UNBOUNDED`] because the
    /// opening stage is odd and has no hop budget; the counter is never read
    /// before the first promotion, so it behaves exactly like a zero counter.
    fn originate(&self, value: Identifier) -> Transition {
        let message = match self {
            Algorithm::Basic => Message::new(value, FIRST_STAGE, 0),
            Algorithm::Optimized => Message::new(value, FIRST_STAGE, UNBOUNDED),
        };
        Transition::forward(NodeState::Candidate, value, message)
    }
}

/// Parity-dependent comparison: odd stages keep the smaller value.
fn beats(message: &Message, value: Identifier) -> bool {
    if message.is_even_stage() {
        message.value() > value
    } else {
        message.value() < value
    }
}

fn basic(state: NodeState, value: Identifier, mut message: Message) -> Transition {
    match state {
        NodeState::Candidate if message.value() == value => {
            Transition::halt(NodeState::Leader, value)
        }
        NodeState::Candidate => {
            if beats(&message, value) {
                let adopted = message.value();
                message.flip_parity();
                Transition::forward(NodeState::Candidate, adopted, message)
            } else {
                Transition::halt(NodeState::Defeated, value)
            }
        }
        _ => Transition::forward(NodeState::Defeated, value, message),
    }
}

fn optimized(state: NodeState, value: Identifier, stage: u32, mut message: Message) -> Transition {
    message.spend_hop();

    match state {
        NodeState::Candidate if message.value() == value => {
            Transition::halt(NodeState::Leader, value)
        }
        NodeState::Candidate if message.stage() > stage => {
            Transition::forward(NodeState::Defeated, value, message)
        }
        NodeState::Candidate => {
            if beats(&message, value) || message.is_exhausted() {
                promote(message)
            } else {
                Transition::halt(NodeState::Defeated, value)
            }
        }
        NodeState::Defeated if revives(value, stage, &message) => promote(message),
        _ => Transition::forward(NodeState::Defeated, value, message),
    }
}

/// A defeated node takes over a message that ran out of budget, or an odd
/// value one stage ahead of it that beats what it retained.
fn revives(value: Identifier, stage: u32, message: &Message) -> bool {
    message.is_exhausted()
        || (stage % 2 == 0 && message.stage() == stage + 1 && message.value() < value)
}

fn promote(mut message: Message) -> Transition {
    let adopted = message.value();
    message.promote();
    Transition::forward(NodeState::Candidate, adopted, message)
}
