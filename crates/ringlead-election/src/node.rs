//! A single ring participant.

use std::collections::VecDeque;

use crate::algorithm::Algorithm;
use crate::error::Result;
use crate::events::NodeView;
use crate::message::{Identifier, Message, MessageView};
use crate::state::NodeState;

/// One application of the protocol at a node, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Message taken from the inbox, `None` for an originator's activation.
    pub received: Option<MessageView>,
    /// State after the step.
    pub state: NodeState,
    /// Value after the step.
    pub value: Identifier,
    /// Stage after the step.
    pub stage: u32,
    /// Message handed on, if any.
    pub forwarded: Option<MessageView>,
}

/// Election state for one identifier plus its inbound queue.
#[derive(Debug, Clone)]
pub struct Node {
    identifier: Identifier,
    value: Identifier,
    state: NodeState,
    stage: u32,
    inbox: VecDeque<Message>,
}

impl Node {
    /// An asleep node holding its own identifier.
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            value: identifier,
            state: NodeState::Asleep,
            stage: 0,
            inbox: VecDeque::new(),
        }
    }

    /// A node that starts a probe on its first activation.
    pub fn originator(identifier: Identifier) -> Self {
        let mut node = Self::new(identifier);
        node.mark_originator();
        node
    }

    /// The identifier the node was created with.
    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    /// The value the node currently holds in the election.
    pub fn value(&self) -> Identifier {
        self.value
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// Messages waiting in the inbox.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    pub(crate) fn mark_originator(&mut self) {
        self.state = NodeState::Originator;
    }

    /// Terminal shortcut for a ring with a single node.
    pub(crate) fn crown(&mut self) {
        self.state = NodeState::Leader;
    }

    /// Append a message at the tail of the inbox.
    pub fn deliver(&mut self, message: Message) {
        self.inbox.push_back(message);
    }

    /// Run the protocol until a message comes out or there is nothing left
    /// to do.
    ///
    /// An originator always acts on its own activation before touching the
    /// inbox. Messages the protocol consumes are skipped; the first one it
    /// forwards is returned and the node's stage follows it. `observe` sees
    /// every step in order.
    pub fn process<F>(&mut self, algorithm: Algorithm, mut observe: F) -> Result<Option<Message>>
    where
        F: FnMut(Step),
    {
        while self.state == NodeState::Originator || !self.inbox.is_empty() {
            let incoming = if self.state == NodeState::Originator {
                None
            } else {
                self.inbox.pop_front()
            };
            let received = incoming.as_ref().map(Message::view);

            let transition = algorithm.act(self.state, self.value, self.stage, incoming)?;
            self.state = transition.state;
            self.value = transition.value;
            if let Some(message) = &transition.outgoing {
                self.stage = message.stage();
            }

            observe(Step {
                received,
                state: self.state,
                value: self.value,
                stage: self.stage,
                forwarded: transition.outgoing.as_ref().map(Message::view),
            });

            if transition.outgoing.is_some() {
                return Ok(transition.outgoing);
            }
        }
        Ok(None)
    }

    /// Read-only view of the node at `position`.
    pub fn view(&self, position: usize) -> NodeView {
        NodeView {
            position,
            identifier: self.identifier,
            value: self.value,
            state: self.state,
            stage: self.stage,
            pending: self.inbox.len(),
        }
    }
}
