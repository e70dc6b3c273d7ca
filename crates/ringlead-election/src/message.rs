//! Election messages and their Fibonacci hop budget.
//!
//! A message carries a candidate value, a stage and a hop counter. The
//! stage parity decides the comparison a candidate applies (odd: smaller
//! wins, even: larger wins). In the optimized protocol an even stage `i`
//! may travel at most `F(i)` hops before it is promoted on the spot; odd
//! stages travel without a bound.
//!
//! | stage | counter after promotion |
//! |-------|-------------------------|
//! | odd   | [`UNBOUNDED`]           |
//! | even  | `F(stage)`              |

/// Node identifier and message payload. Unique per ring.
pub type Identifier = u64;

/// Counter value of a stage that has no hop budget.
pub const UNBOUNDED: i64 = -1;

/// The `n`-th Fibonacci number, seeded `F(0) = 0, F(1) = 1`.
///
/// Saturates at `u64::MAX` instead of overflowing.
///
/// ```
/// use ringlead_election::fibonacci;
///
/// assert_eq!(fibonacci(0), 0);
/// assert_eq!(fibonacci(2), 1);
/// assert_eq!(fibonacci(10), 55);
/// ```
pub const fn fibonacci(n: u32) -> u64 {
    let mut previous = 0u64;
    let mut current = 1u64;
    let mut i = 0;
    while i < n {
        let next = previous.saturating_add(current);
        previous = current;
        current = next;
        i += 1;
    }
    previous
}

/// Hop budget a message receives on entering `stage`.
pub fn budget_for_stage(stage: u32) -> i64 {
    if stage % 2 == 0 {
        i64::try_from(fibonacci(stage)).unwrap_or(i64::MAX)
    } else {
        UNBOUNDED
    }
}

/// An election message.
///
/// Messages move from queue to queue; a node that forwards one gives it up.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    value: Identifier,
    stage: u32,
    counter: i64,
}

impl Message {
    /// Create a message with explicit fields.
    pub const fn new(value: Identifier, stage: u32, counter: i64) -> Self {
        Self { value, stage, counter }
    }

    /// Create a message whose counter follows the stage table.
    pub fn at_stage(value: Identifier, stage: u32) -> Self {
        Self::new(value, stage, budget_for_stage(stage))
    }

    /// Candidate value carried by the message.
    pub const fn value(&self) -> Identifier {
        self.value
    }

    /// Stage (and parity) of the probe.
    pub const fn stage(&self) -> u32 {
        self.stage
    }

    /// Remaining hop budget, or [`UNBOUNDED`].
    pub const fn counter(&self) -> i64 {
        self.counter
    }

    /// Even stages favour the larger value and carry a bounded budget.
    pub const fn is_even_stage(&self) -> bool {
        self.stage % 2 == 0
    }

    /// An even-stage message whose budget is spent.
    pub const fn is_exhausted(&self) -> bool {
        self.is_even_stage() && self.counter == 0
    }

    /// Move to the next stage and reset the counter from the stage table.
    pub fn promote(&mut self) {
        self.stage += 1;
        self.counter = budget_for_stage(self.stage);
    }

    /// Advance the stage without touching the counter.
    pub(crate) fn flip_parity(&mut self) {
        self.stage += 1;
    }

    /// Charge one hop against an even-stage budget.
    pub(crate) fn spend_hop(&mut self) {
        if self.is_even_stage() {
            self.counter -= 1;
        }
    }

    /// Copy of the fields for traces.
    pub const fn view(&self) -> MessageView {
        MessageView {
            value: self.value,
            stage: self.stage,
            counter: self.counter,
        }
    }
}

/// Read-only copy of a message at one point of its journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageView {
    pub value: Identifier,
    pub stage: u32,
    pub counter: i64,
}
