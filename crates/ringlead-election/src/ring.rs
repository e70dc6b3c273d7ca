//! Ring driver: topology, originator selection and election runs.
//!
//! # Concurrency
//!
//! Each node sits behind its own lock. One hop applies the protocol at a node
//! and appends the result to the neighbour's inbox while holding both locks,
//! taken in position order. Links therefore stay FIFO, and because an
//! originator always activates before reading its inbox, every node sees the
//! same input sequence however the workers interleave. The outcome and the
//! message count are reproducible.
//!
//! A worker follows its own message around the ring until a node forwards
//! nothing. Whoever enqueues into a node also moves there next, so no message
//! is left behind once every worker has stopped.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::events::{ElectionEvent, NodeView, RingSnapshot};
use crate::message::{Identifier, Message};
use crate::node::Node;
use crate::state::NodeState;
use crate::topology::{Direction, Topology};

/// Result of a completed election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElectionOutcome {
    /// Ring position of the leader.
    pub leader: usize,
    /// The leader's own identifier.
    pub identifier: Identifier,
    /// Value the leader holds at the end of the run.
    pub elected: Identifier,
    /// Hops taken across all workers.
    pub messages: u64,
}

/// A ring of nodes ready to run one election.
pub struct Ring {
    nodes: Vec<Mutex<Node>>,
    topology: Topology,
    direction: Direction,
    algorithm: Algorithm,
    originators: Vec<usize>,
    initial: Vec<NodeView>,
    messages: AtomicU64,
    trace: Mutex<Vec<ElectionEvent>>,
    started: AtomicBool,
}

impl Ring {
    /// Build a ring from identifiers in ring order.
    ///
    /// Fails before anything runs if the ring is empty, an identifier repeats,
    /// or the originator positions are not a non-empty set of distinct
    /// positions in the ring.
    pub fn new(
        identifiers: Vec<Identifier>,
        direction: Direction,
        algorithm: Algorithm,
        originators: &[usize],
    ) -> Result<Self> {
        if identifiers.is_empty() {
            warn!("rejecting empty ring");
            return Err(Error::EmptyRing);
        }

        let mut seen = HashSet::with_capacity(identifiers.len());
        if let Some(&duplicate) = identifiers.iter().find(|&&id| !seen.insert(id)) {
            warn!(identifier = duplicate, "rejecting ring with duplicate identifier");
            return Err(Error::DuplicateIdentifier(duplicate));
        }

        if let Err(e) = validate_originators(originators, identifiers.len()) {
            warn!(error = %e, "rejecting originator selection");
            return Err(e);
        }

        let mut nodes: Vec<Node> = identifiers.into_iter().map(Node::new).collect();
        for &position in originators {
            nodes[position].mark_originator();
        }
        let initial = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| node.view(position))
            .collect();

        Ok(Self {
            topology: Topology::cycle(nodes.len()),
            nodes: nodes.into_iter().map(Mutex::new).collect(),
            direction,
            algorithm,
            originators: originators.to_vec(),
            initial,
            messages: AtomicU64::new(0),
            trace: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Originator positions in selection order.
    pub fn originators(&self) -> &[usize] {
        &self.originators
    }

    /// Identifiers in ring order.
    pub fn identifiers(&self) -> Vec<Identifier> {
        self.initial.iter().map(|n| n.identifier).collect()
    }

    /// The ring before the election started.
    pub fn initial_views(&self) -> &[NodeView] {
        &self.initial
    }

    /// Where messages leaving `position` go.
    pub fn neighbor(&self, position: usize) -> usize {
        self.topology.neighbor(position, self.direction)
    }

    /// `(identifier, neighbour identifier)` for every node in ring order.
    pub fn edges(&self, direction: Direction) -> Vec<(Identifier, Identifier)> {
        (0..self.len())
            .map(|position| {
                let other = self.topology.neighbor(position, direction);
                (self.initial[position].identifier, self.initial[other].identifier)
            })
            .collect()
    }

    /// Hops taken so far.
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Acquire)
    }

    /// Every protocol step recorded so far, in the order it happened.
    pub fn events(&self) -> Vec<ElectionEvent> {
        self.trace.lock().clone()
    }

    /// Current state of every node in ring order.
    pub fn snapshot(&self) -> RingSnapshot {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(position, node)| node.lock().view(position))
            .collect();
        let trace = self.trace.lock();
        RingSnapshot {
            step: trace.len() as u64,
            nodes,
            messages: self.messages(),
            last_hop: trace.iter().rev().find_map(ElectionEvent::hop),
        }
    }

    /// Run the node at `position` until it forwards a message or runs dry.
    ///
    /// Returns `true` if a message moved on to the neighbour.
    pub(crate) fn advance(&self, position: usize) -> Result<bool> {
        let Some(link) = self.topology.link(position) else {
            return Err(Error::OriginatorOutOfRange {
                index: position,
                nodes: self.len(),
            });
        };
        let next = link.toward(self.direction);

        if next == position {
            let mut node = self.nodes[position].lock();
            return Ok(match self.process(position, next, &mut node)? {
                Some(message) => {
                    node.deliver(message);
                    true
                }
                None => false,
            });
        }

        let (mut node, mut neighbor) = if position < next {
            let node = self.nodes[position].lock();
            let neighbor = self.nodes[next].lock();
            (node, neighbor)
        } else {
            let neighbor = self.nodes[next].lock();
            let node = self.nodes[position].lock();
            (node, neighbor)
        };

        Ok(match self.process(position, next, &mut node)? {
            Some(message) => {
                neighbor.deliver(message);
                true
            }
            None => false,
        })
    }

    fn process(&self, position: usize, next: usize, node: &mut Node) -> Result<Option<Message>> {
        let outgoing = node.process(self.algorithm, |observed| {
            debug!(
                position,
                state = %observed.state,
                value = observed.value,
                stage = observed.stage,
                "node step"
            );
            let mut trace = self.trace.lock();
            let step = trace.len() as u64;
            trace.push(ElectionEvent::from_step(step, position, next, observed));
        })?;

        if let Some(message) = &outgoing {
            self.messages.fetch_add(1, Ordering::AcqRel);
            debug!(
                from = position,
                to = next,
                value = message.value(),
                stage = message.stage(),
                counter = message.counter(),
                state = %node.state(),
                "hop"
            );
        } else {
            debug!(position, state = %node.state(), "chain ended");
        }
        Ok(outgoing)
    }

    /// Run the election with one thread per originator.
    pub fn elect(&self) -> Result<ElectionOutcome> {
        if let Some(outcome) = self.begin()? {
            return Ok(outcome);
        }

        let results: Vec<Result<()>> = thread::scope(|scope| {
            let workers: Vec<_> = self
                .originators
                .iter()
                .map(|&start| scope.spawn(move || self.follow(start)))
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().map_err(|_| Error::WorkerPanicked).and_then(|r| r))
                .collect()
        });

        for result in results {
            if let Err(e) = result {
                error!(error = %e, "election worker failed");
                return Err(e);
            }
        }
        self.conclude()
    }

    /// Run the election on the calling thread, round-robin over workers.
    pub fn elect_sequential(&self) -> Result<ElectionOutcome> {
        if let Some(outcome) = self.begin()? {
            return Ok(outcome);
        }

        let mut workers: VecDeque<usize> = self.originators.iter().copied().collect();
        while let Some(position) = workers.pop_front() {
            if self.advance(position)? {
                workers.push_back(self.neighbor(position));
            }
        }
        self.conclude()
    }

    fn follow(&self, start: usize) -> Result<()> {
        let mut position = start;
        while self.advance(position)? {
            position = self.neighbor(position);
        }
        Ok(())
    }

    /// Guard against reruns and settle the single-node ring.
    fn begin(&self) -> Result<Option<ElectionOutcome>> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyElected);
        }

        info!(
            nodes = self.len(),
            originators = self.originators.len(),
            algorithm = self.algorithm.name(),
            direction = ?self.direction,
            "starting election"
        );

        if self.len() > 1 {
            return Ok(None);
        }

        let mut node = self.nodes[0].lock();
        node.crown();
        self.trace.lock().push(ElectionEvent {
            step: 0,
            position: 0,
            received: None,
            state: node.state(),
            value: node.value(),
            stage: node.stage(),
            forwarded: None,
            to: None,
        });
        info!(identifier = node.identifier(), "single node ring elects itself");
        Ok(Some(ElectionOutcome {
            leader: 0,
            identifier: node.identifier(),
            elected: node.value(),
            messages: 0,
        }))
    }

    /// Check that exactly one node ended as Leader.
    fn conclude(&self) -> Result<ElectionOutcome> {
        let leaders: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.lock().state() == NodeState::Leader)
            .map(|(position, _)| position)
            .collect();

        let position = match leaders.len() {
            0 => {
                error!("all workers stopped without a leader");
                return Err(Error::NoLeader);
            }
            1 => leaders[0],
            _ => {
                error!(?leaders, "more than one leader elected");
                return Err(Error::MultipleLeaders { positions: leaders });
            }
        };

        let node = self.nodes[position].lock();
        let outcome = ElectionOutcome {
            leader: position,
            identifier: node.identifier(),
            elected: node.value(),
            messages: self.messages(),
        };
        info!(
            leader = position,
            identifier = outcome.identifier,
            elected = outcome.elected,
            messages = outcome.messages,
            "leader elected"
        );
        Ok(outcome)
    }
}

/// Check that `originators` is a non-empty set of distinct positions in a
/// ring of `nodes`.
pub fn validate_originators(originators: &[usize], nodes: usize) -> Result<()> {
    if originators.is_empty() {
        return Err(Error::NoOriginators);
    }
    if originators.len() > nodes {
        return Err(Error::TooManyOriginators {
            requested: originators.len(),
            nodes,
        });
    }

    let mut seen = HashSet::with_capacity(originators.len());
    for &index in originators {
        if index >= nodes {
            return Err(Error::OriginatorOutOfRange { index, nodes });
        }
        if !seen.insert(index) {
            return Err(Error::DuplicateOriginator(index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring(ids: &[Identifier], direction: Direction, algorithm: Algorithm, originators: &[usize]) -> Ring {
        Ring::new(ids.to_vec(), direction, algorithm, originators).unwrap()
    }

    fn outcome(leader: usize, identifier: Identifier, elected: Identifier, messages: u64) -> ElectionOutcome {
        ElectionOutcome {
            leader,
            identifier,
            elected,
            messages,
        }
    }

    #[test]
    fn construction_rejects_bad_configuration() {
        let build = |ids: Vec<Identifier>, originators: &[usize]| {
            Ring::new(ids, Direction::Right, Algorithm::Basic, originators).err()
        };

        assert_eq!(build(vec![], &[0]), Some(Error::EmptyRing));
        assert_eq!(build(vec![1, 2, 1], &[0]), Some(Error::DuplicateIdentifier(1)));
        assert_eq!(build(vec![1, 2, 3], &[]), Some(Error::NoOriginators));
        assert_eq!(
            build(vec![1, 2, 3], &[0, 1, 2, 0]),
            Some(Error::TooManyOriginators { requested: 4, nodes: 3 })
        );
        assert_eq!(
            build(vec![1, 2, 3], &[3]),
            Some(Error::OriginatorOutOfRange { index: 3, nodes: 3 })
        );
        assert_eq!(build(vec![1, 2, 3], &[1, 1]), Some(Error::DuplicateOriginator(1)));
    }

    #[test]
    fn originators_are_marked_before_start() {
        let ring = ring(&[4, 8, 1], Direction::Right, Algorithm::Basic, &[2, 0]);
        let states: Vec<_> = ring.initial_views().iter().map(|n| n.state).collect();
        assert_eq!(
            states,
            vec![NodeState::Originator, NodeState::Asleep, NodeState::Originator]
        );
        assert_eq!(ring.originators(), &[2, 0]);
        assert!(ring.topology().is_cycle());
    }

    #[test]
    fn edges_follow_direction() {
        let ring = ring(&[3, 1, 2], Direction::Right, Algorithm::Basic, &[0]);
        assert_eq!(ring.edges(Direction::Right), vec![(3, 1), (1, 2), (2, 3)]);
        assert_eq!(ring.edges(Direction::Left), vec![(3, 2), (1, 3), (2, 1)]);
    }

    #[test]
    fn single_originator_circles_once() {
        for algorithm in [Algorithm::Basic, Algorithm::Optimized] {
            let ring = ring(&[3, 1, 2], Direction::Right, algorithm, &[0]);
            assert_eq!(ring.elect().unwrap(), outcome(0, 3, 3, 3));

            let snap = ring.snapshot();
            assert_eq!(
                snap.states(),
                vec![
                    (3, NodeState::Leader),
                    (1, NodeState::Defeated),
                    (2, NodeState::Defeated)
                ]
            );
            assert_eq!(snap.in_flight(), 0);
        }
    }

    #[test]
    fn single_node_ring_elects_itself_without_messages() {
        for algorithm in [Algorithm::Basic, Algorithm::Optimized] {
            let ring = ring(&[7], Direction::Right, algorithm, &[0]);
            assert_eq!(ring.elect().unwrap(), outcome(0, 7, 7, 0));
            assert_eq!(ring.snapshot().positions_in(NodeState::Leader), vec![0]);
        }
    }

    #[test]
    fn outlier_identifier_does_not_change_the_winner() {
        // 1000 never originates, so it only relays.
        for algorithm in [Algorithm::Basic, Algorithm::Optimized] {
            for direction in [Direction::Right, Direction::Left] {
                for _ in 0..5 {
                    let ring = ring(&[5, 1, 2, 1000, 3], direction, algorithm, &[0, 4]);
                    assert_eq!(ring.elect().unwrap(), outcome(0, 5, 3, 10));
                }
            }
        }
    }

    #[test]
    fn optimized_leaves_stale_candidates_behind() {
        let ring = ring(&[5, 1, 2, 1000, 3], Direction::Right, Algorithm::Optimized, &[0, 4]);
        ring.elect().unwrap();

        let snap = ring.snapshot();
        let states: Vec<_> = snap.nodes.iter().map(|n| n.state).collect();
        assert_eq!(
            states,
            vec![
                NodeState::Leader,
                NodeState::Candidate,
                NodeState::Defeated,
                NodeState::Defeated,
                NodeState::Defeated,
            ]
        );
        let values: Vec<_> = snap.nodes.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![3, 3, 2, 1000, 3]);
    }

    fn check(
        ids: &[Identifier],
        originators: &[usize],
        algorithm: Algorithm,
        direction: Direction,
        expected: ElectionOutcome,
    ) {
        let threaded = ring(ids, direction, algorithm, originators);
        assert_eq!(
            threaded.elect().unwrap(),
            expected,
            "{:?} {:?} {:?} {:?}",
            ids,
            originators,
            algorithm,
            direction
        );

        let sequential = ring(ids, direction, algorithm, originators);
        assert_eq!(sequential.elect_sequential().unwrap(), expected);
    }

    #[test]
    fn known_outcomes() {
        use Algorithm::{Basic, Optimized};
        use Direction::{Left, Right};

        let small = [1, 2, 3];
        check(&small, &[0, 1, 2], Basic, Right, outcome(1, 2, 2, 9));
        check(&small, &[0, 1, 2], Basic, Left, outcome(2, 3, 1, 6));
        check(&small, &[0, 1, 2], Optimized, Right, outcome(0, 1, 1, 11));
        check(&small, &[0, 1, 2], Optimized, Left, outcome(2, 3, 1, 6));

        let six = [4, 8, 1, 6, 3, 7];
        let everyone = [0, 1, 2, 3, 4, 5];
        check(&six, &everyone, Basic, Right, outcome(3, 6, 4, 18));
        check(&six, &everyone, Basic, Left, outcome(3, 6, 3, 24));
        check(&six, &everyone, Optimized, Right, outcome(5, 7, 3, 26));
        check(&six, &everyone, Optimized, Left, outcome(4, 3, 1, 21));

        for algorithm in [Basic, Optimized] {
            for direction in [Left, Right] {
                check(&six, &[1, 3], algorithm, direction, outcome(1, 8, 6, 12));
                check(&[10, 20], &[0, 1], algorithm, direction, outcome(1, 20, 10, 4));
            }
        }
    }

    #[test]
    fn finishing_without_a_leader_is_fatal() {
        let ring = ring(&[4, 8, 1], Direction::Right, Algorithm::Basic, &[0, 2]);
        assert_eq!(ring.conclude(), Err(Error::NoLeader));
    }

    #[test]
    fn finishing_with_two_leaders_is_fatal() {
        let ring = ring(&[4, 8, 1], Direction::Right, Algorithm::Optimized, &[0, 2]);
        ring.nodes[0].lock().crown();
        ring.nodes[2].lock().crown();
        assert_eq!(
            ring.conclude(),
            Err(Error::MultipleLeaders { positions: vec![0, 2] })
        );
    }

    #[test]
    fn advance_rejects_unknown_position() {
        let ring = ring(&[4, 8, 1], Direction::Left, Algorithm::Basic, &[0]);
        assert_eq!(
            ring.advance(3),
            Err(Error::OriginatorOutOfRange { index: 3, nodes: 3 })
        );
        assert_eq!(ring.messages(), 0);
        assert!(ring.events().is_empty());
    }

    #[test]
    fn second_run_is_rejected() {
        let ring = ring(&[3, 1, 2], Direction::Right, Algorithm::Basic, &[0]);
        ring.elect_sequential().unwrap();
        assert_eq!(ring.elect(), Err(Error::AlreadyElected));
        assert_eq!(ring.elect_sequential(), Err(Error::AlreadyElected));
    }

    #[test]
    fn trace_replays_to_final_snapshot() {
        let ring = ring(&[4, 8, 1, 6, 3, 7], Direction::Right, Algorithm::Optimized, &[0, 1, 2, 3, 4, 5]);
        let result = ring.elect().unwrap();

        let events = ring.events();
        let steps: Vec<u64> = events.iter().map(|e| e.step).collect();
        assert_eq!(steps, (0..events.len() as u64).collect::<Vec<_>>());

        let replayed = RingSnapshot::from_events(ring.initial_views(), &events, events.len());
        let current = ring.snapshot();
        assert_eq!(replayed.nodes, current.nodes);
        assert_eq!(replayed.messages, result.messages);
        assert_eq!(replayed.step, current.step);
        assert_eq!(replayed.last_hop, current.last_hop);
    }

    #[test]
    fn hop_count_matches_forwarding_events() {
        let ring = ring(&[1, 2, 3], Direction::Right, Algorithm::Basic, &[0, 1, 2]);
        let result = ring.elect().unwrap();
        let hops = ring.events().iter().filter(|e| e.hop().is_some()).count() as u64;
        assert_eq!(hops, result.messages);
        assert_eq!(ring.messages(), result.messages);
    }

    fn ring_with_originators() -> impl Strategy<Value = (Vec<Identifier>, Vec<usize>)> {
        (1usize..14).prop_flat_map(|n| {
            (
                Just((1..=n as Identifier).collect::<Vec<_>>()).prop_shuffle(),
                proptest::sample::subsequence((0..n).collect::<Vec<_>>(), 1..=n),
            )
        })
    }

    proptest! {
        #[test]
        fn exactly_one_leader_from_an_originator(
            (ids, originators) in ring_with_originators(),
            optimized in any::<bool>(),
            left in any::<bool>(),
        ) {
            let algorithm = if optimized { Algorithm::Optimized } else { Algorithm::Basic };
            let direction = if left { Direction::Left } else { Direction::Right };
            let n = ids.len() as u64;

            let threaded = Ring::new(ids.clone(), direction, algorithm, &originators).unwrap();
            let result = threaded.elect().unwrap();

            let snap = threaded.snapshot();
            prop_assert_eq!(snap.positions_in(NodeState::Leader), vec![result.leader]);
            prop_assert_eq!(snap.in_flight(), 0);

            let originator_ids: Vec<Identifier> = originators.iter().map(|&p| ids[p]).collect();
            prop_assert!(originator_ids.contains(&result.elected));
            prop_assert!(result.messages <= 2 * n * n);

            // A candidate's stage never goes back.
            let mut last: Vec<(NodeState, u32)> = threaded
                .initial_views()
                .iter()
                .map(|n| (n.state, n.stage))
                .collect();
            for event in threaded.events() {
                let (state, stage) = last[event.position];
                if state == NodeState::Candidate && event.state == NodeState::Candidate {
                    prop_assert!(
                        event.stage >= stage,
                        "position {} went from stage {} to {}",
                        event.position,
                        stage,
                        event.stage
                    );
                }
                last[event.position] = (event.state, event.stage);
            }

            let sequential = Ring::new(ids, direction, algorithm, &originators).unwrap();
            prop_assert_eq!(sequential.elect_sequential().unwrap(), result);
        }

        #[test]
        fn lone_originator_wins_in_one_lap(
            ids in (2usize..20).prop_flat_map(|n| Just((1..=n as Identifier).collect::<Vec<_>>()).prop_shuffle()),
            pick in any::<prop::sample::Index>(),
            optimized in any::<bool>(),
        ) {
            let algorithm = if optimized { Algorithm::Optimized } else { Algorithm::Basic };
            let start = pick.index(ids.len());
            let ring = Ring::new(ids.clone(), Direction::Right, algorithm, &[start]).unwrap();

            let result = ring.elect().unwrap();
            prop_assert_eq!(result, outcome(start, ids[start], ids[start], ids.len() as u64));
        }
    }
}
