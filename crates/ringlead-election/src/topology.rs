//! Ring topology as an index arena.
//!
//! Positions `0..len` are linked into a single cycle: the right neighbour of
//! `i` is `i + 1` and the left neighbour is `i - 1`, both wrapping around.
//! Links are plain indices, so the cyclic structure needs no shared
//! ownership.

/// Travel direction of messages, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    /// The other way around the ring.
    pub const fn opposite(&self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Neighbour indices of one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub left: usize,
    pub right: usize,
}

impl Link {
    /// The neighbour in `direction`.
    pub const fn toward(&self, direction: Direction) -> usize {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }
}

/// Fixed cycle over `len` positions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Topology {
    links: Vec<Link>,
}

impl Topology {
    /// Link `size` positions into a cycle.
    ///
    /// A single position is its own left and right neighbour.
    pub fn cycle(size: usize) -> Self {
        let links = (0..size)
            .map(|i| Link {
                left: (i + size - 1) % size,
                right: (i + 1) % size,
            })
            .collect();
        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links of `position`, if it exists.
    pub fn link(&self, position: usize) -> Option<Link> {
        self.links.get(position).copied()
    }

    /// Neighbour of `position` in `direction`.
    ///
    /// # Panics
    ///
    /// If `position` is not in the ring.
    pub fn neighbor(&self, position: usize, direction: Direction) -> usize {
        self.links[position].toward(direction)
    }

    /// Every position exactly once, starting at `start`.
    pub fn walk(&self, start: usize, direction: Direction) -> Walk<'_> {
        Walk {
            topology: self,
            next: start,
            direction,
            remaining: if start < self.len() { self.len() } else { 0 },
        }
    }

    /// Check that links are mutual and form one cycle through every position.
    pub fn is_cycle(&self) -> bool {
        let mutual = self.links.iter().enumerate().all(|(i, link)| {
            link.right < self.len()
                && link.left < self.len()
                && self.links[link.right].left == i
                && self.links[link.left].right == i
        });
        if !mutual {
            return false;
        }

        let mut seen = vec![false; self.len()];
        for position in self.walk(0, Direction::Right) {
            if seen[position] {
                return false;
            }
            seen[position] = true;
        }
        seen.iter().all(|&s| s) && (self.is_empty() || self.neighbor(self.len() - 1, Direction::Right) == 0)
    }
}

/// Iterator returned by [`Topology::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    topology: &'a Topology,
    next: usize,
    direction: Direction,
    remaining: usize,
}

impl Iterator for Walk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.next = self.topology.neighbor(current, self.direction);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Walk<'_> {}
