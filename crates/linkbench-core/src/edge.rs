//! Canonical undirected edges and the O(1) membership index.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An unordered node pair stored as `(min, max)`.
///
/// Self-pairs are unrepresentable: [`Edge::new`] rejects `u == v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "(usize, usize)", try_from = "(usize, usize)")]
pub struct Edge {
    u: usize,
    v: usize,
}

impl Edge {
    /// Canonicalize `(a, b)` into `(min, max)`. Returns `None` for a self-pair.
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Option<Self> {
        if a == b {
            None
        } else if a < b {
            Some(Self { u: a, v: b })
        } else {
            Some(Self { u: b, v: a })
        }
    }

    /// Smaller endpoint.
    #[must_use]
    pub const fn u(self) -> usize {
        self.u
    }

    /// Larger endpoint.
    #[must_use]
    pub const fn v(self) -> usize {
        self.v
    }

    #[must_use]
    pub const fn endpoints(self) -> (usize, usize) {
        (self.u, self.v)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.u, self.v)
    }
}

impl From<Edge> for (usize, usize) {
    fn from(edge: Edge) -> Self {
        edge.endpoints()
    }
}

impl TryFrom<(usize, usize)> for Edge {
    type Error = String;

    fn try_from((a, b): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(a, b).ok_or_else(|| format!("self-pair ({a}, {a}) is not an edge"))
    }
}

/// Hash set of canonical edges for constant-time "is this pair an edge" checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    edges: HashSet<Edge>,
}

impl EdgeIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: HashSet::with_capacity(capacity),
        }
    }

    /// Insert an edge. Returns `false` if it was already present.
    pub fn insert(&mut self, edge: Edge) -> bool {
        self.edges.insert(edge)
    }

    #[must_use]
    pub fn contains(&self, edge: Edge) -> bool {
        self.edges.contains(&edge)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }
}

impl FromIterator<Edge> for EdgeIndex {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}

impl Extend<Edge> for EdgeIndex {
    fn extend<I: IntoIterator<Item = Edge>>(&mut self, iter: I) {
        self.edges.extend(iter);
    }
}
