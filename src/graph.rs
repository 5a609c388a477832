//! Undirected edges and set relations shared by the kinship and sandwich
//! models.

use std::collections::BTreeSet;

////////////////////////////////////////////////////////////////////////////////////////
// Set relations
////////////////////////////////////////////////////////////////////////////////////////

/// Returns whether every element of `a` is also an element of `b`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
///
/// use genogram::graph::is_subset;
///
/// let a = BTreeSet::from([1, 2]);
/// let b = BTreeSet::from([1, 2, 3]);
///
/// assert!(is_subset(&a, &b));
/// assert!(!is_subset(&b, &a));
/// ```
pub fn is_subset<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    a.is_subset(b)
}

/// Returns whether `a` and `b` contain exactly the same elements.
pub fn equal<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    a == b
}

/// Returns whether `a` and `b` share at least one element.
pub fn has_intersection<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    !a.is_disjoint(b)
}

/// Returns the elements of `a` that are not in `b`.
pub fn difference<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.difference(b).cloned().collect()
}

////////////////////////////////////////////////////////////////////////////////////////
// Edges
////////////////////////////////////////////////////////////////////////////////////////

/// An unordered pair of distinct vertex indices.
///
/// The smaller index is always stored first, so two edges naming the same
/// endpoints in either order compare equal.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Edge {
    /// The smaller endpoint.
    a: usize,

    /// The larger endpoint.
    b: usize,
}

impl Edge {
    /// Attempts to create a new edge between `u` and `v`.
    ///
    /// [`None`] is returned for a self loop.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::graph::Edge;
    ///
    /// let edge = Edge::try_new(3, 1).unwrap();
    /// assert_eq!(edge.endpoints(), (1, 3));
    /// assert_eq!(edge, Edge::try_new(1, 3).unwrap());
    ///
    /// assert!(Edge::try_new(2, 2).is_none());
    /// ```
    pub fn try_new(u: usize, v: usize) -> Option<Self> {
        match u.cmp(&v) {
            std::cmp::Ordering::Less => Some(Self { a: u, b: v }),
            std::cmp::Ordering::Greater => Some(Self { a: v, b: u }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Gets the endpoints of the edge, smaller index first.
    pub fn endpoints(&self) -> (usize, usize) {
        (self.a, self.b)
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// An ordered set of [`Edge`]s.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EdgeSet(BTreeSet<Edge>);

impl EdgeSet {
    /// Creates an empty edge set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the edge between `u` and `v`.
    ///
    /// Returns `false` if the edge was already present or is a self loop.
    pub fn insert(&mut self, u: usize, v: usize) -> bool {
        match Edge::try_new(u, v) {
            Some(edge) => self.0.insert(edge),
            None => false,
        }
    }

    /// Returns whether the edge between `u` and `v` is present.
    pub fn contains(&self, u: usize, v: usize) -> bool {
        Edge::try_new(u, v)
            .map(|edge| self.0.contains(&edge))
            .unwrap_or(false)
    }

    /// Gets the number of edges.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no edges.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the edges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.0.iter()
    }

    /// Gets the edges present in both `self` and `other`.
    pub fn intersection(&self, other: &EdgeSet) -> EdgeSet {
        EdgeSet(self.0.intersection(&other.0).copied().collect())
    }

    /// Builds the adjacency lists of the edges over `n` vertices.
    ///
    /// Neighbours are listed in ascending order.
    pub fn adjacency(&self, n: usize) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); n];

        for edge in &self.0 {
            let (a, b) = edge.endpoints();
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        for neighbours in adjacency.iter_mut() {
            neighbours.sort_unstable();
        }

        adjacency
    }
}

impl FromIterator<Edge> for EdgeSet {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        EdgeSet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EdgeSet {
    type Item = &'a Edge;
    type IntoIter = std::collections::btree_set::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
