//! Interval layouts produced by the sandwich solver.

use rust_lapper as lapper;

use crate::graph::Edge;
use crate::graph::EdgeSet;
use crate::sandwich::Instance;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to verifying a [`Layout`] against an [`Instance`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A vertex of the instance has no interval.
    MissingVertex(usize),

    /// The intervals of a required edge do not overlap.
    RequiredApart(Edge),

    /// The intervals of a forbidden edge overlap.
    ForbiddenTouching(Edge),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingVertex(vertex) => write!(f, "vertex {vertex} has no interval"),
            Error::RequiredApart(edge) => {
                write!(f, "intervals of required edge {edge} do not overlap")
            }
            Error::ForbiddenTouching(edge) => {
                write!(f, "intervals of forbidden edge {edge} overlap")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Intervals
////////////////////////////////////////////////////////////////////////////////////////

/// A closed interval `[start, end]` assigned to one vertex.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct IntervalForVertex {
    /// The vertex index.
    vertex: usize,

    /// The first position covered.
    start: usize,

    /// The last position covered.
    end: usize,
}

impl IntervalForVertex {
    /// Creates a new [`IntervalForVertex`].
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::sandwich::IntervalForVertex;
    ///
    /// let a = IntervalForVertex::new(0, 0, 3);
    /// let b = IntervalForVertex::new(1, 3, 5);
    /// let c = IntervalForVertex::new(2, 4, 4);
    ///
    /// assert!(a.overlaps(&b));
    /// assert!(!a.overlaps(&c));
    /// ```
    pub fn new(vertex: usize, start: usize, end: usize) -> Self {
        let (start, end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };

        Self { vertex, start, end }
    }

    /// Gets the vertex index.
    pub fn vertex(&self) -> usize {
        self.vertex
    }

    /// Gets the first position covered.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Gets the last position covered.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns whether two intervals share at least one position.
    pub fn overlaps(&self, other: &IntervalForVertex) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Layout
////////////////////////////////////////////////////////////////////////////////////////

/// An assignment of intervals to the vertices of an [`Instance`].
#[derive(Clone, Debug)]
pub struct Layout {
    /// The intervals, sorted by vertex.
    intervals: Vec<IntervalForVertex>,

    /// The intervals, indexed by position.
    inner: lapper::Lapper<usize, usize>,
}

impl Layout {
    /// Creates a new [`Layout`].
    pub fn new(mut intervals: Vec<IntervalForVertex>) -> Self {
        intervals.sort_by_key(|interval| interval.vertex);

        let inner = lapper::Lapper::new(
            intervals
                .iter()
                .map(|interval| lapper::Interval {
                    start: interval.start,
                    stop: interval.end + 1,
                    val: interval.vertex,
                })
                .collect(),
        );

        Self { intervals, inner }
    }

    /// Gets the intervals, sorted by vertex.
    pub fn intervals(&self) -> &[IntervalForVertex] {
        &self.intervals
    }

    /// Gets the interval of a vertex.
    pub fn get(&self, vertex: usize) -> Option<&IntervalForVertex> {
        self.intervals
            .binary_search_by_key(&vertex, |interval| interval.vertex)
            .ok()
            .map(|i| &self.intervals[i])
    }

    /// Gets the vertices whose intervals cover `position`, in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::sandwich::IntervalForVertex;
    /// use genogram::sandwich::Layout;
    ///
    /// let layout = Layout::new(vec![
    ///     IntervalForVertex::new(0, 0, 2),
    ///     IntervalForVertex::new(1, 1, 5),
    ///     IntervalForVertex::new(2, 3, 4),
    /// ]);
    ///
    /// assert_eq!(layout.at(0), vec![0]);
    /// assert_eq!(layout.at(2), vec![0, 1]);
    /// assert_eq!(layout.at(4), vec![1, 2]);
    /// assert!(layout.at(6).is_empty());
    /// ```
    pub fn at(&self, position: usize) -> Vec<usize> {
        let mut vertices = self
            .inner
            .find(position, position + 1)
            .map(|interval| interval.val)
            .collect::<Vec<_>>();

        vertices.sort_unstable();
        vertices
    }

    /// Gets the vertices in draw order: by interval start, then by interval
    /// end, then by vertex.
    pub fn order(&self) -> Vec<usize> {
        let mut intervals = self.intervals.iter().collect::<Vec<_>>();
        intervals.sort_by_key(|interval| (interval.start, interval.end, interval.vertex));
        intervals.into_iter().map(|interval| interval.vertex).collect()
    }

    /// Gets the number of positions spanned by the layout.
    pub fn span(&self) -> usize {
        self.intervals
            .iter()
            .map(|interval| interval.end + 1)
            .max()
            .unwrap_or(0)
    }

    /// Gets the number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns whether the layout has no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Checks that the layout solves `instance`.
    ///
    /// Every vertex must have an interval, the intervals of every required
    /// edge must overlap and the intervals of every forbidden edge must not.
    pub fn verify(&self, instance: &Instance) -> Result<()> {
        self.verify_edges(instance.len(), instance.required(), instance.forbidden())
    }

    /// Checks the layout against bare edge sets over `len` vertices.
    pub(crate) fn verify_edges(
        &self,
        len: usize,
        required: &EdgeSet,
        forbidden: &EdgeSet,
    ) -> Result<()> {
        if let Some(vertex) = (0..len).find(|vertex| self.get(*vertex).is_none()) {
            return Err(Error::MissingVertex(vertex));
        }

        for edge in required {
            if !self.overlap(edge)? {
                return Err(Error::RequiredApart(*edge));
            }
        }

        for edge in forbidden {
            if self.overlap(edge)? {
                return Err(Error::ForbiddenTouching(*edge));
            }
        }

        Ok(())
    }

    /// Returns whether the intervals of both endpoints of `edge` overlap.
    fn overlap(&self, edge: &Edge) -> Result<bool> {
        let (a, b) = edge.endpoints();
        let a = self.get(a).ok_or(Error::MissingVertex(a))?;
        let b = self.get(b).ok_or(Error::MissingVertex(b))?;
        Ok(a.overlaps(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_layout() -> Layout {
        Layout::new(vec![
            IntervalForVertex::new(2, 3, 4),
            IntervalForVertex::new(0, 0, 2),
            IntervalForVertex::new(1, 1, 5),
        ])
    }

    #[test]
    fn test_intervals_are_sorted_by_vertex() {
        let layout = path_layout();

        let vertices = layout
            .intervals()
            .iter()
            .map(|interval| interval.vertex())
            .collect::<Vec<_>>();

        assert_eq!(vertices, vec![0, 1, 2]);
        assert_eq!(layout.get(1).map(|i| (i.start(), i.end())), Some((1, 5)));
        assert!(layout.get(3).is_none());
        assert_eq!(layout.span(), 6);
        assert_eq!(layout.len(), 3);
    }

    #[test]
    fn test_draw_order() {
        assert_eq!(path_layout().order(), vec![0, 1, 2]);

        let layout = Layout::new(vec![
            IntervalForVertex::new(0, 4, 4),
            IntervalForVertex::new(1, 0, 9),
            IntervalForVertex::new(2, 0, 1),
        ]);

        assert_eq!(layout.order(), vec![2, 1, 0]);
    }

    #[test]
    fn test_verify() {
        let layout = path_layout();

        let mut required = EdgeSet::new();
        required.insert(0, 1);
        required.insert(1, 2);

        let mut forbidden = EdgeSet::new();
        forbidden.insert(0, 2);

        assert!(layout.verify_edges(3, &required, &forbidden).is_ok());

        let err = layout.verify_edges(3, &forbidden, &required).unwrap_err();
        assert_eq!(err.to_string(), "intervals of required edge 0-2 do not overlap");

        let err = layout.verify_edges(4, &required, &forbidden).unwrap_err();
        assert_eq!(err, Error::MissingVertex(3));
    }

    #[test]
    fn test_reversed_bounds_are_normalized() {
        let interval = IntervalForVertex::new(7, 5, 2);

        assert_eq!(interval.start(), 2);
        assert_eq!(interval.end(), 5);
    }

    #[test]
    fn test_empty_layout() {
        let layout = Layout::new(Vec::new());

        assert!(layout.is_empty());
        assert!(layout.order().is_empty());
        assert!(layout.at(0).is_empty());
        assert_eq!(layout.span(), 0);
        assert!(layout.verify(&Instance::default()).is_ok());
    }
}
