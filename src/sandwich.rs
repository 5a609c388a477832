//! Interval sandwich instances derived from a kinship graph.
//!
//! A sandwich instance places every individual, mating unit and sibship unit
//! of a family on a common vertex universe, then splits the pairs of vertices
//! into those that must be drawn adjacent (required edges) and those that must
//! never be (forbidden edges). A family can be drawn without crossings
//! exactly when some interval graph lies between the two edge sets.

use std::collections::BTreeSet;

use crate::graph::Edge;
use crate::graph::EdgeSet;
use crate::kinship::Generations;
use crate::kinship::IndividualId;
use crate::kinship::Kinship;
use crate::kinship::MatingUnitId;
use crate::kinship::SibshipUnitId;

pub mod builder;
pub mod layout;
pub mod monitor;
pub mod solver;

pub use builder::Builder;
pub use layout::IntervalForVertex;
pub use layout::Layout;
pub use solver::Outcome;
pub use solver::Solver;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to an [`Instance`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// An edge is both required and forbidden.
    Overlap(Edge),

    /// An edge names a vertex outside of the instance.
    VertexOutOfRange(Edge, usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Overlap(edge) => write!(f, "edge {edge} is both required and forbidden"),
            Error::VertexOutOfRange(edge, len) => write!(
                f,
                "edge {edge} names a vertex outside of the instance: {len} vertices"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Vertices
////////////////////////////////////////////////////////////////////////////////////////

/// A vertex of a sandwich instance.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Vertex {
    /// An individual.
    Individual(IndividualId),

    /// A mating unit.
    MatingUnit(MatingUnitId),

    /// A sibship unit.
    SibshipUnit(SibshipUnitId),
}

impl Vertex {
    /// Gets the individuals this vertex stands for.
    ///
    /// An individual stands for itself, a mating unit for its known parents,
    /// and a sibship unit for its children.
    pub fn individual_set(&self, kinship: &Kinship) -> BTreeSet<IndividualId> {
        match self {
            Vertex::Individual(id) => BTreeSet::from([*id]),
            Vertex::MatingUnit(id) => kinship.mating_unit(*id).partners().collect(),
            Vertex::SibshipUnit(id) => kinship
                .sibship_unit(*id)
                .children()
                .iter()
                .copied()
                .collect(),
        }
    }

    /// Gets the generations occupied by the individuals of this vertex.
    ///
    /// Individuals without a generation do not contribute.
    pub fn generation_ranks(
        &self,
        kinship: &Kinship,
        generations: &Generations,
    ) -> BTreeSet<usize> {
        self.individual_set(kinship)
            .into_iter()
            .filter_map(|id| generations.get(id))
            .collect()
    }

    /// Gets a human readable label for this vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::kinship::Builder;
    /// use genogram::record::PersonRecord;
    /// use genogram::sandwich::Vertex;
    ///
    /// let records = vec![
    ///     PersonRecord::new("kid", "mom", "dad"),
    ///     PersonRecord::new("half", "0", "dad"),
    /// ];
    /// let kinship = Builder::default().try_build_from(&records)?;
    ///
    /// let mut units = kinship.mating_unit_ids();
    /// let sibship = kinship.sibship_unit_ids().next().unwrap();
    ///
    /// assert_eq!(Vertex::MatingUnit(units.next().unwrap()).label(&kinship), "mom+dad");
    /// assert_eq!(Vertex::MatingUnit(units.next().unwrap()).label(&kinship), "?+dad");
    /// assert_eq!(Vertex::SibshipUnit(sibship).label(&kinship), "{kid}");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn label(&self, kinship: &Kinship) -> String {
        match self {
            Vertex::Individual(id) => kinship.individual(*id).name().to_string(),
            Vertex::MatingUnit(id) => {
                let unit = kinship.mating_unit(*id);
                let name = |parent: Option<IndividualId>| {
                    parent.map_or("?", |parent| kinship.individual(parent).name())
                };

                format!("{}+{}", name(unit.mother()), name(unit.father()))
            }
            Vertex::SibshipUnit(id) => {
                let children = kinship
                    .sibship_unit(*id)
                    .children()
                    .iter()
                    .map(|child| kinship.individual(*child).name())
                    .collect::<Vec<_>>();

                format!("{{{}}}", children.join(","))
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Instance
////////////////////////////////////////////////////////////////////////////////////////

/// A graph sandwich instance.
///
/// Edges refer to vertices by their position in [`Instance::vertices`].
/// Once built, the required and forbidden edges are guaranteed to be
/// disjoint.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Instance {
    /// The vertices.
    vertices: Vec<Vertex>,

    /// The edges every solution must contain.
    required: EdgeSet,

    /// The edges no solution may contain.
    forbidden: EdgeSet,
}

impl Instance {
    /// Attempts to create a new [`Instance`].
    ///
    /// Fails if an edge names a vertex that does not exist or if an edge is
    /// both required and forbidden.
    pub fn try_new(vertices: Vec<Vertex>, required: EdgeSet, forbidden: EdgeSet) -> Result<Self> {
        let len = vertices.len();

        if let Some(edge) = required
            .iter()
            .chain(forbidden.iter())
            .find(|edge| edge.endpoints().1 >= len)
        {
            return Err(Error::VertexOutOfRange(*edge, len));
        }

        if let Some(edge) = required.intersection(&forbidden).iter().next() {
            return Err(Error::Overlap(*edge));
        }

        Ok(Self {
            vertices,
            required,
            forbidden,
        })
    }

    /// Gets the vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Gets the required edges.
    pub fn required(&self) -> &EdgeSet {
        &self.required
    }

    /// Gets the forbidden edges.
    pub fn forbidden(&self) -> &EdgeSet {
        &self.forbidden
    }

    /// Gets the number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns whether the instance has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinship;
    use crate::record::PersonRecord;

    fn family() -> Kinship {
        let records = vec![
            PersonRecord::new("c1", "m", "f"),
            PersonRecord::new("c2", "m", "f"),
        ];

        kinship::Builder::default().try_build_from(&records).unwrap()
    }

    #[test]
    fn test_individual_sets() {
        let kinship = family();
        let m = kinship.find("m").unwrap();
        let f = kinship.find("f").unwrap();
        let c1 = kinship.find("c1").unwrap();
        let c2 = kinship.find("c2").unwrap();

        let unit = kinship.find_mating_unit(Some(m), Some(f)).unwrap();
        let sibship = kinship.mating_unit(unit).sibship();

        assert_eq!(
            Vertex::Individual(c1).individual_set(&kinship),
            BTreeSet::from([c1])
        );
        assert_eq!(
            Vertex::MatingUnit(unit).individual_set(&kinship),
            BTreeSet::from([m, f])
        );
        assert_eq!(
            Vertex::SibshipUnit(sibship).individual_set(&kinship),
            BTreeSet::from([c1, c2])
        );
    }

    #[test]
    fn test_generation_ranks() {
        let kinship = family();
        let generations = Generations::rank(&kinship);

        let unit = kinship.mating_unit_ids().next().unwrap();
        let sibship = kinship.sibship_unit_ids().next().unwrap();

        assert_eq!(
            Vertex::MatingUnit(unit).generation_ranks(&kinship, &generations),
            BTreeSet::from([0])
        );
        assert_eq!(
            Vertex::SibshipUnit(sibship).generation_ranks(&kinship, &generations),
            BTreeSet::from([1])
        );
        assert_eq!(Vertex::SibshipUnit(sibship).label(&kinship), "{c1,c2}");
    }

    #[test]
    fn test_overlapping_edges_are_rejected() {
        let kinship = family();
        let vertices = kinship.individual_ids().map(Vertex::Individual).collect::<Vec<_>>();

        let mut required = EdgeSet::new();
        required.insert(0, 1);

        let mut forbidden = EdgeSet::new();
        forbidden.insert(1, 0);
        forbidden.insert(2, 3);

        let err = Instance::try_new(vertices, required, forbidden).unwrap_err();
        assert_eq!(err.to_string(), "edge 0-1 is both required and forbidden");
    }

    #[test]
    fn test_out_of_range_edges_are_rejected() {
        let kinship = family();
        let vertices = kinship.individual_ids().map(Vertex::Individual).collect::<Vec<_>>();

        let mut required = EdgeSet::new();
        required.insert(0, 9);

        let err = Instance::try_new(vertices, required, EdgeSet::new()).unwrap_err();
        assert_eq!(
            err,
            Error::VertexOutOfRange(Edge::try_new(0, 9).unwrap(), 4)
        );
    }
}
