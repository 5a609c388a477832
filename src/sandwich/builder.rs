//! A builder for an [`Instance`].

use std::collections::BTreeSet;

use crate::graph;
use crate::graph::EdgeSet;
use crate::kinship::Generations;
use crate::kinship::IndividualId;
use crate::kinship::Kinship;
use crate::sandwich;
use crate::sandwich::Instance;
use crate::sandwich::Vertex;

/// An error related to building an [`Instance`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// An individual has no generation.
    Unranked(String),

    /// The derived edges do not form a valid instance.
    Instance(sandwich::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unranked(name) => write!(f, "individual has no generation: {name}"),
            Error::Instance(err) => write!(f, "instance error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The per-vertex sets that every edge category compares.
struct Profile {
    /// The individuals the vertex stands for.
    individuals: BTreeSet<IndividualId>,

    /// The generations those individuals occupy.
    ranks: BTreeSet<usize>,
}

/// A builder for an [`Instance`].
#[derive(Clone, Debug, Default)]
pub struct Builder;

impl Builder {
    /// Builds the sandwich instance of a ranked kinship graph.
    ///
    /// Vertices are laid out as all individuals, then all mating units, then
    /// all sibship units, each in discovery order. Edges are derived as
    /// follows:
    ///
    /// * individuals of the same generation are forbidden to touch;
    /// * an individual must touch each of its mating units and is forbidden
    ///   to touch other mating units of its generation;
    /// * a child must touch its sibship and, unless it is a founder, is
    ///   forbidden to touch other sibships of its generation;
    /// * a mating unit must touch the sibship of its children;
    /// * a mating unit is forbidden to touch any other unit with which it
    ///   shares neither individuals nor generations.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::kinship;
    /// use genogram::kinship::Generations;
    /// use genogram::record::PersonRecord;
    /// use genogram::sandwich;
    ///
    /// let records = vec![PersonRecord::new("kid", "mom", "dad")];
    /// let kinship = kinship::Builder::default().try_build_from(&records)?;
    /// let generations = Generations::rank(&kinship);
    ///
    /// let instance = sandwich::Builder.try_build_from(&kinship, &generations)?;
    ///
    /// // kid, mom, dad, the couple and the sibship.
    /// assert_eq!(instance.len(), 5);
    /// assert!(instance.forbidden().contains(1, 2));
    /// assert!(instance.required().contains(1, 3));
    /// assert!(instance.required().contains(3, 4));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build_from(
        &self,
        kinship: &Kinship,
        generations: &Generations,
    ) -> Result<Instance> {
        let unranked = kinship
            .individual_ids()
            .find(|id| generations.get(*id).is_none());

        if let Some(id) = unranked {
            return Err(Error::Unranked(kinship.individual(id).name().to_string()));
        }

        let individuals = kinship.individual_ids().map(Vertex::Individual).collect::<Vec<_>>();
        let mating_units = kinship.mating_unit_ids().map(Vertex::MatingUnit).collect::<Vec<_>>();
        let sibships = kinship.sibship_unit_ids().map(Vertex::SibshipUnit).collect::<Vec<_>>();

        let vertices = individuals
            .iter()
            .chain(mating_units.iter())
            .chain(sibships.iter())
            .copied()
            .collect::<Vec<_>>();

        let profiles = vertices
            .iter()
            .map(|vertex| Profile {
                individuals: vertex.individual_set(kinship),
                ranks: vertex.generation_ranks(kinship, generations),
            })
            .collect::<Vec<_>>();

        let first_mating_unit = individuals.len();
        let first_sibship = first_mating_unit + mating_units.len();

        let individual_range = 0..first_mating_unit;
        let mating_unit_range = first_mating_unit..first_sibship;
        let sibship_range = first_sibship..vertices.len();

        let mut required = EdgeSet::new();
        let mut forbidden = EdgeSet::new();

        // Individuals against individuals.
        for i in individual_range.clone() {
            for j in (i + 1)..first_mating_unit {
                if graph::equal(&profiles[i].ranks, &profiles[j].ranks) {
                    forbidden.insert(i, j);
                }
            }
        }

        // Individuals against mating units and sibships.
        for i in individual_range {
            let has_parents = match vertices[i] {
                Vertex::Individual(id) => kinship.individual(id).parents().is_some(),
                _ => false,
            };

            for m in mating_unit_range.clone() {
                if graph::is_subset(&profiles[i].individuals, &profiles[m].individuals) {
                    required.insert(i, m);
                } else if graph::equal(&profiles[i].ranks, &profiles[m].ranks) {
                    forbidden.insert(i, m);
                }
            }

            for s in sibship_range.clone() {
                if graph::is_subset(&profiles[i].individuals, &profiles[s].individuals) {
                    required.insert(i, s);
                } else if has_parents && graph::equal(&profiles[i].ranks, &profiles[s].ranks) {
                    forbidden.insert(i, s);
                }
            }
        }

        // Mating units against the sibships of their children.
        for m in mating_unit_range.clone() {
            let children = match vertices[m] {
                Vertex::MatingUnit(id) => {
                    Vertex::SibshipUnit(kinship.mating_unit(id).sibship()).individual_set(kinship)
                }
                _ => BTreeSet::new(),
            };

            for s in sibship_range.clone() {
                if graph::equal(&children, &profiles[s].individuals) {
                    required.insert(m, s);
                }
            }
        }

        // Mating units against every other unit.
        for m in mating_unit_range {
            for other in first_mating_unit..vertices.len() {
                if other == m || required.contains(m, other) {
                    continue;
                }

                let apart = !graph::has_intersection(&profiles[m].ranks, &profiles[other].ranks)
                    && !graph::has_intersection(
                        &profiles[m].individuals,
                        &profiles[other].individuals,
                    );

                if apart {
                    forbidden.insert(m, other);
                }
            }
        }

        tracing::debug!(
            "built sandwich instance: {} vertices, {} required edges, {} forbidden edges",
            vertices.len(),
            required.len(),
            forbidden.len()
        );

        Instance::try_new(vertices, required, forbidden).map_err(Error::Instance)
    }
}
