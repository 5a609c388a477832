//! Generation ranks for the individuals of a [`Kinship`].
//!
//! Ranks are propagated from a single root individual: partners share a
//! rank, children sit one rank below their parents and parents one rank
//! above their children. A rank, once assigned, is never revisited, which
//! keeps the propagation finite when marriage loops lead back to an
//! individual along a different path.
//!
//! Propagated ranks are relative to the root. Once propagation completes,
//! they are normalized into generations: the earliest generation is `0` and
//! generations increase downward. Individuals that cannot be reached from the
//! root have no generation at all.

use fixedbitset::FixedBitSet;

use crate::kinship::IndividualId;
use crate::kinship::Kinship;
use crate::kinship::MatingUnitId;
use crate::kinship::SibshipUnitId;

/// A disagreement between the assigned generations and the kinship graph.
///
/// These arise when the same individuals are reached along paths implying
/// different generations (for example, a person partnering with someone a
/// generation above).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Inconsistency {
    /// The two parents of a mating unit sit in different generations.
    UnequalPartners(MatingUnitId),

    /// A child does not sit exactly one generation below its parents.
    MisplacedChild(SibshipUnitId, IndividualId),
}

/// The generation of every individual in a [`Kinship`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Generations {
    /// The propagated rank relative to the root, per individual.
    raw: Vec<Option<i64>>,

    /// The normalized generation, per individual.
    normalized: Vec<Option<usize>>,
}

impl Generations {
    /// Ranks `kinship` from its default root (see [`Generations::default_root`]).
    ///
    /// An empty kinship yields empty generations.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::kinship::Builder;
    /// use genogram::kinship::Generations;
    /// use genogram::record::PersonRecord;
    ///
    /// let records = vec![PersonRecord::new("kid", "mom", "dad")];
    /// let kinship = Builder::default().try_build_from(&records)?;
    /// let generations = Generations::rank(&kinship);
    ///
    /// assert_eq!(generations.get(kinship.find("mom").unwrap()), Some(0));
    /// assert_eq!(generations.get(kinship.find("dad").unwrap()), Some(0));
    /// assert_eq!(generations.get(kinship.find("kid").unwrap()), Some(1));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn rank(kinship: &Kinship) -> Self {
        match Self::default_root(kinship) {
            Some(root) => Self::rank_from(kinship, root),
            None => Self::default(),
        }
    }

    /// Gets the default root: the first individual, in discovery order, with
    /// no known parents.
    ///
    /// Falls back to the first individual, and returns [`None`] only for an
    /// empty kinship.
    pub fn default_root(kinship: &Kinship) -> Option<IndividualId> {
        kinship
            .individual_ids()
            .find(|id| kinship.individual(*id).parents().is_none())
            .or_else(|| kinship.individual_ids().next())
    }

    /// Ranks `kinship` starting from `root`.
    pub fn rank_from(kinship: &Kinship, root: IndividualId) -> Self {
        let mut raw = vec![None; kinship.len()];
        let mut visited = FixedBitSet::with_capacity(kinship.mating_units().len());

        let mut stack = vec![(root, 0i64)];
        let mut next = Vec::new();

        while let Some((id, rank)) = stack.pop() {
            if raw[id.index()].is_some() {
                continue;
            }

            raw[id.index()] = Some(rank);

            let individual = kinship.individual(id);
            next.clear();

            for unit_id in individual.mating_units() {
                let unit = kinship.mating_unit(*unit_id);

                if let Some(partner) = unit.partner_of(id) {
                    next.push((partner, rank));
                }

                if !visited.contains(unit_id.index()) {
                    visited.insert(unit_id.index());

                    let sibship = kinship.sibship_unit(unit.sibship());
                    next.extend(sibship.children().iter().map(|child| (*child, rank - 1)));
                }
            }

            if let Some(parents) = individual.parents() {
                next.extend(parents.known().map(|parent| (parent, rank + 1)));
            }

            // Reversed so that the traversal visits relatives in the order
            // listed above.
            stack.extend(next.drain(..).rev());
        }

        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    /// Gets the normalized generation of an individual.
    ///
    /// [`None`] means the individual was not reachable from the root.
    pub fn get(&self, id: IndividualId) -> Option<usize> {
        self.normalized.get(id.index()).copied().flatten()
    }

    /// Gets the rank of an individual relative to the root, before
    /// normalization.
    pub fn raw(&self, id: IndividualId) -> Option<i64> {
        self.raw.get(id.index()).copied().flatten()
    }

    /// Gets the number of distinct generations.
    pub fn depth(&self) -> usize {
        self.normalized
            .iter()
            .flatten()
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Gets the individuals that were not reachable from the root.
    pub fn disconnected(&self) -> Vec<IndividualId> {
        self.normalized
            .iter()
            .enumerate()
            .filter(|(_, generation)| generation.is_none())
            .map(|(i, _)| IndividualId(i))
            .collect()
    }

    /// Returns whether every individual received a generation.
    pub fn is_connected(&self) -> bool {
        self.normalized.iter().all(Option::is_some)
    }

    /// Checks the generations against the structure of `kinship`.
    ///
    /// Partners should share a generation and children should sit exactly
    /// one generation below their parents. Unranked individuals are ignored.
    pub fn inconsistencies(&self, kinship: &Kinship) -> Vec<Inconsistency> {
        let mut result = Vec::new();

        for unit_id in kinship.mating_unit_ids() {
            let unit = kinship.mating_unit(unit_id);
            let mother = unit.mother().and_then(|id| self.get(id));
            let father = unit.father().and_then(|id| self.get(id));

            if let (Some(mother), Some(father)) = (mother, father) {
                if mother != father {
                    result.push(Inconsistency::UnequalPartners(unit_id));
                }
            }

            let Some(parent) = mother.or(father) else {
                continue;
            };

            for child in kinship.sibship_unit(unit.sibship()).children() {
                if let Some(generation) = self.get(*child) {
                    if generation != parent + 1 {
                        result.push(Inconsistency::MisplacedChild(unit.sibship(), *child));
                    }
                }
            }
        }

        result
    }
}

/// Shifts relative ranks so the earliest generation is `0` and generations
/// increase downward.
fn normalize(raw: &[Option<i64>]) -> Vec<Option<usize>> {
    let Some(top) = raw.iter().flatten().max().copied() else {
        return vec![None; raw.len()];
    };

    raw.iter()
        .map(|rank| rank.map(|rank| (top - rank) as usize))
        .collect()
}
