//! The kinship graph of a family.
//!
//! A [`Kinship`] is an arena holding three kinds of nodes:
//!
//! - [`Individual`]s, one per person id,
//! - [`MatingUnit`]s, one per (mother, father) couple that has children,
//!   where one partner may be unknown, and
//! - [`SibshipUnit`]s, the children of exactly one mating unit.
//!
//! Nodes refer to one another through the handles [`IndividualId`],
//! [`MatingUnitId`] and [`SibshipUnitId`], which index into the arena. The
//! graph is built once by a [`Builder`] and is not mutated afterwards; the
//! generation of each individual is computed separately (see
//! [`Generations`]).

use std::collections::HashMap;

use nonempty::NonEmpty;

pub mod builder;
pub mod generation;

pub use builder::Builder;
pub use builder::MalformedPolicy;
pub use generation::Generations;

/// Declares an arena handle.
macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(usize);

        impl $name {
            /// Gets the arena index of the handle.
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// A handle to an [`Individual`] within a [`Kinship`].
    IndividualId
);

handle!(
    /// A handle to a [`MatingUnit`] within a [`Kinship`].
    MatingUnitId
);

handle!(
    /// A handle to a [`SibshipUnit`] within a [`Kinship`].
    ///
    /// Every mating unit owns exactly one sibship, so the two handles share
    /// the same index.
    SibshipUnitId
);

/// The parents of an individual.
///
/// This is a lookup relation only; the parents are owned by the arena. At
/// least one of the two parents is known.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ParentalUnit {
    /// The mother, if known.
    mother: Option<IndividualId>,

    /// The father, if known.
    father: Option<IndividualId>,
}

impl ParentalUnit {
    /// Gets the mother, if known.
    pub fn mother(&self) -> Option<IndividualId> {
        self.mother
    }

    /// Gets the father, if known.
    pub fn father(&self) -> Option<IndividualId> {
        self.father
    }

    /// Iterates over the known parents, mother first.
    pub fn known(&self) -> impl Iterator<Item = IndividualId> {
        self.mother.into_iter().chain(self.father)
    }
}

/// A person in the pedigree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Individual {
    /// The person id.
    name: String,

    /// The parents, if known.
    parents: Option<ParentalUnit>,

    /// The mating units in which this individual is a parent.
    mating_units: Vec<MatingUnitId>,
}

impl Individual {
    /// Gets the person id.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the parents, if known.
    pub fn parents(&self) -> Option<&ParentalUnit> {
        self.parents.as_ref()
    }

    /// Gets the mating units in which this individual is a parent.
    pub fn mating_units(&self) -> &[MatingUnitId] {
        &self.mating_units
    }
}

/// A couple with at least one child.
///
/// One of the two partners may be unknown, in which case the unit stands for
/// the known partner alone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatingUnit {
    /// The mother, if known.
    mother: Option<IndividualId>,

    /// The father, if known.
    father: Option<IndividualId>,

    /// The children of the couple.
    sibship: SibshipUnitId,
}

impl MatingUnit {
    /// Gets the mother, if known.
    pub fn mother(&self) -> Option<IndividualId> {
        self.mother
    }

    /// Gets the father, if known.
    pub fn father(&self) -> Option<IndividualId> {
        self.father
    }

    /// Iterates over the known partners, mother first.
    pub fn partners(&self) -> impl Iterator<Item = IndividualId> {
        self.mother.into_iter().chain(self.father)
    }

    /// Gets the sibship of the couple's children.
    pub fn sibship(&self) -> SibshipUnitId {
        self.sibship
    }

    /// Gets the partner of `individual` within this couple.
    ///
    /// [`None`] is returned if `individual` is not part of the couple or if
    /// the partner is unknown.
    pub fn partner_of(&self, individual: IndividualId) -> Option<IndividualId> {
        if self.mother == Some(individual) {
            self.father
        } else if self.father == Some(individual) {
            self.mother
        } else {
            None
        }
    }
}

/// The children of one mating unit, in the order they were first seen.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SibshipUnit {
    /// The mating unit owning this sibship.
    mating_unit: MatingUnitId,

    /// The children.
    children: NonEmpty<IndividualId>,
}

impl SibshipUnit {
    /// Gets the mating unit owning this sibship.
    pub fn mating_unit(&self) -> MatingUnitId {
        self.mating_unit
    }

    /// Gets the children.
    pub fn children(&self) -> &NonEmpty<IndividualId> {
        &self.children
    }
}

/// The kinship graph of a single family.
#[derive(Clone, Debug, Default)]
pub struct Kinship {
    /// The individuals, in discovery order.
    individuals: Vec<Individual>,

    /// The mating units, in discovery order.
    mating_units: Vec<MatingUnit>,

    /// The sibship units, parallel to `mating_units`.
    sibship_units: Vec<SibshipUnit>,

    /// Lookup from person id to individual.
    by_name: HashMap<String, IndividualId>,

    /// Lookup from (mother, father) to mating unit.
    by_parents: HashMap<(Option<IndividualId>, Option<IndividualId>), MatingUnitId>,

    /// Malformed records dropped while building.
    skipped: Vec<builder::Error>,
}

impl Kinship {
    /// Gets the individuals in discovery order.
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Gets the mating units in discovery order.
    pub fn mating_units(&self) -> &[MatingUnit] {
        &self.mating_units
    }

    /// Gets the sibship units, in the order of their mating units.
    pub fn sibship_units(&self) -> &[SibshipUnit] {
        &self.sibship_units
    }

    /// Iterates over the handles of all individuals.
    pub fn individual_ids(&self) -> impl Iterator<Item = IndividualId> + '_ {
        (0..self.individuals.len()).map(IndividualId)
    }

    /// Iterates over the handles of all mating units.
    pub fn mating_unit_ids(&self) -> impl Iterator<Item = MatingUnitId> + '_ {
        (0..self.mating_units.len()).map(MatingUnitId)
    }

    /// Iterates over the handles of all sibship units.
    pub fn sibship_unit_ids(&self) -> impl Iterator<Item = SibshipUnitId> + '_ {
        (0..self.sibship_units.len()).map(SibshipUnitId)
    }

    /// Gets an individual by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to a different [`Kinship`].
    pub fn individual(&self, id: IndividualId) -> &Individual {
        &self.individuals[id.0]
    }

    /// Gets a mating unit by handle.
    pub fn mating_unit(&self, id: MatingUnitId) -> &MatingUnit {
        &self.mating_units[id.0]
    }

    /// Gets a sibship unit by handle.
    pub fn sibship_unit(&self, id: SibshipUnitId) -> &SibshipUnit {
        &self.sibship_units[id.0]
    }

    /// Looks up an individual by person id.
    pub fn find(&self, name: &str) -> Option<IndividualId> {
        self.by_name.get(name).copied()
    }

    /// Looks up the mating unit of a (mother, father) couple.
    ///
    /// An unknown partner is passed as [`None`].
    pub fn find_mating_unit(
        &self,
        mother: Option<IndividualId>,
        father: Option<IndividualId>,
    ) -> Option<MatingUnitId> {
        self.by_parents.get(&(mother, father)).copied()
    }

    /// Gets the malformed records that were dropped while building.
    ///
    /// This is only ever non-empty under [`MalformedPolicy::Skip`].
    pub fn skipped(&self) -> &[builder::Error] {
        &self.skipped
    }

    /// Gets the number of individuals.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Returns whether the kinship contains no individuals.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    ////////////////////////////////////////////////////////////////////////////////////
    // Construction (used by the builder)
    ////////////////////////////////////////////////////////////////////////////////////

    /// Looks up or creates the individual with person id `name`.
    fn individual_or_insert(&mut self, name: &str) -> IndividualId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }

        let id = IndividualId(self.individuals.len());
        self.individuals.push(Individual {
            name: name.to_string(),
            parents: None,
            mating_units: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Adds `child` to the couple (`mother`, `father`), creating the mating
    /// unit and its sibship on first sight.
    ///
    /// At least one of `mother` and `father` must be known.
    fn add_child(
        &mut self,
        mother: Option<IndividualId>,
        father: Option<IndividualId>,
        child: IndividualId,
    ) {
        match self.by_parents.get(&(mother, father)) {
            Some(unit) => {
                let sibship = &mut self.sibship_units[unit.0];
                if !sibship.children.contains(&child) {
                    sibship.children.push(child);
                }
            }
            None => {
                let unit = MatingUnitId(self.mating_units.len());
                let sibship = SibshipUnitId(self.sibship_units.len());

                self.mating_units.push(MatingUnit {
                    mother,
                    father,
                    sibship,
                });
                self.sibship_units.push(SibshipUnit {
                    mating_unit: unit,
                    children: NonEmpty::new(child),
                });
                self.by_parents.insert((mother, father), unit);

                for parent in mother.into_iter().chain(father) {
                    self.individuals[parent.0].mating_units.push(unit);
                }
            }
        }

        self.individuals[child.0].parents = Some(ParentalUnit { mother, father });
    }
}
