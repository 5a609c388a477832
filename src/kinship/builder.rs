//! A builder for a [`Kinship`].

use std::collections::HashMap;

use crate::kinship::Kinship;
use crate::record;
use crate::record::PersonRecord;

/// An error related to building a [`Kinship`]: a malformed person record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The person id is empty or an unknown-parent value.
    MissingId(PersonRecord),

    /// The person is listed as its own mother or father.
    OwnParent(PersonRecord),

    /// The same person is listed as both mother and father.
    IdenticalParents(PersonRecord),

    /// The person was already given different parents by an earlier record.
    ConflictingParents(PersonRecord),
}

impl Error {
    /// Gets the offending record.
    pub fn record(&self) -> &PersonRecord {
        match self {
            Error::MissingId(record)
            | Error::OwnParent(record)
            | Error::IdenticalParents(record)
            | Error::ConflictingParents(record) => record,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingId(record) => write!(f, "missing person id: record: {record}"),
            Error::OwnParent(record) => {
                write!(f, "person is listed as its own parent: record: {record}")
            }
            Error::IdenticalParents(record) => {
                write!(f, "mother and father are the same person: record: {record}")
            }
            Error::ConflictingParents(record) => write!(
                f,
                "person was already given different parents: record: {record}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// What to do when a malformed record is encountered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MalformedPolicy {
    /// Fail the whole batch on the first malformed record.
    #[default]
    Reject,

    /// Drop the malformed record, log a warning, and keep going.
    Skip,
}

/// A builder for a [`Kinship`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    /// The malformed record policy.
    policy: MalformedPolicy,
}

impl Builder {
    /// Sets the malformed record policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::kinship::Builder;
    /// use genogram::kinship::MalformedPolicy;
    /// use genogram::record::PersonRecord;
    ///
    /// let records = vec![
    ///     PersonRecord::new("kid", "mom", "dad"),
    ///     PersonRecord::new("odd", "odd", "0"),
    /// ];
    ///
    /// let kinship = Builder::default()
    ///     .policy(MalformedPolicy::Skip)
    ///     .try_build_from(&records)?;
    ///
    /// assert_eq!(kinship.len(), 3);
    /// assert_eq!(kinship.skipped().len(), 1);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds a [`Kinship`] from person records.
    ///
    /// Individuals are created for every person, mother and father mentioned,
    /// memoized by person id. A record with at least one known parent adds
    /// the person to the sibship of that couple, where an unknown partner is
    /// left out of the couple. Records for the same person are merged: a
    /// later record may fill in a parent left unknown by an earlier one, and
    /// repeated records are idempotent.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::kinship::Builder;
    /// use genogram::record::PersonRecord;
    ///
    /// let records = vec![
    ///     PersonRecord::new("c1", "mom", "dad"),
    ///     PersonRecord::new("c2", "mom", "dad"),
    /// ];
    ///
    /// let kinship = Builder::default().try_build_from(&records)?;
    ///
    /// assert_eq!(kinship.len(), 4);
    /// assert_eq!(kinship.mating_units().len(), 1);
    /// assert_eq!(kinship.sibship_units()[0].children().len(), 2);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build_from<'a, I>(&self, records: I) -> Result<Kinship>
    where
        I: IntoIterator<Item = &'a PersonRecord>,
    {
        let mut kinship = Kinship::default();
        let mut parents = HashMap::new();
        let mut accepted = Vec::new();

        for record in records {
            match resolve(&parents, record) {
                Ok(resolved) => {
                    if let Some(resolved) = resolved {
                        parents.insert(record.id(), resolved);
                    }

                    accepted.push(record);
                }
                Err(err) => match self.policy {
                    MalformedPolicy::Reject => return Err(err),
                    MalformedPolicy::Skip => {
                        tracing::warn!("skipping malformed record: {err}");
                        kinship.skipped.push(err);
                    }
                },
            }
        }

        for record in accepted {
            let child = kinship.individual_or_insert(record.id());

            let Some((mother, father)) = parents.get(record.id()).copied() else {
                continue;
            };

            let mother = mother.map(|m| kinship.individual_or_insert(m));
            let father = father.map(|f| kinship.individual_or_insert(f));
            kinship.add_child(mother, father, child);
        }

        Ok(kinship)
    }
}

/// The (mother, father) ids of a person, either of which may be unknown.
type Parents<'a> = (Option<&'a str>, Option<&'a str>);

/// Checks a record against the parents resolved so far and returns the
/// merged parents of the person, or [`None`] if neither is known.
fn resolve<'a>(
    resolved: &HashMap<&'a str, Parents<'a>>,
    record: &'a PersonRecord,
) -> Result<Option<Parents<'a>>> {
    let id = record.id();

    if record::is_unknown(id) {
        return Err(Error::MissingId(record.clone()));
    }

    if record.mother() == Some(id) || record.father() == Some(id) {
        return Err(Error::OwnParent(record.clone()));
    }

    let (mut mother, mut father) = resolved.get(id).copied().unwrap_or_default();

    for (slot, parent) in [(&mut mother, record.mother()), (&mut father, record.father())] {
        match (*slot, parent) {
            (Some(known), Some(parent)) if known != parent => {
                return Err(Error::ConflictingParents(record.clone()));
            }
            (None, Some(parent)) => *slot = Some(parent),
            _ => {}
        }
    }

    if mother.is_some() && mother == father {
        return Err(Error::IdenticalParents(record.clone()));
    }

    Ok(match (mother, father) {
        (None, None) => None,
        parents => Some(parents),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(triples: &[(&str, &str, &str)]) -> Vec<PersonRecord> {
        triples
            .iter()
            .map(|(id, mother, father)| PersonRecord::new(*id, mother, father))
            .collect()
    }

    #[test]
    fn test_nuclear_family() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let kinship =
            Builder::default().try_build_from(&records(&[("c1", "m", "f"), ("c2", "m", "f")]))?;

        let names = kinship
            .individuals()
            .iter()
            .map(|i| i.name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["c1", "m", "f", "c2"]);

        let m = kinship.find("m").unwrap();
        let f = kinship.find("f").unwrap();
        let unit = kinship.find_mating_unit(Some(m), Some(f)).unwrap();
        let sibship = kinship.sibship_unit(kinship.mating_unit(unit).sibship());

        let children = sibship
            .children()
            .iter()
            .map(|c| kinship.individual(*c).name())
            .collect::<Vec<_>>();
        assert_eq!(children, vec!["c1", "c2"]);

        assert!(kinship.individual(m).parents().is_none());
        let parents = kinship.individual(kinship.find("c1").unwrap()).parents().unwrap();
        assert_eq!(parents.father(), Some(f));

        Ok(())
    }

    #[test]
    fn test_duplicate_records_are_idempotent() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let once = Builder::default().try_build_from(&records(&[("c1", "m", "f")]))?;
        let twice =
            Builder::default().try_build_from(&records(&[("c1", "m", "f"), ("c1", "m", "f")]))?;

        assert_eq!(once.individuals(), twice.individuals());
        assert_eq!(once.mating_units(), twice.mating_units());
        assert_eq!(once.sibship_units(), twice.sibship_units());

        Ok(())
    }

    #[test]
    fn test_single_known_parent_forms_a_couple_alone(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let kinship =
            Builder::default().try_build_from(&records(&[("c1", "m", "0"), ("c2", "m", "NA")]))?;

        assert_eq!(kinship.len(), 3);
        assert!(kinship.find("0").is_none());
        assert!(kinship.find("NA").is_none());

        let m = kinship.find("m").unwrap();
        let unit = kinship.find_mating_unit(Some(m), None).unwrap();
        assert_eq!(kinship.mating_units().len(), 1);
        assert_eq!(kinship.sibship_unit(kinship.mating_unit(unit).sibship()).children().len(), 2);

        let parents = kinship.individual(kinship.find("c1").unwrap()).parents().unwrap();
        assert_eq!(parents.mother(), Some(m));
        assert_eq!(parents.father(), None);

        Ok(())
    }

    #[test]
    fn test_later_records_fill_in_unknown_parents(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let kinship =
            Builder::default().try_build_from(&records(&[("c1", "m", "0"), ("c1", "0", "f")]))?;

        let m = kinship.find("m").unwrap();
        let f = kinship.find("f").unwrap();

        assert_eq!(kinship.mating_units().len(), 1);
        assert!(kinship.find_mating_unit(Some(m), Some(f)).is_some());
        assert!(kinship.find_mating_unit(Some(m), None).is_none());

        let parents = kinship.individual(kinship.find("c1").unwrap()).parents().unwrap();
        assert_eq!(parents.known().collect::<Vec<_>>(), vec![m, f]);

        Ok(())
    }

    #[test]
    fn test_founder_record_after_child_record_keeps_parents(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let kinship =
            Builder::default().try_build_from(&records(&[("c1", "m", "f"), ("c1", "0", "0")]))?;

        assert!(kinship.individual(kinship.find("c1").unwrap()).parents().is_some());

        Ok(())
    }

    #[test]
    fn test_own_parent_is_rejected() {
        let err = Builder::default()
            .try_build_from(&records(&[("c1", "c1", "f")]))
            .unwrap_err();

        assert!(matches!(err, Error::OwnParent(_)));
        assert_eq!(
            err.to_string(),
            "person is listed as its own parent: record: c1\tc1\tf"
        );
    }

    #[test]
    fn test_identical_parents_are_rejected() {
        let err = Builder::default()
            .try_build_from(&records(&[("c1", "p", "p")]))
            .unwrap_err();

        assert!(matches!(err, Error::IdenticalParents(_)));
    }

    #[test]
    fn test_identical_parents_across_records_are_rejected() {
        let err = Builder::default()
            .try_build_from(&records(&[("c1", "p", "0"), ("c1", "0", "p")]))
            .unwrap_err();

        assert!(matches!(err, Error::IdenticalParents(_)));
    }

    #[test]
    fn test_missing_id_is_rejected() {
        for id in ["0", "", " NA ", "na"] {
            let err = Builder::default()
                .try_build_from(&records(&[(id, "m", "f")]))
                .unwrap_err();

            assert!(matches!(err, Error::MissingId(_)));
        }
    }

    #[test]
    fn test_ids_are_matched_after_trimming() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let kinship =
            Builder::default().try_build_from(&records(&[(" m ", "gm", "gf"), ("c1", "m", "f")]))?;

        assert_eq!(kinship.len(), 5);
        assert!(kinship.find("m").is_some());
        assert!(kinship.find(" m ").is_none());

        Ok(())
    }

    #[test]
    fn test_conflicting_parents_are_rejected() {
        let err = Builder::default()
            .try_build_from(&records(&[("c1", "m", "f"), ("c1", "m", "g")]))
            .unwrap_err();

        assert!(matches!(err, Error::ConflictingParents(_)));
        assert_eq!(err.record().father(), Some("g"));
    }

    #[test]
    fn test_skip_policy_keeps_going() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let kinship = Builder::default()
            .policy(MalformedPolicy::Skip)
            .try_build_from(&records(&[
                ("c1", "m", "f"),
                ("c1", "m", "g"),
                ("c2", "m", "f"),
            ]))?;

        assert!(kinship.find("g").is_none());
        assert_eq!(kinship.skipped().len(), 1);
        assert_eq!(kinship.sibship_units()[0].children().len(), 2);

        Ok(())
    }
}
