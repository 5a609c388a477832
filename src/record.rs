//! A person record.

use std::str::FromStr;

/// The value written in place of an unknown parent.
pub const UNKNOWN_PARENT: &str = "0";

/// The delimiter used when displaying a person record.
pub const RECORD_DELIMITER: char = '\t';

/// The number of expected fields in a person record.
pub const NUM_RECORD_FIELDS: usize = 3;

/// An error associated with parsing a person record.
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An incorrect number of fields in the record.
    IncorrectNumberOfFields(usize),

    /// The person id was empty or an unknown-parent value.
    MissingId,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(n) => write!(
                f,
                "invalid number of fields in person record: expected {NUM_RECORD_FIELDS} \
                 fields, found {n} fields"
            ),
            ParseError::MissingId => write!(f, "missing person id"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A single person within a family: the person's id and, when known, the ids
/// of the person's mother and father.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PersonRecord {
    /// The person id.
    id: String,

    /// The id of the mother, if known.
    mother: Option<String>,

    /// The id of the father, if known.
    father: Option<String>,
}

impl PersonRecord {
    /// Creates a new person record.
    ///
    /// Surrounding whitespace is trimmed from every id. Parent ids of `""`,
    /// `"0"`, or `"NA"` (in any case) denote an unknown parent.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::record::PersonRecord;
    ///
    /// let record = PersonRecord::new("child", "mom", "0");
    ///
    /// assert_eq!(record.id(), "child");
    /// assert_eq!(record.mother(), Some("mom"));
    /// assert_eq!(record.father(), None);
    /// ```
    pub fn new(id: impl Into<String>, mother: &str, father: &str) -> Self {
        let id = id.into();

        Self {
            id: id.trim().to_string(),
            mother: parse_parent(mother),
            father: parse_parent(father),
        }
    }

    /// Gets the person id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the mother id, if known.
    pub fn mother(&self) -> Option<&str> {
        self.mother.as_deref()
    }

    /// Gets the father id, if known.
    pub fn father(&self) -> Option<&str> {
        self.father.as_deref()
    }

    /// Returns whether both parents are known.
    pub fn has_both_parents(&self) -> bool {
        self.mother.is_some() && self.father.is_some()
    }

    /// Attempts to create a person record from its three textual fields.
    pub(crate) fn try_from_fields(id: &str, mother: &str, father: &str) -> Result<Self, ParseError> {
        if is_unknown(id) {
            return Err(ParseError::MissingId);
        }

        Ok(Self::new(id, mother, father))
    }
}

impl std::fmt::Display for PersonRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{RECORD_DELIMITER}{}{RECORD_DELIMITER}{}",
            self.id,
            self.mother.as_deref().unwrap_or(UNKNOWN_PARENT),
            self.father.as_deref().unwrap_or(UNKNOWN_PARENT)
        )
    }
}

impl FromStr for PersonRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split_whitespace().collect::<Vec<_>>();

        if parts.len() != NUM_RECORD_FIELDS {
            return Err(ParseError::IncorrectNumberOfFields(parts.len()));
        }

        Self::try_from_fields(parts[0], parts[1], parts[2])
    }
}

/// Returns whether `s` denotes an unknown person.
pub(crate) fn is_unknown(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed == UNKNOWN_PARENT || trimmed.eq_ignore_ascii_case("na")
}

/// Parses a parent id, returning [`None`] for an unknown parent.
fn parse_parent(s: &str) -> Option<String> {
    match is_unknown(s) {
        true => None,
        false => Some(s.trim().to_string()),
    }
}
