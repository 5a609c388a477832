//! A line within a pedigree file.
//!
//! Each non-empty, non-comment line describes one person of one family:
//!
//! ```text
//! # family  person  mother  father  [sex  status ...]
//! fam1      kid1    mom     dad     2    affected
//! ```
//!
//! Fields are separated by single tabs or by runs of spaces. Tab separation
//! allows empty parent fields, which (like `0` and `NA`) denote an unknown
//! parent. Columns past the fourth are ignored.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::record;
use crate::record::PersonRecord;

/// The prefix for a comment line.
pub const COMMENT_PREFIX: char = '#';

/// The minimum number of fields in an entry line.
pub const MIN_ENTRY_FIELDS: usize = 4;

/// Splits entry fields on single tabs or runs of spaces.
static DELIMITER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\t| +").unwrap());

/// An error associated with parsing a pedigree line.
#[derive(Debug)]
pub enum Error {
    /// An incorrect number of fields in an entry line.
    IncorrectNumberOfFields(usize, String),

    /// The family id was empty.
    MissingFamily(String),

    /// An invalid person record.
    InvalidRecord(record::ParseError, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IncorrectNumberOfFields(n, line) => write!(
                f,
                "invalid number of fields in entry: expected at least {MIN_ENTRY_FIELDS} fields, \
                 found {n} fields\n\nline: {line}"
            ),
            Error::MissingFamily(line) => write!(f, "missing family id\n\nline: {line}"),
            Error::InvalidRecord(err, line) => {
                write!(f, "invalid person record: {err}\n\nline: {line}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A person record together with the family it belongs to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// The family id.
    family: String,

    /// The person record.
    record: PersonRecord,
}

impl Entry {
    /// Gets the family id.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Gets the person record.
    pub fn record(&self) -> &PersonRecord {
        &self.record
    }

    /// Consumes `self` and returns the family id and person record.
    pub fn into_parts(self) -> (String, PersonRecord) {
        (self.family, self.record)
    }
}

/// A line within a pedigree file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// An empty line.
    Empty,

    /// A comment line (without the leading `#`).
    Comment(String),

    /// A person entry.
    Entry(Entry),
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::Empty => write!(f, ""),
            Line::Comment(comment) => write!(f, "{COMMENT_PREFIX}{comment}"),
            Line::Entry(entry) => write!(f, "{}\t{}", entry.family, entry.record),
        }
    }
}

impl FromStr for Line {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches(' ');

        if trimmed.is_empty() {
            return Ok(Line::Empty);
        }

        if let Some(comment) = trimmed.strip_prefix(COMMENT_PREFIX) {
            return Ok(Line::Comment(comment.to_string()));
        }

        let parts = DELIMITER.split(trimmed).collect::<Vec<_>>();
        if parts.len() < MIN_ENTRY_FIELDS {
            return Err(Error::IncorrectNumberOfFields(parts.len(), s.into()));
        }

        let family = parts[0].trim();
        if family.is_empty() {
            return Err(Error::MissingFamily(s.into()));
        }

        let record = PersonRecord::try_from_fields(parts[1], parts[2], parts[3])
            .map_err(|e| Error::InvalidRecord(e, s.into()))?;

        Ok(Line::Entry(Entry {
            family: family.to_string(),
            record,
        }))
    }
}
