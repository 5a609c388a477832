//! An iterator over the families within a pedigree file.

use std::collections::HashSet;
use std::io::BufRead;

use nonempty::NonEmpty;

use crate::line::Entry;
use crate::reader;
use crate::record::PersonRecord;
use crate::Line;
use crate::Reader;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to [`Families`].
#[derive(Debug)]
pub enum Error {
    /// A family's entries were interrupted by another family and then
    /// resumed.
    FamilyNotContiguous(String, usize),

    /// There was an issue reading from the underlying reader.
    Reader(reader::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::FamilyNotContiguous(family, line_no) => write!(
                f,
                "entries for family {family} resume after another family: line {line_no}"
            ),
            Error::Reader(err) => write!(f, "reader error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Family
////////////////////////////////////////////////////////////////////////////////////////

/// The person records of one family, in file order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Family {
    /// The family id.
    id: String,

    /// The person records.
    records: NonEmpty<PersonRecord>,
}

impl Family {
    /// Gets the family id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the person records.
    pub fn records(&self) -> &NonEmpty<PersonRecord> {
        &self.records
    }

    /// Consumes `self` and returns the person records as a vector.
    pub fn into_records(self) -> Vec<PersonRecord> {
        self.records.into()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Families
////////////////////////////////////////////////////////////////////////////////////////

/// An iterator that groups consecutive entries sharing a family id.
#[derive(Debug)]
pub struct Families<'a, T>
where
    T: BufRead,
{
    /// The inner reader.
    reader: &'a mut Reader<T>,

    /// An entry that was read but belongs to the next family.
    pending: Option<Entry>,

    /// The families that have already been yielded.
    seen: HashSet<String>,

    /// A resumed family and its line number, reported once the family under
    /// construction has been yielded.
    interrupted: Option<(String, usize)>,

    /// The line number.
    line_no: usize,
}

impl<'a, T> Families<'a, T>
where
    T: BufRead,
{
    /// Creates a new [`Families`].
    pub(crate) fn new(reader: &'a mut Reader<T>) -> Self {
        Self {
            reader,
            pending: None,
            seen: HashSet::new(),
            interrupted: None,
            line_no: 0usize,
        }
    }

    /// Finishes the family under construction, if any.
    fn finish(&mut self, current: Option<Family>) -> Option<Result<Family>> {
        let family = current?;
        self.seen.insert(family.id.clone());
        Some(Ok(family))
    }
}

impl<T> Iterator for Families<'_, T>
where
    T: BufRead,
{
    type Item = Result<Family>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((family, line_no)) = self.interrupted.take() {
            return Some(Err(Error::FamilyNotContiguous(family, line_no)));
        }

        let mut current = self.pending.take().map(|entry| {
            let (id, record) = entry.into_parts();
            Family {
                id,
                records: NonEmpty::new(record),
            }
        });

        let mut buffer = String::new();

        loop {
            let line = match self.reader.read_line(&mut buffer) {
                Ok(line) => line,
                Err(err) => return Some(Err(Error::Reader(err))),
            };

            self.line_no += 1;

            let entry = match line {
                Some(Line::Entry(entry)) => entry,
                Some(Line::Empty) | Some(Line::Comment(_)) => continue,
                None => return self.finish(current),
            };

            if self.seen.contains(entry.family()) {
                let family = entry.family().to_string();

                if current.is_some() {
                    self.interrupted = Some((family, self.line_no));
                    return self.finish(current);
                }

                return Some(Err(Error::FamilyNotContiguous(family, self.line_no)));
            }

            match current.as_mut() {
                Some(family) if family.id == entry.family() => {
                    family.records.push(entry.into_parts().1);
                }
                Some(_) => {
                    self.pending = Some(entry);
                    return self.finish(current);
                }
                None => {
                    let (id, record) = entry.into_parts();
                    current = Some(Family {
                        id,
                        records: NonEmpty::new(record),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Reader;

    #[test]
    fn test_valid_families() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"# family person mother father\n\
                     fam1 mom 0 0\n\
                     fam1 dad 0 0\n\
                     fam1 kid mom dad\n\
                     \n\
                     fam2 solo 0 0\n";

        let mut reader = Reader::new(&data[..]);
        let families = reader.families().collect::<Result<Vec<_>, _>>()?;

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].id(), "fam1");
        assert_eq!(families[0].records().len(), 3);
        assert_eq!(families[1].id(), "fam2");
        assert_eq!(families[1].records().len(), 1);

        Ok(())
    }

    #[test]
    fn test_family_not_contiguous() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"fam1 mom 0 0\nfam2 solo 0 0\nfam1 kid mom 0\n";

        let mut reader = Reader::new(&data[..]);
        let mut families = reader.families();

        assert_eq!(families.next().unwrap()?.id(), "fam1");
        assert_eq!(families.next().unwrap()?.id(), "fam2");

        let err = families.next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "entries for family fam1 resume after another family: line 3"
        );

        Ok(())
    }

    #[test]
    fn test_family_resumed_right_after_another() -> Result<(), Box<dyn std::error::Error>> {
        let data = b"fam1 mom 0 0\n\
                     fam2 solo 0 0\n\
                     fam2 kid solo 0\n\
                     fam1 kid mom 0\n\
                     fam3 x 0 0\n";

        let mut reader = Reader::new(&data[..]);
        let mut families = reader.families();

        assert_eq!(families.next().unwrap()?.id(), "fam1");

        let fam2 = families.next().unwrap()?;
        assert_eq!(fam2.id(), "fam2");
        assert_eq!(fam2.records().len(), 2);

        let err = families.next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "entries for family fam1 resume after another family: line 4"
        );

        assert_eq!(families.next().unwrap()?.id(), "fam3");
        assert!(families.next().is_none());

        Ok(())
    }

    #[test]
    fn test_invalid_line_in_family() {
        let data = b"fam1 mom 0 0\nfam1 kid\n";

        let mut reader = Reader::new(&data[..]);
        let err = reader.families().next().unwrap().unwrap_err();

        assert_eq!(
            err.to_string(),
            "reader error: line error: invalid number of fields in entry: expected at least 4 \
             fields, found 2 fields\n\nline: fam1 kid"
        );
    }

    #[test]
    fn test_empty_input() {
        let data = b"\n# nothing here\n";

        let mut reader = Reader::new(&data[..]);
        assert!(reader.families().next().is_none());
    }
}
