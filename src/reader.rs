//! A pedigree file reader.

use std::io::BufRead;
use std::io::{self};
use std::iter;

use crate::line;
use crate::Line;

pub mod families;

pub use families::Families;
pub use families::Family;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A line error.
    Line(line::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Line(err) => write!(f, "line error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A pedigree file reader.
#[derive(Clone, Debug)]
pub struct Reader<T>(T)
where
    T: BufRead;

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates a pedigree file reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"fam1\tkid\tmom\tdad\n";
    /// let reader = genogram::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Gets a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"fam1\tkid\tmom\tdad\r\n# done";
    /// let mut reader = genogram::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 18);
    /// assert_eq!(buffer, "fam1\tkid\tmom\tdad");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 6);
    /// assert_eq!(buffer, "# done");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        read_line(self.inner_mut(), buffer)
    }

    /// Attempts to read a [`Line`] from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::Line;
    ///
    /// let data = b"# pedigree\nfam1\tkid\tmom\tdad";
    /// let mut reader = genogram::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    /// assert!(matches!(reader.read_line(&mut buffer)?, Some(Line::Comment(_))));
    /// assert!(matches!(reader.read_line(&mut buffer)?, Some(Line::Entry(_))));
    /// assert!(matches!(reader.read_line(&mut buffer)?, None));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_line(&mut self, buffer: &mut String) -> Result<Option<Line>, Error> {
        let read = self.read_line_raw(buffer).map_err(Error::Io)?;

        match read {
            0 => Ok(None),
            _ => {
                let line = buffer.parse::<Line>().map_err(Error::Line)?;
                Ok(Some(line))
            }
        }
    }

    /// Returns an iterator over the `Line`s in the underlying reader.
    pub fn lines(&mut self) -> impl Iterator<Item = io::Result<Line>> + '_ {
        let mut buffer = String::new();

        iter::from_fn(move || {
            buffer.clear();

            match self.read_line_raw(&mut buffer) {
                Ok(0) => None,
                Ok(_) => Some(
                    buffer
                        .parse()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
                ),
                Err(e) => Some(Err(e)),
            }
        })
    }

    /// Returns an iterator over the families in the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"fam1 kid mom dad\nfam2 solo 0 0\n";
    /// let mut reader = genogram::Reader::new(&data[..]);
    ///
    /// let families = reader
    ///     .families()
    ///     .map(|result| result.unwrap())
    ///     .collect::<Vec<_>>();
    /// assert_eq!(families.len(), 2);
    /// assert_eq!(families[0].id(), "fam1");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn families(&mut self) -> Families<'_, T> {
        Families::new(self)
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self(inner)
    }
}

/// Reads a line from a buffered reader, dropping the line terminator.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}
