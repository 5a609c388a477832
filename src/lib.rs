//! `genogram` is a crate for deciding whether a family pedigree can be drawn as
//! a crossing-free genogram.
//!
//! The crate provides two main points of entry:
//!
//! - Parsing and reading pedigree files directly.
//! - Providing an analyzer that decides, for the person records of a family,
//!   whether the family can be drawn.
//!
//! ## Parsing and reading pedigree files
//!
//! A pedigree file holds one person per line: a family id, a person id, the
//! mother's id and the father's id, separated by tabs or spaces (any further
//! columns are ignored). Unknown parents are written as `0`. The [`Reader`]
//! facility reads the raw [`Line`]s of such a file, and
//! [`Reader::families()`](crate::Reader::families()) groups consecutive lines
//! into [families](crate::reader::Family), each holding the
//! [person records](crate::record::PersonRecord) of one family.
//!
//! ```
//! use genogram::Reader;
//!
//! let data = b"# family\tid\tmother\tfather\n\
//!              fam1\tkid\tmom\tdad\n\
//!              fam2\tsolo\t0\t0\n";
//! let mut reader = Reader::new(&data[..]);
//!
//! for result in reader.families() {
//!     let family = result?;
//!     println!("{}: {} records", family.id(), family.records().len());
//! }
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Drawability
//!
//! Deciding whether a family can be drawn goes through a handful of stages,
//! each of which is exposed on its own:
//!
//! 1. the person records are assembled into a [`kinship::Kinship`] graph of
//!    individuals, mating units (couples) and sibship units (their children)
//!    by a [`kinship::Builder`];
//! 2. every individual is given a generation by [`kinship::Generations`];
//! 3. the graph and its generations become a [`sandwich::Instance`]: a set of
//!    edges that must be drawn and a set of edges that must not be drawn;
//! 4. a [`sandwich::Solver`] searches for an interval layout lying between the
//!    two edge sets.
//!
//! Most users will want the [`drawability::Analyzer`], which runs every stage
//! and returns a [`drawability::Verdict`]. A family that cannot be drawn is
//! not an error. The solver runs under a budget (see
//! [`sandwich::solver::Config`]) and reports when that budget runs out rather
//! than searching forever.
//!
//! ```
//! use genogram::drawability::Analyzer;
//! use genogram::drawability::Verdict;
//! use genogram::record::PersonRecord;
//!
//! let records = vec![
//!     PersonRecord::new("kid", "mom", "dad"),
//!     PersonRecord::new("mom", "grandma", "grandpa"),
//! ];
//!
//! let analysis = Analyzer::default().analyze(&records)?;
//!
//! match analysis.verdict() {
//!     Verdict::Drawable(layout) => println!("drawable: {:?}", layout.order()),
//!     Verdict::NotDrawable => println!("not drawable"),
//!     Verdict::Aborted(reason) => println!("gave up: {reason}"),
//! }
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod drawability;
pub mod graph;
pub mod kinship;
pub mod line;
pub mod reader;
pub mod record;
pub mod sandwich;

pub use line::Line;

pub use self::reader::Reader;
