//! # nsearch-rs: Structured results from the nsearch sequence search engine
//!
//! This library drives the nsearch engine (a BLAST-like nucleotide/protein
//! search tool) and turns its fixed-format text report into structured,
//! machine-usable hit tables.
//!
//! ## Overview
//!
//! nsearch-rs allows you to:
//! - Search query sequences against a database, given as FASTA files or
//!   in-memory sequence collections
//! - Get one typed record per hit, with coordinates, matched substrings,
//!   match/mismatch/gap counts and identity
//! - Get an extended CIGAR string ('=', 'X', 'D') for every hit
//! - Keep the result table on disk as delimited text, or load it into memory
//!
//! ## Example Usage
//!
//! ```no_run
//! # use anyhow::Result;
//! # fn main() -> Result<()> {
//! use nsearch_rs::{Alphabet, SearchConfig, SearchInput, Searcher};
//!
//! let config = SearchConfig::builder()
//!     .min_identity(0.8)
//!     .alphabet(Alphabet::Nucleotide)
//!     .build();
//! let searcher = Searcher::new(config)?;
//!
//! let output = searcher.search(
//!     &SearchInput::from("queries.fasta"),
//!     &SearchInput::from("database.fasta"),
//! )?;
//! if let Some(table) = output.into_table() {
//!     println!("{:?}", table.strings("Alignment"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `cigar`: run-length encoding of padded alignment strings
//! - `report`: streaming parser for the engine's 13-line report blocks
//! - `table`: persisted table writer and column-oriented loader
//! - `staging`: resolving inputs to files, scratch file lifecycle
//! - `engine`: the engine interface and its subprocess implementation
//! - `search`: the end-to-end pipeline
//!
//! ## Concurrency
//!
//! Every call blocks until the engine and all file I/O finish. Scratch files
//! are uniquely named, so independent searches may run side by side.

pub mod binary_finder;
pub mod cigar;
pub mod config;
pub mod engine;
pub mod error;
pub mod fasta;
pub mod report;
pub mod search;
pub mod staging;
pub mod table;

pub use cigar::{encode, EncodedAlignment};
pub use config::{Alphabet, SearchConfig, Strand};
pub use engine::{EngineParams, NsearchEngine, SearchEngine};
pub use error::NsearchError;
pub use fasta::{read_fasta, write_fasta, SequenceCollection};
pub use report::{report_to_table, HitRecord, ReportParser};
pub use search::{search, SearchOutput, Searcher};
pub use staging::SearchInput;
pub use table::{Column, ResultTable, COLUMNS};
