//! Configuration options for nsearch searches.
//!
//! This module provides a builder pattern for configuring search parameters,
//! the alphabet/strand selectors understood by the engine, and where staged
//! and persisted files are placed.

use crate::error::{NsearchError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a search.
///
/// # Default Values
/// - `max_accepts`: 1
/// - `max_rejects`: 16
/// - `min_identity`: 0.75
/// - `alphabet`: nucleotide
/// - `strand`: both
/// - `output_to_file`: false
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of accepted hits per query
    pub max_accepts: usize,

    /// Maximum number of rejected candidates before giving up on a query
    pub max_rejects: usize,

    /// Minimum identity fraction (0.0-1.0) for a hit to be accepted
    pub min_identity: f64,

    /// Residue alphabet of query and database
    pub alphabet: Alphabet,

    /// Strand(s) to search; only meaningful for nucleotide searches
    pub strand: Strand,

    /// Leave the result table on disk and return its path
    pub output_to_file: bool,

    /// Directory receiving persisted result tables (current directory if unset)
    pub output_dir: Option<PathBuf>,

    /// Directory for staged inputs and engine reports (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,

    /// Keep the raw engine report for debugging
    pub keep_intermediates: bool,

    /// Line width used when staging in-memory sequences (0 = no wrapping)
    pub fasta_wrap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_accepts: 1,
            max_rejects: 16,
            min_identity: 0.75,
            alphabet: Alphabet::Nucleotide,
            strand: Strand::Both,
            output_to_file: false,
            output_dir: None,
            temp_dir: None,
            keep_intermediates: false,
            fasta_wrap: 0,
        }
    }
}

impl SearchConfig {
    /// Creates a new configuration builder.
    ///
    /// # Example
    /// ```
    /// use nsearch_rs::{Alphabet, SearchConfig};
    ///
    /// let config = SearchConfig::builder()
    ///     .min_identity(0.9)
    ///     .max_accepts(5)
    ///     .alphabet(Alphabet::Protein)
    ///     .build();
    /// assert_eq!(config.max_accepts, 5);
    /// ```
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Checks parameter ranges before anything touches the filesystem.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_identity) {
            return Err(NsearchError::InvalidConfig(format!(
                "min_identity must be between 0.0 and 1.0, got {}",
                self.min_identity
            )));
        }
        if self.max_accepts == 0 {
            return Err(NsearchError::InvalidConfig(
                "max_accepts must be at least 1".to_string(),
            ));
        }
        if self.alphabet == Alphabet::Protein && self.strand != Strand::Both {
            log::debug!("strand {} ignored for protein search", self.strand);
        }
        Ok(())
    }
}

/// Builder for constructing SearchConfig instances.
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Sets the maximum number of accepted hits per query.
    ///
    /// Default: 1
    pub fn max_accepts(mut self, n: usize) -> Self {
        self.config.max_accepts = n;
        self
    }

    /// Sets the maximum number of rejected candidates per query.
    ///
    /// Default: 16
    pub fn max_rejects(mut self, n: usize) -> Self {
        self.config.max_rejects = n;
        self
    }

    /// Sets the minimum identity fraction. Checked by [`SearchConfig::validate`].
    ///
    /// Default: 0.75
    pub fn min_identity(mut self, identity: f64) -> Self {
        self.config.min_identity = identity;
        self
    }

    pub fn alphabet(mut self, alphabet: Alphabet) -> Self {
        self.config.alphabet = alphabet;
        self
    }

    pub fn strand(mut self, strand: Strand) -> Self {
        self.config.strand = strand;
        self
    }

    /// Return the persisted table path instead of an in-memory table.
    ///
    /// Default: false
    pub fn output_to_file(mut self, enabled: bool) -> Self {
        self.config.output_to_file = enabled;
        self
    }

    /// Sets the directory that receives persisted result tables.
    ///
    /// Default: current directory
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.config.output_dir = Some(path);
        self
    }

    /// Sets the directory for staged inputs and engine reports.
    ///
    /// Default: System temp directory
    pub fn temp_dir(mut self, path: PathBuf) -> Self {
        self.config.temp_dir = Some(path);
        self
    }

    /// Keep the raw engine report for debugging.
    ///
    /// Default: false
    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.config.keep_intermediates = keep;
        self
    }

    pub fn fasta_wrap(mut self, width: usize) -> Self {
        self.config.fasta_wrap = width;
        self
    }

    /// Builds the final SearchConfig instance.
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Residue alphabet, selecting `dna_blast` or `protein_blast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Nucleotide,
    Protein,
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Nucleotide => write!(f, "nucleotide"),
            Alphabet::Protein => write!(f, "protein"),
        }
    }
}

impl FromStr for Alphabet {
    type Err = NsearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nucleotide" | "dna" => Ok(Alphabet::Nucleotide),
            "protein" => Ok(Alphabet::Protein),
            other => Err(NsearchError::InvalidConfig(format!(
                "unknown alphabet '{other}', expected nucleotide or protein"
            ))),
        }
    }
}

/// Strand(s) searched in a nucleotide search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
    Both,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "plus"),
            Strand::Minus => write!(f, "minus"),
            Strand::Both => write!(f, "both"),
        }
    }
}

impl FromStr for Strand {
    type Err = NsearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plus" => Ok(Strand::Plus),
            "minus" => Ok(Strand::Minus),
            "both" => Ok(Strand::Both),
            other => Err(NsearchError::InvalidConfig(format!(
                "unknown strand '{other}', expected plus, minus or both"
            ))),
        }
    }
}
