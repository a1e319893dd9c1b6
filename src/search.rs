//! Search orchestration.
//!
//! Stages the query and database, dispatches the engine, translates its
//! report into a result table and returns either the table or the path of
//! the persisted table file.

use crate::config::{Alphabet, SearchConfig};
use crate::engine::{EngineParams, NsearchEngine, SearchEngine};
use crate::error::Result;
use crate::report::report_to_table;
use crate::staging::{release, Scratch, SearchInput};
use crate::table::ResultTable;
use std::path::{Path, PathBuf};

/// Result of a search.
#[derive(Debug)]
pub enum SearchOutput {
    /// Hits loaded into memory; the persisted table has been removed
    Table(ResultTable),
    /// Path of the persisted table, left on disk for the caller
    File(PathBuf),
}

impl SearchOutput {
    pub fn into_table(self) -> Option<ResultTable> {
        match self {
            SearchOutput::Table(table) => Some(table),
            SearchOutput::File(_) => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            SearchOutput::File(path) => Some(path),
            SearchOutput::Table(_) => None,
        }
    }
}

/// Drives one engine through the stage → search → parse → load pipeline.
#[derive(Debug, Clone)]
pub struct Searcher<E = NsearchEngine> {
    engine: E,
    config: SearchConfig,
}

impl Searcher<NsearchEngine> {
    /// Searcher backed by the `nsearch` executable.
    pub fn new(config: SearchConfig) -> Result<Self> {
        Ok(Self::with_engine(NsearchEngine::new()?, config))
    }
}

impl<E: SearchEngine> Searcher<E> {
    pub fn with_engine(engine: E, config: SearchConfig) -> Self {
        Searcher { engine, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches `query` against `database`.
    ///
    /// Scratch files (staged inputs, the raw report, and the table when it
    /// is loaded into memory) are removed on every exit path. Caller-supplied
    /// input files are never touched.
    pub fn search(&self, query: &SearchInput, database: &SearchInput) -> Result<SearchOutput> {
        self.config.validate()?;
        let scratch = Scratch::new(self.config.temp_dir.as_deref());

        log::info!("Staging inputs in {}", scratch.dir().display());
        let query = scratch.stage(query, "query", self.config.fasta_wrap)?;
        let database = scratch.stage(database, "database", self.config.fasta_wrap)?;

        let report = scratch.file("output_", ".txt")?;
        let params = EngineParams::from(&self.config);

        log::info!(
            "Running {} search: {} vs {}",
            self.config.alphabet,
            query.path().display(),
            database.path().display()
        );
        match self.config.alphabet {
            Alphabet::Nucleotide => self.engine.dna_blast(
                query.path(),
                database.path(),
                &report,
                &params,
                self.config.strand,
            )?,
            Alphabet::Protein => {
                self.engine
                    .protein_blast(query.path(), database.path(), &report, &params)?
            }
        }
        query.release();
        database.release();

        let table_dir = if self.config.output_to_file {
            self.config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
        } else {
            scratch.dir().to_path_buf()
        };
        let table = Scratch::new(Some(table_dir.as_path())).file("output_", ".csv")?;
        let rows = report_to_table(&report, &table)?;
        log::info!("Parsed {rows} hits");

        if self.config.keep_intermediates {
            let kept = report.keep()?;
            log::info!("Keeping engine report {}", kept.display());
        } else {
            release(report);
        }

        if self.config.output_to_file {
            let path = table.keep()?;
            log::info!("Results written to {}", path.display());
            return Ok(SearchOutput::File(path));
        }

        let loaded = ResultTable::load(&table)?;
        release(table);
        Ok(SearchOutput::Table(loaded))
    }

    /// Searches two sequence files.
    pub fn search_files(&self, query: &Path, database: &Path) -> Result<SearchOutput> {
        self.search(&SearchInput::from(query), &SearchInput::from(database))
    }
}

/// One-shot search with the `nsearch` executable.
///
/// ```no_run
/// # fn main() -> nsearch_rs::error::Result<()> {
/// use nsearch_rs::{search, SearchConfig, SearchInput};
///
/// let output = search(
///     &SearchInput::from("queries.fasta"),
///     &SearchInput::from("database.fasta"),
///     SearchConfig::builder().min_identity(0.9).build(),
/// )?;
/// if let Some(table) = output.into_table() {
///     println!("{} hits", table.len());
/// }
/// # Ok(())
/// # }
/// ```
pub fn search(
    query: &SearchInput,
    database: &SearchInput,
    config: SearchConfig,
) -> Result<SearchOutput> {
    Searcher::new(config)?.search(query, database)
}
