/// nsearch-rs - Structured hit tables from the nsearch search engine
///
/// Runs a search and prints the hit table, or converts an existing engine
/// report without running anything.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nsearch_rs::{
    encode, report_to_table, Alphabet, SearchConfig, SearchInput, SearchOutput, Searcher, Strand,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Only log warnings and errors
    #[clap(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    /// Log engine command lines and scratch paths
    #[clap(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search query sequences against a database
    Search {
        /// Query FASTA file
        #[clap(long = "query")]
        query: PathBuf,

        /// Database FASTA file
        #[clap(long = "database")]
        database: PathBuf,

        /// Maximum accepted hits per query
        #[clap(long = "max-accepts", default_value = "1")]
        max_accepts: usize,

        /// Maximum rejected candidates per query
        #[clap(long = "max-rejects", default_value = "16")]
        max_rejects: usize,

        /// Minimum identity fraction (0.0-1.0)
        #[clap(long = "min-identity", default_value = "0.75")]
        min_identity: f64,

        /// Alphabet: nucleotide or protein
        #[clap(long = "alphabet", default_value = "nucleotide", value_parser = parse_alphabet)]
        alphabet: Alphabet,

        /// Strand for nucleotide searches: plus, minus or both
        #[clap(long = "strand", default_value = "both", value_parser = parse_strand)]
        strand: Strand,

        /// Keep the table on disk in this directory and print its path
        #[clap(short = 'o', long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Directory for scratch files
        #[clap(long = "temp-dir")]
        temp_dir: Option<PathBuf>,

        /// Keep the raw engine report
        #[clap(short = 'k', long = "keep-intermediates")]
        keep_intermediates: bool,
    },

    /// Convert an existing engine report into a result table
    Convert {
        /// Engine report
        report: PathBuf,

        /// Output table (CSV)
        table: PathBuf,
    },

    /// Print the extended CIGAR of two aligned strings
    Cigar {
        /// Aligned query, '-' for gaps
        query: String,

        /// Aligned target, same length as the query
        target: String,
    },
}

fn parse_alphabet(s: &str) -> Result<Alphabet, String> {
    s.parse().map_err(|e: nsearch_rs::NsearchError| e.to_string())
}

fn parse_strand(s: &str) -> Result<Strand, String> {
    s.parse().map_err(|e: nsearch_rs::NsearchError| e.to_string())
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    match args.command {
        Command::Search {
            query,
            database,
            max_accepts,
            max_rejects,
            min_identity,
            alphabet,
            strand,
            output_dir,
            temp_dir,
            keep_intermediates,
        } => {
            let mut builder = SearchConfig::builder()
                .max_accepts(max_accepts)
                .max_rejects(max_rejects)
                .min_identity(min_identity)
                .alphabet(alphabet)
                .strand(strand)
                .keep_intermediates(keep_intermediates)
                .output_to_file(output_dir.is_some());
            if let Some(dir) = output_dir {
                builder = builder.output_dir(dir);
            }
            if let Some(dir) = temp_dir {
                builder = builder.temp_dir(dir);
            }

            let searcher = Searcher::new(builder.build()).context("Failed to locate nsearch")?;
            let output = searcher
                .search(&SearchInput::Path(query), &SearchInput::Path(database))
                .context("Search failed")?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match output {
                SearchOutput::File(path) => writeln!(out, "{}", path.display())?,
                SearchOutput::Table(table) => table.write_to(&mut out)?,
            }
        }
        Command::Convert { report, table } => {
            let rows = report_to_table(&report, &table)
                .with_context(|| format!("Failed to convert {}", report.display()))?;
            log::info!("Wrote {rows} rows to {}", table.display());
        }
        Command::Cigar { query, target } => {
            println!("{}", encode(&query, &target)?);
        }
    }

    Ok(())
}
