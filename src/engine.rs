//! Adapter for the external search engine.
//!
//! The engine is an opaque collaborator: given query, database and output
//! paths it writes a fixed-format text report and returns nothing else.
//! [`NsearchEngine`] drives the `nsearch` executable as a subprocess;
//! anything implementing [`SearchEngine`] can stand in for it.

use crate::binary_finder::find_binary;
use crate::config::{SearchConfig, Strand};
use crate::error::{NsearchError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Search limits passed through to the engine unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    pub max_accepts: usize,
    pub max_rejects: usize,
    pub min_identity: f64,
}

impl From<&SearchConfig> for EngineParams {
    fn from(config: &SearchConfig) -> Self {
        EngineParams {
            max_accepts: config.max_accepts,
            max_rejects: config.max_rejects,
            min_identity: config.min_identity,
        }
    }
}

/// An alignment engine that writes its report to `output`.
pub trait SearchEngine {
    fn dna_blast(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
        params: &EngineParams,
        strand: Strand,
    ) -> Result<()>;

    fn protein_blast(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
        params: &EngineParams,
    ) -> Result<()>;
}

/// Runs the `nsearch` binary.
#[derive(Debug, Clone)]
pub struct NsearchEngine {
    binary: PathBuf,
}

impl NsearchEngine {
    /// Locates the `nsearch` executable.
    pub fn new() -> Result<Self> {
        Ok(Self::with_binary(find_binary("nsearch")?))
    }

    pub fn with_binary(binary: PathBuf) -> Self {
        NsearchEngine { binary }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn base_command(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
        params: &EngineParams,
    ) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("search")
            .arg(flag("query", query))
            .arg(flag("db", database))
            .arg(flag("out", output))
            .arg(flag("min-identity", params.min_identity.to_string()))
            .arg(flag("max-hits", params.max_accepts.to_string()))
            .arg(flag("max-rejects", params.max_rejects.to_string()));
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<()> {
        log::debug!("Executing: {cmd:?}");

        let output = cmd
            .output()
            .map_err(|e| NsearchError::EngineFailed(format!("failed to run {}: {e}", self.binary.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NsearchError::EngineFailed(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }
        Ok(())
    }
}

/// Formats `--name=value`; the engine's option parser expects the joined form.
fn flag(name: &str, value: impl AsRef<OsStr>) -> OsString {
    let mut arg = OsString::from(format!("--{name}="));
    arg.push(value);
    arg
}

impl SearchEngine for NsearchEngine {
    fn dna_blast(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
        params: &EngineParams,
        strand: Strand,
    ) -> Result<()> {
        let mut cmd = self.base_command(query, database, output, params);
        cmd.arg(flag("strand", strand.to_string()));
        self.run(cmd)
    }

    fn protein_blast(
        &self,
        query: &Path,
        database: &Path,
        output: &Path,
        params: &EngineParams,
    ) -> Result<()> {
        let mut cmd = self.base_command(query, database, output, params);
        cmd.arg("--protein");
        self.run(cmd)
    }
}
