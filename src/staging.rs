//! Staging of query/database inputs and scratch files.
//!
//! Every file created here is a [`TempPath`], so it is removed when dropped
//! on any exit path, including errors. Caller-supplied paths are borrowed and
//! never deleted.

use crate::error::{NsearchError, Result};
use crate::fasta::{write_fasta, SequenceCollection};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// A query or database as supplied by the caller.
#[derive(Debug, Clone)]
pub enum SearchInput {
    /// An existing sequence file
    Path(PathBuf),
    /// In-memory sequences, staged to a scratch file before the search
    Sequences(SequenceCollection),
}

impl From<PathBuf> for SearchInput {
    fn from(path: PathBuf) -> Self {
        SearchInput::Path(path)
    }
}

impl From<&Path> for SearchInput {
    fn from(path: &Path) -> Self {
        SearchInput::Path(path.to_path_buf())
    }
}

impl From<&str> for SearchInput {
    fn from(path: &str) -> Self {
        SearchInput::Path(PathBuf::from(path))
    }
}

impl From<SequenceCollection> for SearchInput {
    fn from(sequences: SequenceCollection) -> Self {
        SearchInput::Sequences(sequences)
    }
}

/// An input resolved to a concrete file.
#[derive(Debug)]
pub enum StagedInput {
    /// Caller's file; left untouched
    Borrowed(PathBuf),
    /// Scratch file written from in-memory sequences; deleted on drop
    Owned(TempPath),
}

impl StagedInput {
    pub fn path(&self) -> &Path {
        match self {
            StagedInput::Borrowed(path) => path,
            StagedInput::Owned(temp) => temp,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, StagedInput::Owned(_))
    }

    /// Removes an owned scratch file now; borrowed paths are left alone.
    pub fn release(self) {
        if let StagedInput::Owned(temp) = self {
            release(temp);
        }
    }
}

/// Removes a scratch file, logging a warning if it cannot be removed.
pub fn release(temp: TempPath) {
    let path = temp.to_path_buf();
    if let Err(e) = temp.close() {
        log::warn!("Failed to remove scratch file {}: {e}", path.display());
    }
}

/// Provider of uniquely named scratch files in one directory.
#[derive(Debug, Clone)]
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    /// Scratch space in `dir`, or the system temp directory.
    pub fn new(dir: Option<&Path>) -> Self {
        Scratch {
            dir: dir.map_or_else(std::env::temp_dir, Path::to_path_buf),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates an empty, uniquely named file and returns its guard.
    pub fn file(&self, prefix: &str, suffix: &str) -> Result<TempPath> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        Ok(file.into_temp_path())
    }

    /// Resolves an input to a file the engine can read.
    ///
    /// `role` ("query" or "database") names the scratch file and error messages.
    pub fn stage(&self, input: &SearchInput, role: &str, wrap: usize) -> Result<StagedInput> {
        match input {
            SearchInput::Path(path) => {
                if !path.exists() {
                    return Err(NsearchError::InputNotFound(path.clone()));
                }
                if !path.is_file() {
                    return Err(NsearchError::InvalidInput(format!(
                        "{role} {} is not a regular file",
                        path.display()
                    )));
                }
                log::debug!("Using {role} file {}", path.display());
                Ok(StagedInput::Borrowed(path.clone()))
            }
            SearchInput::Sequences(sequences) => {
                if sequences.is_empty() {
                    return Err(NsearchError::InvalidInput(format!(
                        "{role} sequence collection is empty"
                    )));
                }
                let temp = self.file(&format!("{role}_"), ".fasta")?;
                write_fasta(&temp, sequences, wrap)?;
                log::debug!(
                    "Staged {} {role} sequences to {}",
                    sequences.len(),
                    temp.display()
                );
                Ok(StagedInput::Owned(temp))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::read_fasta;
    use tempfile::tempdir;

    #[test]
    fn test_borrowed_path_survives_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q.fasta");
        std::fs::write(&path, ">q\nACGT\n").unwrap();

        let scratch = Scratch::new(Some(dir.path()));
        let staged = scratch.stage(&SearchInput::from(path.as_path()), "query", 0).unwrap();
        assert!(!staged.is_owned());
        assert_eq!(staged.path(), path.as_path());
        drop(staged);
        assert!(path.exists());
    }

    #[test]
    fn test_owned_file_removed_on_drop() {
        let dir = tempdir().unwrap();
        let scratch = Scratch::new(Some(dir.path()));
        let mut seqs = SequenceCollection::new();
        seqs.insert("q1".to_string(), "ACGTACGT".to_string());

        let staged = scratch.stage(&SearchInput::from(seqs.clone()), "query", 0).unwrap();
        assert!(staged.is_owned());
        let path = staged.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("query_"));
        assert_eq!(read_fasta(&path).unwrap(), seqs);

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_path() {
        let scratch = Scratch::new(None);
        assert!(matches!(
            scratch.stage(&SearchInput::from("does/not/exist.fa"), "query", 0),
            Err(NsearchError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_directory_and_empty_collection_rejected() {
        let dir = tempdir().unwrap();
        let scratch = Scratch::new(Some(dir.path()));
        assert!(matches!(
            scratch.stage(&SearchInput::from(dir.path()), "database", 0),
            Err(NsearchError::InvalidInput(_))
        ));
        assert!(matches!(
            scratch.stage(&SearchInput::Sequences(SequenceCollection::new()), "database", 0),
            Err(NsearchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_release_removes_owned_only() {
        let dir = tempdir().unwrap();
        let scratch = Scratch::new(Some(dir.path()));
        let borrowed = dir.path().join("db.fasta");
        std::fs::write(&borrowed, ">d\nACGT\n").unwrap();

        let mut seqs = SequenceCollection::new();
        seqs.insert("q1".to_string(), "ACGT".to_string());
        let owned = scratch.stage(&SearchInput::from(seqs), "query", 0).unwrap();
        let owned_path = owned.path().to_path_buf();

        owned.release();
        scratch
            .stage(&SearchInput::from(borrowed.as_path()), "database", 0)
            .unwrap()
            .release();
        assert!(!owned_path.exists());
        assert!(borrowed.exists());
    }

    #[test]
    fn test_release_of_vanished_file_does_not_panic() {
        let dir = tempdir().unwrap();
        let temp = Scratch::new(Some(dir.path())).file("output_", ".txt").unwrap();
        std::fs::remove_file(&temp).unwrap();
        release(temp);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_names_unique() {
        let dir = tempdir().unwrap();
        let scratch = Scratch::new(Some(dir.path()));
        let a = scratch.file("output_", ".txt").unwrap();
        let b = scratch.file("output_", ".txt").unwrap();
        assert_ne!(a.to_path_buf(), b.to_path_buf());
    }
}
