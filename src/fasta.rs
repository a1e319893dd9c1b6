//! Minimal FASTA reading and writing for staged sequence collections.

use crate::error::{NsearchError, Result};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Sequences keyed by id, in file (or insertion) order.
pub type SequenceCollection = IndexMap<String, String>;

/// Reads a FASTA file into a [`SequenceCollection`].
///
/// The id is the full header line after `>`, trimmed. Sequence lines are
/// concatenated and blank lines skipped. A repeated id replaces the earlier
/// sequence.
pub fn read_fasta(path: &Path) -> Result<SequenceCollection> {
    if !path.is_file() {
        return Err(NsearchError::InputNotFound(path.to_path_buf()));
    }
    parse_fasta(BufReader::new(File::open(path)?))
}

/// Parses FASTA text from any reader.
pub fn parse_fasta<R: BufRead>(reader: R) -> Result<SequenceCollection> {
    let mut sequences = SequenceCollection::new();
    let mut current: Option<String> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            let id = header.trim().to_string();
            sequences.insert(id.clone(), String::new());
            current = Some(id);
        } else {
            let id = current.as_ref().ok_or_else(|| {
                NsearchError::InvalidInput(format!(
                    "sequence data before first header at line {}",
                    line_no + 1
                ))
            })?;
            if let Some(seq) = sequences.get_mut(id) {
                seq.push_str(line);
            }
        }
    }

    Ok(sequences)
}

/// Writes sequences as FASTA, wrapping sequence lines at `wrap` characters.
///
/// `wrap == 0` writes each sequence on a single line.
pub fn write_fasta(path: &Path, sequences: &SequenceCollection, wrap: usize) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    format_fasta(&mut out, sequences, wrap)?;
    out.flush()?;
    Ok(())
}

/// Formats sequences as FASTA into any writer.
pub fn format_fasta<W: Write>(out: &mut W, sequences: &SequenceCollection, wrap: usize) -> Result<()> {
    for (id, seq) in sequences {
        writeln!(out, ">{id}")?;
        if wrap == 0 || seq.is_empty() {
            writeln!(out, "{seq}")?;
            continue;
        }
        for chunk in seq.as_bytes().chunks(wrap) {
            out.write_all(chunk)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn collection(pairs: &[(&str, &str)]) -> SequenceCollection {
        pairs
            .iter()
            .map(|(id, seq)| (id.to_string(), seq.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_multiline_records() {
        let text = ">seq1 sample\nACGT\nACGT\n\n>seq2\nTTTT\n";
        let seqs = parse_fasta(Cursor::new(text)).unwrap();
        assert_eq!(seqs, collection(&[("seq1 sample", "ACGTACGT"), ("seq2", "TTTT")]));
        assert_eq!(seqs.keys().next().unwrap(), "seq1 sample");
    }

    #[test]
    fn test_sequence_before_header() {
        assert!(matches!(
            parse_fasta(Cursor::new("ACGT\n>seq\nA\n")),
            Err(NsearchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrapped_output() {
        let seqs = collection(&[("a", "ACGTACGTAC"), ("b", "GG")]);
        let mut buf = Vec::new();
        format_fasta(&mut buf, &seqs, 4).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ">a\nACGT\nACGT\nAC\n>b\nGG\n"
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seqs.fasta");
        let seqs = collection(&[("z", "ACGTTGCA"), ("a", "MKV")]);
        write_fasta(&path, &seqs, 3).unwrap();
        assert_eq!(read_fasta(&path).unwrap(), seqs);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_fasta(Path::new("no/such/file.fasta")),
            Err(NsearchError::InputNotFound(_))
        ));
    }
}
