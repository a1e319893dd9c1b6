//! Parser for the engine's fixed-period alignment report.
//!
//! The engine writes one 13-line block per hit. Only five block-relative
//! lines carry data:
//!
//! | offset | content                                              |
//! |--------|------------------------------------------------------|
//! | 4      | header; 3rd token is `>id`                           |
//! | 7      | query row: `Query <start> <strand> <seq> <end>`      |
//! | 9      | target row, same layout as the query row             |
//! | 11     | `<cols> cols, <ids> ids (<pct>%), <gaps> gaps`       |
//! | 12     | end of block                                         |
//!
//! This layout is a versioned wire format: any drift in the engine's output
//! must be handled here by a new [`BlockState`] table, not by heuristics.

use crate::cigar::{self, EncodedAlignment};
use crate::error::{NsearchError, Result};
use crate::table::TableWriter;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines};
use std::path::Path;

/// Number of lines in one report block.
pub const BLOCK_LINES: usize = 13;

/// One reported alignment between a query and a database sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub query_id: String,
    pub target_id: String,
    /// 1-based inclusive, as reported by the engine
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub query_seq: String,
    pub target_seq: String,
    pub num_columns: usize,
    pub num_matches: usize,
    /// Always `num_columns - num_matches`; the report's own value is not read
    pub num_mismatches: usize,
    pub num_gaps: usize,
    /// Fraction in [0, 1]
    pub identity: f64,
    pub alignment: EncodedAlignment,
}

/// Which data-bearing line of a block the parser is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    ExpectHeader,
    ExpectQueryCoords,
    ExpectTargetCoords,
    ExpectSummary,
    ExpectBlockEnd,
}

impl BlockState {
    /// Block-relative line consumed in this state.
    pub const fn offset(self) -> usize {
        match self {
            BlockState::ExpectHeader => 4,
            BlockState::ExpectQueryCoords => 7,
            BlockState::ExpectTargetCoords => 9,
            BlockState::ExpectSummary => 11,
            BlockState::ExpectBlockEnd => 12,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            BlockState::ExpectHeader => BlockState::ExpectQueryCoords,
            BlockState::ExpectQueryCoords => BlockState::ExpectTargetCoords,
            BlockState::ExpectTargetCoords => BlockState::ExpectSummary,
            BlockState::ExpectSummary => BlockState::ExpectBlockEnd,
            BlockState::ExpectBlockEnd => BlockState::ExpectHeader,
        }
    }
}

#[derive(Debug)]
struct SideCoords {
    start: usize,
    end: usize,
    seq: String,
}

#[derive(Debug)]
struct Summary {
    columns: usize,
    matches: usize,
    gaps: usize,
    identity: f64,
}

/// Fields accumulated while walking one block.
#[derive(Debug, Default)]
struct PartialHit {
    id: Option<String>,
    query: Option<SideCoords>,
    target: Option<SideCoords>,
    summary: Option<Summary>,
}

/// Streaming parser yielding one [`HitRecord`] per report block.
///
/// Only the current block is held in memory.
pub struct ReportParser<R> {
    lines: Lines<R>,
    line_no: usize,
    offset: usize,
    state: BlockState,
    partial: PartialHit,
    done: bool,
}

impl ReportParser<BufReader<File>> {
    /// Opens a report file for parsing.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NsearchError::InputNotFound(path.to_path_buf()));
        }
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> ReportParser<R> {
    pub fn new(reader: R) -> Self {
        ReportParser {
            lines: reader.lines(),
            line_no: 0,
            offset: 0,
            state: BlockState::ExpectHeader,
            partial: PartialHit::default(),
            done: false,
        }
    }

    /// Current state of the block state machine.
    pub fn state(&self) -> BlockState {
        self.state
    }

    fn malformed(&self, reason: impl Into<String>) -> NsearchError {
        NsearchError::MalformedReport {
            line: self.line_no,
            reason: reason.into(),
        }
    }

    /// Consumes the data-bearing line for the current state.
    ///
    /// Returns a finished record when the block end is reached.
    fn consume(&mut self, line: &str) -> Result<Option<HitRecord>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match self.state {
            BlockState::ExpectHeader => {
                let raw = self.token(&tokens, 2, "sequence id")?;
                let mut chars = raw.chars();
                chars.next();
                let id = chars.as_str();
                if id.is_empty() {
                    return Err(self.malformed(format!("empty sequence id in {raw:?}")));
                }
                self.partial.id = Some(id.to_string());
            }
            BlockState::ExpectQueryCoords => {
                self.partial.query = Some(self.parse_coords(&tokens, "query")?);
            }
            BlockState::ExpectTargetCoords => {
                self.partial.target = Some(self.parse_coords(&tokens, "target")?);
            }
            BlockState::ExpectSummary => {
                self.partial.summary = Some(self.parse_summary(&tokens)?);
            }
            BlockState::ExpectBlockEnd => {
                let partial = std::mem::take(&mut self.partial);
                return self.assemble(partial).map(Some);
            }
        }
        Ok(None)
    }

    fn token<'a>(&self, tokens: &[&'a str], idx: usize, what: &str) -> Result<&'a str> {
        tokens
            .get(idx)
            .copied()
            .ok_or_else(|| self.malformed(format!("missing {what} (token {})", idx + 1)))
    }

    fn number(&self, token: &str, what: &str) -> Result<usize> {
        token
            .parse()
            .map_err(|_| self.malformed(format!("invalid {what}: {token:?}")))
    }

    fn parse_coords(&self, tokens: &[&str], side: &str) -> Result<SideCoords> {
        let start = self.token(tokens, 1, &format!("{side} start"))?;
        let seq = self.token(tokens, 3, &format!("{side} sequence"))?;
        // The end coordinate is the last token and must follow the sequence
        let end = self.token(tokens, 4, &format!("{side} end"))?;
        let end = tokens.last().copied().unwrap_or(end);

        Ok(SideCoords {
            start: self.number(start, &format!("{side} start"))?,
            end: self.number(end, &format!("{side} end"))?,
            seq: seq.to_string(),
        })
    }

    fn parse_summary(&self, tokens: &[&str]) -> Result<Summary> {
        let columns = self.number(self.token(tokens, 0, "column count")?, "column count")?;
        let matches = self.number(self.token(tokens, 2, "match count")?, "match count")?;
        let pct = self.token(tokens, 4, "identity percentage")?;
        let gaps = self.number(self.token(tokens, 5, "gap count")?, "gap count")?;

        let identity = percentage_to_fraction(pct)
            .ok_or_else(|| self.malformed(format!("invalid identity percentage: {pct:?}")))?;
        if !(0.0..=1.0).contains(&identity) {
            return Err(self.malformed(format!("identity out of range: {pct:?}")));
        }

        if matches > columns {
            return Err(self.malformed(format!(
                "{matches} matches exceed {columns} columns"
            )));
        }

        Ok(Summary {
            columns,
            matches,
            gaps,
            identity,
        })
    }

    fn assemble(&self, partial: PartialHit) -> Result<HitRecord> {
        let (Some(id), Some(query), Some(target), Some(summary)) =
            (partial.id, partial.query, partial.target, partial.summary)
        else {
            return Err(self.malformed("incomplete block"));
        };

        let alignment = cigar::encode(&query.seq, &target.seq)?;

        // The header line only names one sequence, so the target id repeats
        // the query id. Kept until the engine's report exposes the target.
        Ok(HitRecord {
            target_id: id.clone(),
            query_id: id,
            query_start: query.start,
            query_end: query.end,
            target_start: target.start,
            target_end: target.end,
            query_seq: query.seq,
            target_seq: target.seq,
            num_columns: summary.columns,
            num_matches: summary.matches,
            num_mismatches: summary.columns - summary.matches,
            num_gaps: summary.gaps,
            identity: summary.identity,
            alignment,
        })
    }
}

impl<R: BufRead> Iterator for ReportParser<R> {
    type Item = Result<HitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    if self.offset != 0 {
                        return Some(Err(self.malformed(format!(
                            "report ends mid-block after {} of {BLOCK_LINES} lines",
                            self.offset
                        ))));
                    }
                    return None;
                }
            };
            self.line_no += 1;

            if self.offset == self.state.offset() {
                let finished = match self.consume(&line) {
                    Ok(finished) => finished,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                };
                self.state = self.state.next();
                if let Some(record) = finished {
                    self.offset = 0;
                    return Some(Ok(record));
                }
            }
            self.offset += 1;
        }
    }
}

/// Reads a percentage token such as `(95.00%),` or `95.00%` as a fraction.
pub fn percentage_to_fraction(token: &str) -> Option<f64> {
    let digits = token
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .trim_end_matches(|c: char| !c.is_ascii_digit());
    digits.parse::<f64>().ok().map(|pct| pct / 100.0)
}

/// Converts an engine report into a persisted result table.
///
/// Rows are written to a scratch file beside `table`, which is renamed into
/// place only once the whole report has parsed. On error `table` is left
/// as it was. Returns the number of rows written.
pub fn report_to_table(report: &Path, table: &Path) -> Result<usize> {
    log::info!(
        "Parsing report {} into {}",
        report.display(),
        table.display()
    );

    let parser = ReportParser::open(report)?;
    let dir = match table.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut partial = tempfile::Builder::new()
        .prefix(".table_")
        .suffix(".partial")
        .tempfile_in(dir)?;

    let mut writer = TableWriter::new(BufWriter::new(partial.as_file_mut()))?;
    let mut rows = 0;
    let mut warned = false;

    for record in parser {
        let record = record?;
        if !warned && record.query_id == record.target_id {
            log::warn!(
                "Report header names a single sequence; TargetId repeats QueryId ({})",
                record.query_id
            );
            warned = true;
        }
        writer.write_record(&record)?;
        rows += 1;
    }
    writer.finish()?;

    // Scratch files are created owner-only; the table is an ordinary output
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        partial
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    partial.persist(table)?;

    log::debug!("Wrote {rows} rows to {}", table.display());
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    /// Renders one report block in the engine's layout.
    pub(crate) fn block(
        id: &str,
        target: &str,
        query_row: (usize, &str, usize),
        target_row: (usize, &str, usize),
        summary: (usize, usize, &str, usize),
    ) -> String {
        let (cols, ids, pct, gaps) = summary;
        let lines = [
            String::new(),
            format!("Query >{id}"),
            " %Id   TLen  Target".to_string(),
            format!("{pct}    {}  {target}", target_row.2),
            format!(" Query {}nt >{id}", query_row.2),
            format!("Target {}nt >{target}", target_row.2),
            String::new(),
            format!("Query  {:>5} + {} {}", query_row.0, query_row.1, query_row.2),
            "                 ||||".to_string(),
            format!("Target {:>5} + {} {}", target_row.0, target_row.1, target_row.2),
            String::new(),
            format!("{cols} cols, {ids} ids ({pct}), {gaps} gaps"),
            String::new(),
        ];
        lines.iter().map(|l| format!("{l}\n")).collect()
    }

    #[test]
    fn test_state_machine_cycle() {
        let mut state = BlockState::ExpectHeader;
        let mut offsets = Vec::new();
        for _ in 0..5 {
            offsets.push(state.offset());
            state = state.next();
        }
        assert_eq!(offsets, vec![4, 7, 9, 11, 12]);
        assert_eq!(state, BlockState::ExpectHeader);
        assert!(BlockState::ExpectBlockEnd.offset() < BLOCK_LINES);
    }

    #[test]
    fn test_parse_single_block() {
        let report = block("q1", "t1", (1, "ACGT", 4), (3, "ACGA", 6), (4, 3, "75.00%", 0));
        let records: Vec<_> = ReportParser::new(Cursor::new(report))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 1);
        let hit = &records[0];
        assert_eq!(hit.query_id, "q1");
        assert_eq!(hit.target_id, "q1");
        assert_eq!((hit.query_start, hit.query_end), (1, 4));
        assert_eq!((hit.target_start, hit.target_end), (3, 6));
        assert_eq!(hit.query_seq, "ACGT");
        assert_eq!(hit.target_seq, "ACGA");
        assert_eq!(hit.num_columns, 4);
        assert_eq!(hit.num_matches, 3);
        assert_eq!(hit.num_mismatches, 1);
        assert_eq!(hit.num_gaps, 0);
        assert_eq!(hit.identity, 0.75);
        assert_eq!(hit.alignment.to_string(), "3=1X");
    }

    #[test]
    fn test_percentage_to_fraction() {
        assert_eq!(percentage_to_fraction("95.00%"), Some(0.95));
        assert_eq!(percentage_to_fraction("(95.00%),"), Some(0.95));
        assert_eq!(percentage_to_fraction("(100.0%)"), Some(1.0));
        assert_eq!(percentage_to_fraction("(%),"), None);
    }

    #[test]
    fn test_identity_from_summary_line() {
        let report = block("q", "t", (1, "A", 1), (1, "A", 1), (20, 19, "95.00%", 0));
        let hit = ReportParser::new(Cursor::new(report)).next().unwrap().unwrap();
        assert_eq!(hit.identity, 0.95);
    }

    #[test]
    fn test_identity_out_of_range() {
        let report = block("q", "t", (1, "A", 1), (1, "A", 1), (1, 1, "120.0%", 0));
        let err = ReportParser::new(Cursor::new(report)).next().unwrap().unwrap_err();
        assert!(matches!(err, NsearchError::MalformedReport { line: 12, .. }));
    }

    #[test]
    fn test_block_count() {
        let mut report = String::new();
        for i in 0..5 {
            report.push_str(&block(
                &format!("q{i}"),
                "t",
                (1, "AC-T", 3),
                (1, "ACGT", 4),
                (4, 3, "75.0%", 1),
            ));
        }
        let records: Vec<_> = ReportParser::new(Cursor::new(report))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[4].query_id, "q4");
        assert!(records
            .iter()
            .all(|r| r.num_mismatches == r.num_columns - r.num_matches));
        assert_eq!(records[0].alignment.to_string(), "2=1D1=");
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(ReportParser::new(Cursor::new("")).count(), 0);
    }

    #[test]
    fn test_truncated_report() {
        let report = block("q", "t", (1, "A", 1), (1, "A", 1), (1, 1, "100.0%", 0));
        let truncated: String = report.lines().take(12).map(|l| format!("{l}\n")).collect();
        let results: Vec<_> = ReportParser::new(Cursor::new(truncated)).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(NsearchError::MalformedReport { line: 12, .. })
        ));
    }

    #[test]
    fn test_trailing_partial_block_after_full_block() {
        let mut report = block("q", "t", (1, "A", 1), (1, "A", 1), (1, 1, "100.0%", 0));
        report.push_str("extra\n");
        let results: Vec<_> = ReportParser::new(Cursor::new(report)).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_missing_token() {
        let report = block("q", "t", (1, "A", 1), (1, "A", 1), (1, 1, "100.0%", 0))
            .replace("1 cols, 1 ids (100.0%), 0 gaps", "1 cols");
        let err = ReportParser::new(Cursor::new(report)).next().unwrap().unwrap_err();
        assert!(matches!(err, NsearchError::MalformedReport { line: 12, .. }));
    }

    #[test]
    fn test_non_numeric_coordinate() {
        let report = block("q", "t", (1, "A", 1), (1, "A", 1), (1, 1, "100.0%", 0))
            .replace("Query      1 +", "Query      x +");
        let err = ReportParser::new(Cursor::new(report)).next().unwrap().unwrap_err();
        assert!(matches!(err, NsearchError::MalformedReport { line: 8, .. }));
    }

    #[test]
    fn test_unequal_match_strings() {
        let report = block("q", "t", (1, "ACG", 3), (1, "AC", 2), (3, 2, "66.7%", 0));
        let err = ReportParser::new(Cursor::new(report)).next().unwrap().unwrap_err();
        assert!(matches!(err, NsearchError::LengthMismatch { query: 3, target: 2 }));
    }

    #[test]
    fn test_parser_stops_after_error() {
        let mut report = block("q", "t", (1, "ACG", 3), (1, "AC", 2), (3, 2, "66.7%", 0));
        report.push_str(&block("q2", "t", (1, "A", 1), (1, "A", 1), (1, 1, "100.0%", 0)));
        let results: Vec<_> = ReportParser::new(Cursor::new(report)).collect();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_report_to_table_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.txt");
        let table = dir.path().join("hits.csv");
        let mut text = block("q1", "t", (1, "ACGT", 4), (1, "ACGA", 4), (4, 3, "75.00%", 0));
        text.push_str(&block("q2", "t", (2, "AC-T", 4), (5, "ACGT", 8), (4, 3, "75.00%", 1)));
        std::fs::write(&report, text).unwrap();

        assert_eq!(report_to_table(&report, &table).unwrap(), 2);
        let written = std::fs::read_to_string(&table).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert_eq!(
            written.lines().nth(2).unwrap(),
            "q2,q2,2,4,5,8,AC-T,ACGT,4,3,1,1,0.75,2=1D1="
        );
        // Only the report and the finished table remain
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&table).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[test]
    fn test_failed_conversion_leaves_no_table() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.txt");
        let table = dir.path().join("hits.csv");
        let mut text = block("q", "t", (1, "ACGT", 4), (1, "ACGA", 4), (4, 3, "75.00%", 0));
        text.push_str("extra\n");
        std::fs::write(&report, text).unwrap();

        let err = report_to_table(&report, &table).unwrap_err();
        assert!(matches!(err, NsearchError::MalformedReport { line: 14, .. }));
        assert!(!table.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_conversion_keeps_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.txt");
        let table = dir.path().join("hits.csv");
        std::fs::write(&report, "only\nthree\nlines\n").unwrap();
        std::fs::write(&table, "previous\n").unwrap();

        assert!(report_to_table(&report, &table).is_err());
        assert_eq!(std::fs::read_to_string(&table).unwrap(), "previous\n");
    }
}
