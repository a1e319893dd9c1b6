//! Persisted result tables.
//!
//! Hits are written as comma-delimited text with a fixed header, and loaded
//! back as a column-oriented [`ResultTable`] with typed columns.

use crate::cigar::EncodedAlignment;
use crate::error::{NsearchError, Result};
use crate::report::HitRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Column names of a persisted table, in file order.
pub const COLUMNS: [&str; 14] = [
    "QueryId",
    "TargetId",
    "QueryMatchStart",
    "QueryMatchEnd",
    "TargetMatchStart",
    "TargetMatchEnd",
    "QueryMatchSeq",
    "TargetMatchSeq",
    "NumColumns",
    "NumMatches",
    "NumMismatches",
    "NumGaps",
    "Identity",
    "Alignment",
];

/// Value type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Str,
    Int,
    Float,
}

/// Type of the column at `index` in [`COLUMNS`].
pub fn column_type(index: usize) -> ColumnType {
    match index {
        2..=5 | 8..=11 => ColumnType::Int,
        12 => ColumnType::Float,
        _ => ColumnType::Str,
    }
}

fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|&c| c == name)
}

/// One typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Str(Vec<String>),
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {
    fn empty(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Str => Column::Str(Vec::new()),
            ColumnType::Int => Column::Int(Vec::new()),
            ColumnType::Float => Column::Float(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Str(_) => ColumnType::Str,
            Column::Int(_) => ColumnType::Int,
            Column::Float(_) => ColumnType::Float,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Str(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a raw field, converting it to the column's type.
    fn push(&mut self, column: &'static str, row: usize, value: &str) -> Result<()> {
        let coercion = || NsearchError::TypeCoercion {
            column,
            row,
            value: value.to_string(),
        };
        match self {
            Column::Str(v) => v.push(value.to_string()),
            Column::Int(v) => v.push(value.trim().parse().map_err(|_| coercion())?),
            // Identity is the only float column and holds a fraction
            Column::Float(v) => {
                let x: f64 = value.trim().parse().map_err(|_| coercion())?;
                if !(0.0..=1.0).contains(&x) {
                    return Err(coercion());
                }
                v.push(x);
            }
        }
        Ok(())
    }
}

/// Column-oriented hit table; every column has one entry per hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<Column>,
}

impl Default for ResultTable {
    fn default() -> Self {
        ResultTable {
            columns: (0..COLUMNS.len())
                .map(|i| Column::empty(column_type(i)))
                .collect(),
        }
    }
}

impl ResultTable {
    /// Loads a persisted table file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NsearchError::InputNotFound(path.to_path_buf()));
        }
        log::info!("Loading result table {}", path.display());
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Reads the header, then transposes the remaining rows into typed columns.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(NsearchError::MalformedTable("missing header row".to_string())),
        };
        let names = split_record(header.trim_end_matches('\r'));
        if names != COLUMNS {
            return Err(NsearchError::MalformedTable(format!(
                "unexpected header {:?}",
                names
            )));
        }

        let mut table = ResultTable::default();
        let mut row = 0;
        for line in lines {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let fields = split_record(line);
            if fields.len() != COLUMNS.len() {
                return Err(NsearchError::MalformedTable(format!(
                    "row {row} has {} fields, expected {}",
                    fields.len(),
                    COLUMNS.len()
                )));
            }
            for (i, field) in fields.iter().enumerate() {
                table.columns[i].push(COLUMNS[i], row, field)?;
            }
            row += 1;
        }

        Ok(table)
    }

    /// Builds a table directly from parsed hits.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a HitRecord>,
    {
        let mut table = ResultTable::default();
        for record in records {
            for (column, field) in table.columns.iter_mut().zip(fields(record)) {
                match (column, field) {
                    (Column::Str(v), Field::Str(s)) => v.push(s),
                    (Column::Int(v), Field::Int(n)) => v.push(n as i64),
                    (Column::Float(v), Field::Float(x)) => v.push(x),
                    _ => unreachable!("field order follows COLUMNS"),
                }
            }
        }
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over (name, column) pairs in file order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Column)> {
        COLUMNS.iter().copied().zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        column_index(name).map(|i| &self.columns[i])
    }

    /// Values of a string column, `None` for unknown or non-string columns.
    pub fn strings(&self, name: &str) -> Option<&[String]> {
        match self.column(name)? {
            Column::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn integers(&self, name: &str) -> Option<&[i64]> {
        match self.column(name)? {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn floats(&self, name: &str) -> Option<&[f64]> {
        match self.column(name)? {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Converts the table back into hit records.
    pub fn records(&self) -> Result<Vec<HitRecord>> {
        (0..self.len()).map(|row| self.record(row)).collect()
    }

    fn record(&self, row: usize) -> Result<HitRecord> {
        let text = |i: usize| match &self.columns[i] {
            Column::Str(v) => Ok(v[row].clone()),
            _ => Err(NsearchError::MalformedTable(format!("{} is not text", COLUMNS[i]))),
        };
        let count = |i: usize| match &self.columns[i] {
            Column::Int(v) => usize::try_from(v[row]).map_err(|_| NsearchError::TypeCoercion {
                column: COLUMNS[i],
                row,
                value: v[row].to_string(),
            }),
            _ => Err(NsearchError::MalformedTable(format!("{} is not integer", COLUMNS[i]))),
        };
        let identity = match &self.columns[12] {
            Column::Float(v) => v[row],
            _ => return Err(NsearchError::MalformedTable("Identity is not float".to_string())),
        };
        let alignment: EncodedAlignment = text(13)?.parse().map_err(|_| {
            NsearchError::TypeCoercion {
                column: COLUMNS[13],
                row,
                value: text(13).unwrap_or_default(),
            }
        })?;

        Ok(HitRecord {
            query_id: text(0)?,
            target_id: text(1)?,
            query_start: count(2)?,
            query_end: count(3)?,
            target_start: count(4)?,
            target_end: count(5)?,
            query_seq: text(6)?,
            target_seq: text(7)?,
            num_columns: count(8)?,
            num_matches: count(9)?,
            num_mismatches: count(10)?,
            num_gaps: count(11)?,
            identity,
            alignment,
        })
    }

    /// Writes the table in persisted form.
    pub fn write(&self, path: &Path) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }

    /// Writes the table as delimited text to any writer.
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = TableWriter::new(out)?;
        for record in self.records()? {
            writer.write_record(&record)?;
        }
        writer.finish()
    }
}

enum Field {
    Str(String),
    Int(usize),
    Float(f64),
}

fn fields(record: &HitRecord) -> [Field; 14] {
    [
        Field::Str(record.query_id.clone()),
        Field::Str(record.target_id.clone()),
        Field::Int(record.query_start),
        Field::Int(record.query_end),
        Field::Int(record.target_start),
        Field::Int(record.target_end),
        Field::Str(record.query_seq.clone()),
        Field::Str(record.target_seq.clone()),
        Field::Int(record.num_columns),
        Field::Int(record.num_matches),
        Field::Int(record.num_mismatches),
        Field::Int(record.num_gaps),
        Field::Float(record.identity),
        Field::Str(record.alignment.to_string()),
    ]
}

/// Streams hit records into the persisted table format.
pub struct TableWriter<W: Write> {
    out: W,
}

impl<W: Write> TableWriter<W> {
    /// Creates a writer and emits the header row.
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", COLUMNS.join(","))?;
        Ok(TableWriter { out })
    }

    pub fn write_record(&mut self, record: &HitRecord) -> Result<()> {
        let row: Vec<String> = fields(record)
            .into_iter()
            .map(|field| match field {
                Field::Str(s) => escape_field(&s),
                Field::Int(n) => n.to_string(),
                Field::Float(x) => x.to_string(),
            })
            .collect();
        writeln!(self.out, "{}", row.join(","))?;
        Ok(())
    }

    /// Flushes buffered rows.
    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Quotes a field containing a delimiter or quote.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits one delimited line, honouring double-quoted fields.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
