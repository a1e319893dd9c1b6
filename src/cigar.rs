//! Extended CIGAR encoding of gapped pairwise alignments.
//!
//! Builds a run-length string with '=' (match), 'X' (mismatch) and 'D' (gap)
//! operators from the two padded strings of an alignment. Gaps in the query
//! and gaps in the target share the single 'D' operator.

use crate::error::{NsearchError, Result};
use std::fmt;
use std::str::FromStr;

/// Gap marker used in padded alignment strings.
pub const GAP: u8 = b'-';

/// Classification of one alignment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnClass {
    Match,
    Mismatch,
    Gap,
}

impl ColumnClass {
    /// CIGAR operator character for this class.
    pub fn symbol(self) -> char {
        match self {
            ColumnClass::Match => '=',
            ColumnClass::Mismatch => 'X',
            ColumnClass::Gap => 'D',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '=' => Some(ColumnClass::Match),
            'X' => Some(ColumnClass::Mismatch),
            'D' => Some(ColumnClass::Gap),
            _ => None,
        }
    }
}

/// A run of identically classified columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    pub count: usize,
    pub class: ColumnClass,
}

/// Run-length encoded alignment; adjacent ops never share a class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedAlignment {
    ops: Vec<CigarOp>,
}

impl EncodedAlignment {
    /// Compresses a column classification into maximal runs.
    pub fn from_classes<I>(classes: I) -> Self
    where
        I: IntoIterator<Item = ColumnClass>,
    {
        let mut ops: Vec<CigarOp> = Vec::new();
        for class in classes {
            match ops.last_mut() {
                Some(op) if op.class == class => op.count += 1,
                _ => ops.push(CigarOp { count: 1, class }),
            }
        }
        EncodedAlignment { ops }
    }

    pub fn ops(&self) -> &[CigarOp] {
        &self.ops
    }

    /// Expands the runs back into one class per column.
    pub fn expand(&self) -> Vec<ColumnClass> {
        self.ops
            .iter()
            .flat_map(|op| std::iter::repeat(op.class).take(op.count))
            .collect()
    }

    /// Total number of columns covered.
    pub fn len(&self) -> usize {
        self.ops.iter().map(|op| op.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns (matches, mismatches, gaps).
    pub fn counts(&self) -> (usize, usize, usize) {
        self.ops
            .iter()
            .fold((0, 0, 0), |(m, x, g), op| match op.class {
                ColumnClass::Match => (m + op.count, x, g),
                ColumnClass::Mismatch => (m, x + op.count, g),
                ColumnClass::Gap => (m, x, g + op.count),
            })
    }
}

impl fmt::Display for EncodedAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}{}", op.count, op.class.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for EncodedAlignment {
    type Err = NsearchError;

    fn from_str(s: &str) -> Result<Self> {
        let mut ops: Vec<CigarOp> = Vec::new();
        let mut num_str = String::new();

        for ch in s.chars() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                continue;
            }
            let class = ColumnClass::from_symbol(ch).ok_or_else(|| {
                NsearchError::InvalidInput(format!("unknown CIGAR operator '{ch}' in {s:?}"))
            })?;
            let count: usize = num_str.parse().map_err(|_| {
                NsearchError::InvalidInput(format!("missing count before '{ch}' in {s:?}"))
            })?;
            num_str.clear();
            if count == 0 {
                return Err(NsearchError::InvalidInput(format!(
                    "zero-length CIGAR operation in {s:?}"
                )));
            }
            match ops.last_mut() {
                Some(op) if op.class == class => op.count += count,
                _ => ops.push(CigarOp { count, class }),
            }
        }

        if !num_str.is_empty() {
            return Err(NsearchError::InvalidInput(format!(
                "trailing count without operator in {s:?}"
            )));
        }

        Ok(EncodedAlignment { ops })
    }
}

/// Classifies every column of an aligned pair.
///
/// A gap marker on either side makes the column a gap; otherwise equal
/// residues match and differing residues mismatch.
pub fn classify(query: &str, target: &str) -> Result<Vec<ColumnClass>> {
    let (q, t) = (query.as_bytes(), target.as_bytes());
    if q.len() != t.len() || q.is_empty() {
        return Err(NsearchError::LengthMismatch {
            query: q.len(),
            target: t.len(),
        });
    }

    Ok(q.iter()
        .zip(t)
        .map(|(&a, &b)| {
            if a == GAP || b == GAP {
                ColumnClass::Gap
            } else if a == b {
                ColumnClass::Match
            } else {
                ColumnClass::Mismatch
            }
        })
        .collect())
}

/// Encodes an aligned pair as an extended CIGAR.
///
/// ```
/// use nsearch_rs::cigar::encode;
///
/// assert_eq!(encode("ACGT", "ACGA").unwrap().to_string(), "3=1X");
/// assert_eq!(encode("AC-T", "ACGT").unwrap().to_string(), "2=1D1=");
/// ```
pub fn encode(query: &str, target: &str) -> Result<EncodedAlignment> {
    Ok(EncodedAlignment::from_classes(classify(query, target)?))
}
