use std::{fs::File, io::{BufRead, BufReader}, path::Path};

use genome::RelatednessPair;
use indexmap::IndexMap;
use located_error::prelude::*;
use log::{debug, warn};

use crate::{ParseError, ParseErrorKind, parse::{find_column, trim_eol}};

mod error;
pub use error::RelatednessReaderError;

/// Accepted names for the first sample identifier column (vcftools, plink, KING).
pub const FIRST_ID_COLUMNS : [&str; 4] = ["ID1", "IID1", "INDV1", "SAMPLE1"];
/// Accepted names for the second sample identifier column.
pub const SECOND_ID_COLUMNS: [&str; 4] = ["ID2", "IID2", "INDV2", "SAMPLE2"];
/// Accepted names for the relatedness coefficient column, by order of preference.
pub const COEFFICIENT_COLUMNS: [&str; 5] = ["RELATEDNESS", "PI_HAT", "KINSHIP", "RELATEDNESS_PHI", "COEFFICIENT"];

/// Deduplicated set of relatedness pairs.
#[derive(Debug, Clone, Default)]
pub struct RelatednessTable {
    pairs: IndexMap<(String, String), RelatednessPair>,
    /// Number of self-pairs that were discarded.
    pub self_pairs: usize,
    /// Number of pairs with a non-finite coefficient that were skipped.
    pub non_finite: usize,
}

impl RelatednessTable {
    /// Register a pair. Self-pairs are discarded, and duplicated pairs keep their highest coefficient.
    pub fn insert(&mut self, a: &str, b: &str, coefficient: f64) {
        let Some(pair) = RelatednessPair::new(a, b, coefficient) else {
            self.self_pairs += 1;
            return
        };
        let (first, second) = pair.ids();
        let key = (first.to_string(), second.to_string());
        match self.pairs.get_mut(&key) {
            Some(existing) => existing.merge_max(coefficient),
            None           => { self.pairs.insert(key, pair); },
        }
    }

    pub fn pairs(&self) -> impl Iterator<Item = &RelatednessPair> {
        self.pairs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<RelatednessPair> for RelatednessTable {
    fn from_iter<T: IntoIterator<Item = RelatednessPair>>(iter: T) -> Self {
        let mut table = Self::default();
        for pair in iter {
            let (a, b) = pair.ids();
            table.insert(a, b, pair.coefficient());
        }
        table
    }
}

/// Column layout of a relatedness table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout { first: usize, second: usize, coefficient: usize }

impl Layout {
    fn width(&self) -> usize {
        1 + self.first.max(self.second).max(self.coefficient)
    }
}

/// Reader for whitespace-delimited pairwise relatedness tables
/// (vcftools `--relatedness2`, plink `--genome`, KING `.kin0`, or plain `id1 id2 coefficient` triplets).
pub struct RelatednessReader;

impl RelatednessReader {
    /// Read a relatedness table from a file.
    /// - `coefficient_column`: name of the coefficient column, overriding the default detection.
    pub fn from_path(path: &Path, coefficient_column: Option<&str>) -> Result<RelatednessTable> {
        let loc_msg = || format!("While reading relatedness table '{}'", path.display());
        let file = File::open(path).map_err(RelatednessReaderError::Open).with_loc(loc_msg)?;
        Self::from_reader(BufReader::new(file), path, coefficient_column).with_loc(loc_msg)
    }

    /// Read a relatedness table from any buffered source. `path` is only used to report errors.
    pub fn from_reader<R: BufRead>(mut source: R, path: &Path, coefficient_column: Option<&str>) -> Result<RelatednessTable> {
        let mut table  = RelatednessTable::default();
        let mut layout = None;
        let mut line   = 0;
        let mut buf    = String::new();

        loop {
            buf.clear();
            let bytes = source.read_line(&mut buf).map_err(|e| {
                let kind = match e.kind() {
                    std::io::ErrorKind::InvalidData => ParseErrorKind::InvalidUtf8,
                    _                               => ParseErrorKind::Read(e),
                };
                ParseError::new(path, line + 1, kind)
            })?;
            if bytes == 0 {
                break
            }
            line += 1;
            let fields: Vec<&str> = trim_eol(&buf).split_whitespace().collect();
            if fields.is_empty() {
                continue
            }
            let error = |kind| ParseError::new(path, line, kind);

            let current = match layout {
                Some(layout) => layout,
                None => {
                    let (detected, is_header) = Self::detect_layout(&fields, coefficient_column).map_err(error)?;
                    debug!("Relatedness table '{}' layout: {detected:?} (header: {is_header})", path.display());
                    layout = Some(detected);
                    if is_header {
                        continue
                    }
                    detected
                }
            };
            Self::parse_row(&mut table, &fields, current).map_err(error)?;
        }

        if layout.is_none() {
            return Err(RelatednessReaderError::Empty).loc("While parsing relatedness table")
        }
        if table.non_finite > 0 {
            warn!("Skipped {} pairs with a non-finite relatedness coefficient in '{}'", table.non_finite, path.display());
        }
        if table.self_pairs > 0 {
            debug!("Discarded {} self-pairs in '{}'", table.self_pairs, path.display());
        }
        debug!("Found {} distinct relatedness pairs in '{}'", table.len(), path.display());
        Ok(table)
    }

    /// Inspect the first non-empty line. Returns the column layout, and whether this line is a header.
    fn detect_layout(fields: &[&str], coefficient_column: Option<&str>) -> Result<(Layout, bool), ParseErrorKind> {
        let header: Vec<&str> = fields.iter().map(|field| field.trim_start_matches('#')).collect();
        let first  = find_column(&header, &FIRST_ID_COLUMNS);
        let second = find_column(&header, &SECOND_ID_COLUMNS);
        let coefficient = match coefficient_column {
            Some(name) => find_column(&header, &[name]),
            None       => find_column(&header, &COEFFICIENT_COLUMNS),
        };

        match (first, second, coefficient) {
            (Some(first), Some(second), Some(coefficient)) => Ok((Layout{first, second, coefficient}, true)),
            // Header-less `id1 id2 coefficient` triplets.
            _ if fields.len() == 3 && fields[2].parse::<f64>().is_ok() => Ok((Layout{first: 0, second: 1, coefficient: 2}, false)),
            (None, _, _) => Err(ParseErrorKind::MissingColumn(FIRST_ID_COLUMNS.join("|"))),
            (_, None, _) => Err(ParseErrorKind::MissingColumn(SECOND_ID_COLUMNS.join("|"))),
            (_, _, None) => Err(ParseErrorKind::MissingColumn(coefficient_column.map_or_else(|| COEFFICIENT_COLUMNS.join("|"), ToString::to_string))),
        }
    }

    fn parse_row(table: &mut RelatednessTable, fields: &[&str], layout: Layout) -> Result<(), ParseErrorKind> {
        if fields.len() < layout.width() {
            return Err(ParseErrorKind::MissingValues { expected: layout.width(), found: fields.len() })
        }
        let raw = fields[layout.coefficient];
        let coefficient = raw.parse::<f64>().map_err(|_| ParseErrorKind::InvalidCoefficient(raw.to_string()))?;
        if !coefficient.is_finite() {
            table.non_finite += 1;
            return Ok(())
        }
        table.insert(fields[layout.first], fields[layout.second], coefficient);
        Ok(())
    }
}
