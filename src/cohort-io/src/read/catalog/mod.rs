use std::{fs, io::{self, Write}, ops::Range, path::{Path, PathBuf}};

use csv::{ReaderBuilder, StringRecord};
use genome::Sample;
use indexmap::IndexMap;
use located_error::prelude::*;
use log::debug;

use crate::{ParseError, ParseErrorKind, parse::find_column};

mod error;
pub use error::CatalogError;

/// Infer the field delimiter of a metadata table from its file extension.
pub fn infer_delimiter(path: &Path) -> Result<u8, CatalogError> {
    let unknown = || CatalogError::UnknownDelimiter{path: path.to_path_buf()};
    match path.extension().and_then(|ext| ext.to_str()).ok_or_else(unknown)? {
        "csv"                             => Ok(b','),
        "tsv" | "txt" | "panel" | "meta"  => Ok(b'\t'),
        _                                 => Err(unknown())
    }
}

/// Column indices of the expected metadata fields.
struct Columns { id: usize, pop: usize, pop2: usize, con: usize, lat: usize, lon: usize, loc: usize }

impl Columns {
    fn locate(header: &StringRecord) -> Result<Self, ParseErrorKind> {
        let fields: Vec<&str> = header.iter().collect();
        let find = |name: &str| find_column(&fields, &[name]).ok_or_else(|| ParseErrorKind::MissingColumn(name.to_string()));
        Ok(Self {
            id  : find("id")?,
            pop : find("pop")?,
            pop2: find("pop2")?,
            con : find("Con")?,
            lat : find("lat")?,
            lon : find("lon")?,
            loc : find("loc")?,
        })
    }

    fn sample(&self, record: &StringRecord) -> Result<Sample, ParseErrorKind> {
        let field    = |i: usize| record.get(i).map(str::trim).filter(|value| !value.is_empty());
        let required = |i: usize, name: &'static str| field(i).ok_or(ParseErrorKind::MissingField(name));
        let optional = |i: usize| field(i).map(ToString::to_string);
        let bounded  = |i: usize, column: &'static str, bound: f64| {
            let value = required(i, column)?;
            value.parse::<f64>().ok()
                .filter(|v| (-bound..=bound).contains(v))
                .ok_or_else(|| ParseErrorKind::OutOfRange{column, value: value.to_string(), min: -bound, max: bound})
        };

        Ok(Sample {
            id       : required(self.id, "id")?.to_string(),
            pop      : required(self.pop, "pop")?.to_string(),
            pop2     : optional(self.pop2),
            continent: optional(self.con),
            lat      : bounded(self.lat, "lat", 90.0)?,
            lon      : bounded(self.lon, "lon", 180.0)?,
            loc      : optional(self.loc),
        })
    }
}

#[derive(Debug, Clone)]
struct CatalogRecord {
    sample: Sample,
    raw   : Range<usize>,
}

/// Per-sample metadata table (`id, pop, pop2, Con, lat, lon, loc` + any extra column), indexed by sample id.
///
/// Raw bytes are kept around, so that a subset of the table can be written back
/// exactly as it was read.
#[derive(Debug, Clone)]
pub struct SampleCatalog {
    source_file: PathBuf,
    data       : Vec<u8>,
    header     : Range<usize>,
    records    : IndexMap<String, CatalogRecord>,
}

impl SampleCatalog {
    /// Load a metadata table. When `delimiter` is `None`, it is inferred from the file extension.
    pub fn from_path(path: &Path, delimiter: Option<u8>) -> Result<Self> {
        let loc_msg = || format!("While loading metadata table '{}'", path.display());
        let delimiter = match delimiter {
            Some(delimiter) => delimiter,
            None            => infer_delimiter(path).with_loc(loc_msg)?,
        };
        let data = fs::read(path).map_err(CatalogError::Open).with_loc(loc_msg)?;
        Self::from_bytes(data, delimiter, path).with_loc(loc_msg)
    }

    /// Parse an in-memory table. `source_file` is only used to report errors.
    pub fn from_bytes(data: Vec<u8>, delimiter: u8, source_file: &Path) -> Result<Self> {
        let error = |line: u64, kind| ParseError::new(source_file, usize::try_from(line).unwrap_or(usize::MAX), kind);
        let table_error = |e: csv::Error| {
            let line = e.position().map_or(0, csv::Position::line);
            error(line, ParseErrorKind::Table(e))
        };

        let mut records = IndexMap::new();
        let mut starts  = Vec::new();
        {
            let mut reader = ReaderBuilder::new()
                .delimiter(delimiter)
                .has_headers(true)
                .flexible(false)
                .from_reader(data.as_slice());

            let header  = reader.headers().map_err(table_error)?.clone();
            let columns = Columns::locate(&header).map_err(|kind| error(1, kind))?;

            for record in reader.records() {
                let record = record.map_err(table_error)?;
                let (byte, line) = record.position().map_or((0, 0), |pos| (pos.byte(), pos.line()));
                let sample = columns.sample(&record).map_err(|kind| error(line, kind))?;
                if records.contains_key(&sample.id) {
                    return Err(error(line, ParseErrorKind::DuplicateRecord(sample.id))).loc("While indexing metadata table")
                }
                starts.push(usize::try_from(byte).unwrap_or(usize::MAX));
                records.insert(sample.id.clone(), CatalogRecord{sample, raw: 0..0});
            }
        }

        // Each row spans from its own start to the start of the next one (or EOF).
        let ends = starts.iter().skip(1).copied().chain(std::iter::once(data.len()));
        for (record, (start, end)) in records.values_mut().zip(starts.iter().copied().zip(ends)) {
            record.raw = start..end;
        }
        let header = 0..starts.first().copied().unwrap_or(data.len());

        debug!("Found {} samples within metadata table '{}'", records.len(), source_file.display());
        Ok(Self { source_file: source_file.to_path_buf(), data, header, records })
    }

    #[must_use]
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    /// Retrieve the metadata record of a given sample.
    pub fn get(&self, id: &str) -> Result<&Sample, CatalogError> {
        self.records.get(id)
            .map(|record| &record.sample)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Samples, in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.records.values().map(|record| &record.sample)
    }

    /// Sample identifiers, in file order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Write the header and every row for which `keep` returns `true`, byte for byte and in file order.
    /// Returns the number of written rows.
    pub fn write_subset<W, F>(&self, writer: &mut W, mut keep: F) -> io::Result<usize>
    where
        W: Write,
        F: FnMut(&str) -> bool,
    {
        writer.write_all(&self.data[self.header.clone()])?;
        let mut written = 0;
        for (id, record) in &self.records {
            if keep(id) {
                writer.write_all(&self.data[record.raw.clone()])?;
                written += 1;
            }
        }
        Ok(written)
    }
}
