use std::path::PathBuf;

use genome::{coordinate::CoordinateError, GenotypeError};
use thiserror::Error;

/// Malformed input. Always fatal, always reported with the offending file and 1-based line.
#[derive(Error, Debug)]
#[error("{}:{line}: {kind}", source_file.display())]
pub struct ParseError {
    pub source_file: PathBuf,
    pub line       : usize,
    #[source]
    pub kind       : ParseErrorKind,
}

#[derive(Error, Debug)]
pub enum ParseErrorKind {
    // ---- Generic
    #[error("Line contains invalid UTF-8 data")]
    InvalidUtf8,

    #[error("Failed to read line")]
    Read(#[source] std::io::Error),

    // ---- VCF header
    #[error("Missing '#CHROM' header line")]
    MissingHeader,

    #[error("Malformed '#CHROM' header line: expected column '{expected}' at position {index}, found '{found}'")]
    MalformedHeader { index: usize, expected: &'static str, found: String },

    #[error("Empty sample identifier in header column {0}")]
    EmptySampleId(usize),

    #[error("Duplicate sample identifier '{0}'")]
    DuplicateSampleId(String),

    // ---- VCF records
    #[error("Expected {expected} tab-separated columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("Invalid coordinate")]
    InvalidCoordinate(#[source] CoordinateError),

    #[error("Invalid allele '{0}'")]
    InvalidAllele(String),

    #[error("Invalid QUAL value '{0}'")]
    InvalidQuality(String),

    #[error("FORMAT column '{0}' does not declare a GT key")]
    MissingGenotypeField(String),

    #[error("Invalid genotype for sample '{sample}'")]
    InvalidGenotype { sample: String, #[source] source: GenotypeError },

    #[error("Wrong allele count for sample '{sample}': allele index {index} is out of range for a record declaring {alleles} alleles")]
    AlleleIndexOutOfRange { sample: String, index: usize, alleles: usize },

    // ---- Tables (metadata, relatedness)
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Missing required value in column '{0}'")]
    MissingField(&'static str),

    #[error("Invalid {column} value '{value}': expected a number within [{min}, {max}]")]
    OutOfRange { column: &'static str, value: String, min: f64, max: f64 },

    #[error("Duplicate sample identifier '{0}' in metadata table")]
    DuplicateRecord(String),

    #[error("Malformed table row")]
    Table(#[source] csv::Error),

    #[error("Invalid relatedness coefficient '{0}'")]
    InvalidCoefficient(String),

    #[error("Expected at least {expected} whitespace-separated columns, found {found}")]
    MissingValues { expected: usize, found: usize },
}
