use thiserror::Error;

/// Identifier sets of the genotype matrix and the metadata table disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Referential integrity check failed. Samples missing from the metadata table: [{}]. Catalog records missing from the VCF: [{}]",
    missing_metadata.join(", "), missing_genotypes.join(", "))]
pub struct IntegrityError {
    /// Retained VCF samples without a catalog record (sorted).
    pub missing_metadata : Vec<String>,
    /// Catalog records naming no VCF sample (sorted). Only reported in strict mode.
    pub missing_genotypes: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CohortError {
    #[error("The filtered cohort is empty: no {what} were retained")]
    Empty { what: &'static str },

    #[error("'{path}' changed since it was loaded: record at line {line} does not match the genotype matrix ({reason})")]
    InputChanged { path: String, line: usize, reason: String },

    #[error("'{path}' changed since it was loaded: expected {expected} records, found {found}")]
    RecordCount { path: String, expected: usize, found: usize },
}
