use std::path::Path;

use ahash::AHashSet;
use cohort_io::{
    CancelToken,
    read::{SampleCatalog, VcfReader},
    write::{AtomicFile, VcfWriter, WriterError},
};
use genome::{GenotypeMatrix, Sample, Selection, Variant};
use located_error::prelude::*;
use log::{debug, info, trace, warn};
use logger::Logger;

mod error;
pub use error::{CohortError, IntegrityError};

/// Retained variants and samples, joined with their metadata records.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredCohort {
    pub variants: Selection,
    pub samples : Selection,
    /// One record per retained VCF sample, in VCF column order.
    pub records : Vec<Sample>,
    /// Catalog records naming no VCF sample. These are left out of the output table.
    pub unmatched_catalog: Vec<String>,
}

impl FilteredCohort {
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.count()
    }

    #[must_use]
    pub fn n_variants(&self) -> usize {
        self.variants.count()
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|sample| sample.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Rewrite the `AC` and `AN` INFO keys over the retained samples.
    pub recompute_info       : bool,
    pub overwrite            : bool,
    pub decompression_threads: usize,
    pub compression_threads  : usize,
}

/// Joins the filtered genotype matrix with the sample catalog, and writes the resulting pair.
pub struct CohortAssembler<'a> {
    matrix : &'a GenotypeMatrix,
    catalog: &'a SampleCatalog,
    vcf    : &'a Path,
}

impl<'a> CohortAssembler<'a> {
    /// - `vcf`: the VCF `matrix` was loaded from. It is streamed a second time when writing.
    #[must_use]
    pub fn new(matrix: &'a GenotypeMatrix, catalog: &'a SampleCatalog, vcf: &'a Path) -> Self {
        Self { matrix, catalog, vcf }
    }

    /// Join the retained samples with their catalog records.
    /// # Errors
    /// - `IntegrityError` if a retained sample has no catalog record, or if `strict` and a catalog
    ///   record names no VCF sample. Every offending identifier is listed.
    /// - `CohortError::Empty` if no sample or no variant was retained.
    pub fn assemble(&self, variants: &Selection, samples: &Selection, strict: bool) -> Result<FilteredCohort> {
        let loc_msg = "While assembling the filtered cohort";
        let mut records          = Vec::with_capacity(samples.count());
        let mut missing_metadata = Vec::new();
        for id in samples.indices().filter_map(|column| self.matrix.samples().get(column)) {
            match self.catalog.get(id) {
                Ok(sample) => records.push(sample.clone()),
                Err(e)     => {
                    trace!("{e}");
                    missing_metadata.push(id.clone());
                }
            }
        }

        let vcf_ids: AHashSet<&str> = self.matrix.samples().iter().map(String::as_str).collect();
        let mut unmatched_catalog: Vec<String> = self.catalog.ids()
            .filter(|id| !vcf_ids.contains(id))
            .map(ToString::to_string)
            .collect();

        missing_metadata.sort();
        unmatched_catalog.sort();
        if !missing_metadata.is_empty() || (strict && !unmatched_catalog.is_empty()) {
            let missing_genotypes = if strict { unmatched_catalog } else { Vec::new() };
            return Err(IntegrityError { missing_metadata, missing_genotypes }).loc(loc_msg)
        }
        if !unmatched_catalog.is_empty() {
            warn!(
                "{} metadata records name no VCF sample and are excluded from the output table: [{}]",
                unmatched_catalog.len(), unmatched_catalog.join(", ")
            );
        }

        if samples.is_empty() {
            return Err(CohortError::Empty { what: "samples" }).loc(loc_msg)
        }
        if variants.is_empty() {
            return Err(CohortError::Empty { what: "variants" }).loc(loc_msg)
        }

        info!("Assembled a cohort of {} samples and {} variants", samples.count(), variants.count());
        Ok(FilteredCohort { variants: variants.clone(), samples: samples.clone(), records, unmatched_catalog })
    }

    /// Stream the input VCF a second time, and stage the retained records and sample columns at `destination`.
    /// Nothing is visible at `destination` until the returned file is persisted.
    pub fn write_vcf(&self, cohort: &FilteredCohort, destination: &Path, options: &WriteOptions, cancel: &CancelToken) -> Result<AtomicFile> {
        let loc_msg = || format!("While writing filtered VCF '{}'", destination.display());
        let file = AtomicFile::new(destination, options.overwrite).with_loc(loc_msg)?;
        let mut reader = VcfReader::new(self.vcf, options.decompression_threads).with_loc(loc_msg)?;
        let path = self.vcf.display().to_string();

        if reader.samples() != self.matrix.samples() {
            let reason = "sample columns differ".to_string();
            return Err(CohortError::InputChanged { path, line: reader.line(), reason }).with_loc(loc_msg)
        }

        let mut writer = VcfWriter::new(file.writer(options.compression_threads)?, cohort.samples.clone(), options.recompute_info);
        writer.write_header(reader.header()).map_err(WriterError::IOError).with_loc(loc_msg)?;

        let spinner = Logger::spinner(format!("Writing {}", destination.display()));
        let mut row = 0;
        loop {
            cancel.check().with_loc(loc_msg)?;
            let mismatch = {
                let Some(fields) = reader.next_raw_record().with_loc(loc_msg)? else { break };
                let mismatch = Self::check_record(&fields, self.matrix.variants().get(row));
                if mismatch.is_none() && cohort.variants.contains(row) {
                    writer.write_record(&fields).map_err(WriterError::IOError).with_loc(loc_msg)?;
                }
                mismatch
            };
            if let Some(reason) = mismatch {
                return Err(CohortError::InputChanged { path, line: reader.line(), reason }).with_loc(loc_msg)
            }
            row += 1;
            spinner.inc(1);
        }
        spinner.finish_and_clear();

        if row != self.matrix.n_variants() {
            return Err(CohortError::RecordCount { path, expected: self.matrix.n_variants(), found: row }).with_loc(loc_msg)
        }
        debug!("Staged {} out of {row} records into '{}'", writer.records(), destination.display());
        writer.into_inner().finish().with_loc(loc_msg)?;
        Ok(file)
    }

    /// Stage the catalog header and the rows of the retained samples at `destination`, byte for byte.
    pub fn write_metadata(&self, cohort: &FilteredCohort, destination: &Path, options: &WriteOptions) -> Result<AtomicFile> {
        let loc_msg = || format!("While writing filtered metadata table '{}'", destination.display());
        let file = AtomicFile::new(destination, options.overwrite).with_loc(loc_msg)?;
        let mut writer = file.writer(options.compression_threads)?;
        let retained: AHashSet<&str> = cohort.sample_ids().collect();
        let rows = self.catalog.write_subset(&mut writer, |id| retained.contains(id))
            .map_err(WriterError::IOError)
            .with_loc(loc_msg)?;
        writer.finish().with_loc(loc_msg)?;
        debug!("Staged {rows} metadata rows into '{}'", destination.display());
        Ok(file)
    }

    /// Reason why a raw record does not match the variant loaded at the same row, if any.
    fn check_record(fields: &[&str], variant: Option<&Variant>) -> Option<String> {
        let Some(variant) = variant else {
            return Some("record absent from the genotype matrix".to_string())
        };
        let chrom = fields.first().copied().unwrap_or_default();
        let pos   = fields.get(1).copied().unwrap_or_default();
        let same_position = pos.parse::<u32>().ok() == Some(u32::from(variant.coordinate.position));
        if chrom != variant.coordinate.contig.as_str() || !same_position {
            return Some(format!("expected {}, found {chrom}:{pos}", variant.coordinate))
        }
        None
    }
}
