use std::path::{Path, PathBuf};

use cohort_io::fs::{file_stem, output_path};
use located_error::prelude::*;
use parser::{FilterArgs, InputArgs, OutputArgs};
use qc::QcThresholds;
use relatedness::{RetentionPolicy, Strategy};

use crate::WriteOptions;
use super::PipelineError;

/// Where relatedness coefficients come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatednessSource {
    /// Pairwise table. `column` overrides the coefficient column detection.
    Table { path: PathBuf, column: Option<String> },
    /// KING-robust estimates computed from the loaded genotypes.
    Genotypes,
}

/// Destination of every output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub vcf     : PathBuf,
    pub metadata: PathBuf,
    pub excluded: PathBuf,
    pub manifest: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<prefix>.vcf[.gz]`, `<dir>/<prefix>.<metadata extension>`, `<dir>/<prefix>.excluded.tsv`
    /// and `<dir>/<prefix>.manifest.yaml`. The VCF is compressed whenever the input is.
    #[must_use]
    pub fn with_prefix(dir: &Path, prefix: &str, vcf: &Path, metadata: &Path) -> Self {
        let vcf_suffix = match vcf.extension().and_then(|ext| ext.to_str()) {
            Some("gz" | "bgz") => "vcf.gz",
            _                  => "vcf",
        };
        let metadata_suffix = metadata.extension().and_then(|ext| ext.to_str()).unwrap_or("tsv");
        Self {
            vcf     : output_path(dir, prefix, vcf_suffix),
            metadata: output_path(dir, prefix, metadata_suffix),
            excluded: output_path(dir, prefix, "excluded.tsv"),
            manifest: output_path(dir, prefix, "manifest.yaml"),
        }
    }

    #[must_use]
    pub fn all(&self) -> [&Path; 4] {
        [&self.vcf, &self.metadata, &self.excluded, &self.manifest]
    }
}

/// Every parameter of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub vcf               : PathBuf,
    pub metadata          : PathBuf,
    pub metadata_delimiter: Option<u8>,
    pub relatedness       : RelatednessSource,
    pub max_relatedness   : f64,
    pub strategy          : Strategy,
    pub retention_policy  : RetentionPolicy,
    pub thresholds        : QcThresholds,
    pub strict_catalog    : bool,
    pub outputs           : OutputPaths,
    pub write             : WriteOptions,
    /// Size of the rayon thread pool. 0 uses every available core.
    pub threads           : usize,
}

impl PipelineConfig {
    /// Translate the `run` command line arguments.
    pub fn from_args(input: &InputArgs, filters: &FilterArgs, output: &OutputArgs) -> Result<Self> {
        let loc_msg = "While configuring the pipeline";
        let relatedness = match (&input.relatedness, input.relatedness_from_genotypes) {
            (Some(path), false) => RelatednessSource::Table { path: path.clone(), column: input.relatedness_column.clone() },
            (None, true)        => RelatednessSource::Genotypes,
            _                   => return Err(PipelineError::MissingRelatednessSource).loc(loc_msg),
        };

        let prefix = match &output.prefix {
            Some(prefix) => prefix.clone(),
            None         => file_stem(&input.vcf).loc(loc_msg)?,
        };
        let mut outputs = OutputPaths::with_prefix(&output.output_dir, &prefix, &input.vcf, &input.metadata);
        if let Some(vcf) = &output.out_vcf {
            outputs.vcf = vcf.clone();
        }
        if let Some(metadata) = &output.out_metadata {
            outputs.metadata = metadata.clone();
        }

        let strategy = match filters.relatedness_strategy {
            parser::RelatednessStrategy::Component => Strategy::Component,
            parser::RelatednessStrategy::Greedy    => Strategy::Greedy,
        };
        let retention_policy = match filters.retention_policy {
            parser::RetentionPolicy::CallRate    => RetentionPolicy::CallRate,
            parser::RetentionPolicy::Identifier  => RetentionPolicy::Identifier,
            parser::RetentionPolicy::ColumnOrder => RetentionPolicy::ColumnOrder,
        };

        Ok(Self {
            vcf               : input.vcf.clone(),
            metadata          : input.metadata.clone(),
            metadata_delimiter: input.metadata_delimiter.as_byte(),
            relatedness,
            max_relatedness   : filters.max_relatedness,
            strategy,
            retention_policy,
            thresholds: QcThresholds {
                min_quality            : filters.min_qual,
                max_variant_missingness: filters.max_variant_missingness,
                max_sample_missingness : filters.max_sample_missingness,
                max_iterations         : filters.max_iterations,
                require_pass           : filters.require_pass,
                biallelic_only         : filters.biallelic_only,
            },
            strict_catalog    : filters.strict_catalog,
            outputs,
            write: WriteOptions {
                recompute_info       : output.recompute_info,
                overwrite            : output.overwrite,
                decompression_threads: input.decompression_threads,
                compression_threads  : output.threads.max(1),
            },
            threads           : output.threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_paths() {
        let paths = OutputPaths::with_prefix(Path::new("out"), "1kg.chr22", Path::new("data/1kg.chr22.vcf.gz"), Path::new("data/samples.csv"));
        assert_eq!(paths.vcf, Path::new("out/1kg.chr22.vcf.gz"));
        assert_eq!(paths.metadata, Path::new("out/1kg.chr22.csv"));
        assert_eq!(paths.excluded, Path::new("out/1kg.chr22.excluded.tsv"));
        assert_eq!(paths.manifest, Path::new("out/1kg.chr22.manifest.yaml"));

        let plain = OutputPaths::with_prefix(Path::new("out"), "calls", Path::new("calls.vcf"), Path::new("samples"));
        assert_eq!(plain.vcf, Path::new("out/calls.vcf"));
        assert_eq!(plain.metadata, Path::new("out/calls.tsv"));
    }
}
