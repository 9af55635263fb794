use std::path::PathBuf;

use qc::PassSummary;
use serde::{Deserialize, Serialize};

use crate::{PipelineConfig, RelatednessSource, pipeline::StageCounts};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestInputs {
    pub vcf        : PathBuf,
    pub metadata   : PathBuf,
    /// Path of the relatedness table, or `genotypes` for KING-robust estimates.
    pub relatedness: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestThresholds {
    pub max_relatedness        : f64,
    pub relatedness_strategy   : String,
    pub retention_policy       : String,
    pub min_quality            : f64,
    pub max_variant_missingness: f64,
    pub max_sample_missingness : Option<f64>,
    pub max_iterations         : usize,
    pub require_pass           : bool,
    pub biallelic_only         : bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestOutputs {
    pub vcf     : PathBuf,
    pub metadata: PathBuf,
    pub excluded: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassCounts {
    pub pass    : usize,
    pub samples : usize,
    pub variants: usize,
}

impl From<&PassSummary> for PassCounts {
    fn from(summary: &PassSummary) -> Self {
        Self { pass: summary.pass, samples: summary.samples, variants: summary.variants }
    }
}

/// Summary of a run, serialized as `<prefix>.manifest.yaml`.
/// Contains no timestamp: identical inputs and parameters yield identical manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub inputs          : ManifestInputs,
    pub thresholds      : ManifestThresholds,
    pub stages          : Vec<StageCounts>,
    pub missingness_passes: Vec<PassCounts>,
    pub excluded_samples: usize,
    pub outputs         : ManifestOutputs,
}

impl Manifest {
    #[must_use]
    pub fn new(config: &PipelineConfig, stages: &[StageCounts], passes: &[PassSummary], excluded_samples: usize) -> Self {
        let relatedness = match &config.relatedness {
            RelatednessSource::Table { path, .. } => path.display().to_string(),
            RelatednessSource::Genotypes          => "genotypes".to_string(),
        };
        let thresholds = &config.thresholds;
        Self {
            inputs: ManifestInputs { vcf: config.vcf.clone(), metadata: config.metadata.clone(), relatedness },
            thresholds: ManifestThresholds {
                max_relatedness        : config.max_relatedness,
                relatedness_strategy   : config.strategy.to_string(),
                retention_policy       : config.retention_policy.to_string(),
                min_quality            : thresholds.min_quality,
                max_variant_missingness: thresholds.max_variant_missingness,
                max_sample_missingness : thresholds.max_sample_missingness,
                max_iterations         : thresholds.max_iterations,
                require_pass           : thresholds.require_pass,
                biallelic_only         : thresholds.biallelic_only,
            },
            stages: stages.to_vec(),
            missingness_passes: passes.iter().map(PassCounts::from).collect(),
            excluded_samples,
            outputs: ManifestOutputs {
                vcf     : config.outputs.vcf.clone(),
                metadata: config.outputs.metadata.clone(),
                excluded: config.outputs.excluded.clone(),
            },
        }
    }
}
