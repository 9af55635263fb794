use std::path::Path;

use cohort_io::{
    CancelToken,
    fs::maybe_to_str,
    read::{RelatednessReader, RelatednessTable, SampleCatalog, VcfReader, load_matrix},
    write::{AtomicFile, TableWriter, commit_all},
};
use genome::GenotypeMatrix;
use located_error::prelude::*;
use log::{debug, info};
use logger::Logger;
use qc::QualityMissingnessFilter;
use relatedness::{RelatednessFilter, king_robust};

use crate::{
    CohortAssembler,
    downstream::{AdapterReport, CohortArtifacts, DownstreamAdapter, fan_out},
    report::{EXCLUDED_HEADER, ExcludedSample, Manifest},
};

mod config;
pub use config::{OutputPaths, PipelineConfig, RelatednessSource};

mod error;
pub use error::{PipelineError, StageFailure};

mod stage;
pub use stage::{Stage, StageCounts, StageTracker};

/// Result of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    pub artifacts: CohortArtifacts,
    pub manifest : Manifest,
    pub excluded : Vec<ExcludedSample>,
    /// One report per registered downstream adapter.
    pub adapters : Vec<AdapterReport>,
}

/// Filtering pipeline: `Loaded -> RelatednessFiltered -> QualityFiltered -> MissingnessConverged -> Assembled -> Written`.
///
/// Stages run strictly in order, and are never retried. Any error is wrapped within a [`StageFailure`]
/// naming the stage that could not be reached. Outputs are only committed once every one of them was
/// fully written, so that a failed run never leaves a partial cohort behind.
pub struct Pipeline {
    config  : PipelineConfig,
    cancel  : CancelToken,
    adapters: Vec<Box<dyn DownstreamAdapter>>,
    tracker : StageTracker,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, cancel: CancelToken::new(), adapters: Vec::new(), tracker: StageTracker::default() }
    }

    /// Share an externally owned cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Register a downstream consumer, called once the cohort is written.
    pub fn register(&mut self, adapter: Box<dyn DownstreamAdapter>) {
        self.adapters.push(adapter);
    }

    /// Last stage reached by the current (or last) run.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        self.tracker.current()
    }

    #[must_use]
    pub fn history(&self) -> &[StageCounts] {
        self.tracker.history()
    }

    /// Run every stage from scratch, then fan the written cohort out to the registered adapters.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.tracker = StageTracker::default();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(PipelineError::BuildThreadPool)
            .loc("While setting up the pipeline")?;
        debug!("Running pipeline on {} threads", pool.current_num_threads());

        let (config, cancel, tracker) = (&self.config, &self.cancel, &mut self.tracker);
        let (artifacts, manifest, excluded) = pool.install(|| execute(config, cancel, tracker))?;
        let adapters = self.fan_out(&artifacts);
        Ok(RunSummary { artifacts, manifest, excluded, adapters })
    }

    /// Hand the written artifacts to every registered adapter.
    #[must_use]
    pub fn fan_out(&self, artifacts: &CohortArtifacts) -> Vec<AdapterReport> {
        fan_out(&self.adapters, artifacts)
    }
}

/// Run `f`, and attach the stage it was attempting to reach to any error.
fn attempt<T, F>(stage: Stage, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>
{
    info!("Running stage: {stage}");
    f().with_context(|| StageFailure(stage))
}

fn execute(config: &PipelineConfig, cancel: &CancelToken, tracker: &mut StageTracker) -> Result<(CohortArtifacts, Manifest, Vec<ExcludedSample>)> {
    let mut excluded = Vec::new();

    // ---- Loaded
    let (matrix, catalog) = attempt(Stage::Loaded, || load(config, cancel))?;
    let all_samples = matrix.all_samples();
    tracker.reach(Stage::Loaded, matrix.n_samples(), matrix.n_variants())?;

    // ---- RelatednessFiltered
    let related = attempt(Stage::RelatednessFiltered, || {
        let table = relatedness_table(config, &matrix)?;
        let call_rates = matrix.call_rates();
        RelatednessFilter::new(config.max_relatedness, config.strategy, config.retention_policy)?
            .apply(matrix.samples(), &all_samples, &call_rates, table.pairs())
    })?;
    excluded.extend(related.excluded.iter().map(|exclusion| {
        let reason = format!("related to {} (coefficient {:.4})", exclusion.kept, exclusion.coefficient);
        ExcludedSample::new(&exclusion.sample, Stage::RelatednessFiltered, reason)
    }));
    tracker.reach(Stage::RelatednessFiltered, related.retained.count(), matrix.n_variants())?;

    // ---- QualityFiltered
    let qc = attempt(Stage::QualityFiltered, || QualityMissingnessFilter::new(config.thresholds))?;
    let quality = qc.quality(&matrix);
    tracker.reach(Stage::QualityFiltered, related.retained.count(), quality.count())?;

    // ---- MissingnessConverged
    let converged = attempt(Stage::MissingnessConverged, || qc.converge(&matrix, &quality, &related.retained, cancel))?;
    let threshold = config.thresholds.max_sample_missingness.unwrap_or(1.0);
    excluded.extend(converged.dropped_samples.iter().filter_map(|drop| {
        let sample = matrix.samples().get(drop.column)?;
        let reason = format!("missingness {:.4} above {threshold} (pass {})", drop.missingness, drop.pass);
        Some(ExcludedSample::new(sample, Stage::MissingnessConverged, reason))
    }));
    tracker.reach(Stage::MissingnessConverged, converged.samples.count(), converged.variants.count())?;

    // ---- Assembled
    let assembler = CohortAssembler::new(&matrix, &catalog, &config.vcf);
    let cohort = attempt(Stage::Assembled, || assembler.assemble(&converged.variants, &converged.samples, config.strict_catalog))?;
    excluded.extend(cohort.unmatched_catalog.iter().map(|id| ExcludedSample::new(id, Stage::Assembled, "absent from the VCF")));
    tracker.reach(Stage::Assembled, cohort.n_samples(), cohort.n_variants())?;

    // ---- Written
    let outputs = &config.outputs;
    let mut stages = tracker.history().to_vec();
    stages.push(StageCounts { stage: Stage::Written, samples: cohort.n_samples(), variants: cohort.n_variants() });
    let manifest = Manifest::new(config, &stages, &converged.passes, excluded.len());
    attempt(Stage::Written, || {
        let staged = vec![
            assembler.write_vcf(&cohort, &outputs.vcf, &config.write, cancel)?,
            assembler.write_metadata(&cohort, &outputs.metadata, &config.write)?,
            write_excluded(&excluded, &outputs.excluded, config.write.overwrite)?,
            write_manifest(&manifest, &outputs.manifest, config.write.overwrite)?,
        ];
        cancel.check().loc("While committing output files")?;
        commit_all(staged)
    })?;
    tracker.reach(Stage::Written, cohort.n_samples(), cohort.n_variants())?;
    info!("Wrote a cohort of {} samples and {} variants into '{}'", cohort.n_samples(), cohort.n_variants(), outputs.vcf.display());

    let artifacts = CohortArtifacts {
        vcf     : outputs.vcf.clone(),
        metadata: outputs.metadata.clone(),
        excluded: outputs.excluded.clone(),
        manifest: outputs.manifest.clone(),
        samples : cohort.n_samples(),
        variants: cohort.n_variants(),
    };
    Ok((artifacts, manifest, excluded))
}

fn load(config: &PipelineConfig, cancel: &CancelToken) -> Result<(GenotypeMatrix, SampleCatalog)> {
    let spinner = Logger::spinner(format!("Loading {}", maybe_to_str(&config.vcf)?));
    let mut reader = VcfReader::new(&config.vcf, config.write.decompression_threads)?;
    let matrix = load_matrix(&mut reader, cancel)?;
    spinner.set_position(matrix.n_variants() as u64);
    spinner.finish_and_clear();
    info!("Loaded {} samples and {} variants from '{}'", matrix.n_samples(), matrix.n_variants(), config.vcf.display());

    let catalog = SampleCatalog::from_path(&config.metadata, config.metadata_delimiter)?;
    info!("Loaded {} metadata records from '{}'", catalog.len(), config.metadata.display());
    Ok((matrix, catalog))
}

fn relatedness_table(config: &PipelineConfig, matrix: &GenotypeMatrix) -> Result<RelatednessTable> {
    match &config.relatedness {
        RelatednessSource::Table { path, column } => RelatednessReader::from_path(path, column.as_deref()),
        RelatednessSource::Genotypes => {
            info!("Estimating pairwise relatedness from genotypes (KING-robust)");
            Ok(king_robust(matrix, &matrix.all_samples(), &matrix.all_variants()).into_iter().collect())
        },
    }
}

fn write_excluded(excluded: &[ExcludedSample], destination: &Path, overwrite: bool) -> Result<AtomicFile> {
    let file = AtomicFile::new(destination, overwrite)?;
    let mut table = TableWriter::new(file.writer(1)?);
    table.write_header(&EXCLUDED_HEADER)?;
    table.write_iter(excluded)?;
    table.into_inner().finish()?;
    Ok(file)
}

fn write_manifest(manifest: &Manifest, destination: &Path, overwrite: bool) -> Result<AtomicFile> {
    let file = AtomicFile::new(destination, overwrite)?;
    let mut writer = file.writer(1)?;
    serde_yaml::to_writer(&mut writer, manifest)
        .map_err(PipelineError::SerializeManifest)
        .with_loc(|| format!("While writing run manifest '{}'", destination.display()))?;
    writer.finish()?;
    Ok(file)
}
