pub mod assembler;
pub use assembler::{CohortAssembler, CohortError, FilteredCohort, IntegrityError, WriteOptions};

pub mod pipeline;
pub use pipeline::{OutputPaths, Pipeline, PipelineConfig, PipelineError, RelatednessSource, RunSummary, Stage, StageFailure};

pub mod downstream;
pub use downstream::{AdapterReport, CohortArtifacts, DownstreamAdapter, fan_out};

pub mod report;
pub use report::{ExcludedSample, Manifest};
