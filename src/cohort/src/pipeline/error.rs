use thiserror::Error;

use super::Stage;

/// Context attached to any error raised while trying to reach a pipeline stage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Pipeline failed before reaching stage '{0}'")]
pub struct StageFailure(pub Stage);

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid stage transition: {} -> {to}", from.map_or_else(|| "start".to_string(), |stage| stage.to_string()))]
    InvalidTransition { from: Option<Stage>, to: Stage },

    #[error("Failed to instantiate threadpool")]
    BuildThreadPool(#[source] rayon::ThreadPoolBuildError),

    #[error("A relatedness source is required: either a relatedness table, or genotype-derived estimates")]
    MissingRelatednessSource,

    #[error("Failed to serialize run manifest")]
    SerializeManifest(#[source] serde_yaml::Error),
}
