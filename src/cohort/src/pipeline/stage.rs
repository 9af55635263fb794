use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Pipeline states, in the only order they can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Loaded,
    RelatednessFiltered,
    QualityFiltered,
    MissingnessConverged,
    Assembled,
    Written,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Self::Loaded,
        Self::RelatednessFiltered,
        Self::QualityFiltered,
        Self::MissingnessConverged,
        Self::Assembled,
        Self::Written,
    ];

    /// Stage following `self`, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        Self::ALL.iter().skip_while(|stage| *stage != self).nth(1).copied()
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded               => "loaded",
            Self::RelatednessFiltered  => "relatedness-filtered",
            Self::QualityFiltered      => "quality-filtered",
            Self::MissingnessConverged => "missingness-converged",
            Self::Assembled            => "assembled",
            Self::Written              => "written",
        };
        f.pad(name)
    }
}

/// Samples and variants retained once a stage was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub stage   : Stage,
    pub samples : usize,
    pub variants: usize,
}

/// Strictly linear record of the stages reached by a run.
#[derive(Debug, Clone, Default)]
pub struct StageTracker {
    history: Vec<StageCounts>,
}

impl StageTracker {
    #[must_use]
    pub fn current(&self) -> Option<Stage> {
        self.history.last().map(|counts| counts.stage)
    }

    /// The only stage that may be reached next.
    #[must_use]
    pub fn expected(&self) -> Option<Stage> {
        match self.current() {
            None        => Some(Stage::Loaded),
            Some(stage) => stage.next(),
        }
    }

    /// Record that `stage` was reached, with the given counts.
    /// # Errors
    /// if `stage` is not the stage following the current one.
    pub fn reach(&mut self, stage: Stage, samples: usize, variants: usize) -> Result<(), PipelineError> {
        if self.expected() != Some(stage) {
            return Err(PipelineError::InvalidTransition { from: self.current(), to: stage })
        }
        self.history.push(StageCounts { stage, samples, variants });
        Ok(())
    }

    #[must_use]
    pub fn history(&self) -> &[StageCounts] {
        &self.history
    }
}
