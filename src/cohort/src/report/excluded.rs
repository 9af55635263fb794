use std::fmt::{self, Display, Formatter};

use cohort_io::write::table::WRITER_SEPARATOR;

use crate::Stage;

pub const EXCLUDED_HEADER: [&str; 3] = ["sample", "stage", "reason"];

/// One line of the `<prefix>.excluded.tsv` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedSample {
    pub sample: String,
    /// First stage the sample did not reach.
    pub stage : Stage,
    pub reason: String,
}

impl ExcludedSample {
    pub fn new(sample: impl Into<String>, stage: Stage, reason: impl Into<String>) -> Self {
        Self { sample: sample.into(), stage, reason: reason.into() }
    }
}

impl Display for ExcludedSample {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{WRITER_SEPARATOR}{}{WRITER_SEPARATOR}{}", self.sample, self.stage, self.reason)
    }
}
