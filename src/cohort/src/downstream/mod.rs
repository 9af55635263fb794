use std::path::PathBuf;

use anyhow::Result;
use log::{error, info};

/// Files written by a successful run, handed to every downstream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortArtifacts {
    pub vcf     : PathBuf,
    pub metadata: PathBuf,
    pub excluded: PathBuf,
    pub manifest: PathBuf,
    pub samples : usize,
    pub variants: usize,
}

/// An independent analysis consuming the filtered cohort (selection scans, SFS, diversity, ...).
/// Implementors must treat the artifacts as read-only.
#[cfg_attr(test, mockall::automock)]
pub trait DownstreamAdapter {
    fn name(&self) -> String;
    fn consume(&self, artifacts: &CohortArtifacts) -> Result<()>;
}

/// Outcome of a single downstream adapter.
#[derive(Debug)]
pub struct AdapterReport {
    pub adapter: String,
    pub result : Result<()>,
}

/// Call every adapter with the written artifacts. A failing adapter does not prevent the others from running.
pub fn fan_out(adapters: &[Box<dyn DownstreamAdapter>], artifacts: &CohortArtifacts) -> Vec<AdapterReport> {
    adapters.iter()
        .map(|adapter| {
            let name = adapter.name();
            info!("Running downstream analysis '{name}'");
            let result = adapter.consume(artifacts);
            if let Err(e) = &result {
                error!("Downstream analysis '{name}' failed: {e:?}");
            }
            AdapterReport { adapter: name, result }
        })
        .collect()
}
