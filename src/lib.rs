use anyhow::Result;
use log::info;
use parser::{Cli, Commands};
use cohort::{Pipeline, PipelineConfig, RunSummary};

/// Log a one-line summary of every stage, followed by the output files.
fn report(summary: &RunSummary) {
    for counts in &summary.manifest.stages {
        info!("{:<22} {:>8} samples {:>10} variants", counts.stage, counts.samples, counts.variants);
    }
    info!("{} samples were excluded. See '{}'", summary.excluded.len(), summary.artifacts.excluded.display());
    info!("Run manifest: '{}'", summary.artifacts.manifest.display());
}

/// Unpack the command line and run the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        Commands::Run { input, filters, output } => {
            let config = PipelineConfig::from_args(&input, &filters, &output)?;
            let summary = Pipeline::new(config).run()?;
            report(&summary);
        },

        Commands::FromYaml { yaml } => {
            info!("Replaying run from '{}'", yaml.display());
            let cli = Cli::deserialize(&yaml)?;
            logger::Logger::set_level(cli.verbosity());
            if let Some(path) = cli.serialize()? {
                info!("Serialized replayed arguments into '{}'", path.display());
            }
            self::run(cli)?;
        },
    };
    Ok(())
}
