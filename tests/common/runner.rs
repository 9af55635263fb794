use std::path::PathBuf;

use clap::Parser;

use super::Fixture;

/// Builds and runs a `cohort-rs run` command line over copies of the test-data files.
pub struct CohortRunner {
    vcf        : Fixture,
    metadata   : Fixture,
    relatedness: Option<Fixture>,
    output_dir : Fixture,
    prefix     : String,
    args       : Vec<String>,
}

impl CohortRunner {
    pub const PREFIX: &'static str = "filtered";

    /// Default cohort: `cohort/cohort.vcf`, `cohort/samples.tsv` and `cohort/cohort.relatedness2`.
    pub fn new() -> Self {
        Self {
            vcf        : Fixture::copy("cohort/cohort.vcf"),
            metadata   : Fixture::copy("cohort/samples.tsv"),
            relatedness: Some(Fixture::copy("cohort/cohort.relatedness2")),
            output_dir : Fixture::blank("cohort-output"),
            prefix     : Self::PREFIX.to_string(),
            args       : Vec::new(),
        }
    }

    pub fn metadata(mut self, metadata: Fixture) -> Self {
        self.metadata = metadata;
        self
    }

    /// Estimate relatedness from genotypes instead of reading the relatedness table.
    pub fn from_genotypes(mut self) -> Self {
        self.relatedness = None;
        self
    }

    /// Append raw arguments, e.g. `arg("--max-sample-missingness 0.3")`.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.extend(arg.split_whitespace().map(ToString::to_string));
        self
    }

    /// Thresholds used by the reference outputs of `cohort/expect`.
    pub fn reference_thresholds(self) -> Self {
        self.arg("--max-variant-missingness 0.25 --max-sample-missingness 0.3")
    }

    pub fn command_line(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "cohort-rs".into(), "run".into(),
            "--vcf".into(), self.vcf.to_string(),
            "--metadata".into(), self.metadata.to_string(),
            "--output-dir".into(), self.output_dir.to_string(),
            "--prefix".into(), self.prefix.clone(),
        ];
        match &self.relatedness {
            Some(table) => args.extend(["--relatedness".into(), table.to_string()]),
            None        => args.push("--relatedness-from-genotypes".into()),
        }
        args.extend(self.args.iter().cloned());
        args
    }

    pub fn cli(&self) -> parser::Cli {
        parser::Cli::parse_from(self.command_line())
    }

    pub fn run(&self) -> anyhow::Result<()> {
        cohort_rs::run(self.cli())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.to_path_buf()
    }

    pub fn output(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{suffix}", self.prefix))
    }

    pub fn output_vcf(&self) -> PathBuf {
        self.output("vcf")
    }

    pub fn output_metadata(&self) -> PathBuf {
        self.output("tsv")
    }

    pub fn output_excluded(&self) -> PathBuf {
        self.output("excluded.tsv")
    }

    pub fn output_manifest(&self) -> PathBuf {
        self.output("manifest.yaml")
    }

    /// Every default output file, in the order they are written.
    pub fn outputs(&self) -> [PathBuf; 4] {
        [self.output_vcf(), self.output_metadata(), self.output_excluded(), self.output_manifest()]
    }
}
