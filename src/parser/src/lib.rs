use std::{
    ffi::OsStr,
    fmt::{self, Display, Formatter},
    fs::File,
    path::{Path, PathBuf},
};

use located_error::prelude::*;

use clap::{ArgEnum, ArgGroup, Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[clap(name="cohort-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// cohort-rs: filter multi-sample genotype calls into an analysis-ready cohort
pub struct Cli {
    ///Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use The --quiet/-q to disable them. The COHORT_LOG environment variable may be used to
    /// set finer grained, per-module filters (same syntax as RUST_LOG).
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emmited and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Logger verbosity: `0` (errors only) when `--quiet`, warnings and above otherwise.
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        if self.quiet { 0 } else { self.verbose.saturating_add(1) }
    }

    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-run.yaml'. current time follows the format
    ///   `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    /// - Nothing is written when replaying a previous run with `from-yaml`.
    ///
    /// Returns the path of the serialized file, if any.
    pub fn serialize(&self) -> Result<Option<PathBuf>> {
        let output_dir = match &self.commands {
            Commands::Run { output, .. } => &output.output_dir,
            Commands::FromYaml { .. }    => return Ok(None),
        };

        // Parse arguments to yaml and print to console.
        let serialized = serde_yaml::to_string(&self)
            .map_err(ParserError::Serialize)
            .loc("While serializing command line arguments")?;
        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let output_file = output_dir.join(format!("{current_time}-run.yaml"));
        std::fs::write(&output_file, serialized)
            .map_err(|source| ParserError::WriteArgs { path: output_file.clone(), source })
            .loc("While serializing command line arguments")?;
        Ok(Some(output_file))
    }

    /// Deserialize a `.yaml` file into Command line arguments.
    pub fn deserialize(yaml: &Path) -> Result<Self> {
        let file = File::open(yaml)
            .map_err(|source| ParserError::OpenYaml { path: yaml.to_path_buf(), source })
            .loc("While replaying a previous run")?;
        serde_yaml::from_reader(file)
            .map_err(|source| ParserError::Deserialize { path: yaml.to_path_buf(), source })
            .loc("While replaying a previous run")
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Commands {
    /// Filter a multi-sample VCF and its metadata table into an analysis-ready cohort.
    ///
    /// Stages are applied in a fixed order: duplicate/relatedness removal, variant quality filtering,
    /// then variant and sample missingness filtering until the retained sets stop changing. The
    /// filtered VCF and metadata table are only committed once every stage succeeded.
    Run {
        #[clap(flatten)]
        input: InputArgs,
        #[clap(flatten)]
        filters: FilterArgs,
        #[clap(flatten)]
        output: OutputArgs,
    },

    /// Run cohort-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a cohort-rs command using the exact same parameters
    /// and arguments.
    FromYaml {
        yaml: PathBuf,
    },
}

/// Input files.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[clap(group(ArgGroup::new("relatedness-source").required(true).args(&["relatedness", "relatedness-from-genotypes"])))]
pub struct InputArgs {
    /// Input multi-sample VCF file.
    ///
    /// Accepted formats: plain text '.vcf', or BGZF-compressed '.vcf.gz' / '.vcf.bgz'
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub vcf: PathBuf,

    /// Per-sample metadata table.
    ///
    /// The header must provide the columns 'id pop pop2 Con lat lon loc' (case-insensitive). Additional
    /// columns are allowed, and copied as-is to the filtered table.
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub metadata: PathBuf,

    /// Field delimiter of the metadata table.
    ///
    /// 'auto' infers the delimiter from the file extension: '.csv' is comma-separated, while '.tsv',
    /// '.txt', '.panel' and '.meta' are tab-separated.
    #[clap(long, arg_enum, default_value("auto"))]
    pub metadata_delimiter: MetadataDelimiter,

    /// Precomputed pairwise relatedness table.
    ///
    /// Whitespace-separated, with an optional header. The outputs of 'vcftools --relatedness2',
    /// 'plink --genome' and KING ('.kin0') are accepted as-is. Header-less files must provide
    /// three columns: '<id1> <id2> <coefficient>'
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub relatedness: Option<PathBuf>,

    /// Estimate pairwise relatedness from the input genotypes (KING-robust), instead of reading a table.
    ///
    /// Estimates are reported on the relatedness scale (twice the kinship coefficient): duplicates
    /// score ~1.0, first degree relatives ~0.5.
    #[clap(long)]
    pub relatedness_from_genotypes: bool,

    /// Name of the coefficient column within the --relatedness table.
    ///
    /// By default, the first column among 'RELATEDNESS PI_HAT KINSHIP RELATEDNESS_PHI COEFFICIENT'
    /// is used.
    #[clap(long)]
    pub relatedness_column: Option<String>,

    /// Number of additional parallel decompression threads.
    ///
    /// Can increase performance when working with BGZF compressed .vcf.gz files. Note that this
    /// parameter has no effect when working with uncompressed .vcf files.
    #[clap(short='#', long, default_value("0"))]
    pub decompression_threads: usize,
}

/// Filtering thresholds.
#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterArgs {
    /// Samples related above this coefficient are pruned (strictly greater than).
    ///
    /// The threshold applies on the scale of the relatedness source. The default of 0.354 excludes
    /// duplicates and first degree relatives on the relatedness scale.
    #[clap(long, default_value("0.354"), parse(try_from_str=parse_threshold))]
    pub max_relatedness: f64,

    /// Pruning strategy of the relatedness graph.
    ///
    /// component: retain exactly one sample per group of related individuals.{n}
    /// greedy: retain as many samples as possible, as long as no two retained samples are related.
    #[clap(long, arg_enum, default_value("component"))]
    pub relatedness_strategy: RelatednessStrategy,

    /// Which sample to retain among related individuals.
    ///
    /// call-rate: highest fraction of called genotypes, ties broken by identifier.{n}
    /// identifier: lowest sample identifier (lexicographic order).{n}
    /// column-order: leftmost sample of the VCF.
    #[clap(long, arg_enum, default_value("call-rate"))]
    pub retention_policy: RetentionPolicy,

    /// Minimal variant quality (QUAL column, inclusive).
    ///
    /// Variants with a missing QUAL are only retained when this threshold is 0 or lower.
    #[clap(short='M', long, default_value("30"), parse(try_from_str=parse_threshold))]
    pub min_qual: f64,

    /// Maximal fraction of missing genotypes per variant (inclusive).
    ///
    /// Computed over the samples retained at each pass.
    #[clap(long, default_value("0.1"), parse(try_from_str=parse_fraction))]
    pub max_variant_missingness: f64,

    /// Maximal fraction of missing genotypes per sample (inclusive).
    ///
    /// When set, samples and variants are filtered alternatively until both sets stabilize.
    #[clap(long, parse(try_from_str=parse_fraction))]
    pub max_sample_missingness: Option<f64>,

    /// Maximal number of missingness filtering passes before giving up.
    #[clap(long, default_value("10"), parse(try_from_str=parse_iterations))]
    pub max_iterations: usize,

    /// Only keep variants whose FILTER column is 'PASS' or '.'
    #[clap(long)]
    pub require_pass: bool,

    /// Only keep variants carrying a single alternate allele.
    #[clap(long)]
    pub biallelic_only: bool,

    /// Fail if the metadata table lists samples that are absent from the VCF.
    ///
    /// By default, such rows are excluded from the output table with a warning.
    #[clap(long)]
    pub strict_catalog: bool,
}

/// Output files.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputArgs {
    /// Output directory where results will be written.
    ///
    /// Note that cohort-rs will create the specified leaf directory if it is not present, but does not
    /// allow itself from creating parent directories.
    #[clap(short, long, default_value("cohort-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Prefix of every output file. Defaults to the file stem of the input VCF.
    #[clap(long)]
    pub prefix: Option<String>,

    /// Path of the filtered VCF. Defaults to '<output-dir>/<prefix>.vcf', or '<output-dir>/<prefix>.vcf.gz'
    /// when the input VCF is compressed.
    ///
    /// The output is BGZF-compressed whenever this path ends with '.gz' or '.bgz'.
    #[clap(long)]
    pub out_vcf: Option<PathBuf>,

    /// Path of the filtered metadata table. Defaults to '<output-dir>/<prefix>.<metadata extension>'
    #[clap(long)]
    pub out_metadata: Option<PathBuf>,

    /// Recompute the AC and AN INFO tags over the retained samples.
    ///
    /// Only tags that are already present are rewritten. The rest of the INFO column is left untouched.
    #[clap(long)]
    pub recompute_info: bool,

    /// Overwrite existing output files.
    ///
    /// By default, cohort-rs does not allow itself from overwriting existing results files. Use this flag
    /// to force this behaviour.
    #[clap(short='w', long)]
    pub overwrite: bool,

    /// Number of worker threads. 0 uses every available core.
    #[clap(short='@', long, default_value("0"))]
    pub threads: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ArgEnum, Serialize, Deserialize)]
pub enum RelatednessStrategy {
    #[default]
    Component,
    Greedy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ArgEnum, Serialize, Deserialize)]
pub enum RetentionPolicy {
    #[default]
    CallRate,
    Identifier,
    ColumnOrder,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ArgEnum, Serialize, Deserialize)]
pub enum MetadataDelimiter {
    #[default]
    Auto,
    Tab,
    Comma,
    Semicolon,
}

impl MetadataDelimiter {
    /// Delimiter byte. `None` when it should be inferred from the file extension.
    #[must_use]
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Self::Auto      => None,
            Self::Tab       => Some(b'\t'),
            Self::Comma     => Some(b','),
            Self::Semicolon => Some(b';'),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(&self, path: &Path) -> Result<(), ParserError> {
        use ParserError::InvalidFileEntity;
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir()
        };

        if valid {
            Ok(())
        } else {
            Err(InvalidFileEntity(*self, path.display().to_string()))
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: &FileEntity) -> Result<()> {
    use ParserError::MissingFileEntity;
    let path = Path::new(s);
    if ! path.exists() {
        return Err(MissingFileEntity(*entity, path.display().to_string()))
            .loc("While parsing arguments.")
    }

    entity.validate(path).loc("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, &FileEntity::File)
        .loc("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    if ! Path::new(s).exists() {
        std::fs::create_dir(s)?;
    }
    assert_filesystem_entity_is_valid(s, &FileEntity::Directory)
        .loc("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}

fn parse_threshold(s: &str) -> Result<f64> {
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParserError::ParseThreshold(s.to_string())).loc("While parsing arguments."),
    }
}

/// Parse a fraction within the `[0, 1]` range (inclusive).
fn parse_fraction(s: &str) -> Result<f64> {
    match s.parse::<f64>() {
        Ok(value) if (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(ParserError::ParseFraction(s.to_string())).loc("While parsing arguments."),
    }
}

fn parse_iterations(s: &str) -> Result<usize> {
    let iterations = s.parse::<usize>().with_loc(|| format!("While parsing --max-iterations {s}"))?;
    if iterations == 0 {
        return Err(ParserError::InvalidIterations).loc("While parsing arguments.")
    }
    Ok(iterations)
}
