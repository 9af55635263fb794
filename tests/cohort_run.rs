mod common;
use common::{CohortRunner, Fixture};

use cohort::{CohortError, IntegrityError, Manifest, Stage, StageFailure};
use cohort_io::{CancelToken, read::{VcfReader, load_matrix}};
#[cfg(test)] use pretty_assertions::assert_eq;

fn read_manifest(runner: &CohortRunner) -> Manifest {
    let file = std::fs::File::open(runner.output_manifest()).expect("manifest should exist");
    serde_yaml::from_reader(file).expect("valid manifest")
}

fn excluded_samples(runner: &CohortRunner) -> Vec<(String, String)> {
    std::fs::read_to_string(runner.output_excluded()).expect("excluded report should exist")
        .lines()
        .skip(1)
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            (fields[0].to_string(), fields[1].to_string())
        })
        .collect()
}

#[test]
fn run_matches_reference_outputs() {
    let runner = CohortRunner::new().reference_thresholds();
    runner.run().expect("run should succeed");

    validate_file!("cohort/expect/filtered.vcf", runner.output_vcf());
    validate_file!("cohort/expect/filtered.tsv", runner.output_metadata());
    validate_file!("cohort/expect/filtered.excluded.tsv", runner.output_excluded());

    let manifest = read_manifest(&runner);
    let counts: Vec<(Stage, usize, usize)> = manifest.stages.iter().map(|c| (c.stage, c.samples, c.variants)).collect();
    assert_eq!(counts, [
        (Stage::Loaded,               6, 8),
        (Stage::RelatednessFiltered,  4, 8),
        (Stage::QualityFiltered,      4, 6),
        (Stage::MissingnessConverged, 3, 5),
        (Stage::Assembled,            3, 5),
        (Stage::Written,              3, 5),
    ]);
    assert_eq!(manifest.missingness_passes.len(), 2);
    assert_eq!(manifest.excluded_samples, 4);
    assert_eq!(manifest.thresholds.max_sample_missingness, Some(0.3));
    assert_eq!(manifest.thresholds.relatedness_strategy, "component");
}

#[test]
fn run_without_sample_threshold_is_a_single_pass() {
    let runner = CohortRunner::new();
    runner.run().expect("run should succeed");

    let manifest = read_manifest(&runner);
    assert_eq!(manifest.missingness_passes.len(), 1);
    // Default 0.1 variant threshold: 2:500, 2:900 and X:100 miss at least one of 4 calls.
    let converged = manifest.stages.iter().find(|c| c.stage == Stage::MissingnessConverged).expect("stage reached");
    assert_eq!((converged.samples, converged.variants), (4, 3));
}

#[test]
fn recompute_info() {
    let runner = CohortRunner::new().reference_thresholds().arg("--recompute-info");
    runner.run().expect("run should succeed");

    let vcf = std::fs::read_to_string(runner.output_vcf()).expect("output vcf");
    let info: Vec<&str> = vcf.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split('\t').nth(7))
        .collect();
    assert_eq!(info, [
        "AC=3;AN=6;DP=61",
        "AC=4;AN=6;DP=38",
        "AC=2,2;AN=6;DP=72",
        "AC=1;AN=6;DP=20",
        "AC=3;AN=6;DP=55",
    ]);
}

#[test]
fn bgzf_output() {
    let output_dir = Fixture::blank("bgzf-output");
    std::fs::create_dir(&*output_dir).expect("create output dir");
    let vcf = output_dir.join("cohort.vcf.gz");
    let runner = CohortRunner::new().reference_thresholds().arg(&format!("--out-vcf {} --threads 2", vcf.display()));
    runner.run().expect("run should succeed");
    assert!(!runner.output_vcf().exists());

    let mut reader = VcfReader::new(&vcf, 0).expect("readable bgzf output");
    assert_eq!(reader.samples(), ["HG01", "HG03", "HG05"]);
    let matrix = load_matrix(&mut reader, &CancelToken::new()).expect("valid records");
    assert_eq!(matrix.n_variants(), 5);
}

#[test]
fn replay_from_yaml() {
    let runner = CohortRunner::new().reference_thresholds();
    let cli = runner.cli();
    let yaml = cli.serialize().expect("serializable arguments").expect("run commands are serialized");
    cohort_rs::run(cli).expect("run should succeed");
    let first: Vec<Vec<u8>> = runner.outputs().iter().map(|path| std::fs::read(path).expect("output")).collect();

    for output in runner.outputs() {
        std::fs::remove_file(output).expect("remove output");
    }
    let replay = <parser::Cli as clap::Parser>::parse_from(["cohort-rs", "from-yaml", yaml.to_str().expect("utf8 path")]);
    cohort_rs::run(replay).expect("replay should succeed");
    let second: Vec<Vec<u8>> = runner.outputs().iter().map(|path| std::fs::read(path).expect("output")).collect();
    assert_eq!(first, second);
}

#[test]
fn missing_metadata_fails_without_output() {
    let samples = std::fs::read_to_string(Fixture::copy("cohort/samples.tsv").to_path_buf()).expect("samples");
    let without_hg05: String = samples.lines().filter(|line| !line.starts_with("HG05")).map(|line| format!("{line}\n")).collect();
    let runner = CohortRunner::new()
        .reference_thresholds()
        .metadata(Fixture::with_contents("samples.tsv", &without_hg05));

    let err = runner.run().expect_err("HG05 has no metadata");
    assert_eq!(err.downcast_ref::<StageFailure>(), Some(&StageFailure(Stage::Assembled)));
    let integrity = err.downcast_ref::<IntegrityError>().expect("integrity error");
    assert_eq!(integrity.missing_metadata, ["HG05"]);
    assert!(runner.outputs().iter().all(|path| !path.exists()));
}

#[test]
fn strict_catalog() {
    let runner = CohortRunner::new().reference_thresholds().arg("--strict-catalog");
    let err = runner.run().expect_err("NA99 is absent from the VCF");
    let integrity = err.downcast_ref::<IntegrityError>().expect("integrity error");
    assert_eq!(integrity.missing_genotypes, ["NA99"]);
    assert!(integrity.missing_metadata.is_empty());
}

#[test]
fn identifier_retention_policy() {
    let runner = CohortRunner::new().reference_thresholds().arg("--retention-policy identifier");
    runner.run().expect("run should succeed");
    let related: Vec<String> = excluded_samples(&runner).into_iter()
        .filter(|(_, stage)| stage == "relatedness-filtered")
        .map(|(sample, _)| sample)
        .collect();
    assert_eq!(related, ["HG02", "HG05"]);
}

#[test]
fn genotype_derived_relatedness() {
    let runner = CohortRunner::new().reference_thresholds().from_genotypes();
    runner.run().expect("run should succeed");
    let excluded = excluded_samples(&runner);
    assert!(excluded.contains(&("HG02".to_string(), "relatedness-filtered".to_string())));
    assert!(!excluded.iter().any(|(sample, _)| sample == "HG01"));
    assert_eq!(read_manifest(&runner).inputs.relatedness, "genotypes");
}

#[test]
fn existing_outputs_are_preserved() {
    let runner = CohortRunner::new().reference_thresholds();
    runner.run().expect("first run should succeed");
    let before = std::fs::read(runner.output_excluded()).expect("excluded report");

    let rerun = runner.arg("--max-relatedness 0.5");
    let err = rerun.run().expect_err("outputs already exist");
    assert_eq!(err.downcast_ref::<StageFailure>(), Some(&StageFailure(Stage::Written)));
    assert_eq!(std::fs::read(rerun.output_excluded()).expect("excluded report"), before);

    let overwrite = rerun.arg("--overwrite");
    overwrite.run().expect("--overwrite should replace outputs");
    assert!(excluded_samples(&overwrite).iter().all(|(sample, _)| sample != "HG02"));
}

#[test]
fn empty_cohort() {
    let runner = CohortRunner::new().arg("--min-qual 1000");
    let err = runner.run().expect_err("no variant passes QUAL >= 1000");
    assert_eq!(err.downcast_ref::<StageFailure>(), Some(&StageFailure(Stage::Assembled)));
    assert_eq!(err.downcast_ref::<CohortError>(), Some(&CohortError::Empty { what: "variants" }));
    assert!(runner.outputs().iter().all(|path| !path.exists()));
}
