#![allow(dead_code)]

mod fixture;
pub use fixture::Fixture;

mod runner;
pub use runner::CohortRunner;

/// Compare an output file against a reference file of `tests/test-data`, byte for byte.
#[macro_export]
macro_rules! validate_file {
    ($ref_file:expr, $obtained_file:expr) => {
        let reference = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test-data").join($ref_file);
        let want = std::fs::read_to_string(&reference)
            .unwrap_or_else(|_| panic!("Failed to open {:?}", reference));
        let got  = std::fs::read_to_string($obtained_file)
            .unwrap_or_else(|_| panic!("Failed to open {:?}", $obtained_file));
        pretty_assertions::assert_eq!(want, got)
    };
}
