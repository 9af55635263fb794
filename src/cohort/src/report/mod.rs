mod excluded;
pub use excluded::{ExcludedSample, EXCLUDED_HEADER};

mod manifest;
pub use manifest::{Manifest, ManifestInputs, ManifestOutputs, ManifestThresholds, PassCounts};
