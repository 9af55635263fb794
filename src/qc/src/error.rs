use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum QcError {
    #[error("Missingness filter did not converge after {iterations} passes (last pass retained {samples} samples and {variants} variants)")]
    ConvergenceFailure { iterations: usize, samples: usize, variants: usize },

    #[error("Invalid {name} threshold: {value}. Expected a fraction within [0, 1]")]
    InvalidFraction { name: &'static str, value: f64 },
}
