use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelatednessError {
    #[error("Invalid relatedness threshold: {0}. Expected a finite number")]
    InvalidThreshold(f64),

    #[error("Expected one call rate per sample ({expected}), found {found}")]
    CallRateLength { expected: usize, found: usize },
}
