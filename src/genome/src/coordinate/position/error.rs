use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParsePositionError {
    #[error("Failed to parse Physical Position into a valid u32: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Physical positions are 1-based. Found position 0")]
    Zero,
}
