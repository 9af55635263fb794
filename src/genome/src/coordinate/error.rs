use thiserror::Error;

use super::ParsePositionError;

#[derive(Error, Debug)]
pub enum CoordinateError {
    #[error("Empty chromosome name")]
    EmptyContig,

    #[error("Failed to parse Coordinate because of an invalid Position value")]
    ParsePosition(#[from] ParsePositionError),
}
