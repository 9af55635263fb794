use std::path::PathBuf;

use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError{
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("Invalid fraction '{0}': the provided value must lie between 0 and 1")]
    ParseFraction(String),

    #[error("Invalid threshold '{0}': expected a finite number")]
    ParseThreshold(String),

    #[error("--max-iterations must be greater than 0")]
    InvalidIterations,

    #[error("Failed to serialize command line arguments")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Unable to write serialized arguments into {}", .path.display())]
    WriteArgs{path: PathBuf, #[source] source: std::io::Error},

    #[error("Failed to open run configuration {}", .path.display())]
    OpenYaml{path: PathBuf, #[source] source: std::io::Error},

    #[error("Failed to parse run configuration {}", .path.display())]
    Deserialize{path: PathBuf, #[source] source: serde_yaml::Error},
}
