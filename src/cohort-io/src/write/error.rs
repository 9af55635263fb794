use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to write to file: inner writer returned an io error")]
    IOError(#[from] std::io::Error),

    #[error("Failed to create a temporary file within '{}'", dir.display())]
    CreateTemp { dir: PathBuf, #[source] source: std::io::Error },

    #[error("Failed to move temporary file to its destination '{}'", path.display())]
    Persist { path: PathBuf, #[source] source: std::io::Error },

    #[error("BGZF compression failed")]
    Compression(#[source] gzp::GzpError),
}
