use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelatednessReaderError {
    #[error("Failed to open relatedness table")]
    Open(#[source] std::io::Error),

    #[error("Relatedness table is empty")]
    Empty,
}
