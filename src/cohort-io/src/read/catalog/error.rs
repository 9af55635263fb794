use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Sample '{0}' not found within the metadata table")]
    NotFound(String),

    #[error("Cannot infer the delimiter of metadata table '{}' from its extension. Accepted extensions are ['.csv', '.tsv', '.txt', '.panel', '.meta']. Use '--metadata-delimiter' to specify it explicitly", path.display())]
    UnknownDelimiter{path: PathBuf},

    #[error("Failed to open metadata table")]
    Open(#[source] std::io::Error),
}
