pub mod error;
pub use error::WriterError;

pub mod atomic;
pub use atomic::{AtomicFile, OutputWriter, commit_all};

pub mod vcf;
pub use vcf::VcfWriter;

pub mod table;
pub use table::TableWriter;
