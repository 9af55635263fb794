pub mod vcf;
pub use vcf::{VcfReader, VcfHeader, VcfReaderError, load_matrix};

pub mod catalog;
pub use catalog::{SampleCatalog, CatalogError};

pub mod relatedness;
pub use relatedness::{RelatednessReader, RelatednessTable};
