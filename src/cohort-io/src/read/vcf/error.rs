use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcfReaderError {
    #[error("Invalid or missing file extension. Accepted format are ['.vcf', '.vcf.gz', '.vcf.bgz']")]
    InvalidFileExt,

    #[error("Failed to open VCF file")]
    Open(#[source] std::io::Error),
}
