use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenotypeError {
    #[error("Malformed genotype call '{0}'")]
    Malformed(String),

    #[error("Unsupported ploidy in genotype call '{call}': found {ploidy} alleles, expected at most 2")]
    Ploidy { call: String, ploidy: usize },

    #[error("Allele index {index} in genotype call '{call}' is out of range: record declares {alleles} alleles")]
    AlleleIndexOutOfRange { call: String, index: usize, alleles: usize },
}
