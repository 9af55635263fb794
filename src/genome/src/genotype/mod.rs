use std::fmt::{self, Display, Formatter};

mod error;
pub use error::GenotypeError;

/// A single per-sample genotype call, reduced to its allele indices.
///
/// Haploid calls (`1`) are stored as homozygous diploids (`1/1`). Any call
/// holding a missing allele (`./.`, `.`, `0/.`) is [`Genotype::Missing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genotype {
    Diploid(u8, u8),
    Missing,
}

impl Genotype {
    /// Parse the value of a `GT` field. `alleles` is the number of alleles declared
    /// by the record (`1 + |ALT|`), every index must be strictly lower.
    pub fn parse(call: &str, alleles: usize) -> Result<Self, GenotypeError> {
        let mut indices = [None; 2];
        let mut ploidy  = 0;
        for allele in call.split(['/', '|']) {
            if ploidy == 2 {
                let ploidy = call.split(['/', '|']).count();
                return Err(GenotypeError::Ploidy { call: call.to_string(), ploidy })
            }
            indices[ploidy] = match allele {
                "." => None,
                "" => return Err(GenotypeError::Malformed(call.to_string())),
                index => {
                    let index = index.parse::<usize>().map_err(|_| GenotypeError::Malformed(call.to_string()))?;
                    if index >= alleles {
                        return Err(GenotypeError::AlleleIndexOutOfRange { call: call.to_string(), index, alleles })
                    }
                    let index = u8::try_from(index).map_err(|_| GenotypeError::Malformed(call.to_string()))?;
                    Some(index)
                }
            };
            ploidy += 1;
        }

        Ok(match (ploidy, indices) {
            (1, [Some(a), _])       => Self::Diploid(a, a),
            (2, [Some(a), Some(b)]) => Self::Diploid(a, b),
            _                       => Self::Missing,
        })
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    #[must_use]
    pub fn is_het(&self) -> bool {
        matches!(self, Self::Diploid(a, b) if a != b)
    }

    /// Return the allele index if this is a homozygous call.
    #[must_use]
    pub fn homozygous_allele(&self) -> Option<u8> {
        match self {
            Self::Diploid(a, b) if a == b => Some(*a),
            _ => None,
        }
    }

    /// `true` if both calls are homozygous for different alleles (e.g. `0/0` vs. `1/1`).
    #[must_use]
    pub fn is_opposite_homozygote(&self, other: &Self) -> bool {
        matches!((self.homozygous_allele(), other.homozygous_allele()), (Some(a), Some(b)) if a != b)
    }
}

impl Display for Genotype {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diploid(a, b) => write!(f, "{a}/{b}"),
            Self::Missing       => write!(f, "./."),
        }
    }
}
