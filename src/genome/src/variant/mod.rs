use crate::{Coordinate, Genotype, Selection};

/// A parsed VCF record: fixed columns plus one genotype call per declared sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub coordinate: Coordinate,
    pub id        : String,
    pub reference : String,
    pub alternate : Vec<String>,
    pub quality   : Option<f64>,
    pub filter    : String,
    pub calls     : Vec<Genotype>,
}

impl Variant {
    /// Number of declared alleles (`1 + |ALT|`). A `.` ALT declares none.
    #[must_use]
    pub fn allele_count(&self) -> usize {
        1 + self.alternate.len()
    }

    /// Exactly one alternate allele.
    #[must_use]
    pub fn is_biallelic(&self) -> bool {
        self.alternate.len() == 1
    }

    /// `FILTER` is `PASS` or unset (`.`).
    #[must_use]
    pub fn passes_filter(&self) -> bool {
        matches!(self.filter.as_str(), "PASS" | ".")
    }

    /// `QUAL >= min_quality`. A missing `QUAL` passes only if the threshold is non-positive.
    #[must_use]
    pub fn passes_quality(&self, min_quality: f64) -> bool {
        match self.quality {
            Some(qual) => qual >= min_quality,
            None       => min_quality <= 0.0,
        }
    }

    /// Number of missing calls among the selected samples.
    #[must_use]
    pub fn missing_count(&self, samples: &Selection) -> usize {
        samples.indices()
            .filter(|i| self.calls.get(*i).map_or(true, Genotype::is_missing))
            .count()
    }

    /// Fraction of missing calls among the selected samples. Computed on every call,
    /// since the value depends on the sample set. An empty selection has no missing calls.
    #[must_use]
    pub fn missingness(&self, samples: &Selection) -> f64 {
        match samples.count() {
            0     => 0.0,
            total => self.missing_count(samples) as f64 / total as f64,
        }
    }
}
