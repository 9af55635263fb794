use rayon::prelude::*;
use ahash::AHashMap;

use crate::{Selection, Variant};

/// In-memory genotype matrix: rows are variants (file order), columns are samples (VCF header order).
#[derive(Debug, Clone, Default)]
pub struct GenotypeMatrix {
    samples : Vec<String>,
    variants: Vec<Variant>,
}

impl GenotypeMatrix {
    #[must_use]
    pub fn new(samples: Vec<String>, variants: Vec<Variant>) -> Self {
        Self { samples, variants }
    }

    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn n_variants(&self) -> usize {
        self.variants.len()
    }

    /// Column index of every sample identifier.
    #[must_use]
    pub fn sample_index(&self) -> AHashMap<&str, usize> {
        self.samples.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect()
    }

    #[must_use]
    pub fn all_samples(&self) -> Selection {
        Selection::all(self.n_samples())
    }

    #[must_use]
    pub fn all_variants(&self) -> Selection {
        Selection::all(self.n_variants())
    }

    /// Per-variant missingness over the selected samples, for every variant (selected or not).
    #[must_use]
    pub fn variant_missingness(&self, samples: &Selection) -> Vec<f64> {
        self.variants.par_iter()
            .map(|variant| variant.missingness(samples))
            .collect()
    }

    /// Per-sample missingness over the selected variants, for every sample (selected or not).
    /// The missingness of a sample only depends on the variant set. No selected variant → `0.0`.
    #[must_use]
    pub fn sample_missingness(&self, variants: &Selection) -> Vec<f64> {
        let n_samples = self.n_samples();
        let missing = self.variants.par_iter()
            .enumerate()
            .filter(|(i, _)| variants.contains(*i))
            .fold(|| vec![0usize; n_samples], |mut acc, (_, variant)| {
                for (count, call) in acc.iter_mut().zip(variant.calls.iter()) {
                    *count += usize::from(call.is_missing());
                }
                acc
            })
            .reduce(|| vec![0usize; n_samples], |mut a, b| {
                a.iter_mut().zip(b).for_each(|(a, b)| *a += b);
                a
            });

        let total = variants.count();
        missing.into_iter()
            .map(|count| if total == 0 { 0.0 } else { count as f64 / total as f64 })
            .collect()
    }

    /// Fraction of non-missing calls of each sample, over every loaded variant.
    #[must_use]
    pub fn call_rates(&self) -> Vec<f64> {
        let all = self.all_variants();
        if all.is_empty() {
            return vec![1.0; self.n_samples()]
        }
        self.sample_missingness(&all).into_iter().map(|missingness| 1.0 - missingness).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Genotype::{Diploid, Missing}, variant::tests::variant};
    use float_cmp::assert_approx_eq;

    fn matrix() -> GenotypeMatrix {
        let samples = ["S1", "S2", "S3"].iter().map(ToString::to_string).collect();
        GenotypeMatrix::new(samples, vec![
            variant(10, &[Diploid(0, 0), Missing,       Missing      ]),
            variant(20, &[Diploid(0, 1), Missing,       Diploid(1, 1)]),
            variant(30, &[Diploid(0, 0), Diploid(0, 1), Diploid(1, 1)]),
            variant(40, &[Missing,       Missing,       Diploid(0, 0)]),
        ])
    }

    #[test]
    fn sample_missingness() {
        let matrix = matrix();
        let got = matrix.sample_missingness(&matrix.all_variants());
        for (got, want) in got.iter().zip([0.25, 0.75, 0.25]) {
            assert_approx_eq!(f64, *got, want);
        }

        let subset = Selection::from_mask(vec![false, true, true, false]);
        let got = matrix.sample_missingness(&subset);
        for (got, want) in got.iter().zip([0.0, 0.5, 0.0]) {
            assert_approx_eq!(f64, *got, want);
        }

        assert!(matrix.sample_missingness(&Selection::none(4)).iter().all(|m| *m == 0.0));
    }

    #[test]
    fn variant_missingness() {
        let matrix = matrix();
        let got = matrix.variant_missingness(&Selection::from_mask(vec![true, false, true]));
        for (got, want) in got.iter().zip([0.5, 0.0, 0.0, 0.5]) {
            assert_approx_eq!(f64, *got, want);
        }
    }

    #[test]
    fn call_rates() {
        let matrix = matrix();
        for (got, want) in matrix.call_rates().iter().zip([0.75, 0.25, 0.75]) {
            assert_approx_eq!(f64, *got, want);
        }
        let empty = GenotypeMatrix::new(vec!["S1".to_string()], Vec::new());
        assert_eq!(empty.call_rates(), vec![1.0]);
    }

    #[test]
    fn sample_index() {
        let matrix = matrix();
        let index = matrix.sample_index();
        assert_eq!(index.get("S2"), Some(&1));
        assert_eq!(index.get("S4"), None);
    }
}
