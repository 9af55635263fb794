use genome::{Genotype, GenotypeMatrix, RelatednessPair, Selection};
use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;

/// Genotype counts shared by two samples over their jointly called sites.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PairCounts {
    het_het          : usize,
    opposite_hom     : usize,
    het_first        : usize,
    het_second       : usize,
}

impl PairCounts {
    fn observe(&mut self, first: Genotype, second: Genotype) {
        if first.is_missing() || second.is_missing() {
            return
        }
        let (het_first, het_second) = (first.is_het(), second.is_het());
        self.het_first  += usize::from(het_first);
        self.het_second += usize::from(het_second);
        self.het_het    += usize::from(het_first && het_second);
        self.opposite_hom += usize::from(first.is_opposite_homozygote(&second));
    }

    /// Within-family KING-robust kinship coefficient. Zero when no site is informative.
    fn kinship(&self) -> f64 {
        match self.het_first + self.het_second {
            0 => 0.0,
            denominator => (self.het_het as f64 - 2.0 * self.opposite_hom as f64) / denominator as f64,
        }
    }
}

/// Estimate relatedness between every pair of selected samples from their genotypes
/// (KING-robust kinship `phi`, reported on the relatedness scale `r = 2 * phi`).
///
/// Duplicated samples score ~1.0, first degree relatives ~0.5 and unrelated individuals ~0.0 or below.
/// Pairs are computed in parallel, on the current rayon thread pool.
#[must_use]
pub fn king_robust(matrix: &GenotypeMatrix, samples: &Selection, variants: &Selection) -> Vec<RelatednessPair> {
    let columns: Vec<usize> = samples.indices().collect();
    let rows: Vec<&[Genotype]> = variants.indices()
        .filter_map(|row| matrix.variants().get(row))
        .map(|variant| variant.calls.as_slice())
        .collect();
    debug!("Estimating relatedness for {} samples over {} variants", columns.len(), rows.len());

    let pairs: Vec<(usize, usize)> = columns.iter().copied().tuple_combinations().collect();
    pairs.par_iter()
        .filter_map(|&(i, j)| {
            let mut counts = PairCounts::default();
            for calls in &rows {
                let (Some(first), Some(second)) = (calls.get(i), calls.get(j)) else { continue };
                counts.observe(*first, *second);
            }
            let relatedness = 2.0 * counts.kinship();
            let (a, b) = (matrix.samples().get(i)?, matrix.samples().get(j)?);
            trace!("KING {a} {b}: {counts:?} -> {relatedness:.4}");
            RelatednessPair::new(a.as_str(), b.as_str(), relatedness)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use genome::{Coordinate, Variant};

    fn matrix(samples: &[&str], rows: &[Vec<Genotype>]) -> GenotypeMatrix {
        let variants = rows.iter().enumerate().map(|(i, calls)| Variant {
            coordinate: Coordinate::new("1", u32::try_from(i + 1).expect("small position")),
            id        : ".".to_string(),
            reference : "A".to_string(),
            alternate : vec!["G".to_string()],
            quality   : Some(50.0),
            filter    : "PASS".to_string(),
            calls     : calls.clone(),
        }).collect();
        GenotypeMatrix::new(samples.iter().map(ToString::to_string).collect(), variants)
    }

    fn random_call(rng: &mut fastrand::Rng) -> Genotype {
        match rng.u8(0..10) {
            0     => Genotype::Missing,
            1..=3 => Genotype::Diploid(0, 0),
            4..=7 => Genotype::Diploid(0, 1),
            _     => Genotype::Diploid(1, 1),
        }
    }

    fn coefficient(pairs: &[RelatednessPair], a: &str, b: &str) -> f64 {
        let want = RelatednessPair::new(a, b, 0.0).expect("distinct ids");
        pairs.iter().find(|pair| pair.ids() == want.ids()).map(RelatednessPair::coefficient).expect("pair")
    }

    #[test]
    fn duplicates_score_one() {
        let mut rng = fastrand::Rng::with_seed(42);
        let rows: Vec<Vec<Genotype>> = (0..500).map(|_| {
            let first = random_call(&mut rng);
            vec![first, first, random_call(&mut rng)]
        }).collect();
        let matrix = matrix(&["HG01", "HG01_dup", "HG02"], &rows);
        let pairs = king_robust(&matrix, &matrix.all_samples(), &matrix.all_variants());
        assert_eq!(pairs.len(), 3);
        assert_approx_eq!(f64, coefficient(&pairs, "HG01", "HG01_dup"), 1.0, epsilon = 1e-12);
        assert!(coefficient(&pairs, "HG01", "HG02") < 0.5);
    }

    #[test]
    fn missing_calls_are_not_counted() {
        use Genotype::{Diploid, Missing};
        let rows = vec![
            vec![Diploid(0, 1), Diploid(0, 1)],
            vec![Diploid(0, 0), Diploid(1, 1)],
            vec![Diploid(0, 1), Missing],
            vec![Missing,       Diploid(1, 1)],
        ];
        let matrix = matrix(&["A", "B"], &rows);
        let pairs = king_robust(&matrix, &matrix.all_samples(), &matrix.all_variants());
        // het_het = 1, opposite_hom = 1, het(A) = 1, het(B) = 1 -> phi = (1 - 2) / 2
        assert_approx_eq!(f64, coefficient(&pairs, "A", "B"), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn selections_restrict_the_estimate() {
        use Genotype::Diploid;
        let rows = vec![
            vec![Diploid(0, 1), Diploid(0, 1), Diploid(0, 0)],
            vec![Diploid(0, 0), Diploid(1, 1), Diploid(0, 0)],
        ];
        let matrix = matrix(&["A", "B", "C"], &rows);
        let samples = Selection::from_mask(vec![true, true, false]);
        let pairs = king_robust(&matrix, &samples, &Selection::from_mask(vec![true, false]));
        assert_eq!(pairs.len(), 1);
        assert_approx_eq!(f64, coefficient(&pairs, "A", "B"), 1.0, epsilon = 1e-12);

        let uninformative = king_robust(&matrix, &Selection::from_mask(vec![false, true, true]), &Selection::from_mask(vec![false, true]));
        assert_approx_eq!(f64, coefficient(&uninformative, "B", "C"), 0.0, epsilon = 1e-12);
    }
}
