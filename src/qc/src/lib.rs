use cohort_io::interrupt::CancelToken;
use genome::{GenotypeMatrix, Selection};
use located_error::prelude::*;
use log::{debug, info, trace};

mod error;
pub use error::QcError;

/// Variant and sample thresholds of the quality / missingness filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcThresholds {
    /// Minimum `QUAL` (inclusive).
    pub min_quality            : f64,
    /// Maximum fraction of missing calls per variant (inclusive).
    pub max_variant_missingness: f64,
    /// Maximum fraction of missing calls per sample (inclusive). `None` disables sample filtering.
    pub max_sample_missingness : Option<f64>,
    pub max_iterations         : usize,
    /// Only keep variants with `FILTER` set to `PASS` or `.`.
    pub require_pass           : bool,
    pub biallelic_only         : bool,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self {
            min_quality            : 30.0,
            max_variant_missingness: 0.1,
            max_sample_missingness : None,
            max_iterations         : 10,
            require_pass           : false,
            biallelic_only         : false,
        }
    }
}

impl QcThresholds {
    pub fn validate(&self) -> Result<()> {
        let fractions = [("max-variant-missingness", Some(self.max_variant_missingness)), ("max-sample-missingness", self.max_sample_missingness)];
        for (name, value) in fractions {
            if let Some(value) = value.filter(|v| !(0.0..=1.0).contains(v)) {
                return Err(QcError::InvalidFraction { name, value }).loc("While validating quality thresholds")
            }
        }
        Ok(())
    }
}

/// Counts retained at the end of a fixed-point pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub pass    : usize,
    pub samples : usize,
    pub variants: usize,
}

/// A sample dropped by the sample-missingness filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleDrop {
    pub column     : usize,
    pub missingness: f64,
    pub pass       : usize,
}

/// Fixed point of the missingness filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Converged {
    pub variants: Selection,
    pub samples : Selection,
    pub passes  : Vec<PassSummary>,
    pub dropped_samples: Vec<SampleDrop>,
}

/// Variants passing the sample-independent checks (`QUAL`, `FILTER`, bi-allelic).
#[must_use]
pub fn quality_pass(matrix: &GenotypeMatrix, thresholds: &QcThresholds) -> Selection {
    matrix.variants().iter()
        .map(|variant| {
            variant.passes_quality(thresholds.min_quality)
            && (!thresholds.require_pass || variant.passes_filter())
            && (!thresholds.biallelic_only || variant.is_biallelic())
        })
        .collect()
}

/// Alternate variant and sample missingness filtering until the sample set stops changing.
///
/// Every pass reads immutable snapshots: variants are filtered against the samples of the previous
/// pass, then samples are filtered against these variants. Selections only ever narrow.
pub fn converge(matrix: &GenotypeMatrix, variants: &Selection, samples: &Selection, thresholds: &QcThresholds, cancel: &CancelToken) -> Result<Converged> {
    let mut current_samples = samples.clone();
    let mut passes          = Vec::new();
    let mut dropped_samples = Vec::new();
    let mut last = PassSummary { pass: 0, samples: samples.count(), variants: variants.count() };

    for pass in 1..=thresholds.max_iterations {
        cancel.check().with_loc(|| format!("While running missingness pass {pass}"))?;

        let variant_missingness = matrix.variant_missingness(&current_samples);
        let retained_variants = variants.narrow(|row| variant_missingness[row] <= thresholds.max_variant_missingness);

        let Some(max_sample_missingness) = thresholds.max_sample_missingness else {
            last = PassSummary { pass, samples: current_samples.count(), variants: retained_variants.count() };
            passes.push(last);
            debug!("Missingness pass {pass}: {} variants retained", last.variants);
            return Ok(Converged { variants: retained_variants, samples: current_samples, passes, dropped_samples })
        };

        let sample_missingness = matrix.sample_missingness(&retained_variants);
        let retained_samples = current_samples.narrow(|column| sample_missingness[column] <= max_sample_missingness);
        for column in current_samples.dropped(&retained_samples) {
            trace!("Pass {pass}: dropping sample column {column} (missingness {:.4})", sample_missingness[column]);
            dropped_samples.push(SampleDrop { column, missingness: sample_missingness[column], pass });
        }

        last = PassSummary { pass, samples: retained_samples.count(), variants: retained_variants.count() };
        passes.push(last);
        debug!("Missingness pass {pass}: {} samples and {} variants retained", last.samples, last.variants);

        if retained_samples == current_samples {
            return Ok(Converged { variants: retained_variants, samples: retained_samples, passes, dropped_samples })
        }
        current_samples = retained_samples;
    }

    Err(QcError::ConvergenceFailure { iterations: thresholds.max_iterations, samples: last.samples, variants: last.variants })
        .loc("While filtering variants and samples on missingness")
}

#[derive(Debug, Clone, PartialEq)]
pub struct QcOutcome {
    /// Variants passing the quality checks, regardless of missingness.
    pub quality  : Selection,
    pub converged: Converged,
}

/// Quality filtering followed by the missingness fixed point.
#[derive(Debug, Clone, Copy)]
pub struct QualityMissingnessFilter {
    thresholds: QcThresholds,
}

impl QualityMissingnessFilter {
    pub fn new(thresholds: QcThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    #[must_use]
    pub fn thresholds(&self) -> &QcThresholds {
        &self.thresholds
    }

    /// Sample-independent variant checks.
    #[must_use]
    pub fn quality(&self, matrix: &GenotypeMatrix) -> Selection {
        let quality = quality_pass(matrix, &self.thresholds);
        info!("Quality filter retained {} out of {} variants", quality.count(), matrix.n_variants());
        quality
    }

    /// Missingness fixed point over the `variants` passing [`Self::quality`].
    pub fn converge(&self, matrix: &GenotypeMatrix, variants: &Selection, samples: &Selection, cancel: &CancelToken) -> Result<Converged> {
        let converged = converge(matrix, variants, samples, &self.thresholds, cancel)?;
        info!(
            "Missingness filter converged after {} passes: {} samples and {} variants retained",
            converged.passes.len(), converged.samples.count(), converged.variants.count()
        );
        Ok(converged)
    }

    /// Filter the variants of `matrix`, and the `samples` that survived relatedness filtering.
    pub fn apply(&self, matrix: &GenotypeMatrix, samples: &Selection, cancel: &CancelToken) -> Result<QcOutcome> {
        let quality = self.quality(matrix);
        let converged = self.converge(matrix, &quality, samples, cancel)?;
        Ok(QcOutcome { quality, converged })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genome::{Coordinate, Genotype, Variant};
    use cohort_io::interrupt::Cancelled;

    const HOM: Genotype = Genotype::Diploid(0, 0);
    const MIS: Genotype = Genotype::Missing;

    fn variant(pos: u32, quality: Option<f64>, filter: &str, calls: Vec<Genotype>) -> Variant {
        Variant {
            coordinate: Coordinate::new("2", pos),
            id        : format!("rs{pos}"),
            reference : "C".to_string(),
            alternate : vec!["T".to_string()],
            quality,
            filter    : filter.to_string(),
            calls,
        }
    }

    /// One variant per row of `missing` flags.
    fn matrix(n_samples: usize, missing: &[&[bool]]) -> GenotypeMatrix {
        let variants = missing.iter().enumerate()
            .map(|(i, row)| variant(i as u32 + 1, Some(50.0), "PASS", row.iter().map(|m| if *m { MIS } else { HOM }).collect()))
            .collect();
        GenotypeMatrix::new((0..n_samples).map(|i| format!("S{i}")).collect(), variants)
    }

    fn thresholds(max_variant_missingness: f64, max_sample_missingness: Option<f64>) -> QcThresholds {
        QcThresholds { max_variant_missingness, max_sample_missingness, ..QcThresholds::default() }
    }

    #[test]
    fn variant_missingness_boundary() -> Result<()> {
        let forty  = [true, true, true, true, false, false, false, false, false, false];
        let thirty = [true, true, true, false, false, false, false, false, false, false];
        let matrix = matrix(10, &[&forty, &thirty]);
        let converged = converge(&matrix, &matrix.all_variants(), &matrix.all_samples(), &thresholds(0.3, None), &CancelToken::new())?;
        assert_eq!(converged.variants.mask(), [false, true]);
        assert_eq!(converged.samples, matrix.all_samples());
        assert_eq!(converged.passes, vec![PassSummary { pass: 1, samples: 10, variants: 1 }]);
        Ok(())
    }

    #[test]
    fn quality_checks() {
        let calls = vec![HOM; 2];
        let variants = vec![
            variant(1, Some(30.0), "PASS", calls.clone()),
            variant(2, Some(29.9), "PASS", calls.clone()),
            variant(3, None,       ".",    calls.clone()),
            variant(4, Some(99.0), "LowQual", calls.clone()),
            Variant { alternate: vec!["T".to_string(), "G".to_string()], ..variant(5, Some(99.0), "PASS", calls) },
        ];
        let matrix = GenotypeMatrix::new(vec!["A".into(), "B".into()], variants);

        let defaults = QcThresholds::default();
        assert_eq!(quality_pass(&matrix, &defaults).mask(), [true, false, false, true, true]);

        let strict = QcThresholds { require_pass: true, biallelic_only: true, min_quality: 0.0, ..defaults };
        assert_eq!(quality_pass(&matrix, &strict).mask(), [true, true, true, false, false]);
    }

    #[test]
    fn sample_drop_cascades() -> Result<()> {
        // S2 is missing in 3/5 variants and is dropped on the first pass. The second pass confirms the fixed point.
        let rows: [&[bool]; 5] = [
            &[false, false, true],
            &[false, false, true],
            &[false, false, true],
            &[false, true,  false],
            &[false, false, false],
        ];
        let matrix = matrix(3, &rows);
        let converged = converge(&matrix, &matrix.all_variants(), &matrix.all_samples(), &thresholds(0.5, Some(0.5)), &CancelToken::new())?;
        assert_eq!(converged.samples.mask(), [true, true, false]);
        assert_eq!(converged.variants.count(), 5);
        assert_eq!(converged.passes.len(), 2);
        assert_eq!(converged.dropped_samples.len(), 1);
        assert_eq!(converged.dropped_samples[0].column, 2);
        assert_eq!(converged.dropped_samples[0].pass, 1);
        Ok(())
    }

    #[test]
    fn convergence_failure() {
        let rows: [&[bool]; 2] = [&[false, true], &[false, true]];
        let matrix = matrix(2, &rows);
        let limits = QcThresholds { max_iterations: 1, ..thresholds(1.0, Some(0.5)) };
        let err = converge(&matrix, &matrix.all_variants(), &matrix.all_samples(), &limits, &CancelToken::new())
            .expect_err("one pass cannot confirm a fixed point that dropped a sample");
        assert_eq!(err.downcast_ref::<QcError>(), Some(&QcError::ConvergenceFailure { iterations: 1, samples: 1, variants: 2 }));
    }

    #[test]
    fn cancelled_between_passes() {
        let rows: [&[bool]; 1] = [&[false]];
        let matrix = matrix(1, &rows);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = converge(&matrix, &matrix.all_variants(), &matrix.all_samples(), &QcThresholds::default(), &cancel)
            .expect_err("cancelled");
        assert!(err.downcast_ref::<Cancelled>().is_some());
    }

    #[test]
    fn invalid_fraction() {
        assert!(QualityMissingnessFilter::new(thresholds(1.5, None)).is_err());
        assert!(QualityMissingnessFilter::new(thresholds(0.2, Some(-0.1))).is_err());
        assert!(QualityMissingnessFilter::new(thresholds(0.0, Some(1.0))).is_ok());
    }

    #[test]
    fn converged_cohort_is_a_fixed_point() -> Result<()> {
        let mut rng = fastrand::Rng::with_seed(7);
        let cancel = CancelToken::new();
        for _ in 0..100 {
            let (n_samples, n_variants) = (rng.usize(1..12), rng.usize(1..40));
            let missing_rate = rng.f64() * 0.6;
            let rows: Vec<Vec<bool>> = (0..n_variants).map(|_| (0..n_samples).map(|_| rng.f64() < missing_rate).collect()).collect();
            let rows: Vec<&[bool]> = rows.iter().map(Vec::as_slice).collect();
            let matrix = matrix(n_samples, &rows);
            let limits = QcThresholds { max_iterations: 100, ..thresholds(rng.f64() * 0.5, Some(rng.f64() * 0.5)) };
            let filter = QualityMissingnessFilter::new(limits)?;

            let first = filter.apply(&matrix, &matrix.all_samples(), &cancel)?.converged;
            assert!(first.variants.is_subset_of(&matrix.all_variants()));
            assert!(first.samples.is_subset_of(&matrix.all_samples()));

            let again = converge(&matrix, &first.variants, &first.samples, &limits, &cancel)?;
            assert_eq!(again.variants, first.variants);
            assert_eq!(again.samples, first.samples);
            assert_eq!(again.passes.len(), 1);
        }
        Ok(())
    }
}
