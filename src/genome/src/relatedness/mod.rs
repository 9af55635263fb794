use std::fmt::{self, Display, Formatter};

/// Relatedness coefficient between two distinct samples. The pair is unordered:
/// identifiers are stored in lexicographic order so that `(a, b)` and `(b, a)` compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatednessPair {
    first      : String,
    second     : String,
    coefficient: f64,
}

impl RelatednessPair {
    /// Build a normalised pair. Returns `None` for self-pairs.
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>, coefficient: f64) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            std::cmp::Ordering::Equal   => None,
            std::cmp::Ordering::Less    => Some(Self { first: a, second: b, coefficient }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a, coefficient }),
        }
    }

    #[must_use]
    pub fn ids(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }

    #[must_use]
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Keep the highest coefficient of two observations of the same pair.
    pub fn merge_max(&mut self, coefficient: f64) {
        if coefficient > self.coefficient {
            self.coefficient = coefficient;
        }
    }
}

impl Display for RelatednessPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({:.4})", self.first, self.second, self.coefficient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered() {
        let ab = RelatednessPair::new("NA12878", "NA12891", 0.5).expect("distinct ids");
        let ba = RelatednessPair::new("NA12891", "NA12878", 0.5).expect("distinct ids");
        assert_eq!(ab, ba);
        assert_eq!(ab.ids(), ("NA12878", "NA12891"));
    }

    #[test]
    fn self_pair() {
        assert!(RelatednessPair::new("NA12878", "NA12878", 1.0).is_none());
    }

    #[test]
    fn merge_keeps_max() {
        let mut pair = RelatednessPair::new("A", "B", 0.2).expect("distinct ids");
        pair.merge_max(0.1);
        assert!((pair.coefficient() - 0.2).abs() < f64::EPSILON);
        pair.merge_max(0.7);
        assert!((pair.coefficient() - 0.7).abs() < f64::EPSILON);
    }
}
