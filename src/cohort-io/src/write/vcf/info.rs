/// Allele counts over a set of genotype calls, as reported by the `AC` and `AN` INFO keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleCounts {
    /// Count of each alternate allele, in ALT order.
    pub ac: Vec<usize>,
    /// Total number of called alleles.
    pub an: usize,
}

impl AlleleCounts {
    /// Count the called alleles of a set of raw `GT` values (e.g. `0/1`, `1|1`, `./.`, `1`).
    /// Missing alleles are not counted.
    pub fn from_calls<'a, I>(calls: I, n_alt: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>
    {
        let mut counts = Self { ac: vec![0; n_alt], an: 0 };
        for allele in calls.into_iter().flat_map(|call| call.split(['/', '|'])) {
            let Ok(index) = allele.parse::<usize>() else {
                continue
            };
            counts.an += 1;
            if let Some(ac) = index.checked_sub(1).and_then(|alt| counts.ac.get_mut(alt)) {
                *ac += 1;
            }
        }
        counts
    }
}

/// Rewrite the existing `AC` and `AN` keys of a raw INFO column. Other keys are left untouched,
/// and missing keys are not added.
#[must_use]
pub fn rewrite_info(info: &str, counts: &AlleleCounts) -> String {
    if info == "." {
        return info.to_string()
    }
    info.split(';')
        .map(|entry| {
            if entry.starts_with("AC=") {
                let ac = counts.ac.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
                format!("AC={}", if ac.is_empty() { "." } else { &ac })
            } else if entry.starts_with("AN=") {
                format!("AN={}", counts.an)
            } else {
                entry.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allele_counts() {
        let counts = AlleleCounts::from_calls(["0|1", "1/1", "./.", "0/.", "2", "0|2"], 2);
        assert_eq!(counts, AlleleCounts { ac: vec![3, 2], an: 9 });
    }

    #[test]
    fn rewrite_existing_keys_only() {
        let counts = AlleleCounts { ac: vec![3, 1], an: 8 };
        assert_eq!(rewrite_info("AC=10,92;AF=0.1;AN=5008;VT=SNP", &counts), "AC=3,1;AF=0.1;AN=8;VT=SNP");
        assert_eq!(rewrite_info("DP=12;MULTI_ALLELIC", &counts), "DP=12;MULTI_ALLELIC");
        assert_eq!(rewrite_info(".", &counts), ".");
        // 'ACX=' is another key.
        assert_eq!(rewrite_info("ACX=1;AN=2", &counts), "ACX=1;AN=8");
    }
}
