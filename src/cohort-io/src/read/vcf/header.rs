use ahash::AHashSet;

use crate::parse::ParseErrorKind;

/// Mandatory leading columns of the `#CHROM` line.
pub(crate) const FIXED_COLUMNS: [&str; 8] = ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];
pub(crate) const FORMAT_COLUMN: &str = "FORMAT";

/// Parsed VCF header: verbatim `##` meta-information lines and the sample identifiers of the `#CHROM` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfHeader {
    meta   : Vec<String>,
    samples: Vec<String>,
    format : bool,
}

impl VcfHeader {
    /// Validate the `#CHROM` line and build the header.
    pub(crate) fn new(meta: Vec<String>, column_line: &str) -> Result<Self, ParseErrorKind> {
        let columns: Vec<&str> = column_line.split('\t').collect();
        for (index, expected) in FIXED_COLUMNS.iter().enumerate() {
            let found = columns.get(index).copied().unwrap_or_default();
            if found != *expected {
                return Err(ParseErrorKind::MalformedHeader { index: index + 1, expected, found: found.to_string() })
            }
        }

        let Some(format) = columns.get(FIXED_COLUMNS.len()) else {
            return Ok(Self { meta, samples: Vec::new(), format: false })
        };
        if *format != FORMAT_COLUMN {
            let index = FIXED_COLUMNS.len() + 1;
            return Err(ParseErrorKind::MalformedHeader { index, expected: FORMAT_COLUMN, found: (*format).to_string() })
        }

        let first_sample = FIXED_COLUMNS.len() + 1;
        let mut seen = AHashSet::with_capacity(columns.len());
        let mut samples = Vec::with_capacity(columns.len() - first_sample);
        for (i, id) in columns.iter().enumerate().skip(first_sample) {
            if id.is_empty() {
                return Err(ParseErrorKind::EmptySampleId(i + 1))
            }
            if !seen.insert(*id) {
                return Err(ParseErrorKind::DuplicateSampleId((*id).to_string()))
            }
            samples.push((*id).to_string());
        }
        Ok(Self { meta, samples, format: true })
    }

    /// `##` meta-information lines, without their line terminator.
    #[must_use]
    pub fn meta(&self) -> &[String] {
        &self.meta
    }

    /// Sample identifiers, in column order.
    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Expected number of tab-separated columns of every record.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        FIXED_COLUMNS.len() + usize::from(self.format) + self.samples.len()
    }

    /// Render the `#CHROM` line, restricted to the samples for which `keep` returns `true`.
    pub fn column_line<F>(&self, mut keep: F) -> String
    where
        F: FnMut(usize) -> bool
    {
        let mut line = FIXED_COLUMNS.join("\t");
        if self.format {
            line.push('\t');
            line.push_str(FORMAT_COLUMN);
        }
        for (i, sample) in self.samples.iter().enumerate().filter(|(i, _)| keep(*i)) {
            line.push('\t');
            line.push_str(sample);
        }
        line
    }
}
