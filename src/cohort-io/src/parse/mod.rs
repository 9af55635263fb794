use std::path::Path;

mod error;
pub use error::{ParseError, ParseErrorKind};

impl ParseError {
    pub fn new(source_file: impl AsRef<Path>, line: usize, kind: ParseErrorKind) -> Self {
        Self { source_file: source_file.as_ref().to_path_buf(), line, kind }
    }
}

/// Remove a trailing `\n` or `\r\n` from a line buffer.
pub(crate) fn trim_eol(line: &str) -> &str {
    line.strip_suffix('\n').map_or(line, |line| line.strip_suffix('\r').unwrap_or(line))
}

/// Find the column index of the first header name matching any of the `candidates` (case-insensitive).
pub(crate) fn find_column<S: AsRef<str>>(header: &[S], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        header.iter().position(|name| name.as_ref().trim().eq_ignore_ascii_case(candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_line_endings() {
        assert_eq!(trim_eol("22\t16050075\n"), "22\t16050075");
        assert_eq!(trim_eol("22\t16050075\r\n"), "22\t16050075");
        assert_eq!(trim_eol("22\t16050075"), "22\t16050075");
        assert_eq!(trim_eol("\r\n"), "");
    }

    #[test]
    fn column_lookup() {
        let header = ["INDV1", "INDV2", "N_AaAa", " relatedness_phi "];
        assert_eq!(find_column(&header, &["ID1", "IID1", "INDV1"]), Some(0));
        assert_eq!(find_column(&header, &["RELATEDNESS", "RELATEDNESS_PHI"]), Some(3));
        assert_eq!(find_column(&header, &["PI_HAT"]), None);
    }

    #[test]
    fn display_names_file_and_line() {
        let err = ParseError::new("cohort.vcf", 42, ParseErrorKind::InvalidQuality("high".to_string()));
        assert_eq!(err.to_string(), "cohort.vcf:42: Invalid QUAL value 'high'");
    }
}
