use std::io::{self, Write};

use genome::Selection;

use crate::read::VcfHeader;

mod info;
pub use info::{AlleleCounts, rewrite_info};

const INFO_IDX  : usize = 7;
const FORMAT_IDX: usize = 8;
const SAMPLE_IDX: usize = 9;

/// Writes VCF records restricted to a subset of sample columns.
/// Fixed columns and retained sample fields are copied verbatim.
pub struct VcfWriter<W: Write> {
    inner         : W,
    samples       : Selection,
    recompute_info: bool,
    records       : usize,
    line          : String,
}

impl<W: Write> VcfWriter<W> {
    /// - `samples`: sample columns to keep.
    /// - `recompute_info`: rewrite the `AC` and `AN` INFO keys over the retained samples.
    pub fn new(inner: W, samples: Selection, recompute_info: bool) -> Self {
        Self { inner, samples, recompute_info, records: 0, line: String::new() }
    }

    /// Write the meta-information lines and the `#CHROM` line, restricted to the retained samples.
    pub fn write_header(&mut self, header: &VcfHeader) -> io::Result<()> {
        for meta in header.meta() {
            writeln!(self.inner, "{meta}")?;
        }
        let samples = &self.samples;
        writeln!(self.inner, "{}", header.column_line(|i| samples.contains(i)))
    }

    /// Write a single record from its raw tab-separated fields.
    pub fn write_record(&mut self, fields: &[&str]) -> io::Result<()> {
        let info = match self.recompute_info && fields.len() > INFO_IDX {
            true  => Some(self.recomputed_info(fields)),
            false => None,
        };
        self.line.clear();
        let fixed = fields.len().min(SAMPLE_IDX);
        for (i, field) in fields[..fixed].iter().enumerate() {
            if i > 0 {
                self.line.push('\t');
            }
            match (i, &info) {
                (INFO_IDX, Some(info)) => self.line.push_str(info),
                _                      => self.line.push_str(field),
            }
        }
        let retained = fields.iter().skip(SAMPLE_IDX).enumerate().filter(|(i, _)| self.samples.contains(*i));
        for (_, field) in retained {
            self.line.push('\t');
            self.line.push_str(field);
        }
        self.line.push('\n');
        self.inner.write_all(self.line.as_bytes())?;
        self.records += 1;
        Ok(())
    }

    fn recomputed_info(&self, fields: &[&str]) -> String {
        let info = fields[INFO_IDX];
        let Some(gt_idx) = fields.get(FORMAT_IDX).and_then(|format| format.split(':').position(|key| key == "GT")) else {
            return info.to_string()
        };
        let n_alt = match fields[4] {
            "."  => 0,
            alts => alts.split(',').count(),
        };
        let calls = fields.iter().skip(SAMPLE_IDX).enumerate()
            .filter(|(i, _)| self.samples.contains(*i))
            .filter_map(|(_, field)| field.split(':').nth(gt_idx));
        rewrite_info(info, &AlleleCounts::from_calls(calls, n_alt))
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
