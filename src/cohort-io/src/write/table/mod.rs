use std::{fmt::Display, io::Write};

use anyhow::Result;
use located_error::LocatedError;

use super::WriterError;

/// THE field separator used for tabular reports.
pub const WRITER_SEPARATOR: &str = "\t";

/// Line-oriented writer for tabular reports.
pub struct TableWriter<W: Write> {
    inner: W,
}

impl<W: Write> TableWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write a header line, joining `columns` with [`WRITER_SEPARATOR`].
    pub fn write_header(&mut self, columns: &[&str]) -> Result<()> {
        writeln!(self.inner, "{}", columns.join(WRITER_SEPARATOR))
            .map_err(WriterError::IOError)
            .loc("While writing table header")
    }

    /// Write the contents of a generic iterator. One iteration step = one line.
    pub fn write_iter<T, I>(&mut self, iter: T) -> Result<()>
    where   T: IntoIterator<Item = I>,
            I: Display,
    {
        iter.into_iter()
            .try_for_each(|obj| writeln!(self.inner, "{obj}"))
            .map_err(WriterError::IOError)
            .loc("While writing contents into file")?;

        self.inner.flush().loc("While flushing buffer contents of Writer")
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use genome::Coordinate;

    use super::*;

    #[test]
    fn write_lines() -> anyhow::Result<()> {
        let mut writer = TableWriter::new(Vec::new());
        writer.write_header(&["chrom:pos"])?;
        writer.write_iter([Coordinate::new("10", 10000), Coordinate::new("X", 5)])?;
        assert_eq!(String::from_utf8(writer.into_inner())?, "chrom:pos\n10:10000\nX:5\n");
        Ok(())
    }
}
