use std::{fs::File, io::{self, BufWriter, Write}, path::{Path, PathBuf}};

use gzp::{deflate::Bgzf, par::compress::{ParCompress, ParCompressBuilder}, ZWriter};
use located_error::prelude::*;
use log::{debug, trace};
use tempfile::NamedTempFile;

use crate::fs::{can_write_file, create_parent_directory};
use super::WriterError;

/// An output file that only becomes visible at its destination once [`AtomicFile::persist`] is called.
/// Contents are written to a temporary file created within the destination directory, and
/// discarded if the `AtomicFile` is dropped before being persisted.
#[derive(Debug)]
pub struct AtomicFile {
    tmp        : NamedTempFile,
    destination: PathBuf,
}

impl AtomicFile {
    /// Prepare a new output file.
    /// # Errors
    /// - if `destination` already exists and `overwrite` is `false`.
    /// - if the parent directory or the temporary file cannot be created.
    pub fn new(destination: &Path, overwrite: bool) -> Result<Self> {
        let loc_msg = || format!("While preparing output file '{}'", destination.display());
        can_write_file(overwrite, destination).with_loc(loc_msg)?;
        create_parent_directory(destination).with_loc(loc_msg)?;

        let dir = destination.parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::Builder::new()
            .prefix(".cohort-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|source| WriterError::CreateTemp { dir: dir.to_path_buf(), source })
            .with_loc(loc_msg)?;
        trace!("Staging '{}' at '{}'", destination.display(), tmp.path().display());
        Ok(Self { tmp, destination: destination.to_path_buf() })
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Path of the temporary file currently holding the contents.
    #[must_use]
    pub fn staging_path(&self) -> &Path {
        self.tmp.path()
    }

    /// Output is BGZF compressed when the destination ends with `.gz` or `.bgz`.
    #[must_use]
    pub fn is_bgzf(&self) -> bool {
        matches!(self.destination.extension().and_then(|ext| ext.to_str()), Some("gz" | "bgz"))
    }

    /// Open a writer over the temporary file. Compression is chosen from the destination extension.
    /// - `threads`: number of compression threads (only relevant for BGZF output).
    pub fn writer(&self, threads: usize) -> Result<OutputWriter> {
        let file = self.tmp.as_file().try_clone().map_err(WriterError::IOError).loc("While opening staged output file")?;
        if !self.is_bgzf() {
            return Ok(OutputWriter::Plain(BufWriter::new(file)))
        }
        let compressor: ParCompress<Bgzf> = ParCompressBuilder::new()
            .num_threads(threads.max(1))
            .map_err(WriterError::Compression)
            .loc("While configuring BGZF compression")?
            .from_writer(file);
        Ok(OutputWriter::Bgzf(Box::new(compressor)))
    }

    /// Move the temporary file to its destination.
    pub fn persist(self) -> Result<PathBuf> {
        let Self { tmp, destination } = self;
        tmp.as_file().sync_all().map_err(WriterError::IOError).loc("While syncing staged output file")?;
        tmp.persist(&destination)
            .map_err(|e| WriterError::Persist { path: destination.clone(), source: e.error })
            .loc("While committing output file")?;
        debug!("Wrote '{}'", destination.display());
        Ok(destination)
    }
}

/// Persist every staged file, in order. Nothing is persisted before every output was fully written by the caller.
pub fn commit_all(files: Vec<AtomicFile>) -> Result<Vec<PathBuf>> {
    files.into_iter().map(AtomicFile::persist).collect()
}

/// Plain or BGZF compressed writer over a staged output file.
pub enum OutputWriter {
    Plain(BufWriter<File>),
    Bgzf(Box<ParCompress<Bgzf>>),
}

impl OutputWriter {
    /// Flush every buffered byte, and terminate the BGZF stream if needed.
    pub fn finish(self) -> Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush().map_err(WriterError::IOError)?,
            Self::Bgzf(mut writer)  => writer.finish().map_err(WriterError::Compression)?,
        };
        Ok(())
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Bgzf(writer)  => writer.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.write_all(buf),
            Self::Bgzf(writer)  => writer.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Bgzf(writer)  => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FsError;
    use gzp::par::decompress::ParDecompressBuilder;
    use std::io::Read;

    #[test]
    fn invisible_until_persisted() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let destination = tmpdir.path().join("out").join("cohort.tsv");
        let file = AtomicFile::new(&destination, false)?;
        let mut writer = file.writer(1)?;
        writer.write_all(b"id\tpop\n")?;
        writer.finish()?;
        assert!(!destination.exists());
        assert!(file.staging_path().exists());

        let persisted = file.persist()?;
        assert_eq!(persisted, destination);
        assert_eq!(std::fs::read_to_string(&destination)?, "id\tpop\n");
        Ok(())
    }

    #[test]
    fn dropped_file_leaves_nothing_behind() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let destination = tmpdir.path().join("cohort.vcf");
        {
            let file = AtomicFile::new(&destination, false)?;
            let mut writer = file.writer(1)?;
            writer.write_all(b"##fileformat=VCFv4.2\n")?;
        }
        assert!(!destination.exists());
        assert_eq!(std::fs::read_dir(tmpdir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn overwrite_disallowed() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let destination = tmpdir.path().join("cohort.vcf");
        std::fs::write(&destination, "previous run")?;
        let err = AtomicFile::new(&destination, false).expect_err("file exists");
        assert!(matches!(err.downcast_ref::<FsError>(), Some(FsError::OverwriteDisallowed{..})));

        let file = AtomicFile::new(&destination, true)?;
        let mut writer = file.writer(1)?;
        writer.write_all(b"new run")?;
        writer.finish()?;
        file.persist()?;
        assert_eq!(std::fs::read_to_string(&destination)?, "new run");
        Ok(())
    }

    #[test]
    fn bgzf_output() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let destination = tmpdir.path().join("cohort.vcf.gz");
        let file = AtomicFile::new(&destination, false)?;
        assert!(file.is_bgzf());
        let mut writer = file.writer(2)?;
        writer.write_all(b"##fileformat=VCFv4.2\n")?;
        writer.finish()?;
        file.persist()?;

        let mut decoded = String::new();
        ParDecompressBuilder::<Bgzf>::new()
            .maybe_par_from_reader(File::open(&destination)?)
            .read_to_string(&mut decoded)?;
        assert_eq!(decoded, "##fileformat=VCFv4.2\n");
        Ok(())
    }

    #[test]
    fn commit_all_persists_every_file() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let paths = [tmpdir.path().join("a.tsv"), tmpdir.path().join("b.tsv")];
        let files = paths.iter().map(|path| AtomicFile::new(path, false)).collect::<Result<Vec<_>>>()?;
        for file in &files {
            let mut writer = file.writer(1)?;
            writer.write_all(b"x")?;
            writer.finish()?;
        }
        assert_eq!(commit_all(files)?, paths);
        assert!(paths.iter().all(|path| path.exists()));
        Ok(())
    }
}
