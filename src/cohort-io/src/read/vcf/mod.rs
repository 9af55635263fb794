use std::{io::{BufRead, BufReader, Read}, path::{Path, PathBuf}, fs::File};

use genome::{Contig, Coordinate, Genotype, GenotypeError, GenotypeMatrix, Variant};
use located_error::prelude::*;

use crate::{CancelToken, ParseError, ParseErrorKind};

use gzp::{deflate::Bgzf, par::decompress::ParDecompressBuilder};
use log::{debug, trace};

mod error;
pub use error::VcfReaderError;

mod header;
pub use header::VcfHeader;

const GENOTYPE_KEY: &str = "GT";

/// Streaming reader for `.vcf`, `.vcf.gz` and `.vcf.bgz` files.
///
/// The header is parsed and validated on construction. Records are then read lazily,
/// one line at a time, through a single reusable buffer.
pub struct VcfReader<'a> {
    source: Box<dyn BufRead + 'a>,
    path  : PathBuf,
    header: VcfHeader,
    buf   : Vec<u8>,
    line  : usize,
    contig: Option<Contig>,
}

impl<'a> VcfReader<'a> {
    /// Instantiate and initialize a new VcfReader.
    /// # Arguments:
    /// - `path`: path leading to the `.vcf(.gz)` file.
    /// - `threads`: number of decompression threads (This is only relevant in the case of BGZF compressed `.vcf.gz` files)
    pub fn new(path: &Path, threads: usize) -> Result<VcfReader<'a>> {
        let loc_msg = || format!("While attempting to open VCF file '{}'", path.display());
        let source = Self::get_reader(path, threads).with_loc(loc_msg)?;
        Self::from_reader(source, path).with_loc(loc_msg)
    }

    /// Wrap an already opened source. `path` is only used to report errors.
    pub fn from_reader(source: Box<dyn BufRead + 'a>, path: &Path) -> Result<VcfReader<'a>> {
        let mut reader = VcfReader {
            source,
            path  : path.to_path_buf(),
            header: VcfHeader::default(),
            buf   : Vec::new(),
            line  : 0,
            contig: None,
        };
        reader.header = reader.parse_header().loc("While parsing VCF header")?;
        debug!("Found {} samples within '{}'", reader.header.samples().len(), path.display());
        Ok(reader)
    }

    #[must_use]
    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    /// Sample identifiers, in VCF column order.
    #[must_use]
    pub fn samples(&self) -> &[String] {
        self.header.samples()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1-based number of the last line read.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Parse and return the next record, or `None` once the end of file is reached.
    pub fn next_variant(&mut self) -> Result<Option<Variant>> {
        if !self.fill_next_line()? {
            return Ok(None)
        }
        let line = self.current_line()?;
        let variant = parse_record(line, &self.header, self.contig.as_ref())
            .map_err(|kind| ParseError::new(&self.path, self.line, kind))
            .loc("While parsing VCF record")?;
        trace!("{} ({})", variant.coordinate, variant.id);
        self.contig = Some(variant.coordinate.contig.clone());
        Ok(Some(variant))
    }

    /// Return the raw tab-separated fields of the next record, or `None` once the end of file is reached.
    /// Fields are borrowed from the reader's buffer, and are left untouched.
    pub fn next_raw_record(&mut self) -> Result<Option<Vec<&str>>> {
        if !self.fill_next_line()? {
            return Ok(None)
        }
        Ok(Some(self.current_line()?.split('\t').collect()))
    }

    /// Fill `self.buf` with the next non-empty line, stripped of its line terminator.
    /// Return `false` on EOF.
    fn fill_next_line(&mut self) -> Result<bool> {
        loop {
            self.buf.clear();
            let read = self.source.read_until(b'\n', &mut self.buf);
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(e)    => return Err(self.error(ParseErrorKind::Read(e))).loc("While reading VCF file"),
            };
            if bytes == 0 {
                return Ok(false)
            }
            self.line += 1;
            if self.buf.last() == Some(&b'\n') {
                self.buf.pop();
            }
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            if !self.buf.is_empty() {
                return Ok(true)
            }
        }
    }

    fn current_line(&self) -> Result<&str> {
        std::str::from_utf8(&self.buf)
            .map_err(|_| self.error(ParseErrorKind::InvalidUtf8))
            .loc("While reading VCF file")
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(&self.path, self.line, kind)
    }

    /// Collect every `##` line until the `#CHROM` line is found, then validate it.
    fn parse_header(&mut self) -> Result<VcfHeader> {
        let mut meta = Vec::new();
        while self.fill_next_line()? {
            let line = self.current_line()?;
            if line.starts_with("##") {
                meta.push(line.to_string());
            } else if line.starts_with("#CHROM") {
                return VcfHeader::new(meta, line).map_err(|kind| self.error(kind)).loc("While parsing '#CHROM' line")
            } else {
                break
            }
        }
        Err(self.error(ParseErrorKind::MissingHeader)).loc("While searching for the '#CHROM' header line")
    }

    /// Check the file extension of the provided file, and return an appropriate BufReader
    /// - `.vcf`        -> Return a default BufReader
    /// - `.gz`, `.bgz` -> Return a parallel BGZF decompressor/reader
    /// # Arguments
    /// - `path`   : path leading to the targeted vcf file.
    /// - `threads`: number of user-provided decompression threads for the BGZF decompressor.
    ///   (Only relevant if the file extension ends with `.gz`)
    fn get_reader(path: &Path, threads: usize) -> Result<Box<dyn BufRead>> {
        use VcfReaderError::{InvalidFileExt, Open};
        let path_ext = path.extension().with_loc(|| InvalidFileExt)?;
        let source: Box<dyn Read> = match path_ext.to_str() {
            Some("vcf")         => Box::new(File::open(path).map_err(Open)?),
            Some("gz" | "bgz")  => {
                let vcf = File::open(path).map_err(Open)?;
                ParDecompressBuilder::<Bgzf>::new().maybe_num_threads(threads).maybe_par_from_reader(vcf)
            },
            _                   => return Err(InvalidFileExt.into())
        };
        Ok(Box::new(BufReader::new(source)))
    }
}

impl Iterator for VcfReader<'_> {
    type Item = Result<Variant>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_variant().transpose()
    }
}

/// Parse a single, line-terminator-free VCF record.
fn parse_record(line: &str, header: &VcfHeader, contig: Option<&Contig>) -> Result<Variant, ParseErrorKind> {
    use ParseErrorKind::{ColumnCount, InvalidCoordinate, InvalidAllele, InvalidQuality, MissingGenotypeField};

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != header.n_columns() {
        return Err(ColumnCount { expected: header.n_columns(), found: fields.len() })
    }

    let coordinate = Coordinate::parse(fields[0], fields[1], contig).map_err(InvalidCoordinate)?;

    let reference = match fields[3] {
        "" | "." => return Err(InvalidAllele(fields[3].to_string())),
        allele   => allele.to_string(),
    };

    let alternate = match fields[4] {
        "."  => Vec::new(),
        alts => alts.split(',')
            .map(|alt| if alt.is_empty() { Err(InvalidAllele(alts.to_string())) } else { Ok(alt.to_string()) })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let quality = match fields[5] {
        "."  => None,
        qual => Some(qual.parse::<f64>().ok().filter(|q| q.is_finite()).ok_or_else(|| InvalidQuality(qual.to_string()))?),
    };

    let mut calls = Vec::with_capacity(header.samples().len());
    if !header.samples().is_empty() {
        let format = fields[8];
        let gt_idx = format.split(':').position(|key| key == GENOTYPE_KEY)
            .ok_or_else(|| MissingGenotypeField(format.to_string()))?;
        let alleles = 1 + alternate.len();
        for (field, sample) in fields[9..].iter().zip(header.samples()) {
            // Trailing FORMAT keys may be dropped: an absent GT is a missing call.
            let call = field.split(':').nth(gt_idx).unwrap_or(".");
            calls.push(Genotype::parse(call, alleles).map_err(|e| genotype_error(sample, e))?);
        }
    }

    Ok(Variant {
        coordinate,
        id: fields[2].to_string(),
        reference,
        alternate,
        quality,
        filter: fields[6].to_string(),
        calls,
    })
}

fn genotype_error(sample: &str, error: GenotypeError) -> ParseErrorKind {
    match error {
        GenotypeError::AlleleIndexOutOfRange { index, alleles, .. } => {
            ParseErrorKind::AlleleIndexOutOfRange { sample: sample.to_string(), index, alleles }
        },
        source => ParseErrorKind::InvalidGenotype { sample: sample.to_string(), source },
    }
}

/// Read every remaining record of `reader` into a [`GenotypeMatrix`].
/// Cancellation is checked between records.
pub fn load_matrix(reader: &mut VcfReader, cancel: &CancelToken) -> Result<GenotypeMatrix> {
    let mut variants = Vec::new();
    while let Some(variant) = reader.next_variant()? {
        cancel.check().loc("While loading the genotype matrix")?;
        variants.push(variant);
    }
    debug!("Loaded {} variants x {} samples from '{}'", variants.len(), reader.samples().len(), reader.path().display());
    Ok(GenotypeMatrix::new(reader.samples().to_vec(), variants))
}
