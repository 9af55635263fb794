use std::fmt::Display;

pub mod contig;
pub use contig::Contig;

pub mod position;
pub use position::{Position, ParsePositionError};

mod error;
pub use error::CoordinateError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub contig  : Contig,
    pub position: Position,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&format!("{}:{}", self.contig, self.position), f)
    }
}

impl Coordinate {
    #[must_use]
    pub fn new(contig: impl Into<Contig>, position: impl Into<Position>) -> Self {
        Self{contig: contig.into(), position: position.into()}
    }

    /// Parse a coordinate from its `CHROM` and `POS` fields.
    /// `previous` is reused when it names the same contig, so that consecutive records share their name.
    pub fn parse(chrom: &str, pos: &str, previous: Option<&Contig>) -> Result<Self, CoordinateError> {
        if chrom.is_empty() {
            return Err(CoordinateError::EmptyContig)
        }
        let contig = match previous {
            Some(contig) if contig.as_str() == chrom => contig.clone(),
            _ => Contig::new(chrom),
        };
        Ok(Self{contig, position: pos.parse()?})
    }
}
