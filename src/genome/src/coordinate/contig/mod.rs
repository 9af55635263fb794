use std::{fmt::{self, Display, Formatter}, sync::Arc, borrow::Borrow};

/// Chromosome (or scaffold) name, as written in the `CHROM` column.
/// Cheap to clone: records of the same contig share a single allocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Contig(Arc<str>);

impl Contig {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` if both handles point to the same allocation.
    #[must_use]
    pub fn shares(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Display for Contig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&*self.0, f)
    }
}

impl From<&str> for Contig {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for Contig {
    fn borrow(&self) -> &str {
        &self.0
    }
}
