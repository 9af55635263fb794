use std::fmt::{self, Display, Formatter};

/// One row of the sample metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub id       : String,
    pub pop      : String,
    pub pop2     : Option<String>,
    pub continent: Option<String>,
    pub lat      : f64,
    pub lon      : f64,
    pub loc      : Option<String>,
}

impl Display for Sample {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {:.4}, {:.4})", self.id, self.pop, self.lat, self.lon)
    }
}
