pub mod coordinate;
pub use coordinate::{Coordinate, Contig, Position};

pub mod genotype;
pub use genotype::{Genotype, GenotypeError};

pub mod selection;
pub use selection::Selection;

pub mod variant;
pub use variant::Variant;

pub mod matrix;
pub use matrix::GenotypeMatrix;

pub mod sample;
pub use sample::Sample;

pub mod relatedness;
pub use relatedness::RelatednessPair;
