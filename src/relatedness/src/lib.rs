pub mod graph;
pub use graph::{RelatednessGraph, SampleId, SampleNode};

pub mod filter;
pub use filter::{
    Exclusion,
    RelatednessError,
    RelatednessFilter,
    RelatednessOutcome,
    RetentionPolicy,
    Strategy,
};

pub mod king;
pub use king::king_robust;
