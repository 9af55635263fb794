pub mod parse;
pub use parse::{ParseError, ParseErrorKind};

pub mod fs;

pub mod interrupt;
pub use interrupt::{CancelToken, Cancelled};

pub mod read;
pub mod write;
