//! Report section data structures.

pub mod errors;
pub mod results;

pub use errors::{
    ErrorPair, ErrorRowFragment, ErrorSection, ErrorSectionBuilder, ImageLoader, LoaderError,
};
pub use results::ResultsSection;
