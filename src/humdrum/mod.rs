//! Humdrum input: BCMH preprocessing and the **kern reader

pub mod preprocess;
pub mod reader;

// Re-export for convenience
pub use preprocess::{preprocess, preprocess_file};
pub use reader::parse_kern;
