//! BCMH to RomanText converter
//!
//! Converts the Bach Chorales Melody-Harmony corpus (Humdrum **kern with a
//! **harm analysis spine) to RomanText. The pipeline per file:
//!
//! 1. [`humdrum::preprocess()`]: collapse Dorian keys, turn **harm into lyrics
//! 2. [`humdrum::parse_kern`]: read the score into a flattened [`score::Score`]
//! 3. [`extract::extract_annotations`]: one record per annotated offset
//! 4. [`rntxt::render_rntxt`]: header and measure lines
//!
//! [`batch::BatchConverter`] drives this over a directory.

pub mod batch;
pub mod config;
pub mod errors;
pub mod extract;
pub mod humdrum;
pub mod rntxt;
pub mod score;

// Re-export commonly used types
pub use batch::BatchConverter;
pub use config::ConverterConfig;
pub use errors::{ConversionError, ParseError, Result};
pub use extract::{extract_annotations, AnnotationRecord, Annotations};
pub use score::{ElementClass, ElementKind, Metadata, Offset, Score, ScoreElement, ScoreSource};
