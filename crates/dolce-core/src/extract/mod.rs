//! Python source extraction: files -> syntax trees -> code segments.

pub mod filesystem;
pub mod parser;
pub mod pipeline;
pub mod segments;

pub use pipeline::{extract, extract_file, SegmentStream};
