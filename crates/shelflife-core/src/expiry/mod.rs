//! Expiry date extraction from label text.

mod parser;
pub mod rules;

pub use parser::{ExpiryExtractor, ExpiryParser, ExtractionMethod, ExtractionResult};
