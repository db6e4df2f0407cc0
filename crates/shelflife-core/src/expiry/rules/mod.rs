//! Rule-based date scanning, normalization and scoring for label text.

pub mod normalize;
pub mod patterns;
pub mod scanner;
pub mod scoring;

pub use normalize::{month_number, normalize_date, parse_year};
pub use patterns::DateShape;
pub use scanner::{scan_dates, DateMatch, ScanMode};
pub use scoring::{CandidateScorer, DateCandidate};
