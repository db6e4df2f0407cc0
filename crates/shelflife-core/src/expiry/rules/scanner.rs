//! Date token scanning.

use chrono::NaiveDate;

use super::patterns::DateShape;

/// How many matches to take from each shape pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Every match of every shape.
    All,
    /// Only the first match of each shape.
    FirstPerShape,
}

/// A date-shaped substring found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch<'a> {
    /// Shape whose pattern produced the match.
    pub shape: DateShape,
    /// Matched text.
    pub text: &'a str,
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset of the match end.
    pub end: usize,
}

impl DateMatch<'_> {
    /// Normalize the matched text using its own shape.
    pub fn normalize(&self) -> Option<NaiveDate> {
        self.shape.normalize(self.text)
    }

    /// Whether the matched text spells out a month.
    pub fn has_month_name(&self) -> bool {
        super::patterns::MONTH_WORD.is_match(self.text)
    }
}

/// Find date-shaped substrings, grouped by shape in scan order.
///
/// Shapes are matched independently, so one date can be reported more than
/// once under different shapes.
pub fn scan_dates(text: &str, mode: ScanMode) -> Vec<DateMatch<'_>> {
    let mut matches = Vec::new();

    for shape in DateShape::ALL {
        let found = shape.scan_pattern().find_iter(text).map(|m| DateMatch {
            shape,
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        });

        match mode {
            ScanMode::All => matches.extend(found),
            ScanMode::FirstPerShape => matches.extend(found.take(1)),
        }
    }

    matches
}
