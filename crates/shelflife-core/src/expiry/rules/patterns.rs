//! Date shape patterns for label text.
//!
//! Every shape is compiled twice from the same body: word-bounded for scanning
//! free text, and anchored for normalizing a single string.

use lazy_static::lazy_static;
use regex::Regex;

/// Month names and abbreviations, longest alternative first within each month.
pub const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

/// Pattern bodies in scan order. `MONTH` is substituted at compile time.
const SHAPE_BODIES: [&str; 8] = [
    // 12/07/2025
    r"(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})",
    // 2025-07-12
    r"(\d{4})[/-](\d{1,2})[/-](\d{1,2})",
    // 12 July 2025
    r"(\d{1,2})\s+(MONTH)\s+(\d{2,4})",
    // July 12, 2025
    r"(MONTH)\s+(\d{1,2}),?\s+(\d{2,4})",
    // MAR2026, MAR 2026
    r"(MONTH)\s*(\d{2,4})",
    // 03/2026
    r"(\d{1,2})[/-](\d{4})",
    // 2026/03
    r"(\d{4})[/-](\d{1,2})",
    // 032026, 230326, 20250712
    r"(\d{6,8})",
];

fn compile(template: &str, body: &str) -> Regex {
    let source = template.replace("BODY", &body.replace("MONTH", MONTH));
    Regex::new(&source).unwrap()
}

lazy_static! {
    /// Word-bounded shape patterns, indexed like [`DateShape::ALL`].
    pub static ref SCAN_PATTERNS: Vec<Regex> = SHAPE_BODIES
        .iter()
        .map(|body| compile(r"(?i)\bBODY\b", body))
        .collect();

    /// Anchored shape patterns, indexed like [`DateShape::ALL`].
    pub static ref EXACT_PATTERNS: Vec<Regex> = SHAPE_BODIES
        .iter()
        .map(|body| compile(r"(?i)^BODY$", body))
        .collect();

    /// Any month word, anywhere.
    pub static ref MONTH_WORD: Regex = Regex::new(&format!("(?i){}", MONTH)).unwrap();
}

/// A date-shaped token layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateShape {
    /// `D/M/Y` with `/` or `-`.
    NumericDayMonthYear,
    /// `Y-M-D` with `/` or `-`.
    NumericYearMonthDay,
    /// `12 July 2025`.
    DayMonthNameYear,
    /// `July 12, 2025`.
    MonthNameDayYear,
    /// `MAR2026`, `March 26`.
    MonthNameYear,
    /// `03/2026`.
    NumericMonthYear,
    /// `2026/03`.
    NumericYearMonth,
    /// Bare run of 6 to 8 digits.
    Digits,
}

impl DateShape {
    /// All shapes in scan order.
    pub const ALL: [DateShape; 8] = [
        DateShape::NumericDayMonthYear,
        DateShape::NumericYearMonthDay,
        DateShape::DayMonthNameYear,
        DateShape::MonthNameDayYear,
        DateShape::MonthNameYear,
        DateShape::NumericMonthYear,
        DateShape::NumericYearMonth,
        DateShape::Digits,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Pattern used to find this shape inside free text.
    pub fn scan_pattern(self) -> &'static Regex {
        &SCAN_PATTERNS[self.index()]
    }

    /// Pattern matching a whole string of this shape.
    pub fn exact_pattern(self) -> &'static Regex {
        &EXACT_PATTERNS[self.index()]
    }
}
