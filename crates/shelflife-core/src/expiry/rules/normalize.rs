//! Normalization of date-shaped strings into calendar dates.
//!
//! Ambiguous numeric dates are read day-first, and a missing day defaults to
//! the first of the month.

use std::ops::Range;

use chrono::NaiveDate;
use regex::Captures;

use super::patterns::DateShape;

/// Normalize any supported date string into a calendar date.
///
/// Returns `None` for strings that are not date-shaped or that name a day
/// which does not exist.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DateShape::ALL
        .iter()
        .find_map(|shape| shape.normalize(text))
}

impl DateShape {
    /// Normalize a string that is entirely of this shape.
    pub fn normalize(self, text: &str) -> Option<NaiveDate> {
        let caps = self.exact_pattern().captures(text.trim())?;
        self.from_captures(&caps)
    }

    fn from_captures(self, caps: &Captures<'_>) -> Option<NaiveDate> {
        match self {
            DateShape::NumericDayMonthYear => {
                let first = number(&caps[1])?;
                let second = number(&caps[2])?;
                let year = parse_year(&caps[3])?;
                NaiveDate::from_ymd_opt(year, second, first).or_else(|| {
                    // 07/25/2025 cannot be day-first
                    if second > 12 && first <= 12 {
                        NaiveDate::from_ymd_opt(year, first, second)
                    } else {
                        None
                    }
                })
            }
            DateShape::NumericYearMonthDay => {
                let year = number(&caps[1])? as i32;
                NaiveDate::from_ymd_opt(year, number(&caps[2])?, number(&caps[3])?)
            }
            DateShape::DayMonthNameYear => {
                let day = number(&caps[1])?;
                let month = month_number(&caps[2])?;
                NaiveDate::from_ymd_opt(parse_year(&caps[3])?, month, day)
            }
            DateShape::MonthNameDayYear => {
                let month = month_number(&caps[1])?;
                let day = number(&caps[2])?;
                NaiveDate::from_ymd_opt(parse_year(&caps[3])?, month, day)
            }
            DateShape::MonthNameYear => {
                let month = month_number(&caps[1])?;
                NaiveDate::from_ymd_opt(parse_year(&caps[2])?, month, 1)
            }
            DateShape::NumericMonthYear => {
                let month = number(&caps[1])?;
                NaiveDate::from_ymd_opt(number(&caps[2])? as i32, month, 1)
            }
            DateShape::NumericYearMonth => {
                let year = number(&caps[1])? as i32;
                NaiveDate::from_ymd_opt(year, number(&caps[2])?, 1)
            }
            DateShape::Digits => parse_digit_run(&caps[1]),
        }
    }
}

/// Smallest year accepted from a four-digit field inside a digit run.
const MIN_FULL_YEAR: i32 = 1000;

/// Interpret a bare digit run, day-first, with month-year layouts as the
/// second choice.
///
/// A four-digit field read as a year below 1000 rejects that layout, so
/// `20100315` falls through to `YYYYMMDD`.
fn parse_digit_run(digits: &str) -> Option<NaiveDate> {
    let part = |range: Range<usize>| digits.get(range).and_then(number);
    let year = |range: Range<usize>| {
        part(range)
            .map(|y| y as i32)
            .filter(|y| *y >= MIN_FULL_YEAR)
    };
    let ymd = |y: Option<i32>, m: Option<u32>, d: Option<u32>| {
        NaiveDate::from_ymd_opt(y?, m?, d?)
    };

    match digits.len() {
        // DDMMYY, then MMYYYY
        6 => ymd(digits.get(4..6).and_then(parse_year), part(2..4), part(0..2))
            .or_else(|| ymd(year(2..6), part(0..2), Some(1))),
        // DMMYYYY, then DDMYYYY
        7 => ymd(year(3..7), part(1..3), part(0..1))
            .or_else(|| ymd(year(3..7), part(2..3), part(0..2))),
        // DDMMYYYY, then YYYYMMDD
        8 => ymd(year(4..8), part(2..4), part(0..2))
            .or_else(|| ymd(year(0..4), part(4..6), part(6..8))),
        _ => None,
    }
}

fn number(s: &str) -> Option<u32> {
    s.parse().ok()
}

/// Expand a two or four digit year. Two-digit years 00-50 map to 20xx and
/// 51-99 to 19xx.
pub fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Month number for an English month name or abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).flat_map(char::to_lowercase).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_month_name_without_day() {
        assert_eq!(normalize_date("MAR 2026"), ymd(2026, 3, 1));
        assert_eq!(normalize_date("MAR2026"), ymd(2026, 3, 1));
        assert_eq!(normalize_date("September 2027"), ymd(2027, 9, 1));
    }

    #[test]
    fn test_day_month_name_year() {
        assert_eq!(normalize_date("12 July 2025"), ymd(2025, 7, 12));
        assert_eq!(normalize_date("01 Jan 25"), ymd(2025, 1, 1));
        assert_eq!(normalize_date("5 sept 2026"), ymd(2026, 9, 5));
    }

    #[test]
    fn test_month_name_day_year() {
        assert_eq!(normalize_date("July 12, 2025"), ymd(2025, 7, 12));
        assert_eq!(normalize_date("Feb 3 2026"), ymd(2026, 2, 3));
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(normalize_date("2025-07-12"), ymd(2025, 7, 12));
        assert_eq!(normalize_date("2025/7/2"), ymd(2025, 7, 2));
    }

    #[test]
    fn test_numeric_is_day_first() {
        assert_eq!(normalize_date("12/07/2025"), ymd(2025, 7, 12));
        assert_eq!(normalize_date("03-04-26"), ymd(2026, 4, 3));
    }

    #[test]
    fn test_numeric_month_first_when_day_first_is_impossible() {
        assert_eq!(normalize_date("07/25/2025"), ymd(2025, 7, 25));
        assert_eq!(normalize_date("31/31/2025"), None);
    }

    #[test]
    fn test_month_year_both_orders() {
        assert_eq!(normalize_date("03/2026"), ymd(2026, 3, 1));
        assert_eq!(normalize_date("2026/03"), ymd(2026, 3, 1));
        assert_eq!(normalize_date("13/2026"), None);
    }

    #[test]
    fn test_digit_runs() {
        assert_eq!(normalize_date("032026"), ymd(2026, 3, 1));
        assert_eq!(normalize_date("230326"), ymd(2026, 3, 23));
        assert_eq!(normalize_date("1032026"), ymd(2026, 3, 1));
        assert_eq!(normalize_date("12072025"), ymd(2025, 7, 12));
        assert_eq!(normalize_date("20250712"), ymd(2025, 7, 12));
        assert_eq!(normalize_date("999999"), None);
    }

    #[test]
    fn test_compact_year_first_dates_before_2013() {
        assert_eq!(normalize_date("20100315"), ymd(2010, 3, 15));
        assert_eq!(normalize_date("20001231"), ymd(2000, 12, 31));
        assert_eq!(normalize_date("20120101"), ymd(2012, 1, 1));
        // both layouts valid: day-first still wins
        assert_eq!(normalize_date("01022025"), ymd(2025, 2, 1));
        assert_eq!(normalize_date("12120999"), None);
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(parse_year("50"), Some(2050));
        assert_eq!(parse_year("51"), Some(1951));
        assert_eq!(parse_year("2031"), Some(2031));
        assert_eq!(parse_year("202"), None);
    }

    #[test]
    fn test_rejects_non_dates() {
        assert_eq!(normalize_date("notadate"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("31/02/2025"), None);
        assert_eq!(normalize_date("12/07/202"), None);
    }

    #[test]
    fn test_tolerates_surrounding_whitespace() {
        assert_eq!(normalize_date("  12 July 2025\n"), ymd(2025, 7, 12));
    }
}
