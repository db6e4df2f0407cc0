//! Contextual scoring and selection of expiry date candidates.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::config::{ExtractionConfig, TieBreak};
use crate::ocr::RecognizedText;

use super::scanner::{scan_dates, ScanMode};

/// A normalized, scored date found in recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateCandidate {
    /// Substring the date was read from.
    pub matched: String,
    /// Normalized date.
    pub date: NaiveDate,
    /// Line the match was found on.
    pub line_index: usize,
    /// Plausibility score, comparable only within one extraction.
    pub score: f64,
}

impl DateCandidate {
    /// Date as `YYYY-MM-DD`.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Scores date matches by their surrounding lines.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    expiry_keywords: Vec<String>,
    manufacture_keywords: Vec<String>,
    expiry_bonus: f64,
    manufacture_penalty: f64,
    month_name_bonus: f64,
    year_weight: f64,
    min_year: i32,
    max_year: i32,
    context_radius: usize,
    tie_break: TieBreak,
}

impl CandidateScorer {
    pub fn new(config: &ExtractionConfig) -> Self {
        let lowercase =
            |words: &[String]| -> Vec<String> { words.iter().map(|w| w.to_lowercase()).collect() };

        Self {
            expiry_keywords: lowercase(&config.expiry_keywords),
            manufacture_keywords: lowercase(&config.manufacture_keywords),
            expiry_bonus: config.expiry_bonus,
            manufacture_penalty: config.manufacture_penalty,
            month_name_bonus: config.month_name_bonus,
            year_weight: config.year_weight,
            min_year: config.min_year,
            max_year: config.max_year,
            context_radius: config.context_radius,
            tie_break: config.tie_break,
        }
    }

    /// Whether a date falls within the plausible year range.
    pub fn is_plausible(&self, date: &NaiveDate) -> bool {
        (self.min_year..=self.max_year).contains(&date.year())
    }

    /// Line `index` and its neighbours, joined by spaces.
    pub fn context_window(&self, lines: &[String], index: usize) -> String {
        if lines.is_empty() {
            return String::new();
        }
        let start = index.saturating_sub(self.context_radius);
        let end = (index + self.context_radius + 1).min(lines.len());
        lines[start..end].join(" ")
    }

    /// Score a normalized date given its matched text and context window.
    pub fn score(&self, date: &NaiveDate, has_month_name: bool, context: &str) -> f64 {
        let context = context.to_lowercase();
        let mut score = 0.0;

        if contains_any(&context, &self.expiry_keywords) {
            score += self.expiry_bonus;
        }
        if contains_any(&context, &self.manufacture_keywords) {
            score -= self.manufacture_penalty;
        }
        if has_month_name {
            score += self.month_name_bonus;
        }

        score + f64::from(date.year() - self.min_year) * self.year_weight
    }

    /// Scan every line and score each plausible date, in discovery order.
    pub fn rank(&self, text: &RecognizedText) -> Vec<DateCandidate> {
        let lines = text.lines();
        let mut candidates = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let matches = scan_dates(line, ScanMode::All);
            if matches.is_empty() {
                continue;
            }
            let context = self.context_window(lines, index);

            for m in matches {
                let Some(date) = m.normalize() else {
                    trace!("Dropping unparseable match {:?} on line {}", m.text, index);
                    continue;
                };
                if !self.is_plausible(&date) {
                    trace!("Dropping implausible date {} from {:?}", date, m.text);
                    continue;
                }

                let score = self.score(&date, m.has_month_name(), &context);
                trace!("Candidate {} from {:?} scored {:.2}", date, m.text, score);

                candidates.push(DateCandidate {
                    matched: m.text.to_string(),
                    date,
                    line_index: index,
                    score,
                });
            }
        }

        candidates
    }

    /// Pick the highest scoring candidate, breaking score ties by date.
    ///
    /// Exact ties on both keep discovery order and the last one wins.
    pub fn select(&self, mut candidates: Vec<DateCandidate>) -> Option<DateCandidate> {
        candidates.sort_by(|a, b| self.compare(a, b));
        candidates.pop()
    }

    fn compare(&self, a: &DateCandidate, b: &DateCandidate) -> Ordering {
        a.score.total_cmp(&b.score).then_with(|| match self.tie_break {
            TieBreak::Later => a.date.cmp(&b.date),
            TieBreak::Earlier => b.date.cmp(&a.date),
        })
    }
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(iso: (i32, u32, u32), score: f64) -> DateCandidate {
        DateCandidate {
            matched: String::new(),
            date: date(iso.0, iso.1, iso.2),
            line_index: 0,
            score,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_context_window_is_clamped() {
        let scorer = CandidateScorer::default();
        let lines: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        assert_eq!(scorer.context_window(&lines, 0), "a b");
        assert_eq!(scorer.context_window(&lines, 1), "a b c");
        assert_eq!(scorer.context_window(&lines, 2), "b c");
    }

    #[test]
    fn test_keyword_weights_are_additive() {
        let scorer = CandidateScorer::default();
        let d = date(2026, 3, 1);

        assert!(approx(scorer.score(&d, false, "EXP"), 5.26));
        assert!(approx(scorer.score(&d, false, "MFG"), -3.74));
        assert!(approx(scorer.score(&d, false, "MFG EXP"), 1.26));
        assert!(approx(scorer.score(&d, true, "Best Before"), 6.26));
        assert!(approx(scorer.score(&d, false, "lot 42"), 0.26));
    }

    #[test]
    fn test_rank_drops_implausible_years() {
        let scorer = CandidateScorer::default();
        let text = RecognizedText::from("EXP 12/07/1999\nPRICE 2051-01-01");

        assert!(scorer.rank(&text).is_empty());
    }

    #[test]
    fn test_rank_records_line_and_match() {
        let scorer = CandidateScorer::default();
        let text = RecognizedText::from("Milk\nEXP MAR 2026");
        let ranked = scorer.rank(&text);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].matched, "MAR 2026");
        assert_eq!(ranked[0].line_index, 1);
        assert_eq!(ranked[0].iso_date(), "2026-03-01");
        assert!(approx(ranked[0].score, 6.26));
    }

    #[test]
    fn test_expiry_context_beats_manufacture_context() {
        let scorer = CandidateScorer::default();
        let text = RecognizedText::from("EXP 12/07/2026\nnet wt 500g\nlot A7\nMFG 01/01/2025");
        let ranked = scorer.rank(&text);

        let exp = ranked.iter().find(|c| c.matched == "12/07/2026").unwrap();
        let mfg = ranked.iter().find(|c| c.matched == "01/01/2025").unwrap();
        assert!(exp.score - mfg.score >= 9.0);

        let best = scorer.select(ranked).unwrap();
        assert_eq!(best.date, date(2026, 7, 12));
    }

    #[test]
    fn test_select_prefers_score_then_later_date() {
        let scorer = CandidateScorer::default();

        let best = scorer
            .select(vec![
                candidate((2027, 1, 1), 1.0),
                candidate((2025, 1, 1), 5.0),
                candidate((2025, 6, 1), 5.0),
            ])
            .unwrap();
        assert_eq!(best.date, date(2025, 6, 1));

        assert_eq!(scorer.select(Vec::new()), None);
    }

    #[test]
    fn test_select_earlier_tie_break() {
        let config = ExtractionConfig {
            tie_break: TieBreak::Earlier,
            ..ExtractionConfig::default()
        };
        let scorer = CandidateScorer::new(&config);

        let best = scorer
            .select(vec![candidate((2025, 6, 1), 5.0), candidate((2025, 1, 1), 5.0)])
            .unwrap();
        assert_eq!(best.date, date(2025, 1, 1));
    }
}
