//! Waste risk scoring for inventory items.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::inventory::days_until;

/// Inputs to a waste risk prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub days_to_expiry: i64,
    pub quantity: u32,
    /// Share of past purchases of this item that were thrown away.
    #[serde(default = "default_wasted_rate")]
    pub previously_wasted_rate: f32,
}

fn default_category() -> String {
    "unknown".to_string()
}

fn default_wasted_rate() -> f32 {
    0.2
}

impl RiskFeatures {
    /// Features for an item expiring on `expiry_date`, seen from `today`.
    pub fn for_item(
        name: impl Into<String>,
        expiry_date: NaiveDate,
        quantity: u32,
        today: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            category: default_category(),
            days_to_expiry: days_until(expiry_date, today),
            quantity,
            previously_wasted_rate: default_wasted_rate(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_wasted_rate(mut self, rate: f32) -> Self {
        self.previously_wasted_rate = rate;
        self
    }
}

/// Predicts how likely an item is to be wasted.
pub trait RiskScorer {
    /// Probability-like score in `[0, 1]`.
    fn score(&self, features: &RiskFeatures) -> f32;
}

/// Fixed rules used when no trained model is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleBasedScorer {
    pub base: f32,
    pub near_expiry_days: i64,
    pub near_expiry_bonus: f32,
    pub bulk_quantity: u32,
    pub bulk_bonus: f32,
}

impl Default for RuleBasedScorer {
    fn default() -> Self {
        Self {
            base: 0.2,
            near_expiry_days: 3,
            near_expiry_bonus: 0.5,
            bulk_quantity: 3,
            bulk_bonus: 0.1,
        }
    }
}

impl RiskScorer for RuleBasedScorer {
    fn score(&self, features: &RiskFeatures) -> f32 {
        let mut score = self.base;
        if features.days_to_expiry <= self.near_expiry_days {
            score += self.near_expiry_bonus;
        }
        if features.quantity >= self.bulk_quantity {
            score += self.bulk_bonus;
        }
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(days: i64, quantity: u32) -> RiskFeatures {
        RiskFeatures {
            name: "Milk".to_string(),
            category: "dairy".to_string(),
            days_to_expiry: days,
            quantity,
            previously_wasted_rate: 0.2,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_rule_based_scores() {
        let scorer = RuleBasedScorer::default();

        assert!(approx(scorer.score(&features(10, 1)), 0.2));
        assert!(approx(scorer.score(&features(3, 1)), 0.7));
        assert!(approx(scorer.score(&features(10, 3)), 0.3));
        assert!(approx(scorer.score(&features(-2, 6)), 0.8));
    }

    #[test]
    fn test_score_is_clamped() {
        let scorer = RuleBasedScorer {
            base: 0.9,
            ..RuleBasedScorer::default()
        };
        assert!(approx(scorer.score(&features(0, 5)), 1.0));

        let scorer = RuleBasedScorer {
            base: -1.0,
            ..RuleBasedScorer::default()
        };
        assert!(approx(scorer.score(&features(30, 1)), 0.0));
    }

    #[test]
    fn test_for_item_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let f = RiskFeatures::for_item("Yogurt", expiry, 2, today);

        assert_eq!(f.days_to_expiry, 3);
        assert_eq!(f.category, "unknown");
        assert!(approx(f.previously_wasted_rate, 0.2));
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let f: RiskFeatures =
            serde_json::from_str(r#"{"name":"Eggs","days_to_expiry":5,"quantity":12}"#).unwrap();
        assert_eq!(f.category, "unknown");
        assert!(approx(f.previously_wasted_rate, 0.2));
    }
}
