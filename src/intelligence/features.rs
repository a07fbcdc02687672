//! Numeric rows for the external abnormality classifier.

use serde::{Deserialize, Serialize};

use crate::models::TestItem;

/// Column order expected by the classifier.
pub const FEATURE_NAMES: [&str; 6] = [
    "value",
    "lower",
    "upper",
    "pct_of_range",
    "dist_low",
    "dist_up",
];

/// Keeps the range denominator away from zero.
const RANGE_EPSILON: f64 = 1e-8;

/// Missing bounds are NaN and propagate into the distance columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub pct_of_range: f64,
    pub dist_low: f64,
    pub dist_up: f64,
}

impl FeatureRow {
    pub fn from_item(item: &TestItem) -> Self {
        let value = item.value.unwrap_or(0.0);
        let lower = item.ref_lower.unwrap_or(f64::NAN);
        let upper = item.ref_upper.unwrap_or(f64::NAN);
        let pct_of_range = if lower.is_nan() || upper.is_nan() {
            0.0
        } else {
            (value - lower) / (upper - lower + RANGE_EPSILON)
        };
        Self {
            value,
            lower,
            upper,
            pct_of_range,
            dist_low: value - lower,
            dist_up: upper - value,
        }
    }

    /// Values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.value,
            self.lower,
            self.upper,
            self.pct_of_range,
            self.dist_low,
            self.dist_up,
        ]
    }
}

pub fn prepare_features(items: &[TestItem]) -> Vec<FeatureRow> {
    items.iter().map(FeatureRow::from_item).collect()
}

/// Pair classifier labels back onto their items, in order. Extra items or
/// labels beyond the shorter list are dropped.
pub fn attach_predictions(items: &[TestItem], labels: &[String]) -> Vec<TestItem> {
    if items.len() != labels.len() {
        tracing::warn!(
            items = items.len(),
            labels = labels.len(),
            "Prediction count does not match item count"
        );
    }
    items
        .iter()
        .zip(labels)
        .map(|(item, label)| TestItem {
            prediction: Some(label.trim().to_string()),
            ..item.clone()
        })
        .collect()
}
