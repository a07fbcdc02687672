use serde::{Deserialize, Serialize};

use super::enums::LabStatus;

/// Canonical per-test record every downstream stage works on,
/// whatever shape the input arrived in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestItem {
    pub name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub ref_lower: Option<f64>,
    pub ref_upper: Option<f64>,
    pub prediction: Option<String>,
}

impl TestItem {
    pub fn new(name: &str, value: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            value,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, lower: f64, upper: f64) -> Self {
        self.ref_lower = Some(lower);
        self.ref_upper = Some(upper);
        self
    }

    pub fn with_prediction(mut self, prediction: &str) -> Self {
        self.prediction = Some(prediction.to_string());
        self
    }
}

/// A test joined with its reference bounds, status and specialist advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    pub name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub status: LabStatus,
    pub reference_lower: Option<f64>,
    pub reference_upper: Option<f64>,
    pub specialist: String,
    pub advice: Vec<String>,
}
