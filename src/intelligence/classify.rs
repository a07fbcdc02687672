use crate::models::{LabStatus, TestItem};

/// Multiplier on the upper bound at or above which a value is critical.
pub const CRITICAL_HIGH_FACTOR: f64 = 2.0;
/// Multiplier on the lower bound at or below which a value is critical.
pub const CRITICAL_LOW_FACTOR: f64 = 0.5;

/// Prediction labels treated as non-normal by the fallback recommender.
const ABNORMAL_PREDICTIONS: &[&str] = &["high", "low", "critical_high", "critical_low", "abnormal"];

/// Classify a measured value against its reference range.
///
/// Checks run in a fixed order so the critical band is never masked by the
/// plain low/high bands. Both range ends are inclusive.
pub fn classify_value(value: Option<f64>, lower: Option<f64>, upper: Option<f64>) -> LabStatus {
    let Some(v) = value.filter(|v| !v.is_nan()) else {
        return LabStatus::Unknown;
    };
    let (Some(lower), Some(upper)) = (lower, upper) else {
        return LabStatus::NoReference;
    };

    if v >= CRITICAL_HIGH_FACTOR * upper {
        LabStatus::CriticalHigh
    } else if v <= CRITICAL_LOW_FACTOR * lower {
        LabStatus::CriticalLow
    } else if lower <= v && v <= upper {
        LabStatus::Normal
    } else if v < lower {
        LabStatus::Low
    } else {
        LabStatus::High
    }
}

/// Coarse severity class derived from an upstream prediction label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionClass {
    Normal,
    Abnormal,
    CriticalHigh,
    CriticalLow,
}

impl PredictionClass {
    /// 0 = normal, 1 = abnormal, 2 = critical.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Abnormal => 1,
            Self::CriticalHigh | Self::CriticalLow => 2,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity() == 2
    }
}

/// Derive a class from the item's `prediction` label, refining to a
/// critical class when the value and the relevant bound are known.
/// Without bounds a non-normal prediction stays `Abnormal`.
pub fn classify_prediction(item: &TestItem) -> PredictionClass {
    let label = item
        .prediction
        .as_deref()
        .map(|p| p.trim().to_lowercase())
        .unwrap_or_default();
    if !ABNORMAL_PREDICTIONS.contains(&label.as_str()) {
        return PredictionClass::Normal;
    }

    if let Some(v) = item.value {
        if item.ref_upper.is_some_and(|up| v >= CRITICAL_HIGH_FACTOR * up) {
            return PredictionClass::CriticalHigh;
        }
        if item.ref_lower.is_some_and(|low| v <= CRITICAL_LOW_FACTOR * low) {
            return PredictionClass::CriticalLow;
        }
    }
    PredictionClass::Abnormal
}
