use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::enums::{RiskLevel, Urgency};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistReferral {
    pub test: String,
    pub specialist: String,
    pub urgency: Urgency,
}

/// Shared output schema of the external model path and the rule-based fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub overall_risk: RiskLevel,
    pub suggestions: Vec<String>,
    pub specialist_referrals: Vec<SpecialistReferral>,
}

impl RecommendationResult {
    /// Deduplicates suggestions (exact string) and referrals (by test +
    /// specialist), keeping the first occurrence of each.
    pub fn new(
        overall_risk: RiskLevel,
        suggestions: Vec<String>,
        referrals: Vec<SpecialistReferral>,
    ) -> Self {
        let mut seen_suggestions = HashSet::new();
        let suggestions = suggestions
            .into_iter()
            .filter(|s| seen_suggestions.insert(s.clone()))
            .collect();

        let mut seen_referrals = HashSet::new();
        let specialist_referrals = referrals
            .into_iter()
            .filter(|r| seen_referrals.insert((r.test.clone(), r.specialist.clone())))
            .collect();

        Self {
            overall_risk,
            suggestions,
            specialist_referrals,
        }
    }

    /// Result for input that carried no usable tests.
    pub fn unknown() -> Self {
        Self {
            overall_risk: RiskLevel::Unknown,
            suggestions: vec![],
            specialist_referrals: vec![],
        }
    }
}
