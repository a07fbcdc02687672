//! Recommendation aggregation.
//!
//! The external model path is tried first when a client is configured. Any
//! transport or decode failure falls through to the rule-based path, which
//! emits the same schema.

use serde_json::Value;

use super::classify::{classify_prediction, PredictionClass};
use super::specialist::{GENERAL_PHYSICIAN, RECOMMENDATION_SPECIALISTS, UNMATCHED_SUGGESTION};
use crate::config::LlmConfig;
use crate::models::{RecommendationResult, RiskLevel, SpecialistReferral, TestItem, Urgency};
use crate::pipeline::llm::{
    build_recommendation_prompt, client_from_config, parse_recommendation_reply, LlmClient,
    LlmError, RECOMMENDATION_SYSTEM_PROMPT,
};
use crate::pipeline::normalize::normalize_tests;

pub struct Recommender {
    llm: Option<Box<dyn LlmClient>>,
    config: LlmConfig,
}

impl Recommender {
    pub fn new(config: LlmConfig, llm: Option<Box<dyn LlmClient>>) -> Self {
        Self { llm, config }
    }

    /// Rule-based only; no external calls are made.
    pub fn fallback_only() -> Self {
        Self::new(LlmConfig::default(), None)
    }

    /// Build the client described by `config`.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let llm = client_from_config(&config)?;
        Ok(Self::new(config, llm))
    }

    pub fn has_external(&self) -> bool {
        self.llm.is_some()
    }

    /// Normalize an arbitrary payload, then recommend.
    pub fn recommend_payload(&self, payload: &Value) -> RecommendationResult {
        let items = normalize_tests(payload);
        self.recommend(&items)
    }

    pub fn recommend(&self, items: &[TestItem]) -> RecommendationResult {
        let _span = tracing::info_span!("recommend", tests = items.len()).entered();

        if items.is_empty() {
            return RecommendationResult::unknown();
        }

        if let Some(result) = self.external_recommendations(items) {
            tracing::info!(risk = %result.overall_risk, "Using external model recommendation");
            return result;
        }

        fallback_recommendations(items)
    }

    /// External model path; `None` on any failure.
    fn external_recommendations(&self, items: &[TestItem]) -> Option<RecommendationResult> {
        let llm = self.llm.as_ref()?;
        let prompt = build_recommendation_prompt(items, self.config.max_prompt_tests);

        let reply = match llm.generate(self.config.model(), &prompt, RECOMMENDATION_SYSTEM_PROMPT) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    provider = %self.config.provider,
                    error = %e,
                    "External model call failed, using rule-based fallback"
                );
                return None;
            }
        };

        match parse_recommendation_reply(&reply) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(
                    provider = %self.config.provider,
                    error = %e,
                    reply_len = reply.len(),
                    "Unusable model reply, using rule-based fallback"
                );
                None
            }
        }
    }
}

/// Deterministic recommendations from per-test prediction labels.
pub fn fallback_recommendations(items: &[TestItem]) -> RecommendationResult {
    let mut severity = 0u8;
    let mut suggestions = Vec::new();
    let mut referrals = Vec::new();

    for item in items {
        let class = classify_prediction(item);
        severity = severity.max(class.severity());
        if class == PredictionClass::Normal {
            continue;
        }

        let urgency = if class.is_critical() {
            Urgency::Urgent
        } else {
            Urgency::Routine
        };

        let specialist = match RECOMMENDATION_SPECIALISTS.find(&item.name) {
            Some(rule) => {
                suggestions.extend(rule.tips.iter().map(|tip| format!("{}: {tip}", item.name)));
                rule.specialist
            }
            None => {
                suggestions.push(format!("{}: {UNMATCHED_SUGGESTION}", item.name));
                GENERAL_PHYSICIAN
            }
        };

        referrals.push(SpecialistReferral {
            test: item.name.clone(),
            specialist: specialist.to_string(),
            urgency,
        });
    }

    let overall_risk = match severity {
        0 => RiskLevel::Low,
        1 => RiskLevel::Moderate,
        _ => RiskLevel::High,
    };

    RecommendationResult::new(overall_risk, suggestions, referrals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::{FailingLlmClient, MockLlmClient};
    use serde_json::json;

    fn glucose_high() -> TestItem {
        TestItem::new("Glucose", Some(150.0))
            .with_range(70.0, 110.0)
            .with_prediction("high")
    }

    #[test]
    fn empty_payload_is_unknown() {
        let recommender = Recommender::fallback_only();
        let result = recommender.recommend_payload(&json!({"tests": []}));
        assert_eq!(result, RecommendationResult::unknown());
        let result = recommender.recommend_payload(&json!("not a payload"));
        assert_eq!(result.overall_risk, RiskLevel::Unknown);
    }

    #[test]
    fn all_normal_is_low_risk() {
        let items = vec![TestItem::new("Glucose", Some(90.0)).with_prediction("normal")];
        let result = fallback_recommendations(&items);
        assert_eq!(result.overall_risk, RiskLevel::Low);
        assert!(result.suggestions.is_empty());
        assert!(result.specialist_referrals.is_empty());
    }

    #[test]
    fn high_without_bounds_is_moderate() {
        let items = vec![TestItem::new("Glucose", Some(150.0)).with_prediction("high")];
        let result = fallback_recommendations(&items);
        assert_eq!(result.overall_risk, RiskLevel::Moderate);
        assert_eq!(
            result.suggestions,
            vec!["Glucose: Reduce sugar intake; check HbA1c if persistently high."]
        );
        assert_eq!(result.specialist_referrals[0].specialist, "Endocrinologist");
        assert_eq!(result.specialist_referrals[0].urgency, Urgency::Routine);
    }

    #[test]
    fn critical_value_is_high_risk_and_urgent() {
        let items = vec![TestItem::new("Creatinine", Some(3.0))
            .with_range(0.6, 1.3)
            .with_prediction("HIGH")];
        let result = fallback_recommendations(&items);
        assert_eq!(result.overall_risk, RiskLevel::High);
        assert_eq!(result.specialist_referrals[0].specialist, "Nephrologist");
        assert_eq!(result.specialist_referrals[0].urgency, Urgency::Urgent);
    }

    #[test]
    fn duplicate_tests_yield_one_referral() {
        let items = vec![glucose_high(), glucose_high()];
        let result = fallback_recommendations(&items);
        assert_eq!(result.specialist_referrals.len(), 1);
        assert_eq!(result.suggestions.len(), 1);
    }

    #[test]
    fn unmatched_test_goes_to_general_physician() {
        let items = vec![TestItem::new("Vitamin D", Some(12.0)).with_prediction("low")];
        let result = fallback_recommendations(&items);
        assert_eq!(
            result.suggestions,
            vec!["Vitamin D: Please review this result with your doctor."]
        );
        assert_eq!(result.specialist_referrals[0].specialist, GENERAL_PHYSICIAN);
    }

    #[test]
    fn severity_folds_with_max() {
        let items = vec![
            TestItem::new("Hemoglobin", Some(5.0))
                .with_range(13.0, 17.0)
                .with_prediction("low"),
            TestItem::new("Glucose", Some(120.0)).with_prediction("high"),
            TestItem::new("Creatinine", Some(1.0)).with_prediction("normal"),
        ];
        let result = fallback_recommendations(&items);
        assert_eq!(result.overall_risk, RiskLevel::High);
        assert_eq!(result.specialist_referrals.len(), 2);
        assert_eq!(result.specialist_referrals[0].urgency, Urgency::Urgent);
        assert_eq!(result.specialist_referrals[1].urgency, Urgency::Routine);
    }

    #[test]
    fn transport_error_falls_back() {
        let items = vec![glucose_high()];
        let recommender = Recommender::new(
            LlmConfig::default(),
            Some(Box::new(FailingLlmClient::unreachable())),
        );
        assert!(recommender.has_external());
        assert_eq!(recommender.recommend(&items), fallback_recommendations(&items));
    }

    #[test]
    fn auth_error_falls_back() {
        let items = vec![glucose_high()];
        let recommender = Recommender::new(
            LlmConfig::default(),
            Some(Box::new(FailingLlmClient::new(LlmError::Auth { status: 403 }))),
        );
        assert_eq!(recommender.recommend(&items).overall_risk, RiskLevel::Moderate);
    }

    #[test]
    fn external_result_is_preferred() {
        let reply = r#"Here is my assessment:
        {"overall_risk": "high", "suggestions": ["See a doctor this week"],
         "specialist_referrals": [{"test": "Glucose", "specialist": "Diabetologist", "urgency": "urgent"}]}"#;
        let recommender =
            Recommender::new(LlmConfig::default(), Some(Box::new(MockLlmClient::new(reply))));
        let result = recommender.recommend(&[glucose_high()]);
        assert_eq!(result.overall_risk, RiskLevel::High);
        assert_eq!(result.suggestions, vec!["See a doctor this week"]);
        assert_eq!(result.specialist_referrals[0].specialist, "Diabetologist");
    }

    #[test]
    fn malformed_reply_falls_back() {
        let recommender = Recommender::new(
            LlmConfig::default(),
            Some(Box::new(MockLlmClient::new("I cannot help with that."))),
        );
        let items = vec![glucose_high()];
        assert_eq!(recommender.recommend(&items), fallback_recommendations(&items));
    }

    #[test]
    fn payload_predictions_drive_fallback() {
        let payload = json!({
            "mlPredictions": [
                {"test": "Hemoglobin", "value": 9.5, "ref_lower": 13, "ref_upper": 17, "prediction": "low"},
                {"test": "Glucose", "value": 95, "prediction": "normal"}
            ]
        });
        let result = Recommender::fallback_only().recommend_payload(&payload);
        assert_eq!(result.overall_risk, RiskLevel::Moderate);
        assert_eq!(result.specialist_referrals.len(), 1);
        assert_eq!(result.specialist_referrals[0].test, "Hemoglobin");
    }

    #[test]
    fn output_schema_is_stable() {
        let result = fallback_recommendations(&[glucose_high()]);
        let json = serde_json::to_value(&result).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["overall_risk", "suggestions", "specialist_referrals"]);
        let referral_keys: Vec<&String> = json["specialist_referrals"][0]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(referral_keys, vec!["test", "specialist", "urgency"]);
    }
}
