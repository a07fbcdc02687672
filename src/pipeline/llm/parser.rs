use serde::Deserialize;
use serde_json::Value;

use super::LlmError;
use crate::models::{ParseEnumError, RecommendationResult, RiskLevel, SpecialistReferral, Urgency};

/// Slice from the first `{` through the last `}`, if any.
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Decode the JSON object embedded in a model reply.
///
/// Tries the located `{...}` span first, then the whole trimmed text.
pub fn extract_json_object(text: &str) -> Result<Value, LlmError> {
    let candidate = locate_json_object(text).unwrap_or_else(|| text.trim());
    if candidate.is_empty() {
        return Err(LlmError::MalformedResponse("No JSON object found".into()));
    }

    let value: Value =
        serde_json::from_str(candidate).map_err(|e| LlmError::JsonParsing(e.to_string()))?;

    if !value.is_object() {
        return Err(LlmError::MalformedResponse(
            "Top-level JSON is not an object".into(),
        ));
    }
    Ok(value)
}

#[derive(Deserialize)]
struct RawRecommendation {
    overall_risk: Option<String>,
    #[serde(default)]
    suggestions: Vec<Value>,
    #[serde(default)]
    specialist_referrals: Vec<RawReferral>,
}

#[derive(Deserialize)]
struct RawReferral {
    test: Option<String>,
    specialist: Option<String>,
    urgency: Option<String>,
}

/// Parse a model reply into the recommendation schema.
///
/// Risk and urgency are matched case-insensitively. Anything outside the
/// schema is an error so the caller can fall back.
pub fn parse_recommendation_reply(text: &str) -> Result<RecommendationResult, LlmError> {
    let value = extract_json_object(text)?;
    let raw: RawRecommendation =
        serde_json::from_value(value).map_err(|e| LlmError::JsonParsing(e.to_string()))?;

    let risk_label = raw
        .overall_risk
        .ok_or_else(|| LlmError::MalformedResponse("Missing overall_risk".into()))?;
    let overall_risk: RiskLevel = normalize_label(&risk_label)
        .parse()
        .map_err(|e: ParseEnumError| LlmError::MalformedResponse(e.to_string()))?;

    let suggestions = raw
        .suggestions
        .into_iter()
        .map(|s| match s {
            Value::String(s) => Ok(s.trim().to_string()),
            other => Err(LlmError::MalformedResponse(format!(
                "Suggestion is not a string: {other}"
            ))),
        })
        .filter(|s| !matches!(s, Ok(s) if s.is_empty()))
        .collect::<Result<Vec<_>, _>>()?;

    let referrals = raw
        .specialist_referrals
        .into_iter()
        .map(parse_referral)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecommendationResult::new(overall_risk, suggestions, referrals))
}

fn parse_referral(raw: RawReferral) -> Result<SpecialistReferral, LlmError> {
    let test = required_text(raw.test, "test")?;
    let specialist = required_text(raw.specialist, "specialist")?;
    let urgency: Urgency = match raw.urgency.as_deref().map(normalize_label) {
        Some(label) => label.parse().map_err(|e: ParseEnumError| {
            LlmError::MalformedResponse(e.to_string())
        })?,
        None => Urgency::Routine,
    };
    Ok(SpecialistReferral {
        test,
        specialist,
        urgency,
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, LlmError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LlmError::MalformedResponse(format!("Referral missing {field}")))
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
