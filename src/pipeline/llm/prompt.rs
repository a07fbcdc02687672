use serde_json::{json, Value};

use crate::models::TestItem;

pub const RECOMMENDATION_SYSTEM_PROMPT: &str = r#"
You are an experienced clinical lab assistant. You review lab results and
suggest next steps for the patient and their physician.

RULES:
1. Base every suggestion on the values provided. Do not invent tests.
2. Keep suggestions short and actionable (1-3 per flagged test).
3. Output MUST be a single valid JSON object with no surrounding commentary.
"#;

/// Build the recommendation prompt, listing at most `max_tests` tests.
pub fn build_recommendation_prompt(items: &[TestItem], max_tests: usize) -> String {
    let limit = max_tests.max(1);
    let listed: Vec<Value> = items.iter().take(limit).map(prompt_entry).collect();
    let omitted = items.len().saturating_sub(limit);

    let omitted_note = if omitted > 0 {
        format!("NOTE: {omitted} additional test(s) were omitted from this list.\n")
    } else {
        String::new()
    };

    format!(
        r#"Given a JSON array of lab results (test name, numeric value, unit, reference range if available),
return a JSON object with the following keys:
 - overall_risk: one of ["low", "moderate", "high"]
 - suggestions: an array of short actionable suggestions (1-3 per flagged test)
 - specialist_referrals: an array of objects with keys {{"test", "specialist", "urgency"}},
   where urgency is one of ["routine", "urgent"]
Return ONLY valid JSON. Input tests JSON follows:
{omitted_note}
{tests:#}
"#,
        tests = Value::Array(listed),
    )
}

fn prompt_entry(item: &TestItem) -> Value {
    let mut entry = json!({
        "test": item.name,
        "value": item.value,
        "unit": item.unit,
        "ref_lower": item.ref_lower,
        "ref_upper": item.ref_upper,
    });
    if let Some(prediction) = &item.prediction {
        entry["prediction"] = json!(prediction);
    }
    entry
}
