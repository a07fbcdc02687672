//! Turn arbitrarily shaped JSON payloads into canonical [`TestItem`]s.
//!
//! Payload shapes are sniffed by a fixed, prioritized list of extractors; the
//! first one that recognizes the payload wins. Field coercion is per-field
//! lenient: a bad cell becomes `None`, the record survives.

use serde_json::{Map, Value};

use crate::models::TestItem;

const NAME_KEYS: &[&str] = &["name", "test", "test_name", "Test"];
const VALUE_KEYS: &[&str] = &["value"];
const UNIT_KEYS: &[&str] = &["unit", "units"];
const LOWER_KEYS: &[&str] = &["ref_lower", "lower", "reference_lower"];
const UPPER_KEYS: &[&str] = &["ref_upper", "upper", "reference_upper"];
const PREDICTION_KEYS: &[&str] = &["prediction", "status"];

/// Keyed list fields, in precedence order.
const LIST_KEYS: &[&str] = &["mlPredictions", "extractedValues", "items", "tests"];

type ShapeExtractor = fn(&Value) -> Option<Vec<TestItem>>;

/// Tried in order; the first `Some` short-circuits.
const SHAPE_EXTRACTORS: &[(&str, ShapeExtractor)] = &[
    ("list", from_list),
    ("keyed_list", from_keyed_list),
    ("nested_report", from_nested_report),
    ("any_list_field", from_any_list_field),
];

/// Normalize any payload into a (possibly empty) list of test items.
/// Never fails; callers must handle the empty case.
pub fn normalize_tests(input: &Value) -> Vec<TestItem> {
    for (shape, extract) in SHAPE_EXTRACTORS {
        if let Some(items) = extract(input) {
            tracing::debug!(shape, count = items.len(), "Normalized test payload");
            return items;
        }
    }
    tracing::debug!("No usable test list found in payload");
    Vec::new()
}

/// Patient sex carried by a payload (`sex` at top level or under `report`).
pub fn payload_sex(input: &Value) -> Option<String> {
    let obj = input.as_object()?;
    text_field(obj, &["sex"]).or_else(|| obj.get("report").and_then(payload_sex))
}

fn from_list(input: &Value) -> Option<Vec<TestItem>> {
    input.as_array().map(|arr| coerce_all(arr))
}

fn from_keyed_list(input: &Value) -> Option<Vec<TestItem>> {
    let obj = input.as_object()?;
    LIST_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(|arr| coerce_all(arr))
}

fn from_nested_report(input: &Value) -> Option<Vec<TestItem>> {
    let report = input.as_object()?.get("report")?;
    report.is_object().then(|| normalize_tests(report))
}

/// Last resort: the first list-valued field, in document order, that yields
/// at least one record.
fn from_any_list_field(input: &Value) -> Option<Vec<TestItem>> {
    input
        .as_object()?
        .values()
        .filter_map(Value::as_array)
        .map(|arr| coerce_all(arr))
        .find(|items| !items.is_empty())
}

fn coerce_all(elements: &[Value]) -> Vec<TestItem> {
    elements
        .iter()
        .filter_map(Value::as_object)
        .map(coerce_item)
        .collect()
}

/// Coerce one record through the alias tables.
pub fn coerce_item(record: &Map<String, Value>) -> TestItem {
    TestItem {
        name: text_field(record, NAME_KEYS).unwrap_or_default(),
        value: number_field(record, VALUE_KEYS),
        unit: text_field(record, UNIT_KEYS),
        ref_lower: number_field(record, LOWER_KEYS),
        ref_upper: number_field(record, UPPER_KEYS),
        prediction: text_field(record, PREDICTION_KEYS),
    }
}

/// First alias holding something other than null or an empty string.
fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| match record.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    })
}

fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let text = match first_present(record, keys)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    Some(text)
}

fn number_field(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let number = match first_present(record, keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_list_of_records() {
        let items = normalize_tests(&json!([
            {"name": "Glucose", "value": 230, "unit": "mg/dL"},
            {"test": "Hemoglobin", "value": "11.0", "lower": "13", "upper": 17.0},
        ]));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Glucose");
        assert_eq!(items[0].value, Some(230.0));
        assert_eq!(items[0].unit.as_deref(), Some("mg/dL"));
        assert_eq!(items[1].name, "Hemoglobin");
        assert_eq!(items[1].value, Some(11.0));
        assert_eq!(items[1].ref_lower, Some(13.0));
        assert_eq!(items[1].ref_upper, Some(17.0));
    }

    #[test]
    fn ml_predictions_take_precedence() {
        let payload = json!({
            "tests": [{"name": "from tests"}],
            "extractedValues": [{"name": "from extracted"}],
            "mlPredictions": [{"test": "Glucose", "value": 120, "prediction": "high"}],
        });
        let items = normalize_tests(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Glucose");
        assert_eq!(items[0].prediction.as_deref(), Some("high"));
    }

    #[test]
    fn extracted_values_before_items_before_tests() {
        let payload = json!({
            "tests": [{"name": "c"}],
            "items": [{"name": "b"}],
            "extractedValues": [{"name": "a"}],
        });
        assert_eq!(normalize_tests(&payload)[0].name, "a");

        let payload = json!({"tests": [{"name": "c"}], "items": [{"name": "b"}]});
        assert_eq!(normalize_tests(&payload)[0].name, "b");

        let payload = json!({"tests": [{"name": "c"}]});
        assert_eq!(normalize_tests(&payload)[0].name, "c");
    }

    #[test]
    fn empty_keyed_list_still_wins() {
        let payload = json!({"items": [], "other": [{"name": "ignored"}]});
        assert!(normalize_tests(&payload).is_empty());
    }

    #[test]
    fn nested_report_is_recursed() {
        let payload = json!({
            "ok": true,
            "report": {"sex": "Female", "mlPredictions": [{"name": "Creatinine", "value": 2.1}]}
        });
        let items = normalize_tests(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Creatinine");
        assert_eq!(payload_sex(&payload).as_deref(), Some("Female"));
    }

    #[test]
    fn any_list_field_in_document_order() {
        let payload = json!({
            "zeta": ["strings", "only"],
            "alpha": [{"name": "Urea", "value": 30}],
            "beta": [{"name": "Later"}],
        });
        let items = normalize_tests(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Urea");
    }

    #[test]
    fn coercion_failures_degrade_per_field() {
        let items = normalize_tests(&json!([{
            "Test": "  Sodium ",
            "value": "n/a",
            "units": "",
            "ref_lower": "",
            "lower": "135",
            "reference_upper": {"bad": true},
            "status": "low",
        }]));
        let item = &items[0];
        assert_eq!(item.name, "Sodium");
        assert_eq!(item.value, None);
        assert_eq!(item.unit, None);
        assert_eq!(item.ref_lower, Some(135.0));
        assert_eq!(item.ref_upper, None);
        assert_eq!(item.prediction.as_deref(), Some("low"));
    }

    #[test]
    fn zero_bound_is_kept() {
        let items = normalize_tests(&json!([
            {"name": "CRP", "value": 3, "ref_lower": 0, "ref_upper": 5}
        ]));
        assert_eq!(items[0].ref_lower, Some(0.0));
    }

    #[test]
    fn missing_name_becomes_empty_string() {
        let items = normalize_tests(&json!([{"value": 1.5}]));
        assert_eq!(items[0].name, "");
        assert_eq!(items[0].value, Some(1.5));
    }

    #[test]
    fn non_record_elements_are_skipped() {
        let items = normalize_tests(&json!([1, "two", null, [3], {"name": "Kept"}]));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Kept");
    }

    #[test]
    fn total_on_degenerate_input() {
        assert!(normalize_tests(&json!([])).is_empty());
        assert!(normalize_tests(&json!({})).is_empty());
        assert!(normalize_tests(&json!([1, 2, 3])).is_empty());
        assert!(normalize_tests(&json!("text")).is_empty());
        assert!(normalize_tests(&json!(null)).is_empty());
        assert!(normalize_tests(&json!({"report": "not an object"})).is_empty());
    }
}
