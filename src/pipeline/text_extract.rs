//! Extract `(test, value, lower-upper)` triples from raw report text.
//!
//! OCR and PDF text arrives with headers, patient details and column titles
//! interleaved with the results. Known header phrases are blanked first, then
//! whitespace is collapsed and a bounded pattern scans for
//! `<name> [(<unit>)] <value> <lower>-<upper>`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::TestItem;

/// Header/footer phrases with self-delimiting values, each bounded to its
/// own line.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let phrases = [
        r"\bReport[ \t]+ID[: \t]*\S+",
        r"\bTest[ \t]+Result[ \t]+Reference[ \t]+Range",
        r"\bReport[ \t]+Date[: \t]*\S+",
        r"\bSex[: \t]*(?:Male|Female|[MF])\b",
        r"\bAge[: \t]*\d+",
    ];
    Regex::new(&format!("(?i){}", phrases.join("|"))).expect("valid regex")
});

/// Person-name headers. The value is capped at three words; see
/// [`returned_tail`] for words handed back to the text.
static NAME_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Patient[ \t]+Name|Physician)[: \t]*((?:[A-Za-z][A-Za-z.\-]*[ \t]*){1,3})",
    )
    .expect("valid regex")
});

static NAME_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z.\-]*").expect("valid regex"));

/// Words that start another header and never belong to a person's name.
const HEADER_KEYWORDS: &[&str] = &["patient", "physician", "report", "test", "age", "sex"];

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Name is capped at 40 characters so a lazy match cannot absorb unrelated
/// preceding text. A parenthesized unit after the name is discarded.
static TRIPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"([A-Za-z][A-Za-z0-9 &.%/()\-]{1,40}?)",
        r"(?:\s*\([^)]*\))?",
        r"\s+",
        r"([0-9]+(?:\.[0-9]+)?)",
        r"\s+",
        r"([0-9]+(?:\.[0-9]+)?)\s*[-\u{2013}\u{2014}]\s*([0-9]+(?:\.[0-9]+)?)",
    ))
    .expect("valid regex")
});

/// Column-title words that leak into captured names.
static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Result|Reference|Range|Test)\b").expect("valid regex")
});

/// Blank header phrases and collapse whitespace.
pub fn clean_report_text(raw: &str) -> String {
    let without_headers = HEADER_RE.replace_all(raw, " ");
    let without_names = strip_name_headers(&without_headers);
    WHITESPACE_RE
        .replace_all(&without_names, " ")
        .trim()
        .to_string()
}

/// Remove name headers until none remain. Each pass drops at least one
/// header label, so the loop ends.
fn strip_name_headers(text: &str) -> String {
    let mut text = text.to_string();
    while NAME_HEADER_RE.is_match(&text) {
        text = strip_name_headers_once(&text);
    }
    text
}

fn strip_name_headers_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in NAME_HEADER_RE.captures_iter(text) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push(' ');
        out.push_str(returned_tail(value.as_str(), &text[whole.end()..]));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Part of a captured name value that belongs to the following text: from
/// the first header keyword on, or the last word when a number follows
/// directly (a test name such as "Hemoglobin 11.0").
fn returned_tail<'t>(value: &'t str, rest: &str) -> &'t str {
    let tokens: Vec<_> = NAME_TOKEN_RE.find_iter(value).collect();
    if let Some(stop) = tokens.iter().find(|t| {
        let word = t.as_str().trim_end_matches('.').to_lowercase();
        HEADER_KEYWORDS.contains(&word.as_str())
    }) {
        return &value[stop.start()..];
    }

    let number_follows = rest
        .trim_start()
        .starts_with(|c: char| c.is_ascii_digit() || c == '(');
    match tokens.last() {
        Some(last) if number_follows && tokens.len() > 1 => &value[last.start()..],
        _ => "",
    }
}

/// Scan raw report text for test triples. Items carry name, value and both
/// bounds; unit and prediction stay empty. Never fails.
pub fn extract_test_items(raw: &str) -> Vec<TestItem> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let text = clean_report_text(raw);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for caps in TRIPLE_RE.captures_iter(&text) {
        let Some(name) = clean_name(&caps[1]) else {
            continue;
        };
        let (Ok(value), Ok(lower), Ok(upper)) = (
            caps[2].parse::<f64>(),
            caps[3].parse::<f64>(),
            caps[4].parse::<f64>(),
        ) else {
            continue;
        };

        let key = (
            name.to_lowercase(),
            value.to_bits(),
            lower.to_bits(),
            upper.to_bits(),
        );
        if !seen.insert(key) {
            continue;
        }
        items.push(TestItem::new(&name, Some(value)).with_range(lower, upper));
    }

    tracing::debug!(count = items.len(), "Extracted test triples from report text");
    items
}

/// Strip boilerplate words; reject empty names and short purely alphabetic
/// artifacts such as a stray "M" from a sex field.
fn clean_name(raw: &str) -> Option<String> {
    let stripped = BOILERPLATE_RE.replace_all(raw, "");
    let name = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return None;
    }
    if name.chars().count() <= 2 && name.chars().all(char::is_alphabetic) {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> &'static str {
        "Report ID: BR100001\n\
         Patient Name: John Doe\n\
         Age: 45 Sex: M\n\
         Physician: Dr. A. Rao\n\
         Report Date: 2024-03-01\n\
         Test Result Reference Range\n\
         Hemoglobin (g/dL) 11.0 13.0-17.0\n\
         Fasting Glucose (mg/dL) 230 70\u{2013}110\n\
         Creatinine 1.1 0.6 - 1.3\n"
    }

    #[test]
    fn clean_synthetic_triple() {
        let items = extract_test_items("Hemoglobin 11.0 13.0-17.0");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Hemoglobin");
        assert_eq!(items[0].value, Some(11.0));
        assert_eq!(items[0].ref_lower, Some(13.0));
        assert_eq!(items[0].ref_upper, Some(17.0));
        assert!(items[0].unit.is_none());
        assert!(items[0].prediction.is_none());
    }

    #[test]
    fn full_report_with_headers() {
        let items = extract_test_items(sample_report());
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Hemoglobin", "Fasting Glucose", "Creatinine"]);
        assert_eq!(items[1].value, Some(230.0));
        assert_eq!(items[1].ref_lower, Some(70.0));
        assert_eq!(items[1].ref_upper, Some(110.0));
        assert_eq!(items[2].ref_lower, Some(0.6));
    }

    #[test]
    fn headers_are_blanked() {
        let cleaned = clean_report_text(sample_report());
        assert!(!cleaned.contains("BR100001"));
        assert!(!cleaned.contains("John Doe"));
        assert!(!cleaned.contains("Rao"));
        assert!(!cleaned.contains("2024-03-01"));
        assert!(!cleaned.contains("Reference Range"));
        assert!(!cleaned.contains('\n'));
        assert!(cleaned.starts_with("Hemoglobin"));
    }

    #[test]
    fn single_line_report_keeps_every_row() {
        let text = "Report ID: BR1 Patient Name: John Doe Age: 45 Sex: M \
                    Physician: Dr. A. Rao Hemoglobin 11.0 13.0-17.0 Glucose 95 70-110";
        let cleaned = clean_report_text(text);
        assert_eq!(cleaned, "Hemoglobin 11.0 13.0-17.0 Glucose 95 70-110");

        let names: Vec<String> = extract_test_items(text).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Hemoglobin", "Glucose"]);
    }

    #[test]
    fn short_physician_name_hands_back_test_name() {
        let text = "Physician: Dr. Rao Hemoglobin 11.0 13.0-17.0";
        let items = extract_test_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Hemoglobin");
        assert!(!clean_report_text(text).contains("Rao"));
    }

    #[test]
    fn name_header_stops_at_next_header() {
        let cleaned =
            clean_report_text("Patient Name: Jane Physician: Dr. Lee Creatinine 1.1 0.6-1.3");
        assert_eq!(cleaned, "Creatinine 1.1 0.6-1.3");
    }

    #[test]
    fn em_dash_separator() {
        let items = extract_test_items("Calcium 9.1 8.5\u{2014}10.5");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ref_upper, Some(10.5));
    }

    #[test]
    fn boilerplate_words_removed_from_name() {
        let items = extract_test_items("Test Glucose Result 95 70-110");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Glucose");
    }

    #[test]
    fn short_alphabetic_artifacts_dropped() {
        let items = extract_test_items("XY 5.0 1.0-2.0 Hemoglobin 11.0 13.0-17.0");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Hemoglobin");
    }

    #[test]
    fn short_name_with_digit_is_kept() {
        let items = extract_test_items("T3 1.2 0.8-2.0");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "T3");
    }

    #[test]
    fn duplicates_collapse_case_insensitively() {
        let items =
            extract_test_items("Glucose 230 70-110\nglucose 230 70-110\nGlucose 231 70-110");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Glucose");
        assert_eq!(items[1].value, Some(231.0));
    }

    #[test]
    fn no_triples_yields_empty() {
        assert!(extract_test_items("Patient notes only. Nothing measured here.").is_empty());
        assert!(extract_test_items("").is_empty());
        assert!(extract_test_items("   \n\t ").is_empty());
    }

    #[test]
    fn name_length_is_bounded() {
        let long_prefix = "a".repeat(80);
        let text = format!("{long_prefix} Glucose 95 70-110");
        let items = extract_test_items(&text);
        assert_eq!(items.len(), 1);
        assert!(items[0].name.chars().count() <= 41);
        assert!(items[0].name.ends_with("Glucose"));
    }
}
