use serde::{Deserialize, Serialize};

use super::lab::ClassifiedEntry;

pub const SUMMARY_ALL_NORMAL: &str = "OK: All values are within normal range.";
pub const SUMMARY_NO_TESTS: &str = "UNKNOWN: No test results found.";

/// Terminal artifact of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub sex: Option<String>,
    pub tests: Vec<ClassifiedEntry>,
    pub flags: Vec<ClassifiedEntry>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl Report {
    /// Build a report from classified entries; flags and summary are derived.
    pub fn from_entries(sex: Option<String>, tests: Vec<ClassifiedEntry>) -> Self {
        let flags: Vec<ClassifiedEntry> = tests
            .iter()
            .filter(|e| e.status.is_flagged())
            .cloned()
            .collect();
        let summary = summarize(tests.len(), flags.len());
        Self {
            sex,
            tests,
            flags,
            summary,
            raw_output: None,
        }
    }

    pub fn with_raw_output(mut self, raw: &str) -> Self {
        self.raw_output = Some(raw.to_string());
        self
    }

    /// Plain-text rendering for terminals and logs.
    pub fn human_summary(&self) -> String {
        let mut lines = vec![
            "=== BLOOD REPORT SUMMARY ===".to_string(),
            format!("Sex: {}", self.sex.as_deref().unwrap_or("N/A")),
            self.summary.clone(),
            String::new(),
        ];
        for flag in &self.flags {
            let value = flag
                .value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let measured = match flag.unit.as_deref() {
                Some(unit) => format!("{value} {unit}"),
                None => value,
            };
            lines.push(format!(
                "- {}: {} -> {} ({})",
                flag.name, measured, flag.status, flag.specialist
            ));
            for tip in &flag.advice {
                lines.push(format!("    - {tip}"));
            }
        }
        lines.join("\n")
    }
}

fn summarize(total: usize, flagged: usize) -> String {
    if total == 0 {
        SUMMARY_NO_TESTS.to_string()
    } else if flagged == 0 {
        SUMMARY_ALL_NORMAL.to_string()
    } else {
        format!("WARNING: {flagged} abnormal value(s) detected.")
    }
}
