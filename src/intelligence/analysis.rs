use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use super::classify::classify_value;
use super::specialist::REPORT_SPECIALISTS;
use crate::models::{ClassifiedEntry, LabStatus, Report, TestItem};
use crate::pipeline::llm::extract_json_object;
use crate::pipeline::normalize::{normalize_tests, payload_sex};
use crate::pipeline::text_extract::extract_test_items;
use crate::reference::{RangeResolver, ReferenceError, ReferenceTable, ResolverOptions};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Model output does not contain a usable JSON object: {0}")]
    MalformedModelOutput(String),

    #[error("Reference table error: {0}")]
    Reference(#[from] ReferenceError),
}

/// Joins test items with a reference table into a [`Report`].
pub struct Analyzer<'a> {
    resolver: RangeResolver<'a>,
}

impl<'a> Analyzer<'a> {
    pub fn new(table: &'a ReferenceTable) -> Self {
        Self::with_options(table, ResolverOptions::default())
    }

    pub fn with_options(table: &'a ReferenceTable, options: ResolverOptions) -> Self {
        Self {
            resolver: RangeResolver::with_options(table, options),
        }
    }

    pub fn analyze_items(&self, sex: Option<&str>, items: &[TestItem]) -> Report {
        let _span = tracing::info_span!("analyze", tests = items.len()).entered();

        let entries: Vec<ClassifiedEntry> = items
            .iter()
            .map(|item| self.classify_item(sex, item))
            .collect();
        let report = Report::from_entries(sex.map(str::to_string), entries);

        tracing::info!(flags = report.flags.len(), "Analysis complete");
        report
    }

    /// Raw report text through the text extractor.
    pub fn analyze_text(&self, raw_text: &str) -> Report {
        let items = extract_test_items(raw_text);
        self.analyze_items(None, &items)
    }

    /// Any payload shape the normalizer understands.
    pub fn analyze_payload(&self, payload: &Value) -> Report {
        let sex = payload_sex(payload);
        let items = normalize_tests(payload);
        self.analyze_items(sex.as_deref(), &items)
    }

    /// A model reply embedding `{sex, tests: [...], notes}`. The reply is kept
    /// on the report as `raw_output`.
    pub fn analyze_model_output(&self, text: &str) -> Result<Report, AnalysisError> {
        let payload = extract_json_object(text)
            .map_err(|e| AnalysisError::MalformedModelOutput(e.to_string()))?;
        Ok(self.analyze_payload(&payload).with_raw_output(text))
    }

    fn classify_item(&self, sex: Option<&str>, item: &TestItem) -> ClassifiedEntry {
        let row = self.resolver.resolve_for_sex(&item.name, sex);

        // The item's own range only covers tests the table lacks.
        let (lower, upper) = match row {
            Some(row) => (row.lower, row.upper),
            None => (item.ref_lower, item.ref_upper),
        };
        let status = match row {
            None if lower.is_none() || upper.is_none() => {
                tracing::debug!(test = %item.name, "No reference row");
                LabStatus::NoReference
            }
            _ => classify_value(item.value, lower, upper),
        };

        let (specialist, tips) = REPORT_SPECIALISTS.map(&item.name);
        ClassifiedEntry {
            name: item.name.clone(),
            value: item.value,
            unit: item
                .unit
                .clone()
                .or_else(|| row.and_then(|r| r.unit.clone())),
            status,
            reference_lower: lower,
            reference_upper: upper,
            specialist: specialist.to_string(),
            advice: tips.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Load a reference table and analyze one model reply against it.
pub fn analyze_with_ranges(
    ranges_path: &Path,
    model_output: &str,
) -> Result<Report, AnalysisError> {
    let table = ReferenceTable::load(ranges_path)?;
    Analyzer::new(&table).analyze_model_output(model_output)
}
