use serde::{Deserialize, Serialize};

/// Sex value used when the source table has no sex column or a blank cell.
pub const SEX_ALL: &str = "All";

/// One reference-range row. `test_name_norm` is always derived from
/// `test_name`; build rows through [`ReferenceRow::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub test_name: String,
    pub test_name_norm: String,
    pub sex: String,
    pub unit: Option<String>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ReferenceRow {
    pub fn new(test_name: &str, lower: Option<f64>, upper: Option<f64>) -> Self {
        let test_name = test_name.trim().to_string();
        Self {
            test_name_norm: normalize_test_name(&test_name),
            test_name,
            sex: SEX_ALL.to_string(),
            unit: None,
            lower,
            upper,
        }
    }

    pub fn with_sex(mut self, sex: &str) -> Self {
        let sex = sex.trim();
        self.sex = if sex.is_empty() { SEX_ALL.to_string() } else { sex.to_string() };
        self
    }

    pub fn with_unit(mut self, unit: Option<&str>) -> Self {
        self.unit = unit.map(str::trim).filter(|u| !u.is_empty()).map(String::from);
        self
    }

    /// Both bounds present, so range classification is meaningful.
    pub fn has_range(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}

/// Lookup key shared by the table and the resolver.
pub fn normalize_test_name(name: &str) -> String {
    name.trim().to_lowercase()
}
