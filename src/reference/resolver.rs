//! Reference-row lookup for a test name.
//!
//! Two tiers: exact match on the normalized name, then the first row whose
//! normalized name appears inside the query. Exact matching keeps "Glucose"
//! from landing on "Glucose Fasting"; the contains tier tolerates verbose
//! labels such as "Serum Creatinine (enzymatic)". Ties resolve to table order.

use serde::{Deserialize, Serialize};

use super::table::ReferenceTable;
use crate::models::{normalize_test_name, ReferenceRow};

/// Tuning for the contains tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Reference names shorter than this never take part in contains
    /// matching. `0` disables the guard.
    pub min_contains_len: usize,
}

pub struct RangeResolver<'a> {
    table: &'a ReferenceTable,
    options: ResolverOptions,
}

impl<'a> RangeResolver<'a> {
    pub fn new(table: &'a ReferenceTable) -> Self {
        Self::with_options(table, ResolverOptions::default())
    }

    pub fn with_options(table: &'a ReferenceTable, options: ResolverOptions) -> Self {
        Self { table, options }
    }

    pub fn resolve(&self, name: &str) -> Option<&'a ReferenceRow> {
        self.resolve_in(name, |_| true)
    }

    /// Like [`resolve`](Self::resolve), restricted to rows whose sex is `All`
    /// or matches `sex`. An absent or unrecognized `sex` places no restriction.
    pub fn resolve_for_sex(&self, name: &str, sex: Option<&str>) -> Option<&'a ReferenceRow> {
        match sex.and_then(canonical_sex) {
            Some(patient) => self.resolve_in(name, |row| match canonical_sex(&row.sex) {
                Some(row_sex) => row_sex == patient,
                None => true,
            }),
            None => self.resolve(name),
        }
    }

    fn resolve_in<F>(&self, name: &str, eligible: F) -> Option<&'a ReferenceRow>
    where
        F: Fn(&ReferenceRow) -> bool,
    {
        let query = normalize_test_name(name);
        if query.is_empty() {
            return None;
        }

        let rows = self.table.rows();
        if let Some(row) = rows
            .iter()
            .find(|r| eligible(r) && r.test_name_norm == query)
        {
            return Some(row);
        }

        // An empty reference name is a substring of everything; never let it match.
        let min_len = self.options.min_contains_len.max(1);
        rows.iter().find(|r| {
            eligible(r)
                && r.test_name_norm.chars().count() >= min_len
                && query.contains(r.test_name_norm.as_str())
        })
    }
}

/// `M`/`Male` and `F`/`Female`, case-insensitive. `All` and anything else
/// yield `None`.
fn canonical_sex(sex: &str) -> Option<&'static str> {
    match sex.trim().to_lowercase().as_str() {
        "m" | "male" => Some("male"),
        "f" | "female" => Some("female"),
        _ => None,
    }
}
