//! Reference-range table loading.
//!
//! Accepts comma-delimited text with a header row. Column names are matched
//! case-insensitively against fixed alias lists, and bounds come either from
//! explicit lower/upper columns or from a combined range string such as
//! `"3.5-5.5"` or `"(3.5 – 5.5)"`. Bad cells degrade to `None`; only a missing
//! test-name column is fatal.

use std::io::BufRead;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::ReferenceError;
use crate::models::ReferenceRow;

const NAME_ALIASES: &[&str] = &["test_name", "test", "name"];
const LOWER_ALIASES: &[&str] = &["lower", "lower_ref", "min", "reference_low", "ref_low"];
const UPPER_ALIASES: &[&str] = &["upper", "upper_ref", "max", "reference_high", "ref_high"];
const RANGE_ALIASES: &[&str] = &["range", "ref_range", "reference_range", "normal_range"];
const UNIT_ALIASES: &[&str] = &["unit", "units"];
const SEX_ALIASES: &[&str] = &["sex"];

/// `<num> <dash> <num>`, tolerant of ASCII hyphen, en-dash and em-dash.
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9.]+)\s*[-\u{2013}\u{2014}]\s*([0-9.]+)").expect("valid regex")
});

/// Immutable, in-memory reference table. Share it by reference (or `Arc`).
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    /// Load a table from a delimited file on disk.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = std::fs::File::open(path).map_err(|e| ReferenceError::Load {
            path: path.display().to_string(),
            source: e,
        })?;
        let table = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            "Loaded reference table"
        );
        Ok(table)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, ReferenceError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReferenceError> {
        let mut lines = reader.lines();

        let mut header: Option<Vec<String>> = None;
        for line in lines.by_ref() {
            let line = line?;
            let line = line.trim_start_matches('\u{FEFF}');
            if line.trim().is_empty() {
                continue;
            }
            header = Some(csv_split(line));
            break;
        }
        let header = header.unwrap_or_default();

        let columns = ColumnMap::from_header(&header);
        let Some(name_col) = columns.name else {
            return Err(ReferenceError::MissingNameColumn {
                found: header.iter().map(|c| c.trim().to_string()).collect(),
            });
        };

        let mut rows = Vec::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let cells = csv_split(&line);
            let (lower, upper) = columns.bounds(&cells);
            let row = ReferenceRow::new(cell_at(&cells, Some(name_col)), lower, upper)
                .with_sex(cell_at(&cells, columns.sex))
                .with_unit(columns.unit.map(|idx| cell_at(&cells, Some(idx))));
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Header positions resolved from the alias lists.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    name: Option<usize>,
    lower: Option<usize>,
    upper: Option<usize>,
    range: Option<usize>,
    unit: Option<usize>,
    sex: Option<usize>,
}

impl ColumnMap {
    fn from_header(columns: &[String]) -> Self {
        let normalized: Vec<String> = columns.iter().map(|c| c.trim().to_lowercase()).collect();
        let find = |aliases: &[&str]| -> Option<usize> {
            aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|c| c == alias))
        };

        Self {
            name: find(NAME_ALIASES),
            lower: find(LOWER_ALIASES),
            upper: find(UPPER_ALIASES),
            range: find(RANGE_ALIASES),
            unit: find(UNIT_ALIASES),
            sex: find(SEX_ALIASES),
        }
    }

    /// Explicit lower/upper columns win; a combined range column is the
    /// fallback; neither means no bounds.
    fn bounds(&self, cells: &[String]) -> (Option<f64>, Option<f64>) {
        match (self.lower, self.upper, self.range) {
            (Some(lo), Some(up), _) => (
                parse_number(cell_at(cells, Some(lo))),
                parse_number(cell_at(cells, Some(up))),
            ),
            (_, _, Some(range)) => parse_range(cell_at(cells, Some(range))),
            _ => (None, None),
        }
    }
}

/// Trimmed cell at `idx`; short rows and absent columns read as empty.
fn cell_at(cells: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| cells.get(i)).map(|c| c.trim()).unwrap_or("")
}

/// Parse a single numeric cell; anything unparseable or non-finite is `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pull both endpoints out of a range string like `"3.5-5.5"` or `"(3.5–5.5)"`.
pub fn parse_range(text: &str) -> (Option<f64>, Option<f64>) {
    match RANGE_RE.captures(text.trim()) {
        Some(caps) => (parse_number(&caps[1]), parse_number(&caps[2])),
        None => (None, None),
    }
}

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
