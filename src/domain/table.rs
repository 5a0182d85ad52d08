//! Canonical per-country/per-year indicator table.

use std::collections::BTreeSet;

/// Index columns that precede the indicator columns.
pub const COUNTRY_COLUMN: &str = "country";
pub const YEAR_COLUMN: &str = "year";

/// One `(country, year)` row; `values` is aligned with `IndicatorTable::labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub country: String,
    pub year: i32,
    pub values: Vec<Option<f64>>,
}

/// Normalized `(country, year) × indicator` matrix.
///
/// Invariants (upheld by `data::reshape`, the only producer of non-empty tables):
/// - `(country, year)` pairs are unique
/// - every row has exactly `labels.len()` values, missing ones as `None`
/// - rows are ordered by year, then by request country order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorTable {
    labels: Vec<String>,
    rows: Vec<TableRow>,
}

impl IndicatorTable {
    pub const fn empty() -> Self {
        Self {
            labels: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn from_parts(labels: Vec<String>, rows: Vec<TableRow>) -> Self {
        Self { labels, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// `country`, `year`, then one column per indicator label.
    pub fn columns(&self) -> Vec<&str> {
        let mut cols = vec![COUNTRY_COLUMN, YEAR_COLUMN];
        cols.extend(self.labels.iter().map(String::as_str));
        cols
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn value(&self, country: &str, year: i32, label: &str) -> Option<f64> {
        let idx = self.label_index(label)?;
        self.rows
            .iter()
            .find(|r| r.country == country && r.year == year)
            .and_then(|r| r.values.get(idx).copied().flatten())
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct countries in row order.
    pub fn countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.rows {
            if !out.contains(&r.country.as_str()) {
                out.push(&r.country);
            }
        }
        out
    }

    /// Latest year with at least one non-null value.
    pub fn latest_observed_year(&self) -> Option<i32> {
        self.rows
            .iter()
            .filter(|r| r.values.iter().any(Option::is_some))
            .map(|r| r.year)
            .max()
    }

    /// Read-only slice of the rows for one year (empty if the year is absent).
    pub fn for_year(&self, year: i32) -> YearSlice<'_> {
        YearSlice {
            year,
            labels: &self.labels,
            rows: self.rows.iter().filter(|r| r.year == year).collect(),
        }
    }

    /// Non-null `(year, value)` points for one indicator and country.
    pub fn series(&self, label: &str, country: &str) -> Vec<(i32, f64)> {
        let Some(idx) = self.label_index(label) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter(|r| r.country == country)
            .filter_map(|r| r.values.get(idx).copied().flatten().map(|v| (r.year, v)))
            .collect()
    }
}

/// Borrowed view of the rows for a single year.
#[derive(Debug, Clone)]
pub struct YearSlice<'a> {
    pub year: i32,
    pub labels: &'a [String],
    pub rows: Vec<&'a TableRow>,
}

impl YearSlice<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
