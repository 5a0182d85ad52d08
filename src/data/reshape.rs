//! Raw observations -> canonical `IndicatorTable`.
//!
//! Steps:
//! 1. parse period tokens (`"YR2010"`, `"2010"`) into integer years
//! 2. pivot indicator codes into columns indexed by `(country, year)`
//! 3. rename codes to their labels
//!
//! Rows are the cross product of the requested countries and every in-range
//! year that has at least one observation record, null or not.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::domain::{
    IndicatorTable, LoadRequest, ObservationRecord, RawObservations, TableRow, WideRecord,
};
use crate::error::LoadError;

/// Normalize whichever raw shape arrived into the canonical table.
pub fn normalize(raw: RawObservations, request: &LoadRequest) -> Result<IndicatorTable, LoadError> {
    let records = match raw {
        RawObservations::Long(records) => records,
        RawObservations::Wide(rows) => melt(rows),
    };
    pivot(&records, request)
}

/// Parse a provider period token into a calendar year.
///
/// Any non-numeric prefix is stripped (`"YR2010"` -> 2010). Trailing
/// sub-period suffixes are ignored (`"2010Q1"` -> 2010).
pub fn parse_year(token: &str) -> Option<i32> {
    let digits: String = token
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Wide rows (years as columns) -> long records.
fn melt(rows: Vec<WideRecord>) -> Vec<ObservationRecord> {
    let mut out = Vec::new();
    for row in rows {
        for (period, value) in row.cells {
            out.push(ObservationRecord {
                country: row.country.clone(),
                indicator: row.indicator.clone(),
                period,
                value,
            });
        }
    }
    out
}

fn pivot(records: &[ObservationRecord], request: &LoadRequest) -> Result<IndicatorTable, LoadError> {
    let n_cols = request.indicators.len();
    let labels: Vec<String> = request.indicators.labels().map(str::to_string).collect();

    // (year, country position) -> column values
    let mut cells: BTreeMap<(i32, usize), Vec<Option<f64>>> = BTreeMap::new();
    let mut seen: HashSet<(i32, usize, usize)> = HashSet::new();
    let mut discarded = 0usize;

    for rec in records {
        let country = rec.country.trim().to_ascii_uppercase();
        let (Some(country_idx), Some(col)) = (
            request.countries.position(&country),
            request.indicators.position(rec.indicator.trim()),
        ) else {
            discarded += 1;
            continue;
        };

        // Only records for requested countries and indicators can fail the load.
        let year = parse_year(&rec.period).ok_or_else(|| {
            LoadError::Reshape(format!(
                "unrecognized period token '{}' for {}/{}",
                rec.period, rec.country, rec.indicator
            ))
        })?;
        if !request.years.contains(year) {
            discarded += 1;
            continue;
        }

        if !seen.insert((year, country_idx, col)) {
            warn!(
                country = %country,
                indicator = %rec.indicator,
                year,
                "duplicate observation; keeping the later value"
            );
        }
        let slot = cells
            .entry((year, country_idx))
            .or_insert_with(|| vec![None; n_cols]);
        slot[col] = rec.value.filter(|v| v.is_finite());
    }

    if discarded > 0 {
        debug!(discarded, "dropped observations outside the request");
    }

    // A year with only null observations still gets its rows.
    let observed_years: BTreeSet<i32> = cells.keys().map(|(year, _)| *year).collect();

    let mut rows = Vec::with_capacity(observed_years.len() * request.countries.len());
    for &year in &observed_years {
        for (country_idx, country) in request.countries.codes().iter().enumerate() {
            let values = cells
                .remove(&(year, country_idx))
                .unwrap_or_else(|| vec![None; n_cols]);
            rows.push(TableRow {
                country: country.clone(),
                year,
                values,
            });
        }
    }

    Ok(IndicatorTable::from_parts(labels, rows))
}
