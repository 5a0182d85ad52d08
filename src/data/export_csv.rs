//! Offline source: a wide indicator export (years as columns).
//!
//! Expected layout (the `wbgapi`/DataBank style):
//!
//! ```text
//! economy,series,YR2010,YR2011,...
//! JPN,FP.CPI.TOTL.ZG,-0.72,-0.27,...
//! ```
//!
//! `country` / `indicator` are accepted as aliases for the key columns. Any
//! other column whose header contains a year is treated as a period cell;
//! remaining columns (e.g. a `Country` name column) are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

use csv::StringRecord;
use tracing::info;

use crate::data::reshape::parse_year;
use crate::data::source::IndicatorSource;
use crate::domain::{LoadRequest, RawObservations, WideRecord};
use crate::error::LoadError;

const COUNTRY_KEYS: [&str; 2] = ["economy", "country"];
const INDICATOR_KEYS: [&str; 2] = ["series", "indicator"];

pub struct CsvExportSource {
    path: PathBuf,
}

impl CsvExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IndicatorSource for CsvExportSource {
    fn fetch(&self, _request: &LoadRequest) -> Result<RawObservations, LoadError> {
        let file = File::open(&self.path).map_err(|e| {
            LoadError::Fetch(format!("Failed to open CSV '{}': {e}", self.path.display()))
        })?;
        let rows = read_wide(file)?;
        info!(path = %self.path.display(), rows = rows.len(), "read wide indicator export");
        Ok(RawObservations::Wide(rows))
    }

    fn name(&self) -> &str {
        "CSV export"
    }
}

/// Parse a wide export from any reader.
pub fn read_wide<R: std::io::Read>(reader: R) -> Result<Vec<WideRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Fetch(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let country_idx = find_column(&header_map, &COUNTRY_KEYS)
        .ok_or_else(|| LoadError::Reshape("missing `economy` (or `country`) column".to_string()))?;
    let indicator_idx = find_column(&header_map, &INDICATOR_KEYS)
        .ok_or_else(|| LoadError::Reshape("missing `series` (or `indicator`) column".to_string()))?;

    let period_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != country_idx && *idx != indicator_idx)
        .filter(|(_, name)| parse_year(name).is_some())
        .map(|(idx, name)| (idx, name.trim().to_string()))
        .collect();
    if period_cols.is_empty() {
        return Err(LoadError::Reshape("no year columns found".to_string()));
    }

    let mut out = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| LoadError::Reshape(format!("CSV parse error on line {}: {e}", line + 2)))?;

        let country = record.get(country_idx).unwrap_or("").to_string();
        let indicator = record.get(indicator_idx).unwrap_or("").to_string();
        if country.is_empty() || indicator.is_empty() {
            continue;
        }

        let cells = period_cols
            .iter()
            .map(|(idx, period)| (period.clone(), parse_cell(record.get(*idx))))
            .collect();

        out.push(WideRecord {
            country,
            indicator,
            cells,
        });
    }
    Ok(out)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often carry a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, keys: &[&str]) -> Option<usize> {
    keys.iter().find_map(|k| header_map.get(*k).copied())
}

fn parse_cell(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed == ".." {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_wide_rows_with_bom_and_gaps() {
        let csv = "\u{feff}Economy,Series,Country,YR2020,YR2021\nJPN,X.1,Japan,0.5,..\nUSA,X.1,United States,,4.7\n";
        let rows = read_wide(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country, "JPN");
        assert_eq!(
            rows[0].cells,
            vec![("YR2020".to_string(), Some(0.5)), ("YR2021".to_string(), None)]
        );
        assert_eq!(rows[1].cells[0].1, None);
        assert_eq!(rows[1].cells[1].1, Some(4.7));
    }

    #[test]
    fn missing_key_column_is_reshape_error() {
        let csv = "economy,YR2020\nJPN,1.0\n";
        assert!(matches!(read_wide(csv.as_bytes()), Err(LoadError::Reshape(_))));
    }

    #[test]
    fn missing_file_is_fetch_error() {
        let source = CsvExportSource::new("/definitely/not/here.csv");
        let request = crate::domain::LoadRequest::new(
            crate::domain::IndicatorSpec::macro_default(),
            crate::domain::CountrySet::new(crate::domain::CountryCodeFormat::Iso3, ["JPN"]).unwrap(),
            crate::domain::YearRange::new(2020, 2021).unwrap(),
        );
        assert!(matches!(source.fetch(&request), Err(LoadError::Fetch(_))));
    }

    #[test]
    fn fetch_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "series,economy,2019,2020").unwrap();
        writeln!(file, "X.1,JPN,0.5,-0.0").unwrap();
        let source = CsvExportSource::new(file.path());
        let request = crate::domain::LoadRequest::new(
            crate::domain::IndicatorSpec::new([("X.1", "Inflation")]).unwrap(),
            crate::domain::CountrySet::new(crate::domain::CountryCodeFormat::Iso3, ["JPN"]).unwrap(),
            crate::domain::YearRange::new(2019, 2020).unwrap(),
        );
        match source.fetch(&request).unwrap() {
            RawObservations::Wide(rows) => assert_eq!(rows[0].indicator, "X.1"),
            other => panic!("expected wide rows, got {other:?}"),
        }
    }
}
