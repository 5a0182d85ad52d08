//! Export the canonical table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: `country,year,<label>...`, with empty cells for nulls.

use std::fs::File;
use std::path::Path;

use crate::domain::IndicatorTable;
use crate::error::AppError;

/// Write the table to a CSV file.
pub fn write_table_csv(path: &Path, table: &IndicatorTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(file, table)
}

/// Write the table as CSV to any writer.
pub fn write_table<W: std::io::Write>(writer: W, table: &IndicatorTable) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(table.columns())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in table.rows() {
        let mut record = vec![row.country.clone(), row.year.to_string()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|x| format!("{x}")).unwrap_or_default()),
        );
        out.write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CountryCodeFormat, CountrySet, IndicatorSpec, LoadRequest, ObservationRecord, RawObservations,
        YearRange,
    };

    #[test]
    fn writes_header_and_empty_nulls() {
        let request = LoadRequest::new(
            IndicatorSpec::new([("X.1", "Inflation"), ("X.2", "GDP Growth")]).unwrap(),
            CountrySet::new(CountryCodeFormat::Iso3, ["JPN", "USA"]).unwrap(),
            YearRange::new(2020, 2020).unwrap(),
        );
        let raw = RawObservations::Long(vec![
            ObservationRecord::new("JPN", "X.1", "2020", Some(-0.25)),
            ObservationRecord::new("USA", "X.2", "2020", Some(-2.2)),
        ]);
        let table = crate::data::reshape::normalize(raw, &request).unwrap();

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "country,year,Inflation,GDP Growth\nJPN,2020,-0.25,\nUSA,2020,,-2.2\n"
        );
    }
}
