//! Plain-text tables for the CLI.

use crate::ai::prompt::fmt_value;
use crate::ai::{ModelCatalog, Narrative};
use crate::domain::{IndicatorTable, TableRow, YearSlice};

const COUNTRY_WIDTH: usize = 8;
const YEAR_WIDTH: usize = 6;
const MIN_VALUE_WIDTH: usize = 10;

/// Format the full canonical table.
pub fn format_table(table: &IndicatorTable) -> String {
    let mut out = String::new();
    out.push_str("=== Global Econ Monitor (World Bank) ===\n");
    out.push_str(&format!(
        "Rows: {} | Countries: {} | Years: {}\n\n",
        table.len(),
        table.countries().join(", "),
        fmt_year_span(&table.years()),
    ));
    let rows: Vec<&TableRow> = table.rows().iter().collect();
    out.push_str(&format_rows(table.labels(), &rows));
    out
}

/// Format the rows of one year (the narrative's evidence).
pub fn format_year_slice(slice: &YearSlice<'_>) -> String {
    let mut out = format!("Latest observations ({}):\n", slice.year);
    if slice.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    out.push_str(&format_rows(slice.labels, &slice.rows));
    out
}

pub fn format_narrative(narrative: &Narrative) -> String {
    format!(
        "AI analysis ({}, model: {}):\n{}\n",
        narrative.year,
        narrative.model,
        narrative.text.trim()
    )
}

pub fn format_catalog(catalog: &ModelCatalog, chosen: &str) -> String {
    let mut out = String::new();
    if catalog.is_empty() {
        out.push_str("No text-generation models listed; using fallback.\n");
    } else {
        out.push_str("Text-generation models:\n");
        for model in catalog.models() {
            let mark = if model == chosen { "*" } else { " " };
            out.push_str(&format!("{mark} {model}\n"));
        }
    }
    out.push_str(&format!("Selected: {chosen}\n"));
    out
}

fn format_rows(labels: &[String], rows: &[&TableRow]) -> String {
    let widths: Vec<usize> = labels.iter().map(|l| l.len().max(MIN_VALUE_WIDTH)).collect();

    let (cw, yw) = (COUNTRY_WIDTH, YEAR_WIDTH);

    let mut out = String::new();
    out.push_str(&format!("{:<cw$} {:>yw$}", "country", "year"));
    for (label, &w) in labels.iter().zip(&widths) {
        out.push_str(&format!(" {label:>w$}"));
    }
    out.push('\n');

    for row in rows {
        out.push_str(&format!("{:<cw$} {:>yw$}", row.country, row.year));
        for (value, &w) in row.values.iter().zip(&widths) {
            out.push_str(&format!(" {:>w$}", fmt_value(*value)));
        }
        out.push('\n');
    }
    out
}

fn fmt_year_span(years: &[i32]) -> String {
    match (years.first(), years.last()) {
        (Some(a), Some(b)) if a == b => a.to_string(),
        (Some(a), Some(b)) => format!("{a}-{b}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned_with_nulls() {
        let labels = vec!["Inflation".to_string(), "Unemployment".to_string()];
        let row = TableRow { country: "JPN".into(), year: 2023, values: vec![Some(3.27), None] };
        let text = format_rows(&labels, &[&row]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("country"));
        assert!(lines[1].contains("3.27"));
        assert!(lines[1].trim_end().ends_with("n/a"));
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn catalog_marks_choice() {
        let catalog = ModelCatalog::new(["gemini-1.5-pro", "gemini-1.5-flash"]);
        let text = format_catalog(&catalog, "gemini-1.5-flash");
        assert!(text.contains("* gemini-1.5-flash"));
        assert!(text.contains("  gemini-1.5-pro"));

        let text = format_catalog(&ModelCatalog::default(), "gemini-1.5-flash");
        assert!(text.contains("fallback"));
    }

    #[test]
    fn empty_slice_says_no_data() {
        let table = IndicatorTable::empty();
        assert!(format_year_slice(&table.for_year(2020)).contains("(no data)"));
    }
}
