//! Markdown brief: the narrative plus the observations it was written from.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::ai::Narrative;
use crate::ai::prompt::fmt_value;
use crate::domain::IndicatorTable;
use crate::error::AppError;

pub fn write_brief(path: &Path, table: &IndicatorTable, narrative: &Narrative) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create brief '{}': {e}", path.display())))?;
    file.write_all(render_brief(table, narrative, &Local::now().to_rfc3339()).as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write brief: {e}")))?;
    Ok(())
}

pub fn render_brief(table: &IndicatorTable, narrative: &Narrative, generated: &str) -> String {
    let slice = table.for_year(narrative.year);

    let mut out = String::new();
    out.push_str(&format!("# Global Econ Monitor: {}\n", narrative.year));
    out.push_str(&format!("- generated: {generated}\n"));
    out.push_str(&format!("- model: {}\n", narrative.model));
    out.push_str("- source: World Bank Open Data\n");

    out.push_str(&format!("\n## Observations ({})\n", narrative.year));
    if slice.is_empty() {
        out.push_str("\n_No observations for this year._\n");
    } else {
        out.push_str(&format!("| country | {} |\n", slice.labels.join(" | ")));
        out.push_str(&format!("| - |{}\n", " - |".repeat(slice.labels.len())));
        for row in &slice.rows {
            let cells: Vec<String> = row.values.iter().map(|v| fmt_value(*v)).collect();
            out.push_str(&format!("| {} | {} |\n", row.country, cells.join(" | ")));
        }
    }

    out.push_str("\n## Analysis\n\n");
    out.push_str(narrative.text.trim());
    out.push('\n');
    out
}
