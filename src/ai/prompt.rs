//! Prompt rendering over a single-year slice of the table.

use crate::domain::YearSlice;

pub const DEFAULT_TEMPLATE: &str = "You are an economist writing for a general audience.\n\
Below are World Bank indicators for {year} ({indicators}).\n\
\n\
{data}\n\
\n\
In three to five sentences, compare Japan with the other countries listed. \
Point out the most notable differences and say what they suggest about each \
economy. Do not invent figures that are not shown above.";

/// Text template with `{year}`, `{indicators}`, and `{data}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, slice: &YearSlice<'_>) -> String {
        self.template
            .replace("{year}", &slice.year.to_string())
            .replace("{indicators}", &slice.labels.join(", "))
            .replace("{data}", &render_rows(slice))
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// One line per country: `- JPN: Inflation=3.27, GDP Growth=n/a`.
pub fn render_rows(slice: &YearSlice<'_>) -> String {
    if slice.is_empty() {
        return format!("(no observations available for {})", slice.year);
    }
    slice
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = slice
                .labels
                .iter()
                .zip(&row.values)
                .map(|(label, value)| format!("{label}={}", fmt_value(*value)))
                .collect();
            format!("- {}: {}", row.country, cells.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}
