//! CSV export of reconciled variables
//!
//! One file per variable with the exact points that are plotted, for
//! inspection in a spreadsheet or further processing.

use crate::derive::VariableSeries;
use crate::error::{Result, XvalError};
use std::path::{Path, PathBuf};

/// CSV formatter for one reconciled variable
#[derive(Debug)]
pub struct CsvOutput<'a> {
    variable: &'a VariableSeries,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV formatter
    pub fn new(variable: &'a VariableSeries) -> Self {
        Self { variable }
    }

    /// Header row
    fn header(&self) -> &'static str {
        "source,time_s,value"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(self.header());
        output.push('\n');

        for series in &self.variable.series {
            let label = Self::escape_field(series.source.label());
            for (time, value) in &series.points {
                output.push_str(&format!("{},{:.6},{}\n", label, time, value));
            }
        }

        output
    }

    /// Export path next to the chart: `{prefix}{variable}.csv`
    pub fn output_path(prefix: &str, variable: &str) -> PathBuf {
        PathBuf::from(format!("{}{}.csv", prefix, variable))
    }

    /// Write the CSV document to `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv()).map_err(|e| XvalError::Render {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
