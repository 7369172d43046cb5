//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use gazetteer_domain::StoreDocument;
use gazetteer_harvester::HarvestSummary;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the contents of a store.
    pub fn format_status(&self, document: &StoreDocument) -> Result<String> {
        match self.format {
            CliFormat::Json => self.format_status_json(document),
            CliFormat::Table => Ok(self.format_status_table(document)),
        }
    }

    fn format_status_json(&self, document: &StoreDocument) -> Result<String> {
        let groups: Vec<serde_json::Value> = document
            .groups()
            .map(|(name, units)| {
                serde_json::json!({
                    "group": name,
                    "units": units.len(),
                    "records": units.values().map(Vec::len).sum::<usize>(),
                })
            })
            .collect();

        let status = serde_json::json!({
            "groups": groups,
            "units": document.unit_count(),
            "records": document.record_count(),
        });
        Ok(serde_json::to_string_pretty(&status)?)
    }

    fn format_status_table(&self, document: &StoreDocument) -> String {
        if document.is_empty() {
            return self.colorize("Store is empty.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Group", "Units", "Records"]);

        for (name, units) in document.groups() {
            let records: usize = units.values().map(Vec::len).sum();
            builder.push_record([name.to_string(), units.len().to_string(), records.to_string()]);
        }
        builder.push_record([
            "Total".to_string(),
            document.unit_count().to_string(),
            document.record_count().to_string(),
        ]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format the end-of-run summary.
    pub fn format_summary(&self, summary: &HarvestSummary) -> String {
        let text = summary.summary();
        if summary.is_clean() {
            text
        } else {
            format!(
                "{}\n{}",
                text,
                self.warning(&format!("{} unit(s) failed", summary.failures.len()))
            )
        }
    }

    /// Final line of a `run` or `retry`, printed whether or not it failed.
    pub fn completion(&self, ok: bool) -> String {
        let line = "[FINISH] Gazetteer harvest completed.";
        if ok {
            self.success(line)
        } else {
            self.warning(line)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
