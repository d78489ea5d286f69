//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use ldo_domain::{DocumentState, TableSchema};
use ldo_pipeline::{DocumentOutcome, RunPolicy, RunSummary};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a table schema.
    pub fn format_schema(&self, schema: &TableSchema) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&schema.to_json())?),
            OutputFormat::Table => Ok(self.format_schema_table(schema)),
        }
    }

    fn format_schema_table(&self, schema: &TableSchema) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Column", "Type", "Size", "Nullable", "Auto", "Default", "Mandatory"]);

        for column in &schema.columns {
            builder.push_record([
                column.name.clone(),
                column.sql_type.clone(),
                column.size.to_string(),
                yes_no(column.nullable).to_string(),
                yes_no(column.auto_increment).to_string(),
                column.default_value.clone().unwrap_or_default(),
                yes_no(column.is_mandatory()).to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("Table {}\n{}", schema.name, table)
    }

    /// Format a run summary and the policy verdict.
    pub fn format_summary(&self, summary: &RunSummary, policy: &RunPolicy) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let violations: Vec<String> = summary
                    .policy_violations(policy)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                let json = serde_json::json!({
                    "success": violations.is_empty(),
                    "violations": violations,
                    "summary": summary,
                });
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => Ok(self.format_summary_table(summary, policy)),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary, policy: &RunPolicy) -> String {
        if summary.outcomes.is_empty() {
            return self.warning("No documents processed.");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Source", "State", "Rows", "Conformity", "Unknown", "Gate", "Detail"]);

        for outcome in &summary.outcomes {
            let (conformity, unknown) = match &outcome.report {
                Some(report) => (
                    format!("{:.1}%", report.conformity_rate * 100.0),
                    format!("{:.1}%", report.unknown_rate * 100.0),
                ),
                None => ("-".to_string(), "-".to_string()),
            };
            let gate = match &outcome.gate {
                Some(gate) if gate.is_accepted() => self.colorize("accepted", "green"),
                Some(_) => self.colorize("rejected", "yellow"),
                None => "-".to_string(),
            };
            builder.push_record([
                outcome.index.to_string(),
                outcome.source.clone(),
                self.state(outcome.state),
                outcome.rows_inserted.to_string(),
                conformity,
                unknown,
                gate,
                detail(outcome),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut lines = vec![table.to_string()];
        lines.push(format!(
            "{} documents, {} inserted ({} empty), {} rejected, {} parse failures, {} insert failures, {} rows in {:.1}s",
            summary.documents,
            summary.inserted(),
            summary.empty_documents,
            summary.rejected(),
            summary.parse_failed(),
            summary.insert_failed(),
            summary.rows_inserted,
            summary.elapsed().as_secs_f64(),
        ));

        let violations = summary.policy_violations(policy);
        if violations.is_empty() {
            lines.push(self.success("Run completed"));
        } else {
            for violation in violations {
                lines.push(self.error(&violation.to_string()));
            }
        }

        lines.join("\n")
    }

    fn state(&self, state: DocumentState) -> String {
        let color = match state {
            DocumentState::Inserted => "green",
            DocumentState::Rejected => "yellow",
            s if s.is_failure() => "red",
            _ => "",
        };
        self.colorize(state.as_str(), color)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn detail(outcome: &DocumentOutcome) -> String {
    if let Some(failure) = &outcome.failure {
        return failure.clone();
    }
    outcome
        .gate
        .as_ref()
        .map(|gate| {
            gate.reasons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default()
}
