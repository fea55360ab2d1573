//! Output formatting for the CLI.

use crate::error::Result;
use colored::*;
use finsight_agent::RunOutcome;
use finsight_domain::{MonetaryRecord, ResultAggregate, RunRecord, RunWithLogs, TraceLogEntry};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

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

    /// Format the outcome of a finished run.
    pub fn format_outcome(&self, outcome: &RunOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
            OutputFormat::Quiet => Ok(outcome.run_id.to_string()),
            OutputFormat::Table => {
                let stats = &outcome.stats;
                let header = self.success(&format!(
                    "Run {} {}: {} found, {} not found, {} failed, {} skipped",
                    outcome.run_id,
                    outcome.status,
                    stats.found,
                    stats.not_found,
                    stats.failed,
                    stats.skipped
                ));
                Ok(format!("{}\n{}", header, self.results_table(&outcome.aggregate)))
            }
        }
    }

    /// Format a run with its results and, optionally, its trace log.
    pub fn format_run(&self, run: &RunWithLogs, include_logs: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json if include_logs => Ok(serde_json::to_string_pretty(run)?),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&run.run)?),
            OutputFormat::Quiet => Ok(run.run.status.to_string()),
            OutputFormat::Table => {
                let record = &run.run;
                let mut out = vec![
                    format!("Run:      {}", record.id),
                    format!("File:     {}", record.filename),
                    format!("Status:   {}", self.status(record)),
                    format!("Task:     {}", record.current_task),
                    format!("Started:  {}", record.start_time),
                    format!(
                        "Ended:    {}",
                        record.end_time.map_or_else(|| "-".to_string(), |t| t.to_string())
                    ),
                ];

                match &record.results {
                    Some(results) => out.push(self.results_table(results)),
                    None => out.push(self.info("No results stored")),
                }

                if include_logs {
                    out.push(self.logs_table(&run.logs));
                }
                Ok(out.join("\n"))
            }
        }
    }

    /// Format a list of runs.
    pub fn format_runs(&self, runs: &[RunRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(runs)?),
            OutputFormat::Quiet => Ok(runs
                .iter()
                .map(|r| r.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if runs.is_empty() {
                    return Ok(self.colorize("No runs found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "File", "Status", "Current task", "Metrics"]);
                for run in runs {
                    let metrics = run
                        .results
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |r| r.found_count().to_string());
                    builder.push_record([
                        run.id.to_string(),
                        run.filename.clone(),
                        run.status.to_string(),
                        run.current_task.clone(),
                        metrics,
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format an exchange rate.
    pub fn format_rate(&self, rate: f64) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "inr_to_usd": rate }).to_string(),
            OutputFormat::Quiet => rate.to_string(),
            OutputFormat::Table => format!("1 INR = {} USD", rate),
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

    fn status(&self, run: &RunRecord) -> String {
        let color = match run.status {
            finsight_domain::RunStatus::Completed => "green",
            finsight_domain::RunStatus::Failed => "red",
            finsight_domain::RunStatus::InProgress => "yellow",
        };
        self.colorize(run.status.as_str(), color)
    }

    fn results_table(&self, results: &ResultAggregate) -> String {
        if results.is_empty() {
            return self.colorize("No metrics extracted.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value", "Page"]);

        let monetary = [
            ("Consolidated revenue", &results.consolidated_revenue),
            ("Consolidated net income", &results.consolidated_net_income),
            ("Diluted EPS", &results.diluted_eps),
        ];
        for (name, record) in monetary {
            if let Some(record) = record {
                builder.push_record([name.to_string(), monetary_value(record), page(record.source_page)]);
            }
        }

        for segment in &results.top_segment_contributions {
            builder.push_record([
                format!("Segment: {}", segment.segment_name),
                format!("{}%", segment.percentage_contribution),
                page(segment.source_page),
            ]);
        }

        if let Some(utilization) = &results.employee_utilization {
            let value = utilization
                .rate_percentage
                .map_or_else(|| "-".to_string(), |rate| format!("{}%", rate));
            builder.push_record(["Employee utilization".to_string(), value, page(utilization.source_page)]);
        }

        for risk in &results.key_management_risks {
            builder.push_record(["Key risk".to_string(), risk.risk_summary.clone(), page(risk.source_page)]);
        }

        self.render(builder)
    }

    fn logs_table(&self, logs: &[TraceLogEntry]) -> String {
        if logs.is_empty() {
            return self.info("No trace entries");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Node", "Message"]);
        for entry in logs {
            builder.push_record([entry.id.to_string(), entry.node_name.clone(), entry.message.clone()]);
        }
        self.render(builder)
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
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

/// Value and unit of a monetary record, with its converted figure if any.
pub fn monetary_value(record: &MonetaryRecord) -> String {
    let mut text = match (record.value, record.unit.as_deref()) {
        (Some(value), Some(unit)) => format!("{} {}", value, unit),
        (Some(value), None) => value.to_string(),
        (None, _) => "-".to_string(),
    };
    if let (Some(value), Some(unit)) = (record.converted_value, record.converted_unit.as_deref()) {
        text.push_str(&format!(" ({} {})", value, unit));
    }
    text
}

fn page(page: Option<u32>) -> String {
    page.map_or_else(|| "-".to_string(), |p| p.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_agent::RunStats;
    use finsight_domain::{ExtractedRecord, KeyRisk, RunId, RunStatus};

    fn create_test_aggregate() -> ResultAggregate {
        let mut aggregate = ResultAggregate::new();
        aggregate.merge(ExtractedRecord::Revenue(
            MonetaryRecord::found(255_324.0, Some("INR Crores".into()), Some(12))
                .with_conversion(30.64, "USD Billion", "note"),
        ));
        aggregate.key_management_risks.push(KeyRisk {
            risk_summary: "Client concentration".to_string(),
            source_page: Some(77),
        });
        aggregate
    }

    fn create_test_run() -> RunRecord {
        let mut run = RunRecord::new(RunId(3), "tcs_2024.pdf", 1_700_000_000_000);
        run.status = RunStatus::Completed;
        run.end_time = Some(1_700_000_060_000);
        run.results = Some(create_test_aggregate());
        run
    }

    #[test]
    fn test_monetary_value() {
        let aggregate = create_test_aggregate();
        let revenue = aggregate.consolidated_revenue.unwrap();
        assert_eq!(monetary_value(&revenue), "255324 INR Crores (30.64 USD Billion)");
    }

    #[test]
    fn test_outcome_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let outcome = RunOutcome {
            run_id: RunId(3),
            status: RunStatus::Completed,
            aggregate: create_test_aggregate(),
            stats: RunStats { found: 2, not_found: 4, failed: 0, skipped: 0 },
        };
        let output = formatter.format_outcome(&outcome).unwrap();
        assert!(output.starts_with("✓ Run 3 completed: 2 found, 4 not found"));
        assert!(output.contains("Consolidated revenue"));
        assert!(output.contains("Client concentration"));
    }

    #[test]
    fn test_runs_formats() {
        let runs = vec![create_test_run()];

        let quiet = Formatter::new(OutputFormat::Quiet, false).format_runs(&runs).unwrap();
        assert_eq!(quiet, "3");

        let json = Formatter::new(OutputFormat::Json, false).format_runs(&runs).unwrap();
        let parsed: Vec<RunRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, runs);

        let table = Formatter::new(OutputFormat::Table, false).format_runs(&runs).unwrap();
        assert!(table.contains("tcs_2024.pdf"));
        assert!(table.contains("completed"));
    }

    #[test]
    fn test_empty_runs() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_runs(&[]).unwrap().contains("No runs found"));
    }

    #[test]
    fn test_run_without_results() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let run = RunWithLogs {
            run: RunRecord::new(RunId(1), "missing.pdf", 0),
            logs: vec![],
        };
        let output = formatter.format_run(&run, true).unwrap();
        assert!(output.contains("No results stored"));
        assert!(output.contains("No trace entries"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.format_rate(0.012), "1 INR = 0.012 USD");
    }
}
