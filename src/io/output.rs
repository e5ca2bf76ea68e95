//! Report writers.
//!
//! Emits, for each analysis result, the generating analysis identifier, the
//! detected smell set and the indented multi-line description, in scheduler
//! output order. A report with zero smells is still a successful run.

use crate::analysis::{AnalysisFailure, SchedulerOutcome};
use crate::core::AnalysisResult;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

/// The flat report of one completed run.
#[derive(Debug, Serialize)]
pub struct SmellReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<AnalysisResult>,
    /// Analyses that ran and failed; diagnostics only, not results.
    pub failed_analyses: Vec<AnalysisFailure>,
}

impl SmellReport {
    pub fn from_outcome(outcome: SchedulerOutcome) -> Self {
        Self {
            generated_at: Utc::now(),
            results: outcome.results,
            failed_analyses: outcome.failures,
        }
    }

    pub fn total_smells(&self) -> usize {
        self.results
            .iter()
            .map(|result| result.smells_detected.len())
            .sum()
    }
}

pub trait ReportWriter {
    fn write_report(&mut self, report: &SmellReport) -> anyhow::Result<()>;
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &SmellReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Analysis results:".bold())?;

        for result in &report.results {
            let smells = if result.smells_detected.is_empty() {
                "none".green().to_string()
            } else {
                result
                    .smells_detected
                    .iter()
                    .map(|smell| smell.code())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .red()
                    .to_string()
            };
            writeln!(
                self.writer,
                "{} - detected smells: {}",
                result.generating_analysis.bold(),
                smells
            )?;
            for line in result.description.lines() {
                writeln!(self.writer, "\t{line}")?;
            }
        }

        for failure in &report.failed_analyses {
            writeln!(
                self.writer,
                "{} {} - {}",
                "failed:".yellow(),
                failure.analysis,
                failure.error
            )?;
        }

        writeln!(
            self.writer,
            "{} smells detected across {} analyses",
            report.total_smells(),
            report.results.len()
        )?;
        Ok(())
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &SmellReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Writer for the chosen format, to a file or stdout.
pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<Box<dyn ReportWriter>> {
    match output {
        Some(path) => {
            let file = File::create(path)?;
            Ok(match format {
                OutputFormat::Terminal => Box::new(TerminalWriter::new(file)),
                OutputFormat::Json => Box::new(JsonWriter::new(file)),
            })
        }
        None => {
            let stdout = std::io::stdout();
            Ok(match format {
                OutputFormat::Terminal => Box::new(TerminalWriter::new(stdout)),
                OutputFormat::Json => Box::new(JsonWriter::new(stdout)),
            })
        }
    }
}
