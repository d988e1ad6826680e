use crate::core::{FileSet, Finding};
use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable `path:line:column: warning: message` lines
    #[default]
    Terminal,
    /// JSON array for programmatic consumption
    Json,
}

#[derive(Serialize)]
struct FindingRecord<'a> {
    file: String,
    line: u32,
    column: u32,
    message: &'a str,
}

impl<'a> FindingRecord<'a> {
    fn new(finding: &'a Finding, file_set: &FileSet) -> Self {
        Self {
            file: file_set.path(finding.position.file).display().to_string(),
            line: finding.position.line,
            column: finding.position.column + 1,
            message: &finding.message,
        }
    }
}

/// Write the findings in the requested format. `color` only applies to
/// the terminal format and should be off when not writing to a tty.
pub fn write_findings(
    writer: &mut dyn Write,
    findings: &[Finding],
    file_set: &FileSet,
    format: OutputFormat,
    color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Terminal => {
            for finding in findings {
                let location = file_set.display_pos(finding.position);
                if color {
                    writeln!(
                        writer,
                        "{}: {} {}",
                        location.bold(),
                        "warning:".yellow().bold(),
                        finding.message
                    )?;
                } else {
                    writeln!(writer, "{location}: warning: {}", finding.message)?;
                }
            }
        }
        OutputFormat::Json => {
            let records: Vec<FindingRecord> = findings
                .iter()
                .map(|finding| FindingRecord::new(finding, file_set))
                .collect();
            serde_json::to_writer_pretty(&mut *writer, &records)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
