//! Rendering of a compiled prompt for the terminal or a file.

use serde::Serialize;

use prompt_fusion::{Compilation, FusionError, legacy::HostGrammar};

use crate::args::OutputFormat;

/// One schedule entry as written to a report.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// The serialized form of a compiled prompt.
#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub grammar: HostGrammar,
    pub total_steps: usize,
    /// Every prompt the host must encode, blend partners included.
    pub prompts: Vec<String>,
    pub entries: Vec<ReportEntry>,
}

impl ScheduleReport {
    pub fn new(compilation: &Compilation, total_steps: usize) -> Self {
        Self {
            grammar: compilation.grammar(),
            total_steps,
            prompts: compilation.prompts().iter().cloned().collect(),
            entries: compilation
                .schedule()
                .entries()
                .iter()
                .map(|entry| ReportEntry {
                    start: entry.start(),
                    end: entry.end(),
                    text: entry.text().to_string(),
                })
                .collect(),
        }
    }

    /// Render the report in `format`.
    ///
    /// With `explain`, the text format starts with the expression tree and
    /// the TOML format with the tree as comment lines.
    pub fn render(
        &self,
        compilation: &Compilation,
        format: OutputFormat,
        explain: bool,
    ) -> Result<String, FusionError> {
        let mut out = String::new();
        match format {
            OutputFormat::Text => {
                if explain {
                    out.push_str(&format!("{}\n", compilation.expression()));
                }
                for entry in &self.entries {
                    out.push_str(&format!("{}..{}: {}\n", entry.start, entry.end, entry.text));
                }
                out.push_str(&format!("grammar: {}\n", self.grammar));
            }
            OutputFormat::Toml => {
                if explain {
                    for line in compilation.expression().to_string().lines() {
                        out.push_str(&format!("# {line}\n"));
                    }
                }
                let document = toml::to_string(self)
                    .map_err(|err| FusionError::Serialize(err.to_string()))?;
                out.push_str(&document);
            }
        }
        Ok(out)
    }
}
