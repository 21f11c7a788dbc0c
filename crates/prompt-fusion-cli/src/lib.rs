//! CLI logic for the Prompt Fusion scheduler.
//!
//! This module contains the core CLI logic: it compiles a prompt file and
//! reports the resulting step schedule.

pub mod error_adapter;

mod args;
mod config;
mod report;

pub use args::{Args, OutputFormat};
pub use report::{ReportEntry, ScheduleReport};

use std::{
    fs,
    io::{self, Write},
};

use log::info;

use prompt_fusion::{FusionError, PromptCompiler};

/// Run the Prompt Fusion CLI application
///
/// This function compiles the input prompt over the configured step budget
/// and writes the schedule report to the output file, or to standard output
/// when no output file is given.
///
/// # Errors
///
/// Returns `FusionError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
pub fn run(args: &Args) -> Result<(), FusionError> {
    info!(
        input_path = args.input,
        format:? = args.format;
        "Processing prompt"
    );

    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;
    let app_config = config::apply_overrides(app_config, args)?;
    let total_steps = app_config.schedule().steps();

    // Read input file
    let source = fs::read_to_string(&args.input)?;

    // Compile and render
    let compiler = PromptCompiler::new(app_config);
    let compilation = compiler.compile(&source)?;
    let report = ScheduleReport::new(&compilation, total_steps);
    let rendered = report.render(&compilation, args.format, args.explain)?;

    match &args.output {
        Some(output) => {
            fs::write(output, rendered)?;
            info!(output_file = output; "Schedule written");
        }
        None => io::stdout().write_all(rendered.as_bytes())?,
    }

    Ok(())
}
