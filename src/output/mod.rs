mod cli;
mod json;

pub use cli::{generate_text_report, TextOptions};
pub use json::{generate_json, generate_json_lines};

use crate::model::ScanResult;
use anyhow::Result;

/// Exit code used when the scan target is not a directory.
pub const DIRECTORY_NOT_FOUND_EXIT: u8 = 1;

/// Output mode for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// No output, exit code only
    Quiet,
    /// Human-readable report
    Text,
    /// JSON object, or JSON Lines for recursive scans
    Json,
}

impl OutputFormat {
    /// `--quiet` wins over `--json`.
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub fn print_result(
    result: &ScanResult,
    format: OutputFormat,
    options: &TextOptions,
) -> Result<()> {
    print!("{}", render_result(result, format, options)?);
    Ok(())
}

/// Renders the report exactly as it is written to stdout.
///
/// Recursive scans emit JSON Lines in JSON mode; quiet mode renders nothing.
pub fn render_result(
    result: &ScanResult,
    format: OutputFormat,
    options: &TextOptions,
) -> Result<String> {
    match format {
        OutputFormat::Quiet => Ok(String::new()),
        OutputFormat::Text => Ok(generate_text_report(result, options)),
        OutputFormat::Json if result.recursive => generate_json_lines(result),
        OutputFormat::Json => {
            let mut json = generate_json(result)?;
            json.push('\n');
            Ok(json)
        }
    }
}
