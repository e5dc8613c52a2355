//! Command-line interface module for sortfold.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading and the startup banners
//! - Running the organizer and reporting its outcome

use crate::config::{AppConfig, CompiledConfig};
use crate::organizer::Organizer;
use crate::output::{ConsoleMessageWriter, MessageWriter, OutputFormatter};
use crate::path_planner::OrganizeError;
use crate::statistics::RunStatistics;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Sort a directory tree into category folders.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sortfold", version, about)]
pub struct CliArgs {
    /// Directory to organize (overrides `source_directory` from the config).
    pub source: Option<PathBuf>,

    /// Root that receives the category folders (overrides `destination_root`).
    pub destination: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the run summary as JSON to this file.
    #[arg(long, value_name = "PATH")]
    pub json_report: Option<PathBuf>,
}

/// Runs the CLI application with the given arguments.
///
/// # Examples
///
/// ```no_run
/// use sortfold::cli::{CliArgs, run_cli};
/// use std::path::PathBuf;
///
/// let args = CliArgs {
///     source: Some(PathBuf::from("/home/me/Downloads")),
///     destination: Some(PathBuf::from("/home/me/Sorted")),
///     ..CliArgs::default()
/// };
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
///
/// # Errors
///
/// Returns a message for configuration problems, an invalid category table,
/// an unusable destination, or when any file operation failed during the run.
pub fn run_cli(args: &CliArgs) -> Result<(), String> {
    let config = load_config(args)?;
    announce_settings(&config);

    let writer = ConsoleMessageWriter::new();
    writer.set_status("Organizing...");
    let outcome = organize_with_writer(&config, args.json_report.as_deref(), &writer);
    writer.finish();

    match outcome {
        Ok(Some(_)) => {
            OutputFormatter::success("Organization complete!");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Loads the configuration file and merges the positional paths into it.
///
/// # Errors
///
/// Returns a message if the file cannot be loaded or fails validation.
pub fn load_config(args: &CliArgs) -> Result<CompiledConfig, String> {
    AppConfig::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .with_paths(args.source.clone(), args.destination.clone())
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))
}

fn announce_settings(config: &CompiledConfig) {
    if !config.deleted_extensions.is_empty() {
        OutputFormatter::warning(&format!(
            "Files with these extensions will be deleted: {}",
            config.deleted_extensions.join(", ")
        ));
    }

    OutputFormatter::header("Loaded folder settings:");
    for (key, folder) in config.folders.entries() {
        OutputFormatter::plain(&format!("  {} = {}", key, folder));
    }
    OutputFormatter::info(&format!(
        "Source: {}",
        config.source_directory.display()
    ));
    OutputFormatter::info(&format!(
        "Destination: {}",
        config.destination_root.display()
    ));
}

/// Builds the organizer, runs it and writes the report through `writer`.
///
/// Returns `Ok(None)` when the source directory does not exist: that is
/// reported but is not an error and nothing is created.
///
/// # Errors
///
/// Returns a message for an invalid category table, a run that could not
/// start, an unwritable JSON report, or a run that recorded failures. The
/// summary is written before a failure count is returned.
pub fn organize_with_writer(
    config: &CompiledConfig,
    json_report: Option<&Path>,
    writer: &dyn MessageWriter,
) -> Result<Option<RunStatistics>, String> {
    let organizer =
        Organizer::from_config(config).map_err(|e| format!("Invalid category table: {}", e))?;

    let statistics = match organizer.run(writer) {
        Ok(statistics) => statistics,
        Err(OrganizeError::SourceMissing { .. }) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };

    statistics.report(writer, organizer.source_root());

    if let Some(path) = json_report {
        write_json_report(&statistics, path)?;
        writer.write_line(&format!("JSON summary written to '{}'.", path.display()));
    }

    if statistics.has_failures() {
        return Err(format!(
            "{} file operation(s) failed. Please review errors above.",
            statistics.failures().len()
        ));
    }

    Ok(Some(statistics))
}

fn write_json_report(statistics: &RunStatistics, path: &Path) -> Result<(), String> {
    let json = statistics
        .to_json()
        .map_err(|e| format!("Error serializing summary: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Error writing {}: {}", path.display(), e))
}
