//! Command-line front end.
//!
//! ```text
//! ts-catalog [--workspace DIR] [--config FILE] [--verbose] check [--json] [PATH...]
//! ts-catalog lookup FILE --context C --source S [--count N] [--arg A]...
//! ts-catalog fmt FILE [--output OUT]
//! ts-catalog merge EXISTING EXTRACTED [--output OUT] [--no-obsolete]
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{
    CatalogError,
    load_catalog,
    read_catalog_file,
    save_catalog,
};
use crate::config::{
    CatalogSettings,
    ConfigError,
    ConfigManager,
    Severity,
};
use crate::diagnostics::{
    Diagnostic,
    generate_diagnostics,
};
use crate::lookup::Translator;
use crate::merge::merge;
use crate::workspace::{
    LoadedCatalog,
    WorkspaceError,
    WorkspaceLoader,
};

pub const USAGE: &str = "\
Usage: ts-catalog [--workspace DIR] [--config FILE] [--verbose] <COMMAND>

Commands:
  check [--json] [PATH...]
  lookup FILE --context C --source S [--count N] [--arg A]...
  fmt FILE [--output OUT]
  merge EXISTING EXTRACTED [--output OUT] [--no-obsolete]
";

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}\n\n{USAGE}")]
    Usage(String),

    #[error("Invalid arguments: {0}")]
    Args(#[from] pico_args::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check { json: bool, paths: Vec<PathBuf> },
    Lookup { file: PathBuf, context: String, source: String, count: Option<u64>, args: Vec<String> },
    Fmt { file: PathBuf, output: Option<PathBuf> },
    Merge { existing: PathBuf, extracted: PathBuf, output: Option<PathBuf>, no_obsolete: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    /// Directory holding `.ts-catalog.json`.
    pub workspace: PathBuf,
    /// Settings file used instead of the workspace's own.
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub command: Command,
}

impl Cli {
    /// # Errors
    /// Returns error on unknown commands, missing values or leftover arguments.
    pub fn parse_from(args: Vec<OsString>) -> Result<Self, CliError> {
        let mut args = pico_args::Arguments::from_vec(args);

        let verbose = args.contains(["-v", "--verbose"]);
        let workspace: PathBuf =
            args.opt_value_from_str("--workspace")?.unwrap_or_else(|| PathBuf::from("."));
        let config = args.opt_value_from_str("--config")?;

        let command = match args.subcommand()?.as_deref() {
            Some("check") => {
                let json = args.contains("--json");
                let paths = free_paths(args)?;
                return Ok(Self { workspace, config, verbose, command: Command::Check { json, paths } });
            }
            Some("lookup") => Command::Lookup {
                context: args.value_from_str("--context")?,
                source: args.value_from_str("--source")?,
                count: args.opt_value_from_str("--count")?,
                args: args.values_from_str("--arg")?,
                file: args.free_from_str()?,
            },
            Some("fmt") => Command::Fmt {
                output: args.opt_value_from_str("--output")?,
                file: args.free_from_str()?,
            },
            Some("merge") => {
                let output = args.opt_value_from_str("--output")?;
                let no_obsolete = args.contains("--no-obsolete");
                Command::Merge {
                    existing: args.free_from_str()?,
                    extracted: args.free_from_str()?,
                    output,
                    no_obsolete,
                }
            }
            Some(other) => return Err(CliError::Usage(format!("Unknown command '{other}'"))),
            None => return Err(CliError::Usage("Missing command".to_string())),
        };

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(CliError::Usage(format!("Unexpected arguments: {rest:?}")));
        }
        Ok(Self { workspace, config, verbose, command })
    }
}

fn free_paths(args: pico_args::Arguments) -> Result<Vec<PathBuf>, CliError> {
    let mut paths = Vec::new();
    for arg in args.finish() {
        if arg.to_string_lossy().starts_with('-') {
            return Err(CliError::Usage(format!("Unknown option {arg:?}")));
        }
        paths.push(PathBuf::from(arg));
    }
    Ok(paths)
}

/// Per-file entry of the `check --json` report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    path: PathBuf,
    /// Reasons the file could not be loaded, one per validation problem.
    errors: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

/// Runs a parsed command, writing user-facing output to `out`.
///
/// Returns `false` when `check` found a fatal error or an error-severity
/// diagnostic.
///
/// # Errors
/// Returns error when settings, input files or output cannot be handled.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<bool, CliError> {
    let mut manager = ConfigManager::new();
    match &cli.config {
        Some(path) => manager.load_file(path)?,
        None => manager.load_workspace(&cli.workspace)?,
    };
    if let Some(source) = manager.source() {
        tracing::info!(settings = %source.display(), "Using settings file");
    }
    let settings = manager.settings();

    match cli.command {
        Command::Check { json, paths } => check(&cli.workspace, settings, json, paths, out).await,
        Command::Lookup { file, context, source, count, args } => {
            let catalog = read_catalog_file(&file)?;
            let translator = Translator::from_catalog(catalog, &settings.lookup)?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            writeln!(out, "{}", translator.translate_with_args(&context, &source, count, &args))?;
            Ok(true)
        }
        Command::Fmt { file, output } => {
            let catalog = load_catalog(&file)?;
            save_catalog(&catalog, output.as_deref().unwrap_or(file.as_path()))?;
            Ok(true)
        }
        Command::Merge { existing, extracted, output, no_obsolete } => {
            let mut config = settings.merge;
            if no_obsolete {
                config.keep_obsolete = false;
            }
            let outcome = merge(&load_catalog(&existing)?, &read_catalog_file(&extracted)?, &config)?;
            crate::validate::ensure_valid(&outcome.catalog)?;
            let target = output.as_deref().unwrap_or(existing.as_path());
            save_catalog(&outcome.catalog, target)?;
            let report = outcome.report;
            writeln!(
                out,
                "{}: {} matched, {} added, {} vanished, {} dropped",
                target.display(),
                report.matched,
                report.added,
                report.vanished,
                report.dropped
            )?;
            Ok(true)
        }
    }
}

async fn check(
    workspace: &Path,
    settings: &CatalogSettings,
    json: bool,
    paths: Vec<PathBuf>,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    let loaded = if paths.is_empty() {
        WorkspaceLoader::load(workspace, settings).await?
    } else {
        WorkspaceLoader::new(workspace, settings)?.load_files(paths).await
    };

    let reports: Vec<FileReport> = loaded.into_iter().map(|file| file_report(file, settings)).collect();
    let success = reports.iter().all(|report| {
        report.errors.is_empty() && report.diagnostics.iter().all(|d| d.severity != Severity::Error)
    });

    if json {
        serde_json::to_writer_pretty(&mut *out, &reports)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            write_report(report, out)?;
        }
    }

    tracing::info!(files = reports.len(), success, "Check finished");
    Ok(success)
}

fn file_report(file: LoadedCatalog, settings: &CatalogSettings) -> FileReport {
    match file.result {
        Ok(catalog) => FileReport {
            diagnostics: generate_diagnostics(&catalog, &settings.diagnostics),
            path: file.path,
            errors: Vec::new(),
        },
        Err(e) => FileReport {
            path: file.path,
            errors: e.into_errors().iter().map(ToString::to_string).collect(),
            diagnostics: Vec::new(),
        },
    }
}

fn write_report(report: &FileReport, out: &mut impl Write) -> std::io::Result<()> {
    let path = report.path.display();
    if !report.errors.is_empty() {
        for error in &report.errors {
            writeln!(out, "{path}: error: {error}")?;
        }
        return Ok(());
    }
    if report.diagnostics.is_empty() {
        return writeln!(out, "{path}: ok");
    }
    for diagnostic in &report.diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning | Severity::Off => "warning",
        };
        match &diagnostic.location {
            Some(location) => writeln!(
                out,
                "{path}: {severity}: [{}] {} ({location})",
                diagnostic.context, diagnostic.message
            )?,
            None => {
                writeln!(out, "{path}: {severity}: [{}] {}", diagnostic.context, diagnostic.message)?;
            }
        }
    }
    Ok(())
}
