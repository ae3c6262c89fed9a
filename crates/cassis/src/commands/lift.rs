//! Lift command - converts closures in serialized programs into top-level classes

use anyhow::{bail, Context, Result};
use cassis_diagnostics::{DiagnosticEmitter, Diagnostics, JsonEmitter, TerminalEmitter};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{describe_program, emit, lift_source, Lifted};
use crate::config::Config;
use crate::{Output, OutputFormat};

#[derive(Args, Debug)]
pub struct LiftArgs {
    /// Serialized program, or a directory of `*.json` programs
    pub input: PathBuf,

    /// Output file (or directory, when INPUT is a directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print an outline of the lifted HIR to stderr
    #[arg(long)]
    pub print_hir: bool,

    /// Configuration file (defaults to cassis.toml next to INPUT)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Collect the units to lift, in a stable order
fn collect_units(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            units.push(path.to_path_buf());
        }
    }
    Ok(units)
}

/// Where a lifted unit is written; `None` means stdout
fn destination(args: &LiftArgs, unit: &Path) -> Option<PathBuf> {
    let output = args.output.as_ref()?;
    if args.input.is_dir() {
        let relative = unit.strip_prefix(&args.input).unwrap_or(unit);
        Some(output.join(relative))
    } else {
        Some(output.clone())
    }
}

fn write_unit(lifted: &Lifted, destination: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&lifted.program)?;
    match destination {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

pub fn run(args: LiftArgs, output: Output) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args.input)?;
    let units = collect_units(&args.input)?;

    if units.is_empty() {
        if !output.quiet {
            match output.format {
                OutputFormat::Text => eprintln!("No programs found."),
                OutputFormat::Json => eprintln!(
                    "{}",
                    serde_json::json!({ "success": true, "units": 0, "lifted": 0 })
                ),
            }
        }
        return Ok(());
    }

    if !output.quiet && output.format == OutputFormat::Text {
        eprintln!("Lifting {} unit(s)...", units.len());
    }

    let mut all_diagnostics = Diagnostics::new();
    let mut failed = 0;
    let mut reports = Vec::new();

    for unit in &units {
        let source = fs::read_to_string(unit)
            .with_context(|| format!("failed to read {}", unit.display()))?;

        // A failing unit is reported and skipped; the others still get written
        let lifted = match lift_source(&source, &config.lift) {
            Ok(lifted) => lifted,
            Err(rejected) => {
                log::debug!("{}: {}", unit.display(), rejected.diagnostic.message);
                let mut diagnostics = Diagnostics::new();
                diagnostics.push(rejected.diagnostic);
                emit(output, &diagnostics, &rejected.files)?;
                all_diagnostics.extend(diagnostics);
                failed += 1;
                continue;
            }
        };

        log::info!("{}: lifted {} closure(s)", unit.display(), lifted.reports.len());
        reports.extend(lifted.reports.iter().cloned());

        let mut diagnostics = Diagnostics::new();
        for report in &lifted.reports {
            diagnostics.extend(report.diagnostics());
        }
        emit(output, &diagnostics, &lifted.program.files)?;
        all_diagnostics.extend(diagnostics);

        if args.print_hir {
            eprint!("{}", describe_program(&lifted.program));
        }
        write_unit(&lifted, destination(&args, unit).as_deref())?;
    }

    if !output.quiet {
        let stderr = std::io::stderr();
        match output.format {
            OutputFormat::Text => {
                TerminalEmitter::new(stderr.lock(), output.use_color).emit_summary(&all_diagnostics)?;
                let message = format!(
                    "{} closure(s) lifted in {} unit(s)",
                    reports.len(),
                    units.len() - failed
                );
                if failed > 0 {
                    eprintln!(
                        "{}: {}",
                        console::style("Lift failed")
                            .red()
                            .bold()
                            .force_styling(output.use_color),
                        message
                    );
                } else {
                    eprintln!(
                        "{}",
                        console::style(message).green().force_styling(output.use_color)
                    );
                }
            }
            OutputFormat::Json => {
                JsonEmitter::new(stderr.lock()).emit_summary(&all_diagnostics)?;
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "success": failed == 0,
                        "units": units.len(),
                        "failed": failed,
                        "lifted": reports.len(),
                        "closures": reports,
                    })
                );
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} unit(s) could not be lifted", failed, units.len());
    }
    Ok(())
}
