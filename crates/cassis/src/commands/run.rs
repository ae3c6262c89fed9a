//! Run command - lifts a program and evaluates a static method

use anyhow::{bail, Context, Result};
use cassis_diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use cassis_interp::{Interpreter, Value};
use cassis_types::TypeName;
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::{emit, lift_source, Lifted};
use crate::config::Config;
use crate::{Output, OutputFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serialized program
    pub input: PathBuf,

    /// Qualified name of the class declaring the entry point
    #[arg(long)]
    pub class: String,

    /// Static, zero-argument method to call
    #[arg(long)]
    pub method: String,

    /// Configuration file (defaults to cassis.toml next to INPUT)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn evaluate(lifted: &Lifted, class: &TypeName, method: &str) -> Result<Value, Diagnostic> {
    Interpreter::new(&lifted.program)
        .call_static(class, method, Vec::new())
        .map_err(|e| {
            Diagnostic::error(DiagnosticCode::EvaluationError, e.to_string())
                .with_note(format!("while running {}.{}()", class, method))
                .build()
        })
}

pub fn run(args: RunArgs, output: Output) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args.input)?;
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let lifted = match lift_source(&source, &config.lift) {
        Ok(lifted) => lifted,
        Err(rejected) => {
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(rejected.diagnostic);
            emit(output, &diagnostics, &rejected.files)?;
            bail!("{} could not be lifted", args.input.display());
        }
    };
    log::info!("lifted {} closure(s)", lifted.reports.len());

    let class = TypeName::of(args.class.as_str());
    let value = match evaluate(&lifted, &class, &args.method) {
        Ok(value) => value,
        Err(diagnostic) => {
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(diagnostic);
            emit(output, &diagnostics, &lifted.program.files)?;
            bail!("evaluation of {}.{} failed", class, args.method);
        }
    };

    match output.format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "class": class.qualified_name(),
                "method": args.method,
                "type": value.type_name(),
                "value": value.to_string(),
                "lifted": lifted.reports.len(),
            })
        ),
    }
    Ok(())
}
