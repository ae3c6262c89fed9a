//! CLI command implementations

pub mod lift;
pub mod run;

use cassis_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticEmitter, Diagnostics, JsonEmitter, SimpleEmitter,
    SourceFiles, TerminalEmitter,
};
use cassis_hir::{ClassNode, Program};
use cassis_transform::{convert_closures, LiftOptions, LiftReport};
use std::fmt::Write as _;

use crate::{Output, OutputFormat};

/// A unit that went through `convert_closures`
pub struct Lifted {
    pub program: Program,
    pub reports: Vec<LiftReport>,
}

/// Why a unit could not be lifted, with the files its spans point into
pub struct Rejected {
    pub diagnostic: Diagnostic,
    pub files: SourceFiles,
}

/// Deserialize one program and run the pass over it
pub fn lift_source(source: &str, options: &LiftOptions) -> Result<Lifted, Rejected> {
    let mut program: Program = serde_json::from_str(source).map_err(|e| Rejected {
        diagnostic: Diagnostic::error(DiagnosticCode::MalformedInput, format!("malformed program: {}", e))
            .with_note(format!("at line {}, column {}", e.line(), e.column()))
            .build(),
        files: SourceFiles::new(),
    })?;

    match convert_closures(&mut program, options) {
        Ok(reports) => Ok(Lifted { program, reports }),
        Err(error) => Err(Rejected {
            diagnostic: error.to_diagnostic(),
            files: program.files,
        }),
    }
}

/// Write diagnostics to stderr in the requested format
pub fn emit(output: Output, diagnostics: &Diagnostics, files: &SourceFiles) -> std::io::Result<()> {
    let stderr = std::io::stderr();
    match output.format {
        // Quiet mode still reports errors, one line each
        OutputFormat::Text if output.quiet => {
            let errors = Diagnostics {
                items: diagnostics.iter().filter(|d| d.is_error()).cloned().collect(),
            };
            SimpleEmitter::new(stderr.lock()).emit_all(&errors, files)
        }
        OutputFormat::Text => TerminalEmitter::new(stderr.lock(), output.use_color).emit_all(diagnostics, files),
        OutputFormat::Json => JsonEmitter::new(stderr.lock()).emit_all(diagnostics, files),
    }
}

/// Human-readable outline of a program's classes
pub fn describe_program(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== HIR: {} ===", program.name);
    let _ = writeln!(out, "Classes: {}", program.classes.len());
    for class in &program.classes {
        describe_class(&mut out, class);
    }
    out
}

fn describe_class(out: &mut String, class: &ClassNode) {
    let mut header = format!("  class {}", class.name);
    if !class.type_params.is_empty() {
        let params: Vec<_> = class.type_params.iter().map(|p| p.name.as_str()).collect();
        let _ = write!(header, "<{}>", params.join(", "));
    }
    if !class.super_types.is_empty() {
        let supers: Vec<_> = class.super_types.iter().map(|t| t.to_string()).collect();
        let _ = write!(header, " : {}", supers.join(", "));
    }
    let _ = writeln!(out, "{}", header);

    for field in &class.fields {
        let modifier = if field.is_static { "static " } else { "" };
        let _ = writeln!(out, "    {}field {}: {}", modifier, field.name, field.ty);
    }
    if !class.constructor.params.is_empty() || !class.constructor.body.is_empty() {
        let params: Vec<_> = class
            .constructor
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        let _ = writeln!(
            out,
            "    constructor({}) [{} stmt(s)]",
            params.join(", "),
            class.constructor.body.len()
        );
    }
    for method in &class.methods {
        let modifier = if method.is_static { "static " } else { "" };
        let params: Vec<_> = method
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        let _ = writeln!(
            out,
            "    {}method {}({}): {} [{} stmt(s)]",
            modifier,
            method.name,
            params.join(", "),
            method.return_type,
            method.body.len()
        );
    }
}
