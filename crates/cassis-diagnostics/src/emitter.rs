//! Diagnostic emitters for different output formats.

use crate::diagnostic::{Diagnostic, Diagnostics, Severity};
use crate::span::SourceFiles;
use console::Style;
use std::io::Write;

/// Trait for emitting diagnostics in various formats.
pub trait DiagnosticEmitter {
    /// Emit a single diagnostic.
    fn emit(&mut self, diagnostic: &Diagnostic, files: &SourceFiles) -> std::io::Result<()>;

    /// Emit multiple diagnostics.
    fn emit_all(&mut self, diagnostics: &Diagnostics, files: &SourceFiles) -> std::io::Result<()> {
        for diag in diagnostics.iter() {
            self.emit(diag, files)?;
        }
        Ok(())
    }

    /// Emit a summary line.
    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()>;
}

/// Terminal output with optional colors.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colored: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, colored: bool) -> Self {
        Self { writer, colored }
    }

    fn style(&self, style: Style) -> Style {
        style.force_styling(self.colored)
    }

    fn severity_style(&self, severity: Severity) -> Style {
        match severity {
            Severity::Error => self.style(Style::new().red().bold()),
            Severity::Warning => self.style(Style::new().yellow().bold()),
        }
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, files: &SourceFiles) -> std::io::Result<()> {
        let header = self.severity_style(diagnostic.severity);
        let cyan = self.style(Style::new().cyan());

        // Header: error[L001]: message
        writeln!(
            self.writer,
            "{}: {}",
            header.apply_to(format!(
                "{}[{}]",
                diagnostic.severity.as_str(),
                diagnostic.code.as_str()
            )),
            diagnostic.message
        )?;

        if let Some(loc) = files.location(diagnostic.span) {
            writeln!(self.writer, "  {} {}", cyan.apply_to("-->"), loc)?;
        }

        for note in &diagnostic.notes {
            writeln!(self.writer, "  {} {}", cyan.apply_to("= note:"), note)?;
        }

        if let Some(ref help) = diagnostic.help {
            writeln!(self.writer, "  {} {}", cyan.apply_to("= help:"), help)?;
        }

        writeln!(self.writer)?;
        Ok(())
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        let errors = diagnostics.error_count();
        let warnings = diagnostics.warning_count();
        if errors == 0 && warnings == 0 {
            return Ok(());
        }

        let style = if errors > 0 {
            self.severity_style(Severity::Error)
        } else {
            self.severity_style(Severity::Warning)
        };

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} error{}", errors, if errors == 1 { "" } else { "s" }));
        }
        if warnings > 0 {
            parts.push(format!(
                "{} warning{}",
                warnings,
                if warnings == 1 { "" } else { "s" }
            ));
        }
        writeln!(
            self.writer,
            "{}",
            style.apply_to(format!("{} emitted", parts.join(" and ")))
        )
    }
}

/// JSON output for tooling integration (one object per line).
pub struct JsonEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticEmitter for JsonEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, files: &SourceFiles) -> std::io::Result<()> {
        let loc = files.location(diagnostic.span);

        let json = serde_json::json!({
            "code": diagnostic.code.as_str(),
            "severity": diagnostic.severity.as_str(),
            "message": diagnostic.message,
            "location": loc.map(|l| serde_json::json!({
                "file": l.file,
                "start": l.start,
                "end": l.end,
            })),
            "help": diagnostic.help,
            "notes": diagnostic.notes,
        });

        serde_json::to_writer(&mut self.writer, &json)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        let summary = serde_json::json!({
            "type": "summary",
            "errors": diagnostics.error_count(),
            "warnings": diagnostics.warning_count(),
            "total": diagnostics.len(),
        });
        serde_json::to_writer(&mut self.writer, &summary)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Simple text output (no colors, one line per diagnostic).
pub struct SimpleEmitter<W: Write> {
    writer: W,
}

impl<W: Write> SimpleEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> DiagnosticEmitter for SimpleEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic, files: &SourceFiles) -> std::io::Result<()> {
        match files.location(diagnostic.span) {
            Some(loc) => writeln!(
                self.writer,
                "{}: {}: {} [{}]",
                loc,
                diagnostic.severity.as_str(),
                diagnostic.message,
                diagnostic.code.as_str()
            ),
            None => writeln!(
                self.writer,
                "{}: {} [{}]",
                diagnostic.severity.as_str(),
                diagnostic.message,
                diagnostic.code.as_str()
            ),
        }
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;
    use crate::span::Span;

    fn sample() -> (Diagnostic, SourceFiles) {
        let mut files = SourceFiles::new();
        let file = files.add("Outer.java");
        let diag = Diagnostic::error(DiagnosticCode::InvalidScopeState, "key `x` is already bound")
            .with_span(Span::new(file, 10, 12))
            .with_help("declare each source key once per scope")
            .build();
        (diag, files)
    }

    #[test]
    fn test_simple_emitter_includes_location_and_code() {
        let (diag, files) = sample();
        let mut out = Vec::new();
        SimpleEmitter::new(&mut out).emit(&diag, &files).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Outer.java[10..12]: error: key `x` is already bound [L001]\n");
    }

    #[test]
    fn test_terminal_emitter_without_color() {
        let (diag, files) = sample();
        let mut out = Vec::new();
        TerminalEmitter::new(&mut out, false).emit(&diag, &files).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("error[L001]: key `x` is already bound\n"));
        assert!(text.contains("--> Outer.java[10..12]"));
        assert!(text.contains("= help: declare each source key once per scope"));
    }

    #[test]
    fn test_json_emitter_is_line_delimited() {
        let (diag, files) = sample();
        let mut out = Vec::new();
        JsonEmitter::new(&mut out).emit(&diag, &files).unwrap();
        let text = String::from_utf8(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["code"], "L001");
        assert_eq!(value["location"]["start"], 10);
    }
}
