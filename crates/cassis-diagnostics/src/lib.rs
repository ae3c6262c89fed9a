//! Diagnostic infrastructure for the Cassis compiler.
//!
//! This crate provides structured error reporting with:
//! - Opaque source locations handed over by the front end
//! - Diagnostic types with stable error codes
//! - Multiple output formats (terminal, JSON, simple text)
//!
//! # Example
//!
//! ```
//! use cassis_diagnostics::{
//!     Diagnostic, DiagnosticCode, DiagnosticEmitter, FileId, SimpleEmitter, SourceFiles, Span,
//! };
//!
//! let mut files = SourceFiles::new();
//! let file_id = files.add("src/Outer.java");
//!
//! let diag = Diagnostic::error(DiagnosticCode::MissingFunctionalMethod, "closure has no functional method")
//!     .with_span(Span::new(file_id, 120, 134))
//!     .build();
//!
//! let mut out = Vec::new();
//! SimpleEmitter::new(&mut out).emit(&diag, &files).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("src/Outer.java[120..134]"));
//! # let _ = FileId::DUMMY;
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod span;

// Re-export commonly used types
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Diagnostics, Severity};
pub use emitter::{DiagnosticEmitter, JsonEmitter, SimpleEmitter, TerminalEmitter};
pub use span::{FileId, Location, SourceFiles, Span};
