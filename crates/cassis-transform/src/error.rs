//! Errors raised while lifting closures

use cassis_diagnostics::{Diagnostic, DiagnosticCode, Span};
use cassis_hir::ScopeError;
use thiserror::Error;

/// A failed lift. Every variant aborts the compilation unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiftError {
    #[error("invalid scope state: {source}")]
    InvalidState {
        #[source]
        source: ScopeError,
        span: Span,
    },

    #[error("unsupported construct in closure body: {construct}")]
    UnsupportedConstruct { construct: String, span: Span },

    #[error("closure does not name the method it implements")]
    MissingFunctionalMethod { span: Span },
}

impl From<ScopeError> for LiftError {
    fn from(source: ScopeError) -> Self {
        LiftError::InvalidState {
            source,
            span: Span::DUMMY,
        }
    }
}

impl LiftError {
    pub fn span(&self) -> Span {
        match self {
            LiftError::InvalidState { span, .. }
            | LiftError::UnsupportedConstruct { span, .. }
            | LiftError::MissingFunctionalMethod { span } => *span,
        }
    }

    /// Attach `span` unless the error already carries a location
    pub fn at(mut self, location: Span) -> Self {
        let span = match &mut self {
            LiftError::InvalidState { span, .. }
            | LiftError::UnsupportedConstruct { span, .. }
            | LiftError::MissingFunctionalMethod { span } => span,
        };
        if span.is_dummy() {
            *span = location;
        }
        self
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            LiftError::InvalidState {
                source: ScopeError::Unbound { .. },
                ..
            } => DiagnosticCode::UnboundVariable,
            LiftError::InvalidState { .. } => DiagnosticCode::InvalidScopeState,
            LiftError::UnsupportedConstruct { .. } => DiagnosticCode::UnsupportedConstruct,
            LiftError::MissingFunctionalMethod { .. } => DiagnosticCode::MissingFunctionalMethod,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let builder = Diagnostic::error(self.code(), self.to_string()).with_span(self.span());
        match self {
            LiftError::InvalidState {
                source: ScopeError::Unbound { .. },
                ..
            } => builder
                .with_help("declare the key in this scope or an enclosing one before referencing it")
                .build(),
            LiftError::InvalidState { .. } => builder
                .with_help("each source key and identifier may be declared only once per scope")
                .build(),
            LiftError::UnsupportedConstruct { .. } => builder
                .with_note("closures nested in a lifted body must be lifted first")
                .build(),
            LiftError::MissingFunctionalMethod { .. } => builder
                .with_help("resolve the functional interface method before lifting")
                .build(),
        }
    }
}
