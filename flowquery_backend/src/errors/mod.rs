//! Semantic errors and the diagnostics used to report them.

mod builder;
mod span;

use thiserror::Error;

pub use self::builder::DiagnosticBuilder;
pub use self::span::Span;

#[derive(Clone, Copy, Debug)]
enum Level {
    ICE,
    Error,
    Help,
    Note,
}

/// Everything that can make a compilation fail.
/// Each stage stops at the first of these it runs into.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SemanticError {
    #[error("duplicate variable {name}")]
    DuplicateVariable { name: String, span: Span },
    #[error("ambiguous variable name: {name}")]
    AmbiguousVariable { name: String, span: Span },
    /// Unlike the other errors, this one is collected over the whole file.
    #[error("undefined variable: {}", .names.join(", "))]
    UndefinedVariable { names: Vec<String>, spans: Vec<Span> },
    #[error("undefined table: {name}")]
    UndefinedTable { name: String, span: Span },
    #[error("duplicate column: {name}")]
    DuplicateColumn { name: String, span: Span },
    #[error("unknown column: {name}")]
    UnknownColumn { name: String, span: Span },
    #[error("arity mismatch: {expected} != {found}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("type mismatch: {expected} != {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("cannot unify {first} with {second}")]
    UnificationError {
        first: String,
        second: String,
        span: Span,
    },
    #[error("infinite type: {variable} occurs in {ty}")]
    InfiniteType {
        variable: String,
        ty: String,
        span: Span,
    },
    #[error("internal graph error: {0}")]
    InternalGraphError(String),
    #[error("cannot define `{name}` in a record scope")]
    RecordScopeDefinition { name: String },
}

impl SemanticError {
    /// Whether this error points at a bug in the front end rather than
    /// at the program being compiled.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SemanticError::InternalGraphError(_) | SemanticError::RecordScopeDefinition { .. }
        )
    }

    /// Builds a diagnostic for this error against the source it came from.
    pub fn report<'ctx, 'src>(
        &self,
        ctx: &'ctx DiagnosticsContext<'src>,
    ) -> DiagnosticBuilder<'ctx, 'src> {
        let title = self.to_string();

        match self {
            SemanticError::DuplicateVariable { name, span } => ctx
                .build_error(title)
                .span_label(*span, format!("`{}` redefined here", name)),

            SemanticError::AmbiguousVariable { name, span } => ctx
                .build_error(title)
                .span_label(*span, format!("`{}` is also bound by the enclosing scope", name))
                .help("rename one of the bindings"),

            SemanticError::UndefinedVariable { names, spans } => names.iter().zip(spans).fold(
                ctx.build_error(title),
                |builder, (name, span)| builder.span_label(*span, format!("`{}` is never defined", name)),
            ),

            SemanticError::UndefinedTable { name, span } => ctx
                .build_error(title)
                .span_label(*span, format!("`{}` is not a table", name))
                .note("only tables can be selected from"),

            SemanticError::DuplicateColumn { name, span } => ctx
                .build_error(title)
                .span_label(*span, format!("column `{}` declared again here", name)),

            SemanticError::UnknownColumn { name, span } => ctx
                .build_error(title)
                .span_label(*span, format!("no column named `{}`", name)),

            SemanticError::ArityMismatch { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::UnificationError { span, .. } => ctx
                .build_error(title)
                .span_label(*span, "type error detected here"),

            SemanticError::InfiniteType { span, .. } => ctx
                .build_error(title)
                .span_label(*span, "type error detected here")
                .note("the `occurs-check` unstable feature rejected a recursive type"),

            SemanticError::InternalGraphError(_) | SemanticError::RecordScopeDefinition { .. } => {
                ctx.build_ice(title)
            },
        }
    }
}

pub struct DiagnosticsContext<'src> {
    source: &'src str,
    origin: Option<String>,
    color: bool,
}

impl<'src> DiagnosticsContext<'src> {
    pub fn new(source: &'src str, origin: Option<String>) -> Self {
        Self {
            source,
            origin,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn can_show(&self, span: Span) -> bool {
        !span.is_empty() && span.end() <= self.source.len()
    }

    pub fn build_ice(&self, message: impl ToString) -> DiagnosticBuilder<'_, 'src> {
        DiagnosticBuilder::new(message.to_string(), Level::ICE, self)
            .note("this is an internal error")
            .note("a bug report would be highly appreciated")
    }

    pub fn build_error(&self, message: impl ToString) -> DiagnosticBuilder<'_, 'src> {
        DiagnosticBuilder::new(message.to_string(), Level::Error, self)
    }
}
