use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = FrameError> = std::result::Result<T, E>;

/// Errors raised while planning against, or reading from, a table.
///
/// Every variant carries enough context (the offending column, expression or
/// source) to render a diagnostic without another lookup.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum FrameError {
    #[error("Column not found: {0}")]
    #[diagnostic(
        code(tiny_frame::column_not_found),
        help("check the spelling against the input schema")
    )]
    ColumnNotFound(String),

    #[error("Duplicate field in schema: {0}")]
    #[diagnostic(code(tiny_frame::duplicate_field))]
    DuplicateField(String),

    #[error("Type mismatch: {0}")]
    #[diagnostic(code(tiny_frame::type_mismatch))]
    TypeMismatch(String),

    #[error("Invalid plan: {0}")]
    #[diagnostic(code(tiny_frame::invalid_plan))]
    InvalidPlan(String),

    #[error("Schema mismatch: {0}")]
    #[diagnostic(code(tiny_frame::schema_mismatch))]
    SchemaMismatch(String),

    #[error("Operation cancelled")]
    #[diagnostic(code(tiny_frame::cancelled))]
    Cancelled,

    #[error("Deadline exceeded")]
    #[diagnostic(code(tiny_frame::deadline_exceeded))]
    DeadlineExceeded,

    #[error("Source unavailable: {0}")]
    #[diagnostic(code(tiny_frame::source_unavailable))]
    SourceUnavailable(String),

    #[error("Execution error: {0}")]
    #[diagnostic(code(tiny_frame::execution))]
    Execution(String),
}
