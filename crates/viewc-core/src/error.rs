//! # Compile Errors and Warnings
//!
//! Every failure aborts the whole schema compilation and is reported as one
//! [`CompileError`] carrying a human-readable message. A missing maintenance index
//! is the only non-fatal outcome and is reported as a [`CompileWarning`].

use crate::expr::CodecError;
use crate::external::{ParseError, PlanError};

/// A structural rule a view definition failed.
///
/// The display text continues `Materialized view "<name>" `.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewSpecViolation {
    #[error("must exactly match the GROUP BY clause at index {0} of SELECT list.")]
    GroupByMismatch(usize),
    #[error("with {0} in GROUP BY clause not supported.")]
    GroupByNotUniqueIndexable(String),
    #[error("must have count(*) after the GROUP BY columns (if any) but before the aggregate functions (if any).")]
    MissingCountStar,
    #[error("must have non-group by columns aggregated by sum, count, min or max.")]
    UnsupportedAggregate,
    #[error("with nested aggregate function calls is not supported.")]
    NestedAggregate,
    /// Rejected by the engine's expression checker; its message is kept verbatim.
    #[error("{0}")]
    InvalidExpression(String),
    #[error("with subquery sources is not supported.")]
    Subquery,
    #[error("only supports INNER JOIN.")]
    NonInnerJoin,
    #[error("with ORDER BY clause is not supported.")]
    OrderBy,
    #[error("with LIMIT or OFFSET clause is not supported.")]
    LimitOrOffset,
    #[error("with HAVING clause is not supported.")]
    Having,
    #[error("has too few columns.")]
    TooFewColumns,
    #[error("references table {0} more than once: materialized view does not support self-join.")]
    SelfJoin(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Materialized view \"{view}\" {violation}")]
    Structural {
        view: String,
        violation: ViewSpecViolation,
    },
    #[error("A materialized view ({view}) can not be defined on another view ({source_table}).")]
    ViewOnView { view: String, source_table: String },
    #[error("A materialized view ({view}) on joined tables cannot have streamed table ({source_table}) as its source.")]
    StreamedSource { view: String, source_table: String },
    #[error("A UNIQUE or ASSUMEUNIQUE index is not allowed on a materialized view. Remove the qualifier from the index {index} defined on the materialized view \"{view}\".")]
    IndexQualifier { view: String, index: String },
    #[error("Unexpected error serializing {what} for materialized view \"{view}\": {source}")]
    Serialization {
        view: String,
        what: &'static str,
        #[source]
        source: CodecError,
    },
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Plan(#[from] PlanError),
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },
    #[error("Materialized view \"{view}\" has {dest_columns} columns but its query produces {display_columns}")]
    ColumnCountMismatch {
        view: String,
        dest_columns: usize,
        display_columns: usize,
    },
    /// A contract the compiler relies on was broken, e.g. catalog JSON it wrote
    /// itself no longer decodes.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompileError {
    pub fn structural(view: &str, violation: ViewSpecViolation) -> Self {
        CompileError::Structural {
            view: view.to_string(),
            violation,
        }
    }

    pub fn violation(&self) -> Option<&ViewSpecViolation> {
        match self {
            CompileError::Structural { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Non-fatal compiler diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileWarning {
    #[error("No index found to support UPDATE and DELETE on some of the min() / max() columns in the Materialized View {view}, and a sequential scan might be issued when current min / max value is updated / deleted.")]
    MissingMaintenanceIndex { view: String },
}
