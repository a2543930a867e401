//! # External Collaborators
//!
//! The view compiler depends on several engine subsystems it does not implement.
//! Each is a trait so the engine (or `viewc-builtin`, or a test) can plug in its own:
//!
//! - [`StatementParser`]: view query text to a parsed [`ViewDefinition`].
//! - [`PlanCompiler`]: a [`QueryForm`] to a [`CompiledStatement`].
//! - [`FallbackQueryGenerator`]: the recomputation queries for MIN/MAX maintenance.
//! - [`PredicateCoverage`]: the optimizer's partial-index eligibility test.
//! - [`ExpressionChecker`]: which expressions may appear in indexes and views.
//!
//! All calls are blocking and in-process. [`CompileContext`] bundles one borrowed
//! instance of each for a compile pass.

use crate::catalog::{Database, Index, Table};
use crate::expr::Expr;
use crate::statement::{
    CompiledStatement, DeterminismMode, DisplayColumn, QueryForm, StatementPartitioning, ViewDefinition,
};

/// The statement parser rejected a view's query text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The plan compiler failed to compile a statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PlanError {
    pub message: String,
}

impl PlanError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait StatementParser {
    fn parse(&self, query: &str) -> Result<ViewDefinition, ParseError>;
}

pub trait PlanCompiler {
    fn compile(
        &self,
        db: &Database,
        form: &QueryForm,
        sql_text: &str,
        join_order: Option<&str>,
        determinism: DeterminismMode,
        partitioning: StatementPartitioning,
    ) -> Result<CompiledStatement, PlanError>;
}

pub trait FallbackQueryGenerator {
    /// Query forms recomputing each MIN/MAX aggregate of a view, in display order.
    fn fallback_forms(
        &self,
        original: &QueryForm,
        group_by: &[Expr],
        display_columns: &[DisplayColumn],
    ) -> Vec<QueryForm>;
}

pub trait PredicateCoverage {
    /// Whether `view_conjuncts` imply the partial-index predicate of `index`.
    ///
    /// Conjuncts that match a predicate term exactly are appended to `exact_matches`.
    fn is_partial_index_predicate_covered(
        &self,
        table: &Table,
        view_conjuncts: &[Expr],
        index: &Index,
        index_predicate: &Expr,
        exact_matches: &mut Vec<Expr>,
    ) -> bool;
}

pub trait ExpressionChecker {
    /// Validate expressions destined for an index or materialized view.
    ///
    /// The error text continues a sentence that starts with the view's name, e.g.
    /// `with aggregate expression(s) is not supported.`
    fn validate_for_views(&self, exprs: &[&Expr]) -> Result<(), String>;
}

/// Collaborators used by one compile pass.
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    pub parser: &'a dyn StatementParser,
    pub planner: &'a dyn PlanCompiler,
    pub fallback: &'a dyn FallbackQueryGenerator,
    pub coverage: &'a dyn PredicateCoverage,
    pub checker: &'a dyn ExpressionChecker,
}
