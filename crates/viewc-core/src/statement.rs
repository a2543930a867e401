//! # Statements
//!
//! Parsed view definitions as delivered by the statement parser, the query forms
//! handed to the plan compiler, and the compiled statements it returns.

use crate::expr::{Expr, JoinType};
use serde::{Deserialize, Serialize};

/// One entry of a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayColumn {
    pub alias: String,
    pub expr: Expr,
}

impl DisplayColumn {
    pub fn new(alias: impl Into<String>, expr: Expr) -> Self {
        Self {
            alias: alias.into(),
            expr,
        }
    }
}

/// FROM clause as a tree of joins over named tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinTree {
    Table(String),
    Join {
        join_type: JoinType,
        left: Box<JoinTree>,
        right: Box<JoinTree>,
        condition: Option<Expr>,
    },
}

impl JoinTree {
    pub fn join(join_type: JoinType, left: JoinTree, right: JoinTree, condition: Option<Expr>) -> Self {
        JoinTree::Join {
            join_type,
            left: Box::new(left),
            right: Box::new(right),
            condition,
        }
    }

    pub fn all_inner_joins(&self) -> bool {
        match self {
            JoinTree::Table(_) => true,
            JoinTree::Join {
                join_type,
                left,
                right,
                ..
            } => join_type.is_inner() && left.all_inner_joins() && right.all_inner_joins(),
        }
    }

    /// Table names in left-to-right order.
    pub fn tables(&self) -> Vec<&str> {
        match self {
            JoinTree::Table(name) => vec![name.as_str()],
            JoinTree::Join { left, right, .. } => {
                let mut names = left.tables();
                names.extend(right.tables());
                names
            }
        }
    }
}

/// A parsed `CREATE VIEW ... AS SELECT` body.
///
/// Immutable once parsed. The SELECT list of a valid view starts with the GROUP BY
/// keys, followed by `COUNT(*)`, followed by aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub group_by: Vec<Expr>,
    pub display_columns: Vec<DisplayColumn>,
    #[serde(default)]
    pub join_tree: Option<JoinTree>,
    /// Filter over the source table (the WHERE clause).
    #[serde(default)]
    pub filter: Option<Expr>,
    /// Source tables in FROM order; the first is the view's primary source.
    pub tables: Vec<String>,
    #[serde(default)]
    pub has_subquery: bool,
    #[serde(default)]
    pub has_order_by: bool,
    #[serde(default)]
    pub has_limit_or_offset: bool,
    #[serde(default)]
    pub having: Option<Expr>,
}

impl ViewDefinition {
    /// A single-table view with no filter.
    pub fn new(table: impl Into<String>, group_by: Vec<Expr>, display_columns: Vec<DisplayColumn>) -> Self {
        let table = table.into();
        Self {
            group_by,
            display_columns,
            join_tree: Some(JoinTree::Table(table.clone())),
            filter: None,
            tables: vec![table],
            has_subquery: false,
            has_order_by: false,
            has_limit_or_offset: false,
            having: None,
        }
    }

    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether any grouping key is something other than a bare column.
    pub fn has_complex_group_by(&self) -> bool {
        self.group_by.iter().any(|e| !e.is_column())
    }

    pub fn is_joined(&self) -> bool {
        self.tables.len() > 1
    }
}

/// A query in the form the plan compiler accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryForm {
    pub select: Vec<DisplayColumn>,
    pub tables: Vec<String>,
    pub join_tree: Option<JoinTree>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl From<&ViewDefinition> for QueryForm {
    fn from(def: &ViewDefinition) -> Self {
        Self {
            select: def.display_columns.clone(),
            tables: def.tables.clone(),
            join_tree: def.join_tree.clone(),
            filter: def.filter.clone(),
            group_by: def.group_by.clone(),
        }
    }
}

/// Determinism requirement passed through to the plan compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeterminismMode {
    /// Accept plans whose row order is not guaranteed.
    #[default]
    Faster,
    /// Prefer plans with deterministic output order.
    Safer,
}

/// How a compiled statement decides where it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementPartitioning {
    /// Always runs on the single partition it is invoked on.
    ForceSinglePartition,
    /// Partitioning is inferred from the statement's own predicates.
    Infer,
}

/// A statement compiled by the plan compiler and attached to a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledStatement {
    pub sql_text: String,
    pub form: QueryForm,
    pub join_order: Option<String>,
    pub determinism: DeterminismMode,
    pub partitioning: StatementPartitioning,
    /// Engine-specific serialized plan; `None` when planning is deferred.
    pub plan: Option<String>,
}
