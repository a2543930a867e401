//! # Catalog Model
//!
//! In-memory catalog structures read and written during one schema-compile pass:
//! tables, columns, indexes, constraints, and the materialized view records the
//! compiler attaches to them.
//!
//! ## Ordering
//!
//! Tables live in an `IndexMap` so iteration follows declaration order. A table's
//! `indexes` vector is the catalog iteration order the index matcher scans; the
//! "last sub-optimal match wins" rule depends on it.
//!
//! ## Serialized Fields
//!
//! Expression-valued catalog fields (`Index::expressions_json`,
//! `Index::predicate_json`, `Grouping::Expressions`, `MaterializedView::predicate`)
//! hold the canonical text forms from [`crate::expr`]. An empty string means
//! "absent", the same convention the rest of the engine reads.

use crate::expr::{exprs_from_json, exprs_to_json, CodecError, ColumnRef, Expr, ValueType};
use crate::statement::CompiledStatement;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index structure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexType {
    /// Balanced tree; the engine default and the type of every auto-generated index.
    #[default]
    BalancedTree,
    HashTable,
    /// Geospatial covering-cell index.
    CoveringCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    NotNull,
}

/// Which aggregate produced a destination column of a materialized view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregateKind {
    /// A grouping column, or any column of an ordinary table.
    #[default]
    None,
    CountStar,
    Count,
    Sum,
    Min,
    Max,
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Ordinal position within the owning table.
    pub index: u32,
    pub value_type: ValueType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Aggregate tag; only set on materialized view destination columns.
    #[serde(default)]
    pub aggregate: AggregateKind,
    /// Name of the source-table column this view column derives from.
    #[serde(default)]
    pub matview_source: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, index: u32, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            index,
            value_type,
            nullable: true,
            aggregate: AggregateKind::None,
            matview_source: None,
        }
    }

    /// A reference to this column as it appears in expressions over `table`.
    pub fn to_ref(&self, table: &str) -> ColumnRef {
        ColumnRef::new(table, self.name.clone(), self.index, self.value_type)
    }
}

/// An index on a table.
///
/// A key is either a list of plain columns (`columns`, `expressions_json` empty) or a
/// list of expressions (`expressions_json` set). For an expression index `columns`
/// lists every column the expressions touch, which is not a key and must not be
/// compared positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    #[serde(default)]
    pub index_type: IndexType,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub assume_unique: bool,
    pub columns: Vec<ColumnRef>,
    #[serde(default)]
    pub expressions_json: String,
    /// Partial-index predicate; empty for a full index.
    #[serde(default)]
    pub predicate_json: String,
}

/// Decoded key of an [`Index`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexKey<'a> {
    Columns(&'a [ColumnRef]),
    Expressions(Vec<Expr>),
}

impl IndexKey<'_> {
    pub fn len(&self) -> usize {
        match self {
            IndexKey::Columns(cols) => cols.len(),
            IndexKey::Expressions(exprs) => exprs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index {
    pub fn on_columns(name: impl Into<String>, columns: Vec<ColumnRef>) -> Self {
        Self {
            name: name.into(),
            index_type: IndexType::BalancedTree,
            unique: false,
            assume_unique: false,
            columns,
            expressions_json: String::new(),
            predicate_json: String::new(),
        }
    }

    pub fn on_expressions(name: impl Into<String>, exprs: &[Expr]) -> Result<Self, CodecError> {
        let mut columns: Vec<ColumnRef> = Vec::new();
        for c in exprs.iter().flat_map(|e| e.columns()) {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
        Ok(Self {
            expressions_json: exprs_to_json(exprs)?,
            ..Self::on_columns(name, columns)
        })
    }

    pub fn with_predicate(mut self, predicate: &Expr) -> Result<Self, CodecError> {
        self.predicate_json = predicate.to_json()?;
        Ok(self)
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn is_partial(&self) -> bool {
        !self.predicate_json.is_empty()
    }

    pub fn key(&self) -> Result<IndexKey<'_>, CodecError> {
        if self.expressions_json.is_empty() {
            Ok(IndexKey::Columns(&self.columns))
        } else {
            Ok(IndexKey::Expressions(exprs_from_json(&self.expressions_json)?))
        }
    }

    pub fn predicate(&self) -> Result<Option<Expr>, CodecError> {
        if self.predicate_json.is_empty() {
            Ok(None)
        } else {
            Expr::from_json(&self.predicate_json).map(Some)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    /// Name of the index enforcing this constraint.
    pub index: Option<String>,
}

/// A source column referenced by a simple-column GROUP BY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByColumn {
    /// The source column, including its ordinal within the source table.
    pub column: ColumnRef,
    /// Position of this key in the view's grouping order.
    pub order: u32,
}

/// How a view's grouping keys are recorded. Exactly one form is ever populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Grouping {
    /// Every key is a plain source column (also used for zero keys).
    Columns(Vec<GroupByColumn>),
    /// At least one key is a computed expression; JSON array of all keys in order.
    Expressions(String),
}

impl Grouping {
    pub fn columns(&self) -> &[GroupByColumn] {
        match self {
            Grouping::Columns(cols) => cols,
            Grouping::Expressions(_) => &[],
        }
    }

    pub fn expressions_json(&self) -> Option<&str> {
        match self {
            Grouping::Columns(_) => None,
            Grouping::Expressions(json) => Some(json),
        }
    }
}

/// Maintenance metadata for one materialized view, stored on its first source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedView {
    pub name: String,
    pub source: String,
    pub dest: String,
    pub is_joined: bool,
    pub grouping: Grouping,
    /// JSON array of every aggregate argument, present only when some argument is not
    /// a bare column reference.
    pub aggregation_expressions_json: Option<String>,
    /// Hex-encoded JSON of the view's filter predicate; empty when unfiltered.
    pub predicate: String,
    /// MIN/MAX aggregate ordinal to the source index used to maintain it ("" for none).
    pub index_for_min_max: BTreeMap<u32, String>,
    pub fallback_query_stmts: Vec<CompiledStatement>,
}

impl MaterializedView {
    pub fn predicate_expr(&self) -> Result<Option<Expr>, CodecError> {
        if self.predicate.is_empty() {
            Ok(None)
        } else {
            Expr::from_hex_json(&self.predicate).map(Some)
        }
    }

    /// Whether every MIN/MAX aggregate found a supporting source index.
    pub fn min_max_fully_indexed(&self) -> bool {
        self.index_for_min_max.values().all(|name| !name.is_empty())
    }
}

/// Execution-side handler record kept on the destination table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterializedViewHandler {
    pub is_joined: bool,
    pub fallback_query_stmts: Vec<CompiledStatement>,
    /// Full recomputation query; only for views over joined tables.
    pub create_query: Option<CompiledStatement>,
}

/// A table, a stream, or a materialized view's destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub partition_column: Option<String>,
    #[serde(default = "default_replicated")]
    pub is_replicated: bool,
    /// Export-only (streamed) table.
    #[serde(default)]
    pub is_stream: bool,
    /// For a view's destination table, the source table that feeds it.
    #[serde(default)]
    pub materializer: Option<String>,
    /// Views this table is the (first) source of.
    #[serde(default)]
    pub views: Vec<MaterializedView>,
    /// Destination tables of every view this table participates in.
    #[serde(default)]
    pub affected_view_tables: Vec<String>,
    #[serde(default)]
    pub mv_handler: Option<MaterializedViewHandler>,
}

fn default_replicated() -> bool {
    true
}

impl Table {
    pub fn new(name: impl Into<String>, columns: &[(&str, ValueType)]) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, (name, value_type))| Column::new(*name, i as u32, *value_type))
            .collect();
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
            constraints: Vec::new(),
            partition_column: None,
            is_replicated: true,
            is_stream: false,
            materializer: None,
            views: Vec::new(),
            affected_view_tables: Vec::new(),
            mv_handler: None,
        }
    }

    pub fn partitioned_on(mut self, column: impl Into<String>) -> Self {
        self.partition_column = Some(column.into());
        self.is_replicated = false;
        self
    }

    pub fn stream(mut self) -> Self {
        self.is_stream = true;
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Column by name, case-insensitive.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_at(&self, index: u32) -> Option<&Column> {
        self.columns.iter().find(|c| c.index == index)
    }

    /// Reference to the named column, for building expressions over this table.
    pub fn col(&self, name: &str) -> Option<ColumnRef> {
        self.column(name).map(|c| c.to_ref(&self.name))
    }

    pub fn partition(&self) -> Option<&Column> {
        self.partition_column.as_deref().and_then(|name| self.column(name))
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&MaterializedView> {
        self.views.iter().find(|v| v.name == name)
    }
}

/// The database being compiled: all tables in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub tables: IndexMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }
}
