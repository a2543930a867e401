//! # View Metadata Builder
//!
//! Turns one `CREATE VIEW` body into everything the engine stores for it:
//!
//! - the [`MaterializedView`] record kept on the first source table;
//! - the [`MaterializedViewHandler`] kept on the destination table;
//! - the destination table's retagged columns, primary key and partitioning;
//! - any missing-index warnings.
//!
//! Building reads the database but never writes it. The result is a
//! [`CompiledView`] whose [`CompiledView::apply`] performs the catalog writes, so
//! a schema pass can compile every view before touching the catalog.
//!
//! ## Destination Layout
//!
//! Destination column `i < G` is grouping key `i`, column `G` is `COUNT(*)`, and
//! every later column is the aggregate at the same SELECT list position.

use crate::catalog::{
    AggregateKind, Column, Constraint, ConstraintType, Database, GroupByColumn, Grouping, Index, IndexType,
    MaterializedView, MaterializedViewHandler, Table,
};
use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileWarning, Result};
use crate::expr::{exprs_to_json, AggFunc, ColumnRef, Expr};
use crate::external::CompileContext;
use crate::index_match::{GroupingKeys, IndexMatcher};
use crate::partition::{infer_partitioning, Partitioning};
use crate::statement::{CompiledStatement, QueryForm, StatementPartitioning, ViewDefinition};
use crate::validate::{check_view_meets_spec, ViewLayout};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Everything compiled for one view, not yet written to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledView {
    pub view: MaterializedView,
    pub handler: MaterializedViewHandler,
    /// Replacement columns for the destination table.
    pub dest_columns: Vec<Column>,
    /// Unique index over the grouping columns; `None` for a view with no grouping keys.
    pub pk_index: Option<Index>,
    pub pk_constraint: Option<Constraint>,
    pub partitioning: Partitioning,
    /// Source tables in FROM order.
    pub sources: Vec<String>,
    pub warnings: Vec<CompileWarning>,
}

impl CompiledView {
    /// Write this view's metadata into `db`.
    pub fn apply(self, db: &mut Database) -> Result<()> {
        let CompiledView {
            view,
            handler,
            dest_columns,
            pk_index,
            pk_constraint,
            partitioning,
            sources,
            ..
        } = self;

        let dest = db
            .table_mut(&view.dest)
            .ok_or_else(|| CompileError::TableNotFound(view.dest.clone()))?;
        dest.columns = dest_columns;
        dest.indexes.extend(pk_index);
        dest.constraints.extend(pk_constraint);
        match partitioning {
            Partitioning::Replicated => {}
            Partitioning::ByColumn(column) => {
                dest.is_replicated = false;
                dest.partition_column = Some(column);
            }
            Partitioning::Unkeyed => {
                dest.is_replicated = false;
                dest.partition_column = None;
            }
        }
        dest.materializer = Some(view.source.clone());
        dest.mv_handler = Some(handler);

        for name in &sources {
            let source = db
                .table_mut(name)
                .ok_or_else(|| CompileError::TableNotFound(name.clone()))?;
            if !source.affected_view_tables.contains(&view.dest) {
                source.affected_view_tables.push(view.dest.clone());
            }
        }

        let first = db
            .table_mut(&view.source)
            .ok_or_else(|| CompileError::TableNotFound(view.source.clone()))?;
        first.views.retain(|v| v.name != view.name);
        first.views.push(view);
        Ok(())
    }
}

/// Compiles view definitions against a read-only database.
pub struct ViewMetadataBuilder<'a> {
    db: &'a Database,
    ctx: CompileContext<'a>,
    config: &'a CompilerConfig,
    /// Destination table names of every view in the current schema pass.
    view_names: &'a HashSet<String>,
}

impl<'a> ViewMetadataBuilder<'a> {
    pub fn new(
        db: &'a Database,
        ctx: CompileContext<'a>,
        config: &'a CompilerConfig,
        view_names: &'a HashSet<String>,
    ) -> Self {
        Self {
            db,
            ctx,
            config,
            view_names,
        }
    }

    /// Compile the view whose destination table is `dest_name` and whose body is `query`.
    pub fn build(&self, dest_name: &str, query: &str) -> Result<CompiledView> {
        let def = self.ctx.parser.parse(query)?;
        let layout = check_view_meets_spec(dest_name, &def, self.ctx.checker)?;

        let dest = self.table(dest_name)?;
        if dest.columns.len() != def.display_columns.len() {
            return Err(CompileError::ColumnCountMismatch {
                view: dest_name.to_string(),
                dest_columns: dest.columns.len(),
                display_columns: def.display_columns.len(),
            });
        }
        // The primary key index is generated below; users may only declare plain ones.
        if let Some(index) = dest.indexes.iter().find(|i| i.unique || i.assume_unique) {
            return Err(CompileError::IndexQualifier {
                view: dest_name.to_string(),
                index: index.name.clone(),
            });
        }

        let is_joined = def.is_joined();
        let sources = self.check_sources(dest_name, &def, is_joined)?;
        let source = sources[0];

        let predicate = match &def.filter {
            Some(filter) => filter.to_hex_json().map_err(|source| CompileError::Serialization {
                view: dest_name.to_string(),
                what: "view predicate",
                source,
            })?,
            None => String::new(),
        };

        let mut dest_columns = dest.columns.clone();
        let grouping = self.grouping(dest_name, source, &layout, &mut dest_columns)?;

        let count_star = &mut dest_columns[layout.count_star_position()];
        count_star.aggregate = AggregateKind::CountStar;
        count_star.matview_source = None;

        let (pk_index, pk_constraint) = self.primary_key(dest, layout.group_count());

        let args: Vec<Expr> = layout.aggregates.iter().map(|a| a.arg.clone()).collect();
        let aggregation_expressions_json = if args.iter().any(|a| !a.is_column()) {
            Some(exprs_to_json(&args).map_err(|source| CompileError::Serialization {
                view: dest_name.to_string(),
                what: "aggregation expressions",
                source,
            })?)
        } else {
            None
        };

        let fallback_query_stmts = self.compile_fallbacks(&def, query)?;
        let create_query = if is_joined {
            Some(self.compile(&QueryForm::from(&def), query, StatementPartitioning::Infer)?)
        } else {
            None
        };

        let mut view = MaterializedView {
            name: dest_name.to_string(),
            source: source.name.clone(),
            dest: dest_name.to_string(),
            is_joined,
            grouping,
            aggregation_expressions_json,
            predicate,
            index_for_min_max: BTreeMap::new(),
            fallback_query_stmts,
        };
        view.index_for_min_max = self.min_max_indexes(source, &view, &layout)?;

        for agg in &layout.aggregates {
            let column = &mut dest_columns[agg.position];
            column.aggregate = aggregate_kind(agg.func)?;
            column.matview_source = agg
                .arg
                .as_column()
                .and_then(|c| source.column(&c.name))
                .map(|c| c.name.clone());
            column.value_type = agg.value_type;
        }

        let partitioning = infer_partitioning(&view.grouping, source.partition(), &dest_columns)?;

        let mut warnings = Vec::new();
        let exempt = self.config.skip_warnings_for_streams && source.is_stream;
        if self.config.warn_missing_min_max_index && !exempt && !view.min_max_fully_indexed() {
            warn!(view = dest_name, "no index supports MIN/MAX maintenance");
            warnings.push(CompileWarning::MissingMaintenanceIndex {
                view: dest_name.to_string(),
            });
        }

        let handler = MaterializedViewHandler {
            is_joined,
            fallback_query_stmts: view.fallback_query_stmts.clone(),
            create_query,
        };

        debug!(
            view = dest_name,
            source = %source.name,
            groups = layout.group_count(),
            aggregates = layout.aggregates.len(),
            joined = is_joined,
            partitioning = ?partitioning,
            "compiled materialized view"
        );

        Ok(CompiledView {
            view,
            handler,
            dest_columns,
            pk_index,
            pk_constraint,
            partitioning,
            sources: sources.iter().map(|t| t.name.clone()).collect(),
            warnings,
        })
    }

    fn table(&self, name: &str) -> Result<&'a Table> {
        self.db
            .table(name)
            .ok_or_else(|| CompileError::TableNotFound(name.to_string()))
    }

    /// Resolve the source tables, rejecting views and (for joins) streams.
    fn check_sources(&self, view: &str, def: &ViewDefinition, is_joined: bool) -> Result<Vec<&'a Table>> {
        let mut sources = Vec::with_capacity(def.tables.len());
        for name in &def.tables {
            if self.view_names.contains(name) {
                return Err(CompileError::ViewOnView {
                    view: view.to_string(),
                    source_table: name.clone(),
                });
            }
            let table = self.table(name)?;
            if is_joined && table.is_stream {
                return Err(CompileError::StreamedSource {
                    view: view.to_string(),
                    source_table: name.clone(),
                });
            }
            sources.push(table);
        }
        if sources.is_empty() {
            return Err(CompileError::Internal(format!("view {view} has no source table")));
        }
        Ok(sources)
    }

    /// Record the grouping keys, tagging destination grouping columns in the simple case.
    fn grouping(
        &self,
        view: &str,
        source: &Table,
        layout: &ViewLayout<'_>,
        dest_columns: &mut [Column],
    ) -> Result<Grouping> {
        if layout.complex_group_by {
            let json = exprs_to_json(layout.group_by).map_err(|source| CompileError::Serialization {
                view: view.to_string(),
                what: "group by expressions",
                source,
            })?;
            return Ok(Grouping::Expressions(json));
        }

        let mut group_cols = Vec::with_capacity(layout.group_count());
        for (i, key) in layout.group_by.iter().enumerate() {
            let column = self.source_column(source, key)?;
            let dest = &mut dest_columns[i];
            dest.aggregate = AggregateKind::None;
            dest.matview_source = Some(column.name.clone());
            group_cols.push(GroupByColumn {
                column: column.to_ref(&source.name),
                order: i as u32,
            });
        }
        Ok(Grouping::Columns(group_cols))
    }

    /// The source-table column a simple grouping key refers to.
    fn source_column<'t>(&self, default: &'t Table, key: &Expr) -> Result<&'t Column>
    where
        'a: 't,
    {
        let reference: &ColumnRef = key
            .as_column()
            .ok_or_else(|| CompileError::Internal(format!("grouping key {key} is not a column")))?;
        let table = match reference.table.as_deref() {
            Some(name) if name != default.name => self.table(name)?,
            _ => default,
        };
        table
            .column_at(reference.index)
            .ok_or_else(|| CompileError::ColumnNotFound {
                table: table.name.clone(),
                column: reference.name.clone(),
            })
    }

    fn primary_key(&self, dest: &Table, group_count: usize) -> (Option<Index>, Option<Constraint>) {
        if group_count == 0 {
            return (None, None);
        }
        let columns = dest.columns[..group_count]
            .iter()
            .map(|c| c.to_ref(&dest.name))
            .collect();
        let index = Index {
            index_type: IndexType::BalancedTree,
            ..Index::on_columns(self.config.pk_index_name.clone(), columns).unique()
        };
        let constraint = Constraint {
            name: self.config.pk_constraint_name.clone(),
            constraint_type: ConstraintType::PrimaryKey,
            index: Some(index.name.clone()),
        };
        (Some(index), Some(constraint))
    }

    fn compile_fallbacks(&self, def: &ViewDefinition, query: &str) -> Result<Vec<CompiledStatement>> {
        let original = QueryForm::from(def);
        self.ctx
            .fallback
            .fallback_forms(&original, &def.group_by, &def.display_columns)
            .iter()
            .map(|form| self.compile(form, query, StatementPartitioning::ForceSinglePartition))
            .collect()
    }

    fn compile(
        &self,
        form: &QueryForm,
        query: &str,
        partitioning: StatementPartitioning,
    ) -> Result<CompiledStatement> {
        Ok(self
            .ctx
            .planner
            .compile(self.db, form, query, None, self.config.determinism, partitioning)?)
    }

    /// Best maintenance index for each MIN/MAX aggregate, keyed by MIN/MAX ordinal.
    fn min_max_indexes(
        &self,
        source: &Table,
        view: &MaterializedView,
        layout: &ViewLayout<'_>,
    ) -> Result<BTreeMap<u32, String>> {
        let predicate = view
            .predicate_expr()
            .map_err(|e| CompileError::Internal(format!("cannot decode predicate of view {}: {e}", view.name)))?;
        let keys = match &view.grouping {
            Grouping::Columns(cols) => GroupingKeys::Columns(cols),
            Grouping::Expressions(_) => GroupingKeys::Expressions(layout.group_by),
        };
        let matcher = IndexMatcher::new(self.ctx.coverage);

        let mut found = BTreeMap::new();
        for (ordinal, agg) in layout.min_max_aggregates().enumerate() {
            let index = matcher.find_best_index(source, keys, Some(agg.arg), predicate.as_ref())?;
            found.insert(ordinal as u32, index.map(|i| i.name.clone()).unwrap_or_default());
        }
        Ok(found)
    }
}

fn aggregate_kind(func: AggFunc) -> Result<AggregateKind> {
    match func {
        AggFunc::CountStar => Ok(AggregateKind::CountStar),
        AggFunc::Count => Ok(AggregateKind::Count),
        AggFunc::Sum => Ok(AggregateKind::Sum),
        AggFunc::Min => Ok(AggregateKind::Min),
        AggFunc::Max => Ok(AggregateKind::Max),
        AggFunc::Avg => Err(CompileError::Internal("AVG cannot be maintained".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, ScalarValue, ValueType};
    use crate::external::{
        ExpressionChecker, FallbackQueryGenerator, ParseError, PlanCompiler, PlanError, PredicateCoverage,
        StatementParser,
    };
    use crate::statement::{DeterminismMode, DisplayColumn, JoinTree};
    use crate::expr::JoinType;

    struct Fixed(ViewDefinition);

    impl StatementParser for Fixed {
        fn parse(&self, _query: &str) -> std::result::Result<ViewDefinition, ParseError> {
            Ok(self.0.clone())
        }
    }

    struct Recording;

    impl PlanCompiler for Recording {
        fn compile(
            &self,
            _db: &Database,
            form: &QueryForm,
            sql_text: &str,
            join_order: Option<&str>,
            determinism: DeterminismMode,
            partitioning: StatementPartitioning,
        ) -> std::result::Result<CompiledStatement, PlanError> {
            Ok(CompiledStatement {
                sql_text: sql_text.to_string(),
                form: form.clone(),
                join_order: join_order.map(str::to_string),
                determinism,
                partitioning,
                plan: None,
            })
        }
    }

    struct Failing;

    impl PlanCompiler for Failing {
        fn compile(
            &self,
            _db: &Database,
            _form: &QueryForm,
            _sql_text: &str,
            _join_order: Option<&str>,
            _determinism: DeterminismMode,
            _partitioning: StatementPartitioning,
        ) -> std::result::Result<CompiledStatement, PlanError> {
            Err(PlanError::new("planner exploded"))
        }
    }

    /// One form per MIN/MAX, echoing the original query shape.
    struct OnePerMinMax;

    impl FallbackQueryGenerator for OnePerMinMax {
        fn fallback_forms(
            &self,
            original: &QueryForm,
            _group_by: &[Expr],
            display_columns: &[DisplayColumn],
        ) -> Vec<QueryForm> {
            display_columns
                .iter()
                .filter(|c| c.expr.as_aggregate().is_some_and(|a| a.func.is_min_max()))
                .map(|_| original.clone())
                .collect()
        }
    }

    struct NeverCovered;

    impl PredicateCoverage for NeverCovered {
        fn is_partial_index_predicate_covered(
            &self,
            _table: &Table,
            _view_conjuncts: &[Expr],
            _index: &crate::catalog::Index,
            _index_predicate: &Expr,
            _exact_matches: &mut Vec<Expr>,
        ) -> bool {
            false
        }
    }

    struct AcceptAll;

    impl ExpressionChecker for AcceptAll {
        fn validate_for_views(&self, _exprs: &[&Expr]) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    fn source() -> Table {
        Table::new("T", &[("a", ValueType::Integer), ("b", ValueType::Integer), ("c", ValueType::Integer)])
            .partitioned_on("a")
    }

    fn dest(names: &[&str]) -> Table {
        let cols: Vec<_> = names.iter().map(|n| (*n, ValueType::Integer)).collect();
        Table::new("V", &cols)
    }

    fn col(t: &Table, name: &str) -> Expr {
        Expr::Column(t.col(name).unwrap())
    }

    /// SELECT a, COUNT(*), MIN(c), SUM(b + c) FROM T GROUP BY a
    fn definition(t: &Table) -> ViewDefinition {
        let a = col(t, "a");
        let b_plus_c = Expr::binary(BinaryOp::Add, col(t, "b"), col(t, "c"));
        ViewDefinition::new(
            "T",
            vec![a.clone()],
            vec![
                DisplayColumn::new("a", a),
                DisplayColumn::new("cnt", Expr::count_star()),
                DisplayColumn::new("min_c", Expr::aggregate(AggFunc::Min, Some(col(t, "c")))),
                DisplayColumn::new("sum_bc", Expr::aggregate(AggFunc::Sum, Some(b_plus_c))),
            ],
        )
    }

    fn build_with(db: &Database, def: ViewDefinition, planner: &dyn PlanCompiler) -> Result<CompiledView> {
        let parser = Fixed(def);
        let ctx = CompileContext {
            parser: &parser,
            planner,
            fallback: &OnePerMinMax,
            coverage: &NeverCovered,
            checker: &AcceptAll,
        };
        let config = CompilerConfig::default();
        let names: HashSet<String> = ["V".to_string()].into_iter().collect();
        ViewMetadataBuilder::new(db, ctx, &config, &names).build("V", "SELECT ...")
    }

    fn database(src: Table, dst: Table) -> Database {
        let mut db = Database::new();
        db.add_table(src);
        db.add_table(dst);
        db
    }

    #[test]
    fn test_destination_layout() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let compiled = build_with(&db, definition(&t), &Recording).unwrap();

        let tags: Vec<_> = compiled.dest_columns.iter().map(|c| c.aggregate).collect();
        assert_eq!(
            tags,
            vec![AggregateKind::None, AggregateKind::CountStar, AggregateKind::Min, AggregateKind::Sum]
        );
        let sources: Vec<_> = compiled.dest_columns.iter().map(|c| c.matview_source.as_deref()).collect();
        assert_eq!(sources, vec![Some("a"), None, Some("c"), None]);
        assert_eq!(compiled.dest_columns[3].value_type, ValueType::BigInt);

        assert_eq!(compiled.view.grouping.columns().len(), 1);
        assert!(compiled.view.aggregation_expressions_json.is_some());
        assert_eq!(compiled.view.predicate, "");
        assert_eq!(compiled.partitioning, Partitioning::ByColumn("a".into()));
    }

    #[test]
    fn test_primary_key_over_grouping_columns() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let compiled = build_with(&db, definition(&t), &Recording).unwrap();
        let pk = compiled.pk_index.unwrap();
        assert!(pk.unique);
        assert_eq!(pk.name, "MATVIEW_PK_INDEX");
        assert_eq!(pk.columns.len(), 1);
        let constraint = compiled.pk_constraint.unwrap();
        assert_eq!(constraint.constraint_type, ConstraintType::PrimaryKey);
        assert_eq!(constraint.index.as_deref(), Some("MATVIEW_PK_INDEX"));
    }

    #[test]
    fn test_missing_index_warning_and_mapping() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let compiled = build_with(&db, definition(&t), &Recording).unwrap();
        assert_eq!(compiled.view.index_for_min_max.get(&0).map(String::as_str), Some(""));
        assert_eq!(
            compiled.warnings,
            vec![CompileWarning::MissingMaintenanceIndex { view: "V".into() }]
        );
    }

    #[test]
    fn test_fallbacks_attached_to_view_and_handler() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let compiled = build_with(&db, definition(&t), &Recording).unwrap();
        assert_eq!(compiled.view.fallback_query_stmts.len(), 1);
        let stmt = &compiled.view.fallback_query_stmts[0];
        assert_eq!(stmt.partitioning, StatementPartitioning::ForceSinglePartition);
        assert_eq!(stmt.sql_text, "SELECT ...");
        assert_eq!(stmt.join_order, None);
        assert_eq!(compiled.handler.fallback_query_stmts, compiled.view.fallback_query_stmts);
        assert!(compiled.handler.create_query.is_none());
        assert!(!compiled.handler.is_joined);
    }

    #[test]
    fn test_filter_is_hex_encoded() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let filter = Expr::binary(BinaryOp::Gt, col(&t, "b"), Expr::Literal(ScalarValue::Int64(3)));
        let compiled = build_with(&db, definition(&t).with_filter(filter.clone()), &Recording).unwrap();
        assert_eq!(compiled.view.predicate_expr().unwrap(), Some(filter));
    }

    #[test]
    fn test_column_count_mismatch() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt"]));
        let err = build_with(&db, definition(&t), &Recording).unwrap_err();
        assert!(matches!(err, CompileError::ColumnCountMismatch { dest_columns: 2, display_columns: 4, .. }));
    }

    #[test]
    fn test_unique_index_on_destination_rejected() {
        let t = source();
        let d = dest(&["a", "cnt", "min_c", "sum_bc"]);
        let d = d.clone().with_index(Index::on_columns("V_UNIQ", vec![d.col("a").unwrap()]).unique());
        let db = database(t.clone(), d);
        let err = build_with(&db, definition(&t), &Recording).unwrap_err();
        assert!(matches!(err, CompileError::IndexQualifier { ref index, .. } if index == "V_UNIQ"));
    }

    #[test]
    fn test_planner_failure_propagates() {
        let t = source();
        let db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let err = build_with(&db, definition(&t), &Failing).unwrap_err();
        assert!(matches!(err, CompileError::Plan(_)));
        assert_eq!(err.to_string(), "planner exploded");
    }

    #[test]
    fn test_joined_view_gets_create_query() {
        let t = source();
        let u = Table::new("U", &[("k", ValueType::Integer)]);
        let a = col(&t, "a");
        let mut def = ViewDefinition::new(
            "T",
            vec![a.clone()],
            vec![DisplayColumn::new("a", a.clone()), DisplayColumn::new("cnt", Expr::count_star())],
        );
        def.tables.push("U".into());
        def.join_tree = Some(JoinTree::join(
            JoinType::Inner,
            JoinTree::Table("T".into()),
            JoinTree::Table("U".into()),
            Some(Expr::equals(a, col(&u, "k"))),
        ));
        let mut db = database(t, dest(&["a", "cnt"]));
        db.add_table(u);

        let compiled = build_with(&db, def, &Recording).unwrap();
        assert!(compiled.view.is_joined);
        let create = compiled.handler.create_query.as_ref().unwrap();
        assert_eq!(create.partitioning, StatementPartitioning::Infer);
        assert_eq!(compiled.sources, vec!["T".to_string(), "U".to_string()]);
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn test_apply_writes_catalog() {
        let t = source();
        let mut db = database(t.clone(), dest(&["a", "cnt", "min_c", "sum_bc"]));
        let compiled = build_with(&db, definition(&t), &Recording).unwrap();
        compiled.apply(&mut db).unwrap();

        let v = db.table("V").unwrap();
        assert_eq!(v.materializer.as_deref(), Some("T"));
        assert_eq!(v.partition_column.as_deref(), Some("a"));
        assert!(!v.is_replicated);
        assert!(v.mv_handler.is_some());
        assert_eq!(v.indexes.len(), 1);

        let t = db.table("T").unwrap();
        assert_eq!(t.affected_view_tables, vec!["V".to_string()]);
        assert!(t.view("V").is_some());
    }
}
