//! # Deferred Plan Compiler
//!
//! Resolves a statement's tables and records it without planning. The engine plans
//! stored statements when it loads the catalog.

use viewc_core::catalog::Database;
use viewc_core::external::{PlanCompiler, PlanError};
use viewc_core::statement::{CompiledStatement, DeterminismMode, QueryForm, StatementPartitioning};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredPlanCompiler;

impl PlanCompiler for DeferredPlanCompiler {
    fn compile(
        &self,
        db: &Database,
        form: &QueryForm,
        sql_text: &str,
        join_order: Option<&str>,
        determinism: DeterminismMode,
        partitioning: StatementPartitioning,
    ) -> Result<CompiledStatement, PlanError> {
        if let Some(missing) = form.tables.iter().find(|t| db.table(t).is_none()) {
            return Err(PlanError::new(format!("object not found: {missing}")));
        }
        if let Some(order) = join_order {
            for name in order.split(',').map(str::trim) {
                if !form.tables.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                    return Err(PlanError::new(format!(
                        "The specified join order \"{order}\" contains {name} which is not in the statement"
                    )));
                }
            }
        }
        trace!(tables = ?form.tables, ?partitioning, "deferred statement");
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

#[cfg(test)]
mod tests {
    use super::*;
    use viewc_core::catalog::Table;
    use viewc_core::expr::ValueType;

    fn form(tables: &[&str]) -> QueryForm {
        QueryForm {
            select: vec![],
            tables: tables.iter().map(|t| t.to_string()).collect(),
            join_tree: None,
            filter: None,
            group_by: vec![],
        }
    }

    fn db() -> Database {
        let mut db = Database::new();
        db.add_table(Table::new("T", &[("a", ValueType::Integer)]));
        db.add_table(Table::new("U", &[("a", ValueType::Integer)]));
        db
    }

    #[test]
    fn test_records_statement() {
        let stmt = DeferredPlanCompiler
            .compile(
                &db(),
                &form(&["T"]),
                "SELECT 1",
                None,
                DeterminismMode::Faster,
                StatementPartitioning::ForceSinglePartition,
            )
            .unwrap();
        assert_eq!(stmt.sql_text, "SELECT 1");
        assert_eq!(stmt.partitioning, StatementPartitioning::ForceSinglePartition);
        assert!(stmt.plan.is_none());
    }

    #[test]
    fn test_unknown_table() {
        let err = DeferredPlanCompiler
            .compile(
                &db(),
                &form(&["T", "X"]),
                "q",
                None,
                DeterminismMode::Faster,
                StatementPartitioning::Infer,
            )
            .unwrap_err();
        assert_eq!(err.message, "object not found: X");
    }

    #[test]
    fn test_join_order_must_name_statement_tables() {
        let ok = DeferredPlanCompiler.compile(
            &db(),
            &form(&["T", "U"]),
            "q",
            Some("U, T"),
            DeterminismMode::Safer,
            StatementPartitioning::Infer,
        );
        assert_eq!(ok.unwrap().join_order.as_deref(), Some("U, T"));
        let bad = DeferredPlanCompiler.compile(
            &db(),
            &form(&["T"]),
            "q",
            Some("T,U"),
            DeterminismMode::Safer,
            StatementPartitioning::Infer,
        );
        assert!(bad.is_err());
    }
}
