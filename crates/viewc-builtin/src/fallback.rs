//! # MIN/MAX Fallback Queries
//!
//! Deleting the row that holds a group's current MIN (or MAX) leaves the view
//! without the new extremum. The engine recomputes it with a query over the source
//! restricted to that group and to values no better than the deleted one:
//!
//! ```text
//! SELECT MIN(x) FROM t WHERE <view filter> AND g0 = ?0 AND .. AND gN = ?N AND x >= ?G
//! ```
//!
//! MAX uses `x <= ?G`. One form is produced per MIN/MAX column, in SELECT order.

use viewc_core::expr::{AggFunc, BinaryOp, Expr};
use viewc_core::external::FallbackQueryGenerator;
use viewc_core::statement::{DisplayColumn, QueryForm};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxFallbackGenerator;

impl FallbackQueryGenerator for MinMaxFallbackGenerator {
    fn fallback_forms(
        &self,
        original: &QueryForm,
        group_by: &[Expr],
        display_columns: &[DisplayColumn],
    ) -> Vec<QueryForm> {
        let group_count = group_by.len() as u32;
        let mut forms = Vec::new();
        for column in display_columns.iter().skip(group_by.len() + 1) {
            let Some(agg) = column.expr.as_aggregate() else {
                continue;
            };
            let Some(arg) = agg.arg().filter(|_| agg.func.is_min_max()) else {
                continue;
            };

            let mut predicates: Vec<Expr> = original
                .filter
                .iter()
                .flat_map(|f| f.conjuncts())
                .cloned()
                .collect();
            for (i, key) in group_by.iter().enumerate() {
                let param = Expr::Parameter {
                    index: i as u32,
                    value_type: key.value_type(),
                };
                predicates.push(Expr::equals(key.clone(), param));
            }
            let bound = if agg.func == AggFunc::Min {
                BinaryOp::GtEq
            } else {
                BinaryOp::LtEq
            };
            let param = Expr::Parameter {
                index: group_count,
                value_type: arg.value_type(),
            };
            predicates.push(Expr::binary(bound, arg.clone(), param));

            trace!(column = %column.alias, "fallback query for {}", column.expr);
            forms.push(QueryForm {
                select: vec![column.clone()],
                tables: original.tables.clone(),
                join_tree: original.join_tree.clone(),
                filter: Expr::conjunction(predicates),
                group_by: Vec::new(),
            });
        }
        forms
    }
}
