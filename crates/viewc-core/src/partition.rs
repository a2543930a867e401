//! # View Partitioning
//!
//! A view over a replicated table is replicated. A view over a partitioned table
//! is never replicated; whether it also gets a partition column depends on its
//! grouping keys:
//!
//! - if the source partition column is one of the grouping keys, the destination
//!   column at that key's position becomes the view's partition column, so each
//!   group lives entirely on one partition;
//! - otherwise the view has no partition column. Its rows are spread however the
//!   source rows were, and its grouping keys are only unique per partition.
//!
//! The first decision is unconditional and the second conditional.

use crate::catalog::{Column, Grouping};
use crate::error::{CompileError, Result};
use crate::expr::exprs_from_json;

/// Distribution of a view's destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partitioning {
    Replicated,
    /// Partitioned on the named destination column.
    ByColumn(String),
    /// Partitioned, with no partition column.
    Unkeyed,
}

/// Decide how a view's destination table is distributed.
///
/// `source_partition` is the source table's partition column, `None` for a
/// replicated source. `dest_columns` are the destination columns in ordinal order.
pub fn infer_partitioning(
    grouping: &Grouping,
    source_partition: Option<&Column>,
    dest_columns: &[Column],
) -> Result<Partitioning> {
    let Some(partition_column) = source_partition else {
        return Ok(Partitioning::Replicated);
    };
    let position = grouped_partition_position(grouping, partition_column)?;
    Ok(match position.and_then(|i| dest_columns.get(i)) {
        Some(dest) => Partitioning::ByColumn(dest.name.clone()),
        None => Partitioning::Unkeyed,
    })
}

/// Position among the grouping keys of the key that is the source partition column.
fn grouped_partition_position(grouping: &Grouping, partition_column: &Column) -> Result<Option<usize>> {
    match grouping {
        Grouping::Columns(group_cols) => {
            let mut ordered: Vec<_> = group_cols.iter().collect();
            ordered.sort_by_key(|g| g.order);
            Ok(ordered
                .iter()
                .position(|g| g.column.name == partition_column.name))
        }
        Grouping::Expressions(json) => {
            let exprs = exprs_from_json(json).map_err(|e| {
                CompileError::Internal(format!("cannot decode grouping expressions {json}: {e}"))
            })?;
            Ok(exprs.iter().position(|e| {
                e.as_column()
                    .is_some_and(|c| c.index == partition_column.index)
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GroupByColumn, Table};
    use crate::expr::{exprs_to_json, BinaryOp, Expr, ValueType};

    fn source() -> Table {
        Table::new("T", &[("a", ValueType::Integer), ("b", ValueType::Integer), ("c", ValueType::Integer)])
            .partitioned_on("b")
    }

    fn dest() -> Vec<Column> {
        Table::new("V", &[("va", ValueType::Integer), ("vb", ValueType::Integer), ("cnt", ValueType::BigInt)]).columns
    }

    fn group_cols(t: &Table, names: &[&str]) -> Grouping {
        Grouping::Columns(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| GroupByColumn {
                    column: t.col(n).unwrap(),
                    order: i as u32,
                })
                .collect(),
        )
    }

    #[test]
    fn test_replicated_source_stays_replicated() {
        let t = Table::new("T", &[("a", ValueType::Integer)]);
        let got = infer_partitioning(&group_cols(&t, &["a"]), t.partition(), &dest()).unwrap();
        assert_eq!(got, Partitioning::Replicated);
    }

    #[test]
    fn test_grouped_partition_column_carries_over() {
        let t = source();
        let got = infer_partitioning(&group_cols(&t, &["a", "b"]), t.partition(), &dest()).unwrap();
        assert_eq!(got, Partitioning::ByColumn("vb".into()));
    }

    #[test]
    fn test_ungrouped_partition_column_leaves_view_unkeyed() {
        let t = source();
        let got = infer_partitioning(&group_cols(&t, &["a"]), t.partition(), &dest()).unwrap();
        assert_eq!(got, Partitioning::Unkeyed);
        let none = infer_partitioning(&group_cols(&t, &[]), t.partition(), &dest()).unwrap();
        assert_eq!(none, Partitioning::Unkeyed);
    }

    #[test]
    fn test_expression_grouping_matches_bare_partition_column() {
        let t = source();
        let a = Expr::Column(t.col("a").unwrap());
        let b = Expr::Column(t.col("b").unwrap());
        let sum = Expr::binary(BinaryOp::Add, a, b.clone());
        let json = exprs_to_json(&[sum.clone(), b]).unwrap();
        let got = infer_partitioning(&Grouping::Expressions(json), t.partition(), &dest()).unwrap();
        assert_eq!(got, Partitioning::ByColumn("vb".into()));

        // The partition column only inside a computed key does not count.
        let json = exprs_to_json(&[sum]).unwrap();
        let got = infer_partitioning(&Grouping::Expressions(json), t.partition(), &dest()).unwrap();
        assert_eq!(got, Partitioning::Unkeyed);
    }

    #[test]
    fn test_undecodable_grouping_is_internal_error() {
        let t = source();
        let err = infer_partitioning(&Grouping::Expressions("[{".into()), t.partition(), &dest()).unwrap_err();
        assert!(matches!(err, CompileError::Internal(_)));
    }
}
