//! # View Definition Validation
//!
//! Incremental maintenance only works for a narrow query shape:
//!
//! ```text
//! SELECT g0, .., gN, COUNT(*), agg(x), ..  FROM t [JOIN ...] [WHERE p] GROUP BY g0, .., gN
//! ```
//!
//! with `agg` one of COUNT, SUM, MIN, MAX. [`check_view_meets_spec`] walks the
//! rules in a fixed order and fails on the first one broken; it never accumulates.
//! On success it returns a [`ViewLayout`] classifying every SELECT list entry.

use crate::error::{CompileError, Result, ViewSpecViolation};
use crate::expr::{AggFunc, Expr, ValueType};
use crate::external::ExpressionChecker;
use crate::statement::ViewDefinition;
use std::collections::HashSet;
use tracing::trace;

/// An aggregate column of a validated view.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateColumn<'a> {
    /// Position in the SELECT list (and in the destination table).
    pub position: usize,
    pub func: AggFunc,
    pub arg: &'a Expr,
    /// Type of the aggregate's result; the destination column takes this type.
    pub value_type: ValueType,
}

/// Column layout of a view that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewLayout<'a> {
    pub group_by: &'a [Expr],
    /// Some grouping key is not a bare column reference.
    pub complex_group_by: bool,
    /// Aggregates after the COUNT(*) column, in SELECT list order.
    pub aggregates: Vec<AggregateColumn<'a>>,
}

impl<'a> ViewLayout<'a> {
    pub fn group_count(&self) -> usize {
        self.group_by.len()
    }

    /// Position of the mandatory COUNT(*) column.
    pub fn count_star_position(&self) -> usize {
        self.group_by.len()
    }

    pub fn min_max_aggregates<'s>(&'s self) -> impl Iterator<Item = &'s AggregateColumn<'a>> + 's {
        self.aggregates.iter().filter(|a| a.func.is_min_max())
    }
}

/// Verify that `def` is a view the engine can maintain incrementally.
pub fn check_view_meets_spec<'a>(
    view_name: &str,
    def: &'a ViewDefinition,
    checker: &dyn ExpressionChecker,
) -> Result<ViewLayout<'a>> {
    let fail = |violation| Err(CompileError::structural(view_name, violation));
    let group_count = def.group_by.len();
    let display = &def.display_columns;
    let mut checked: Vec<&Expr> = Vec::new();

    // The SELECT list starts with the GROUP BY keys, in the same order.
    for (i, group_expr) in def.group_by.iter().enumerate() {
        let Some(out) = display.get(i) else {
            return fail(ViewSpecViolation::GroupByMismatch(i));
        };
        if out.expr != *group_expr {
            return fail(ViewSpecViolation::GroupByMismatch(i));
        }
        if let Err(msg) = out.expr.unique_indexable() {
            return fail(ViewSpecViolation::GroupByNotUniqueIndexable(msg));
        }
        checked.push(&out.expr);
    }

    let count_star = display
        .get(group_count)
        .and_then(|c| c.expr.as_aggregate())
        .is_some_and(|agg| agg.func == AggFunc::CountStar && agg.arg.is_none());
    if !count_star {
        return fail(ViewSpecViolation::MissingCountStar);
    }

    let mut aggregates = Vec::new();
    for (position, out) in display.iter().enumerate().skip(group_count + 1) {
        let Some(agg) = out.expr.as_aggregate() else {
            return fail(ViewSpecViolation::UnsupportedAggregate);
        };
        let arg = match (agg.func, agg.arg()) {
            (AggFunc::Count | AggFunc::Sum | AggFunc::Min | AggFunc::Max, Some(arg)) => arg,
            _ => return fail(ViewSpecViolation::UnsupportedAggregate),
        };
        if arg.contains_aggregate() {
            return fail(ViewSpecViolation::NestedAggregate);
        }
        // The argument is checked, not the aggregate call wrapping it.
        checked.push(arg);
        aggregates.push(AggregateColumn {
            position,
            func: agg.func,
            arg,
            value_type: agg.value_type(),
        });
    }

    if let Some(filter) = &def.filter {
        checked.push(filter);
    }
    if let Err(msg) = checker.validate_for_views(&checked) {
        return fail(ViewSpecViolation::InvalidExpression(msg));
    }

    if def.has_subquery {
        return fail(ViewSpecViolation::Subquery);
    }
    if def.join_tree.as_ref().is_some_and(|t| !t.all_inner_joins()) {
        return fail(ViewSpecViolation::NonInnerJoin);
    }
    if def.has_order_by {
        return fail(ViewSpecViolation::OrderBy);
    }
    if def.has_limit_or_offset {
        return fail(ViewSpecViolation::LimitOrOffset);
    }
    if def.having.is_some() {
        return fail(ViewSpecViolation::Having);
    }
    if display.len() <= group_count {
        return fail(ViewSpecViolation::TooFewColumns);
    }

    let mut seen = HashSet::new();
    for table in &def.tables {
        if !seen.insert(table.as_str()) {
            return fail(ViewSpecViolation::SelfJoin(table.clone()));
        }
    }

    trace!(
        view = view_name,
        groups = group_count,
        aggregates = aggregates.len(),
        "view definition accepted"
    );
    Ok(ViewLayout {
        group_by: &def.group_by,
        complex_group_by: def.has_complex_group_by(),
        aggregates,
    })
}
