//! # Maintenance Index Selection
//!
//! When a row holding the current MIN or MAX of a group is updated or deleted,
//! the engine must find the new extremum. An index on the source table whose
//! leading keys are the view's grouping keys narrows that search to one group; if
//! its next key is the aggregate's argument the new extremum is a single seek.
//!
//! ## Matching Cases
//!
//! Grouping keys and index keys each come in two shapes (plain columns or
//! expressions), giving three comparable pairings:
//!
//! | grouping    | index       | keys compared by                       |
//! |-------------|-------------|----------------------------------------|
//! | columns     | columns     | source column ordinal                  |
//! | columns     | expressions | each indexed expression is that column |
//! | expressions | expressions | structural equality                    |
//!
//! Expression grouping against a plain-column index never matches.
//!
//! ## Selection
//!
//! With `G` grouping keys, an index is a candidate only if it has between `G` and
//! `G + 1` keys (exactly `G` when there is no aggregate argument). A `G`-key
//! match is sub-optimal; a `G + 1`-key match whose trailing key is the argument
//! is optimal. A `G + 1`-key index whose trailing key is anything else is
//! rejected. Partial indexes must also have their predicate covered by the
//! view's filter.
//!
//! Indexes are scanned in catalog order. The first optimal match is returned at
//! once; otherwise the last sub-optimal match seen is returned.

use crate::catalog::{GroupByColumn, Index, IndexKey, Table};
use crate::error::{CompileError, Result};
use crate::expr::{ColumnRef, Expr};
use crate::external::PredicateCoverage;
use tracing::trace;

/// A view's grouping keys in the shape the matcher compares.
#[derive(Debug, Clone, Copy)]
pub enum GroupingKeys<'a> {
    /// Plain source columns, in grouping order.
    Columns(&'a [GroupByColumn]),
    /// Grouping expressions, in grouping order.
    Expressions(&'a [Expr]),
}

impl GroupingKeys<'_> {
    pub fn len(&self) -> usize {
        match self {
            GroupingKeys::Columns(cols) => cols.len(),
            GroupingKeys::Expressions(exprs) => exprs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One grouping/index pairing with the data needed to compare it.
enum MatchCase<'g, 'i> {
    ColumnsByColumns {
        groups: &'g [GroupByColumn],
        keys: &'i [ColumnRef],
    },
    ColumnsByExpressions {
        groups: &'g [GroupByColumn],
        keys: &'i [Expr],
    },
    ExpressionsByExpressions {
        groups: &'g [Expr],
        keys: &'i [Expr],
    },
}

impl<'g, 'i> MatchCase<'g, 'i> {
    fn of(grouping: GroupingKeys<'g>, key: &'i IndexKey<'_>) -> Option<Self> {
        match (grouping, key) {
            (GroupingKeys::Columns(groups), IndexKey::Columns(keys)) => {
                Some(MatchCase::ColumnsByColumns { groups, keys })
            }
            (GroupingKeys::Columns(groups), IndexKey::Expressions(keys)) => {
                Some(MatchCase::ColumnsByExpressions { groups, keys })
            }
            (GroupingKeys::Expressions(groups), IndexKey::Expressions(keys)) => {
                Some(MatchCase::ExpressionsByExpressions { groups, keys })
            }
            (GroupingKeys::Expressions(_), IndexKey::Columns(_)) => None,
        }
    }

    fn key_count(&self) -> usize {
        match self {
            MatchCase::ColumnsByColumns { keys, .. } => keys.len(),
            MatchCase::ColumnsByExpressions { keys, .. } | MatchCase::ExpressionsByExpressions { keys, .. } => {
                keys.len()
            }
        }
    }

    /// Whether the leading index keys are the grouping keys, position by position.
    fn covers_grouping(&self) -> bool {
        match self {
            MatchCase::ColumnsByColumns { groups, keys } => groups
                .iter()
                .zip(keys.iter())
                .all(|(g, k)| g.column.index == k.index),
            MatchCase::ColumnsByExpressions { groups, keys } => groups
                .iter()
                .zip(keys.iter())
                .all(|(g, k)| k.as_column().is_some_and(|c| c.index == g.column.index)),
            MatchCase::ExpressionsByExpressions { groups, keys } => {
                groups.iter().zip(keys.iter()).all(|(g, k)| g == k)
            }
        }
    }

    /// Whether the trailing index key is the MIN/MAX argument.
    fn trailing_key_is(&self, arg: &Expr) -> bool {
        match self {
            MatchCase::ColumnsByColumns { keys, .. } => match (arg.as_column(), keys.last()) {
                (Some(arg_col), Some(last)) => arg_col.index == last.index,
                _ => false,
            },
            MatchCase::ColumnsByExpressions { keys, .. } | MatchCase::ExpressionsByExpressions { keys, .. } => {
                keys.last() == Some(arg)
            }
        }
    }
}

/// How well an index supports a view's maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    /// Covers the grouping keys only.
    SubOptimal,
    /// Covers the grouping keys followed by the aggregate argument.
    Optimal,
}

/// Picks the source index that best supports MIN/MAX maintenance.
pub struct IndexMatcher<'a> {
    coverage: &'a dyn PredicateCoverage,
}

impl<'a> IndexMatcher<'a> {
    pub fn new(coverage: &'a dyn PredicateCoverage) -> Self {
        Self { coverage }
    }

    /// Best index on `source` for the given grouping and MIN/MAX argument.
    ///
    /// `view_predicate` is the view's filter, used to qualify partial indexes.
    /// `Ok(None)` means no index qualifies; an error means catalog expression text
    /// failed to decode.
    pub fn find_best_index<'t>(
        &self,
        source: &'t Table,
        grouping: GroupingKeys<'_>,
        min_max_arg: Option<&Expr>,
        view_predicate: Option<&Expr>,
    ) -> Result<Option<&'t Index>> {
        let view_conjuncts: Vec<Expr> = view_predicate
            .map(|p| p.conjuncts().into_iter().cloned().collect())
            .unwrap_or_default();

        let mut candidate = None;
        for index in &source.indexes {
            match self.fit(source, index, grouping, min_max_arg, &view_conjuncts)? {
                Some(Fit::Optimal) => {
                    trace!(table = %source.name, index = %index.name, "optimal maintenance index");
                    return Ok(Some(index));
                }
                Some(Fit::SubOptimal) => {
                    trace!(table = %source.name, index = %index.name, "sub-optimal maintenance index");
                    candidate = Some(index);
                }
                None => {}
            }
        }
        Ok(candidate)
    }

    fn fit(
        &self,
        source: &Table,
        index: &Index,
        grouping: GroupingKeys<'_>,
        min_max_arg: Option<&Expr>,
        view_conjuncts: &[Expr],
    ) -> Result<Option<Fit>> {
        let key = index.key().map_err(|e| {
            CompileError::Internal(format!("cannot decode expressions of index {}: {e}", index.name))
        })?;
        let Some(case) = MatchCase::of(grouping, &key) else {
            trace!(index = %index.name, "rejected: expression grouping needs an expression index");
            return Ok(None);
        };

        let group_count = grouping.len();
        let allowance = usize::from(min_max_arg.is_some());
        let key_count = case.key_count();
        if key_count < group_count || key_count > group_count + allowance {
            trace!(index = %index.name, key_count, group_count, "rejected: key count");
            return Ok(None);
        }
        if !case.covers_grouping() {
            trace!(index = %index.name, "rejected: leading keys differ from grouping");
            return Ok(None);
        }

        let fit = match min_max_arg {
            Some(arg) if key_count == group_count + 1 => {
                if !case.trailing_key_is(arg) {
                    trace!(index = %index.name, "rejected: trailing key is not the aggregate argument");
                    return Ok(None);
                }
                Fit::Optimal
            }
            _ => Fit::SubOptimal,
        };

        let predicate = index.predicate().map_err(|e| {
            CompileError::Internal(format!("cannot decode predicate of index {}: {e}", index.name))
        })?;
        if let Some(predicate) = predicate {
            let mut exact_matches = Vec::new();
            if !self
                .coverage
                .is_partial_index_predicate_covered(source, view_conjuncts, index, &predicate, &mut exact_matches)
            {
                trace!(index = %index.name, "rejected: partial index predicate not covered");
                return Ok(None);
            }
        }
        Ok(Some(fit))
    }
}
