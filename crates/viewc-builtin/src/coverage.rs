//! # Partial Index Coverage
//!
//! A partial index only holds rows satisfying its predicate, so a view may use it
//! for maintenance only if every row the view reads also satisfies that predicate.
//! [`ConjunctCoverage`] proves this syntactically: each conjunct of the index
//! predicate must appear verbatim among the conjuncts of the view filter.

use viewc_core::catalog::{Index, Table};
use viewc_core::expr::Expr;
use viewc_core::external::PredicateCoverage;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConjunctCoverage;

impl PredicateCoverage for ConjunctCoverage {
    fn is_partial_index_predicate_covered(
        &self,
        table: &Table,
        view_conjuncts: &[Expr],
        index: &Index,
        index_predicate: &Expr,
        exact_matches: &mut Vec<Expr>,
    ) -> bool {
        for term in index_predicate.conjuncts() {
            match view_conjuncts.iter().find(|c| *c == term) {
                Some(matched) => exact_matches.push(matched.clone()),
                None => {
                    trace!(table = %table.name, index = %index.name, term = %term, "predicate term not implied");
                    return false;
                }
            }
        }
        true
    }
}
