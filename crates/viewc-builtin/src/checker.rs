//! # Expression Checker
//!
//! Rejects expressions a materialized view cannot maintain: nested aggregate calls,
//! statement parameters, and functions whose result changes between evaluations
//! of the same row.

use viewc_core::expr::Expr;
use viewc_core::external::ExpressionChecker;

/// Functions whose value is not a function of the row alone.
const NON_DETERMINISTIC: &[&str] = &["NOW", "CURRENT_TIMESTAMP", "CURRENT_DATE", "RAND", "RANDOM", "UUID"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpressionChecker;

impl ExpressionChecker for DefaultExpressionChecker {
    fn validate_for_views(&self, exprs: &[&Expr]) -> Result<(), String> {
        for expr in exprs {
            if expr.contains_aggregate() {
                return Err("with aggregate expression(s) is not supported.".to_string());
            }
            if expr.any(|e| matches!(e, Expr::Parameter { .. })) {
                return Err("with parameter(s) is not supported.".to_string());
            }
            let mut volatile = None;
            expr.walk(&mut |e| {
                if let Expr::Function { name, .. } = e {
                    if volatile.is_none() && is_non_deterministic(name) {
                        volatile = Some(name.to_ascii_uppercase());
                    }
                }
            });
            if let Some(name) = volatile {
                return Err(format!("with non-deterministic function {name} is not supported."));
            }
        }
        Ok(())
    }
}

fn is_non_deterministic(name: &str) -> bool {
    NON_DETERMINISTIC.iter().any(|f| f.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewc_core::expr::{AggFunc, BinaryOp, ColumnRef, ScalarValue, ValueType};

    fn a() -> Expr {
        Expr::Column(ColumnRef::new("T", "a", 0, ValueType::Integer))
    }

    #[test]
    fn test_plain_expressions_pass() {
        let filter = Expr::binary(BinaryOp::Gt, a(), Expr::Literal(ScalarValue::Int64(1)));
        let upper = Expr::Function {
            name: "abs".into(),
            args: vec![a()],
            value_type: ValueType::Integer,
        };
        assert_eq!(DefaultExpressionChecker.validate_for_views(&[&filter, &upper]), Ok(()));
    }

    #[test]
    fn test_aggregate_rejected() {
        let agg = Expr::aggregate(AggFunc::Sum, Some(a()));
        let msg = DefaultExpressionChecker.validate_for_views(&[&agg]).unwrap_err();
        assert_eq!(msg, "with aggregate expression(s) is not supported.");
    }

    #[test]
    fn test_parameter_rejected() {
        let param = Expr::binary(
            BinaryOp::Eq,
            a(),
            Expr::Parameter {
                index: 0,
                value_type: ValueType::Integer,
            },
        );
        assert!(DefaultExpressionChecker.validate_for_views(&[&param]).is_err());
    }

    #[test]
    fn test_non_deterministic_function_rejected() {
        let now = Expr::Function {
            name: "now".into(),
            args: vec![],
            value_type: ValueType::Timestamp,
        };
        let cmp = Expr::binary(BinaryOp::Lt, a(), now);
        let msg = DefaultExpressionChecker.validate_for_views(&[&cmp]).unwrap_err();
        assert_eq!(msg, "with non-deterministic function NOW is not supported.");
    }
}
