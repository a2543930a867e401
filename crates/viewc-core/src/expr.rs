//! # Expression Model
//!
//! Typed scalar expression trees used by view definitions, index definitions and
//! the metadata recorded for a compiled materialized view.
//!
//! ## Structural Equality
//!
//! `Expr` derives `PartialEq`/`Eq`/`Hash`, so two expressions are equal exactly when
//! their trees are identical: same operators, same column references (table, name,
//! ordinal and type), same literals. The view validator relies on this to check that
//! the SELECT list mirrors the GROUP BY list, and the index matcher relies on it to
//! compare indexed expressions against grouping keys and MIN/MAX arguments.
//!
//! ## Canonical Text Form
//!
//! The catalog stores expressions as JSON produced by `serde_json` (single
//! expressions and JSON arrays of expressions). View filter predicates are stored as
//! the hex encoding of that JSON text. Decoding either form reproduces a structurally
//! equal tree.
//!
//! ## Classification
//!
//! - [`Expr::as_column`]: is this a bare reference to a source column, and which one.
//! - [`Expr::unique_indexable`]: can this expression's value be a unique index key.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// SQL value types known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Decimal,
    Timestamp,
    Varchar,
    Varbinary,
    GeographyPoint,
    Geography,
}

impl ValueType {
    /// Upper-case SQL name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Null => "NULL",
            ValueType::Boolean => "BOOLEAN",
            ValueType::TinyInt => "TINYINT",
            ValueType::SmallInt => "SMALLINT",
            ValueType::Integer => "INTEGER",
            ValueType::BigInt => "BIGINT",
            ValueType::Float => "FLOAT",
            ValueType::Decimal => "DECIMAL",
            ValueType::Timestamp => "TIMESTAMP",
            ValueType::Varchar => "VARCHAR",
            ValueType::Varbinary => "VARBINARY",
            ValueType::GeographyPoint => "GEOGRAPHY_POINT",
            ValueType::Geography => "GEOGRAPHY",
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ValueType::TinyInt | ValueType::SmallInt | ValueType::Integer | ValueType::BigInt
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, ValueType::Float | ValueType::Decimal)
    }

    /// Whether values of this type can be stored in any index.
    pub fn is_indexable(&self) -> bool {
        !matches!(self, ValueType::Null | ValueType::Boolean)
    }

    /// Whether values of this type can form a unique index key.
    ///
    /// Geography values are indexed through covering cells, which never identify a
    /// single value, so they cannot back a uniqueness guarantee.
    pub fn is_unique_indexable(&self) -> bool {
        self.is_indexable() && *self != ValueType::Geography
    }

    /// Result type of an arithmetic operation on two operands.
    fn promote(left: ValueType, right: ValueType) -> ValueType {
        match (left, right) {
            (ValueType::Float, _) | (_, ValueType::Float) => ValueType::Float,
            (ValueType::Decimal, _) | (_, ValueType::Decimal) => ValueType::Decimal,
            (l, r) if l.is_integral() && r.is_integral() => ValueType::BigInt,
            (ValueType::Null, other) => other,
            (other, _) => other,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference to a table column.
///
/// `index` is the column's ordinal within its owning table; the index matcher
/// identifies source columns by this ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub index: u32,
    pub value_type: ValueType,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>, index: u32, value_type: ValueType) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
            index,
            value_type,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref t) = self.table {
            write!(f, "{}.{}", t, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Scalar value for expressions.
///
/// Uses `OrderedFloat` for `f64` so that floating-point literals can take part in
/// structural `Eq`/`Hash` comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    /// SQL NULL value.
    Null,
    /// Boolean true/false.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point, wrapped in OrderedFloat for Eq/Hash support.
    Float64(OrderedFloat<f64>),
    /// UTF-8 string.
    Utf8(String),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
}

impl ScalarValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            ScalarValue::Null => ValueType::Null,
            ScalarValue::Bool(_) => ValueType::Boolean,
            ScalarValue::Int64(_) => ValueType::BigInt,
            ScalarValue::Float64(_) => ValueType::Float,
            ScalarValue::Utf8(_) => ValueType::Varchar,
            ScalarValue::Timestamp(_) => ValueType::Timestamp,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => v.hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Timestamp(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{}", v.0),
            ScalarValue::Utf8(s) => write!(f, "'{}'", s.replace('\'', "''")),
            ScalarValue::Timestamp(v) => write!(f, "TIMESTAMP {v}"),
        }
    }
}

/// Scalar expression tree.
///
/// Appears as GROUP BY keys, SELECT list entries, filter predicates, indexed
/// expressions and partial-index predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a column by name and ordinal index.
    Column(ColumnRef),
    /// Constant literal value.
    Literal(ScalarValue),
    /// Positional statement parameter (`?`), as used by fallback queries.
    Parameter { index: u32, value_type: ValueType },
    /// Binary operation (e.g., `a + b`, `x = y`, `price > 100`).
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation (e.g., `NOT flag`, `-value`, `IS NULL`).
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// Named scalar function call with its resolved result type.
    Function {
        name: String,
        args: Vec<Expr>,
        value_type: ValueType,
    },
    /// Aggregate call. Only legal at the top of a SELECT list entry.
    Aggregate(AggExpr),
    /// Conjunction (AND) of predicates, stored flat.
    And(Vec<Expr>),
    /// Disjunction (OR) of predicates.
    Or(Vec<Expr>),
}

impl Expr {
    pub fn column(column: ColumnRef) -> Self {
        Expr::Column(column)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn aggregate(func: AggFunc, arg: Option<Expr>) -> Self {
        Expr::Aggregate(AggExpr {
            func,
            arg: arg.map(Box::new),
            distinct: false,
        })
    }

    pub fn count_star() -> Self {
        Self::aggregate(AggFunc::CountStar, None)
    }

    /// The referenced column if this expression is a bare column reference.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_column(&self) -> bool {
        self.as_column().is_some()
    }

    pub fn as_aggregate(&self) -> Option<&AggExpr> {
        match self {
            Expr::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    /// Result type of evaluating this expression.
    pub fn value_type(&self) -> ValueType {
        match self {
            Expr::Column(c) => c.value_type,
            Expr::Literal(v) => v.value_type(),
            Expr::Parameter { value_type, .. } => *value_type,
            Expr::BinaryOp { op, left, right } => {
                if op.is_comparison() {
                    ValueType::Boolean
                } else {
                    ValueType::promote(left.value_type(), right.value_type())
                }
            }
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Neg => operand.value_type(),
                UnaryOp::Not | UnaryOp::IsNull | UnaryOp::IsNotNull => ValueType::Boolean,
            },
            Expr::Function { value_type, .. } => *value_type,
            Expr::Aggregate(agg) => agg.value_type(),
            Expr::And(_) | Expr::Or(_) => ValueType::Boolean,
        }
    }

    /// Check that this expression's value can be used as a unique index key.
    ///
    /// On failure the error names the offending type, e.g. `a GEOGRAPHY expression`.
    pub fn unique_indexable(&self) -> Result<(), String> {
        let value_type = self.value_type();
        if value_type.is_unique_indexable() {
            Ok(())
        } else {
            Err(format!("a {} expression", value_type.name()))
        }
    }

    /// Visit this expression and every sub-expression, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expr)) {
        visit(self);
        match self {
            Expr::Column(_) | Expr::Literal(_) | Expr::Parameter { .. } => {}
            Expr::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::UnaryOp { operand, .. } => operand.walk(visit),
            Expr::Function { args, .. } => {
                for a in args {
                    a.walk(visit);
                }
            }
            Expr::Aggregate(agg) => {
                if let Some(arg) = &agg.arg {
                    arg.walk(visit);
                }
            }
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.walk(visit);
                }
            }
        }
    }

    /// Whether any node of this tree satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&Expr) -> bool) -> bool {
        let mut found = false;
        self.walk(&mut |e| found |= pred(e));
        found
    }

    pub fn contains_aggregate(&self) -> bool {
        self.any(|e| matches!(e, Expr::Aggregate(_)))
    }

    /// Return all column references in this expression.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut cols = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Column(c) = e {
                cols.push(c);
            }
        });
        cols
    }

    /// Flatten AND-chains: (A AND (B AND C)) → [A, B, C].
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Combine predicates into a single conjunction. `None` for an empty list.
    pub fn conjunction(mut predicates: Vec<Expr>) -> Option<Expr> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Expr::And(predicates)),
        }
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Expr, CodecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Hex encoding of the JSON form; the catalog's storage format for view predicates.
    pub fn to_hex_json(&self) -> Result<String, CodecError> {
        Ok(hex::encode(self.to_json()?))
    }

    pub fn from_hex_json(encoded: &str) -> Result<Expr, CodecError> {
        let bytes = hex::decode(encoded)?;
        let json = String::from_utf8(bytes)?;
        Self::from_json(&json)
    }
}

/// Serialize an ordered expression list as a JSON array.
pub fn exprs_to_json(exprs: &[Expr]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(exprs)?)
}

pub fn exprs_from_json(json: &str) -> Result<Vec<Expr>, CodecError> {
    Ok(serde_json::from_str(json)?)
}

/// Failure encoding or decoding the catalog text form of an expression.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid expression JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid hex encoding: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("hex payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{c}"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Parameter { index, .. } => write!(f, "?{index}"),
            Expr::BinaryOp { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "(NOT {operand})"),
                UnaryOp::Neg => write!(f, "(-{operand})"),
                UnaryOp::IsNull => write!(f, "({operand} IS NULL)"),
                UnaryOp::IsNotNull => write!(f, "({operand} IS NOT NULL)"),
            },
            Expr::Function { name, args, .. } => {
                write!(f, "{name}(")?;
                write_list(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::Aggregate(agg) => write!(f, "{agg}"),
            Expr::And(exprs) => {
                f.write_str("(")?;
                write_list(f, exprs, " AND ")?;
                f.write_str(")")
            }
            Expr::Or(exprs) => {
                f.write_str("(")?;
                write_list(f, exprs, " OR ")?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr], sep: &str) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{e}")?;
    }
    Ok(())
}

/// Binary operators for comparison and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Equality comparison (`=`).
    Eq,
    /// Inequality comparison (`<>` or `!=`).
    NotEq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    LtEq,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    GtEq,
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Unary operators for boolean logic and null checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Boolean negation (`NOT`).
    Not,
    /// Arithmetic negation (unary minus).
    Neg,
    /// Null check (`IS NULL`).
    IsNull,
    /// Non-null check (`IS NOT NULL`).
    IsNotNull,
}

/// SQL join types as they appear in a view's join tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Inner join: only matching rows from both sides.
    Inner,
    /// Left outer join: all rows from left, matching from right (or NULLs).
    Left,
    /// Right outer join: all rows from right, matching from left (or NULLs).
    Right,
    /// Full outer join: all rows from both sides, NULLs where no match.
    Full,
    /// Cross join: Cartesian product (`FROM a, b`), an inner join without condition.
    Cross,
}

impl JoinType {
    pub fn is_inner(&self) -> bool {
        matches!(self, JoinType::Inner | JoinType::Cross)
    }
}

/// Aggregate expression. `arg` is `None` only for `COUNT(*)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggExpr {
    pub func: AggFunc,
    pub arg: Option<Box<Expr>>,
    pub distinct: bool,
}

impl AggExpr {
    pub fn arg(&self) -> Option<&Expr> {
        self.arg.as_deref()
    }

    pub fn value_type(&self) -> ValueType {
        let arg_type = self.arg().map(Expr::value_type).unwrap_or(ValueType::BigInt);
        match self.func {
            AggFunc::CountStar | AggFunc::Count => ValueType::BigInt,
            AggFunc::Sum if arg_type.is_integral() => ValueType::BigInt,
            AggFunc::Sum | AggFunc::Avg | AggFunc::Min | AggFunc::Max => arg_type,
        }
    }
}

impl fmt::Display for AggExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.func.name();
        match (self.arg(), self.distinct) {
            (None, _) => write!(f, "{name}(*)"),
            (Some(arg), true) => write!(f, "{name}(DISTINCT {arg})"),
            (Some(arg), false) => write!(f, "{name}({arg})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    CountStar,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::CountStar | AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Min => "MIN",
            AggFunc::Max => "MAX",
        }
    }

    pub fn is_min_max(&self) -> bool {
        matches!(self, AggFunc::Min | AggFunc::Max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, index: u32, value_type: ValueType) -> Expr {
        Expr::Column(ColumnRef::new("T", name, index, value_type))
    }

    #[test]
    fn test_structural_equality() {
        let a = Expr::binary(BinaryOp::Add, col("a", 0, ValueType::Integer), col("b", 1, ValueType::Integer));
        let b = Expr::binary(BinaryOp::Add, col("a", 0, ValueType::Integer), col("b", 1, ValueType::Integer));
        let c = Expr::binary(BinaryOp::Add, col("b", 1, ValueType::Integer), col("a", 0, ValueType::Integer));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_as_column() {
        let a = col("a", 3, ValueType::Integer);
        assert_eq!(a.as_column().map(|c| c.index), Some(3));
        let f = Expr::Function {
            name: "ABS".into(),
            args: vec![a],
            value_type: ValueType::Integer,
        };
        assert!(f.as_column().is_none());
    }

    #[test]
    fn test_unique_indexable() {
        assert!(col("a", 0, ValueType::Varchar).unique_indexable().is_ok());
        let geo = col("g", 0, ValueType::Geography);
        assert_eq!(geo.unique_indexable(), Err("a GEOGRAPHY expression".to_string()));
        let cmp = Expr::equals(col("a", 0, ValueType::Integer), Expr::Literal(ScalarValue::Int64(1)));
        assert_eq!(cmp.unique_indexable(), Err("a BOOLEAN expression".to_string()));
    }

    #[test]
    fn test_value_types() {
        let sum = Expr::aggregate(AggFunc::Sum, Some(col("a", 0, ValueType::Integer)));
        assert_eq!(sum.value_type(), ValueType::BigInt);
        let max = Expr::aggregate(AggFunc::Max, Some(col("v", 1, ValueType::Varchar)));
        assert_eq!(max.value_type(), ValueType::Varchar);
        let mixed = Expr::binary(BinaryOp::Mul, col("a", 0, ValueType::Integer), col("f", 1, ValueType::Float));
        assert_eq!(mixed.value_type(), ValueType::Float);
        assert_eq!(Expr::count_star().value_type(), ValueType::BigInt);
    }

    #[test]
    fn test_hex_json_round_trip() {
        let pred = Expr::And(vec![
            Expr::binary(BinaryOp::Gt, col("c", 2, ValueType::Float), Expr::Literal(ScalarValue::Float64(OrderedFloat(1.5)))),
            Expr::UnaryOp {
                op: UnaryOp::IsNotNull,
                operand: Box::new(col("b", 1, ValueType::Varchar)),
            },
        ]);
        let encoded = pred.to_hex_json().unwrap();
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(Expr::from_hex_json(&encoded).unwrap(), pred);
    }

    #[test]
    fn test_json_array_preserves_order() {
        let exprs = vec![col("b", 1, ValueType::Integer), col("a", 0, ValueType::Integer)];
        let json = exprs_to_json(&exprs).unwrap();
        assert_eq!(exprs_from_json(&json).unwrap(), exprs);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Expr::from_json("{\"Column\":"), Err(CodecError::Json(_))));
        assert!(matches!(Expr::from_hex_json("zz"), Err(CodecError::Hex(_))));
    }

    #[test]
    fn test_conjuncts_flatten() {
        let a = Expr::equals(col("a", 0, ValueType::Integer), Expr::Literal(ScalarValue::Int64(1)));
        let b = Expr::equals(col("b", 1, ValueType::Integer), Expr::Literal(ScalarValue::Int64(2)));
        let c = Expr::equals(col("c", 2, ValueType::Integer), Expr::Literal(ScalarValue::Int64(3)));
        let nested = Expr::And(vec![a.clone(), Expr::And(vec![b.clone(), c.clone()])]);
        assert_eq!(nested.conjuncts(), vec![&a, &b, &c]);
        assert_eq!(Expr::conjunction(vec![a.clone()]), Some(a));
        assert_eq!(Expr::conjunction(vec![]), None);
    }

    #[test]
    fn test_display() {
        let e = Expr::aggregate(
            AggFunc::Min,
            Some(Expr::binary(BinaryOp::Add, col("a", 0, ValueType::Integer), col("b", 1, ValueType::Integer))),
        );
        assert_eq!(e.to_string(), "MIN((T.a + T.b))");
        assert_eq!(Expr::count_star().to_string(), "COUNT(*)");
    }
}
