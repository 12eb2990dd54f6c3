//! Column expressions
//!
//! An [`Expr`] describes how to compute one value per row from the columns of
//! a table. Expressions are evaluated column-at-a-time over a set of rows:
//! the whole table, or one group of a grouped table. Aggregates embedded in
//! an expression therefore see only the rows of the current group, which is
//! what gives `mutate` and `filter` their per-group (window) behaviour.
//!
//! Expressions can be built in Rust:
//!
//! ```
//! use tidyrs::expr::{col, lit, mean};
//!
//! let centred = col("n") - mean(col("n")).exclude_missing();
//! let recent = col("year").gt_eq(lit(2010)).and(col("n").is_not_na());
//! ```
//!
//! or parsed from text with [`Expr::parse`]:
//!
//! ```
//! use tidyrs::expr::Expr;
//!
//! let expr = Expr::parse("year >= 2010 & country %in% c('US', 'CA')").unwrap();
//! ```

pub mod agg;
mod eval;
pub mod parser;

use std::fmt;
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Sub};

use crate::column::ColumnType;
use crate::core::DataValue;
use crate::error::Result;

pub use agg::{AggExpr, AggFunc};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

/// Row-wise scalar functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunc {
    Abs,
    Sqrt,
    Log,
    Log10,
    Exp,
    /// `round(x)` or `round(x, digits)`
    Round,
    Floor,
    Ceil,
    Lower,
    Upper,
    StrLen,
}

impl ScalarFunc {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunc::Abs => "abs",
            ScalarFunc::Sqrt => "sqrt",
            ScalarFunc::Log => "log",
            ScalarFunc::Log10 => "log10",
            ScalarFunc::Exp => "exp",
            ScalarFunc::Round => "round",
            ScalarFunc::Floor => "floor",
            ScalarFunc::Ceil => "ceil",
            ScalarFunc::Lower => "lower",
            ScalarFunc::Upper => "upper",
            ScalarFunc::StrLen => "str_len",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "abs" => ScalarFunc::Abs,
            "sqrt" => ScalarFunc::Sqrt,
            "log" | "ln" => ScalarFunc::Log,
            "log10" => ScalarFunc::Log10,
            "exp" => ScalarFunc::Exp,
            "round" => ScalarFunc::Round,
            "floor" => ScalarFunc::Floor,
            "ceil" | "ceiling" => ScalarFunc::Ceil,
            "lower" | "tolower" => ScalarFunc::Lower,
            "upper" | "toupper" => ScalarFunc::Upper,
            "str_len" | "nchar" => ScalarFunc::StrLen,
            _ => return None,
        };
        Some(func)
    }
}

/// Functions computed over the ordered rows of a group, one output per row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunc {
    /// 1-based position within the group
    RowNumber,
    /// Value `k` rows earlier, missing for the first `k` rows
    Lag(usize),
    /// Value `k` rows later, missing for the last `k` rows
    Lead(usize),
    /// Running sum; missing from the first missing input onwards
    CumSum,
    /// Rank with ties sharing the lowest rank, missing inputs stay missing
    MinRank,
}

impl WindowFunc {
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunc::RowNumber => "row_number",
            WindowFunc::Lag(_) => "lag",
            WindowFunc::Lead(_) => "lead",
            WindowFunc::CumSum => "cumsum",
            WindowFunc::MinRank => "min_rank",
        }
    }
}

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference by name
    Column(String),
    Literal(DataValue),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Function {
        func: ScalarFunc,
        args: Vec<Expr>,
    },
    /// True where the operand is missing; never itself missing
    IsNa(Box<Expr>),
    /// Membership test against a literal set
    IsIn {
        expr: Box<Expr>,
        set: Vec<DataValue>,
    },
    /// Inclusive range test, `low <= expr <= high`
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    IfElse {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// First non-missing argument, row by row
    Coalesce(Vec<Expr>),
    Cast {
        expr: Box<Expr>,
        to: ColumnType,
    },
    /// Aggregate over the current row set, broadcast to every row
    Aggregate(Box<AggExpr>),
    Window {
        func: WindowFunc,
        arg: Option<Box<Expr>>,
    },
}

/// Reference a column by name
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A literal value
pub fn lit(value: impl Into<DataValue>) -> Expr {
    Expr::Literal(value.into())
}

/// The missing value literal
pub fn na() -> Expr {
    Expr::Literal(DataValue::Na)
}

pub fn if_else(condition: Expr, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
    Expr::IfElse {
        condition: Box::new(condition),
        then: Box::new(then.into()),
        otherwise: Box::new(otherwise.into()),
    }
}

pub fn coalesce(exprs: Vec<Expr>) -> Expr {
    Expr::Coalesce(exprs)
}

pub fn row_number() -> Expr {
    Expr::Window {
        func: WindowFunc::RowNumber,
        arg: None,
    }
}

pub fn lag(expr: Expr, k: usize) -> Expr {
    Expr::Window {
        func: WindowFunc::Lag(k),
        arg: Some(Box::new(expr)),
    }
}

pub fn lead(expr: Expr, k: usize) -> Expr {
    Expr::Window {
        func: WindowFunc::Lead(k),
        arg: Some(Box::new(expr)),
    }
}

pub fn cumsum(expr: Expr) -> Expr {
    Expr::Window {
        func: WindowFunc::CumSum,
        arg: Some(Box::new(expr)),
    }
}

pub fn min_rank(expr: Expr) -> Expr {
    Expr::Window {
        func: WindowFunc::MinRank,
        arg: Some(Box::new(expr)),
    }
}

/// Number of rows in the current group
pub fn n() -> AggExpr {
    AggExpr::new(AggFunc::N, None)
}

pub fn count(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Count, Some(expr))
}

pub fn count_distinct(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::CountDistinct, Some(expr))
}

pub fn sum(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Sum, Some(expr))
}

pub fn mean(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Mean, Some(expr))
}

pub fn median(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Median, Some(expr))
}

pub fn min(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Min, Some(expr))
}

pub fn max(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Max, Some(expr))
}

pub fn sd(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Sd, Some(expr))
}

pub fn var(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Var, Some(expr))
}

pub fn first(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::First, Some(expr))
}

pub fn last(expr: Expr) -> AggExpr {
    AggExpr::new(AggFunc::Last, Some(expr))
}

impl Expr {
    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Equal, other)
    }

    pub fn neq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::NotEqual, other)
    }

    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::LessThan, other)
    }

    pub fn lt_eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::LessThanOrEqual, other)
    }

    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::GreaterThan, other)
    }

    pub fn gt_eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::GreaterThanOrEqual, other)
    }

    pub fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    pub fn pow(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOp::Power, other)
    }

    pub fn is_na(self) -> Expr {
        Expr::IsNa(Box::new(self))
    }

    pub fn is_not_na(self) -> Expr {
        !Expr::IsNa(Box::new(self))
    }

    pub fn is_in<V: Into<DataValue>>(self, set: impl IntoIterator<Item = V>) -> Expr {
        Expr::IsIn {
            expr: Box::new(self),
            set: set.into_iter().map(Into::into).collect(),
        }
    }

    pub fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
    }

    pub fn cast(self, to: ColumnType) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            to,
        }
    }

    pub fn apply(self, func: ScalarFunc) -> Expr {
        Expr::Function {
            func,
            args: vec![self],
        }
    }

    /// Names of every column the expression reads
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Expr::Column(name) = self {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        for child in self.children() {
            child.collect_columns(out);
        }
    }

    /// Every aggregate in the expression, including ones nested inside
    /// other aggregates' inputs
    pub fn aggregates(&self) -> Vec<&AggExpr> {
        let mut out = Vec::new();
        self.collect_aggregates(&mut out);
        out
    }

    fn collect_aggregates<'a>(&'a self, out: &mut Vec<&'a AggExpr>) {
        if let Expr::Aggregate(agg) = self {
            out.push(agg.as_ref());
        }
        for child in self.children() {
            child.collect_aggregates(out);
        }
    }

    /// Fails with `AmbiguousMissingPolicy` if any aggregate in the
    /// expression lacks a missing-value policy, whatever the data
    pub fn check_missing_policies(&self) -> Result<()> {
        for agg in self.aggregates() {
            agg.check_missing_policy()?;
        }
        Ok(())
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Column(_) | Expr::Literal(_) => Vec::new(),
            Expr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Unary { operand, .. } => vec![operand.as_ref()],
            Expr::Function { args, .. } | Expr::Coalesce(args) => args.iter().collect(),
            Expr::IsNa(expr) | Expr::IsIn { expr, .. } | Expr::Cast { expr, .. } => {
                vec![expr.as_ref()]
            }
            Expr::Between { expr, low, high } => vec![expr.as_ref(), low.as_ref(), high.as_ref()],
            Expr::IfElse {
                condition,
                then,
                otherwise,
            } => vec![condition.as_ref(), then.as_ref(), otherwise.as_ref()],
            Expr::Aggregate(agg) => agg.input.iter().collect(),
            Expr::Window { arg, .. } => arg.iter().map(|a| a.as_ref()).collect(),
        }
    }
}

impl From<AggExpr> for Expr {
    fn from(agg: AggExpr) -> Self {
        Expr::Aggregate(Box::new(agg))
    }
}

impl From<DataValue> for Expr {
    fn from(value: DataValue) -> Self {
        Expr::Literal(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        lit(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        lit(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        lit(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        lit(value)
    }
}

impl From<&str> for Expr {
    /// String literals; use [`col`] for column references
    fn from(value: &str) -> Self {
        lit(value)
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Expr>> $trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                self.binary($op, rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Subtract);
impl_binary_operator!(Mul, mul, BinaryOp::Multiply);
impl_binary_operator!(Div, div, BinaryOp::Divide);
impl_binary_operator!(Rem, rem, BinaryOp::Modulo);
impl_binary_operator!(BitAnd, bitand, BinaryOp::And);
impl_binary_operator!(BitOr, bitor, BinaryOp::Or);

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(self),
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &DataValue) -> fmt::Result {
    match value {
        DataValue::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        DataValue::Float64(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{:.1}", v),
        other => write!(f, "{}", other),
    }
}

fn write_column(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if plain {
        write!(f, "{}", name)
    } else {
        write!(f, "`{}`", name)
    }
}

/// Renders the expression in the syntax accepted by [`Expr::parse`]
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write_column(f, name),
            Expr::Literal(value) => write_literal(f, value),
            Expr::Binary { left, op, right } => {
                // A signed base needs its own parentheses: `-2 ^ 2` is `-(2 ^ 2)`
                let signed_base = *op == BinaryOp::Power
                    && match left.as_ref() {
                        Expr::Unary { .. } => true,
                        Expr::Literal(value) => value.as_f64().is_some_and(|v| v.is_sign_negative()),
                        _ => false,
                    };
                if signed_base {
                    write!(f, "(({}) {} {})", left, op.symbol(), right)
                } else {
                    write!(f, "({} {} {})", left, op.symbol(), right)
                }
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
            },
            Expr::Function { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::IsNa(expr) => write!(f, "is_na({})", expr),
            Expr::IsIn { expr, set } => {
                write!(f, "({} %in% c(", expr)?;
                for (i, value) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_literal(f, value)?;
                }
                write!(f, "))")
            }
            Expr::Between { expr, low, high } => write!(f, "between({}, {}, {})", expr, low, high),
            Expr::IfElse {
                condition,
                then,
                otherwise,
            } => write!(f, "if_else({}, {}, {})", condition, then, otherwise),
            Expr::Coalesce(args) => {
                write!(f, "coalesce(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Cast { expr, to } => {
                let name = match to {
                    ColumnType::Int64 => "as_integer",
                    ColumnType::Float64 => "as_numeric",
                    ColumnType::String => "as_character",
                    ColumnType::Boolean => "as_logical",
                };
                write!(f, "{}({})", name, expr)
            }
            Expr::Aggregate(agg) => write!(f, "{}", agg),
            Expr::Window { func, arg } => match (func, arg) {
                (WindowFunc::Lag(k) | WindowFunc::Lead(k), Some(arg)) => {
                    write!(f, "{}({}, {})", func.name(), arg, k)
                }
                (_, Some(arg)) => write!(f, "{}({})", func.name(), arg),
                (_, None) => write!(f, "{}()", func.name()),
            },
        }
    }
}
