//! Column-at-a-time expression evaluation

use std::cmp::Ordering;

use crate::column::{cast_value, ColumnType};
use crate::core::DataValue;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::expr::{AggExpr, AggFunc, BinaryOp, Expr, ScalarFunc, UnaryOp, WindowFunc};

impl Expr {
    /// Evaluates the expression for each of `rows`, in order.
    ///
    /// `rows` is the current row set: every row of an ungrouped table, or the
    /// rows of one group. Aggregates and window functions see only these rows.
    /// The result always has `rows.len()` values.
    pub fn evaluate(&self, df: &DataFrame, rows: &[usize]) -> Result<Vec<DataValue>> {
        let n = rows.len();
        match self {
            Expr::Column(name) => {
                let column = df.column(name)?;
                Ok(rows.iter().map(|&i| column.value(i)).collect())
            }
            Expr::Literal(value) => Ok(vec![value.clone(); n]),
            Expr::Binary { left, op, right } => {
                let left = left.evaluate(df, rows)?;
                let right = right.evaluate(df, rows)?;
                left.into_iter()
                    .zip(right)
                    .map(|(l, r)| binary_value(&l, *op, &r))
                    .collect()
            }
            Expr::Unary { op, operand } => operand
                .evaluate(df, rows)?
                .into_iter()
                .map(|v| unary_value(*op, v))
                .collect(),
            Expr::Function { func, args } => evaluate_function(*func, args, df, rows),
            Expr::IsNa(expr) => Ok(expr
                .evaluate(df, rows)?
                .into_iter()
                .map(|v| DataValue::Boolean(v.is_na()))
                .collect()),
            Expr::IsIn { expr, set } => Ok(expr
                .evaluate(df, rows)?
                .into_iter()
                .map(|v| DataValue::Boolean(set.iter().any(|s| values_equal(&v, s))))
                .collect()),
            Expr::Between { expr, low, high } => {
                let values = expr.evaluate(df, rows)?;
                let low = low.evaluate(df, rows)?;
                let high = high.evaluate(df, rows)?;
                values
                    .iter()
                    .zip(low.iter().zip(high.iter()))
                    .map(|(v, (lo, hi))| {
                        let above = binary_value(v, BinaryOp::GreaterThanOrEqual, lo)?;
                        let below = binary_value(v, BinaryOp::LessThanOrEqual, hi)?;
                        binary_value(&above, BinaryOp::And, &below)
                    })
                    .collect()
            }
            Expr::IfElse {
                condition,
                then,
                otherwise,
            } => {
                let condition = condition.evaluate(df, rows)?;
                let then = then.evaluate(df, rows)?;
                let otherwise = otherwise.evaluate(df, rows)?;
                condition
                    .into_iter()
                    .zip(then.into_iter().zip(otherwise))
                    .map(|(c, (t, o))| match c {
                        DataValue::Boolean(true) => Ok(t),
                        DataValue::Boolean(false) => Ok(o),
                        DataValue::Na => Ok(DataValue::Na),
                        other => Err(not_logical("if_else condition", &other)),
                    })
                    .collect()
            }
            Expr::Coalesce(args) => {
                let mut out = vec![DataValue::Na; n];
                for arg in args {
                    let values = arg.evaluate(df, rows)?;
                    for (slot, value) in out.iter_mut().zip(values) {
                        if slot.is_na() {
                            *slot = value;
                        }
                    }
                }
                Ok(out)
            }
            Expr::Cast { expr, to } => Ok(expr
                .evaluate(df, rows)?
                .into_iter()
                .map(|v| cast_value(v, *to))
                .collect()),
            Expr::Aggregate(_) if n == 0 => Ok(Vec::new()),
            Expr::Aggregate(agg) => {
                let value = agg.evaluate(df, rows)?;
                Ok(vec![value; n])
            }
            Expr::Window { func, arg } => {
                let values = match arg {
                    Some(arg) => arg.evaluate(df, rows)?,
                    None => vec![DataValue::Na; n],
                };
                evaluate_window(*func, values)
            }
        }
    }

    /// Column type to use when every evaluated value is missing
    pub(crate) fn type_hint(&self, df: &DataFrame) -> Option<ColumnType> {
        match self {
            Expr::Column(name) => df.column(name).ok().map(|c| c.column_type()),
            Expr::Literal(value) => value.data_type(),
            Expr::Cast { to, .. } => Some(*to),
            Expr::IsNa(_) | Expr::IsIn { .. } | Expr::Between { .. } => Some(ColumnType::Boolean),
            Expr::Binary { op, left, .. } => {
                if op.is_comparison() || op.is_logical() {
                    Some(ColumnType::Boolean)
                } else {
                    left.type_hint(df)
                }
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => Some(ColumnType::Boolean),
                UnaryOp::Negate => operand.type_hint(df),
            },
            Expr::IfElse { then, otherwise, .. } => {
                then.type_hint(df).or_else(|| otherwise.type_hint(df))
            }
            Expr::Coalesce(args) => args.iter().find_map(|a| a.type_hint(df)),
            Expr::Function { func, args } => match func {
                ScalarFunc::Lower | ScalarFunc::Upper => Some(ColumnType::String),
                ScalarFunc::StrLen => Some(ColumnType::Int64),
                _ => args.first().and_then(|a| a.type_hint(df)),
            },
            Expr::Aggregate(agg) => agg.type_hint(df),
            Expr::Window { func, arg } => match func {
                WindowFunc::RowNumber | WindowFunc::MinRank => Some(ColumnType::Int64),
                _ => arg.as_ref().and_then(|a| a.type_hint(df)),
            },
        }
    }
}

impl AggExpr {
    /// Column type of the aggregate's result when every group yields missing
    pub(crate) fn type_hint(&self, df: &DataFrame) -> Option<ColumnType> {
        match self.func {
            AggFunc::N | AggFunc::Count | AggFunc::CountDistinct => Some(ColumnType::Int64),
            AggFunc::Min | AggFunc::Max | AggFunc::First | AggFunc::Last | AggFunc::Sum => {
                self.input.as_ref().and_then(|e| e.type_hint(df))
            }
            _ => Some(ColumnType::Float64),
        }
    }
}

fn not_logical(context: &str, value: &DataValue) -> Error {
    Error::TypeMismatch(format!(
        "{} must be logical, found {} value `{}`",
        context,
        value.type_name(),
        value
    ))
}

/// Equality used by `%in%`: numbers compare numerically across Int64/Float64
fn values_equal(a: &DataValue, b: &DataValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn kleene(value: &DataValue) -> Result<Option<bool>> {
    match value {
        DataValue::Boolean(b) => Ok(Some(*b)),
        DataValue::Na => Ok(None),
        other => Err(not_logical("operand of & and |", other)),
    }
}

pub(crate) fn binary_value(left: &DataValue, op: BinaryOp, right: &DataValue) -> Result<DataValue> {
    use DataValue::*;

    if op.is_logical() {
        let l = kleene(left)?;
        let r = kleene(right)?;
        let result = match op {
            BinaryOp::And => match (l, r) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            _ => match (l, r) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        };
        return Ok(result.map_or(Na, Boolean));
    }

    if left.is_na() || right.is_na() {
        return Ok(Na);
    }

    if op.is_comparison() {
        // NaN is unordered, so the comparison has no answer
        let Some(ordering) = compare(left, op, right)? else {
            return Ok(Na);
        };
        let result = match op {
            BinaryOp::Equal => ordering == Ordering::Equal,
            BinaryOp::NotEqual => ordering != Ordering::Equal,
            BinaryOp::LessThan => ordering == Ordering::Less,
            BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
            BinaryOp::GreaterThan => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(Boolean(result));
    }

    match (left, right) {
        (Int64(a), Int64(b)) => Ok(int_arithmetic(*a, op, *b)),
        (String(a), String(b)) if op == BinaryOp::Add => Ok(String(format!("{}{}", a, b))),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(float_arithmetic(a, op, b)),
            _ => Err(Error::TypeMismatch(format!(
                "cannot apply `{}` to {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

fn compare(left: &DataValue, op: BinaryOp, right: &DataValue) -> Result<Option<Ordering>> {
    use DataValue::*;
    match (left, right) {
        (Int64(a), Int64(b)) => Ok(Some(a.cmp(b))),
        (String(a), String(b)) => Ok(Some(a.cmp(b))),
        (Boolean(a), Boolean(b)) => Ok(Some(a.cmp(b))),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(Error::TypeMismatch(format!(
                "cannot compare {} with {} using `{}`",
                left.type_name(),
                right.type_name(),
                op.symbol()
            ))),
        },
    }
}

fn int_arithmetic(a: i64, op: BinaryOp, b: i64) -> DataValue {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Modulo => {
            if b == 0 {
                return DataValue::Na;
            }
            a.checked_rem_euclid(b)
        }
        _ => return float_arithmetic(a as f64, op, b as f64),
    };
    // Overflow falls back to floating point
    checked.map_or_else(|| float_arithmetic(a as f64, op, b as f64), DataValue::Int64)
}

fn float_arithmetic(a: f64, op: BinaryOp, b: f64) -> DataValue {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => {
            if b == 0.0 {
                return DataValue::Na;
            }
            a / b
        }
        BinaryOp::Modulo => {
            if b == 0.0 {
                return DataValue::Na;
            }
            a.rem_euclid(b)
        }
        BinaryOp::Power => a.powf(b),
        _ => return DataValue::Na,
    };
    if result.is_nan() {
        DataValue::Na
    } else {
        DataValue::Float64(result)
    }
}

fn unary_value(op: UnaryOp, value: DataValue) -> Result<DataValue> {
    match (op, value) {
        (_, DataValue::Na) => Ok(DataValue::Na),
        (UnaryOp::Not, DataValue::Boolean(b)) => Ok(DataValue::Boolean(!b)),
        (UnaryOp::Negate, DataValue::Int64(v)) => Ok(v
            .checked_neg()
            .map_or(DataValue::Float64(-(v as f64)), DataValue::Int64)),
        (UnaryOp::Negate, DataValue::Float64(v)) => Ok(DataValue::Float64(-v)),
        (UnaryOp::Not, other) => Err(not_logical("operand of !", &other)),
        (UnaryOp::Negate, other) => Err(Error::TypeMismatch(format!(
            "cannot negate {} value `{}`",
            other.type_name(),
            other
        ))),
    }
}

fn evaluate_function(
    func: ScalarFunc,
    args: &[Expr],
    df: &DataFrame,
    rows: &[usize],
) -> Result<Vec<DataValue>> {
    let expected = if func == ScalarFunc::Round { 1..=2 } else { 1..=1 };
    if !expected.contains(&args.len()) {
        return Err(Error::InvalidInput(format!(
            "{}() takes {} argument(s), found {}",
            func.name(),
            if func == ScalarFunc::Round { "1 or 2" } else { "1" },
            args.len()
        )));
    }

    let values = args[0].evaluate(df, rows)?;
    let digits = match args.get(1) {
        Some(arg) => arg.evaluate(df, rows)?,
        None => vec![DataValue::Int64(0); rows.len()],
    };

    values
        .into_iter()
        .zip(digits)
        .map(|(value, digits)| scalar_value(func, value, &digits))
        .collect()
}

fn scalar_value(func: ScalarFunc, value: DataValue, digits: &DataValue) -> Result<DataValue> {
    use DataValue::*;

    if value.is_na() {
        return Ok(Na);
    }

    let result = match func {
        ScalarFunc::Lower | ScalarFunc::Upper | ScalarFunc::StrLen => {
            let Some(s) = value.as_str() else {
                return Err(Error::TypeMismatch(format!(
                    "{}() needs a string, found {} value `{}`",
                    func.name(),
                    value.type_name(),
                    value
                )));
            };
            match func {
                ScalarFunc::Lower => String(s.to_lowercase()),
                ScalarFunc::Upper => String(s.to_uppercase()),
                _ => Int64(s.chars().count() as i64),
            }
        }
        ScalarFunc::Abs => match value {
            Int64(v) => v.checked_abs().map_or(Float64((v as f64).abs()), Int64),
            Float64(v) => Float64(v.abs()),
            other => return Err(not_numeric(func, &other)),
        },
        ScalarFunc::Round | ScalarFunc::Floor | ScalarFunc::Ceil => {
            let digits = if func == ScalarFunc::Round {
                digits.as_i64().ok_or_else(|| {
                    Error::TypeMismatch("round() digits must be an integer".to_string())
                })?
            } else {
                0
            };
            match value {
                // Integers only change for negative digits
                Int64(v) if digits >= 0 => Int64(v),
                Int64(v) => match digits
                    .checked_neg()
                    .and_then(|k| u32::try_from(k).ok())
                    .and_then(|k| 10i64.checked_pow(k))
                {
                    Some(unit) => {
                        let rounded = (v as f64 / unit as f64).round() * unit as f64;
                        if rounded.abs() < i64::MAX as f64 {
                            Int64(rounded as i64)
                        } else {
                            Float64(rounded)
                        }
                    }
                    None => Int64(0),
                },
                Float64(v) => Float64(match func {
                    ScalarFunc::Floor => v.floor(),
                    ScalarFunc::Ceil => v.ceil(),
                    _ => {
                        let scale = 10f64.powi(digits as i32);
                        (v * scale).round() / scale
                    }
                }),
                other => return Err(not_numeric(func, &other)),
            }
        }
        _ => {
            let Some(v) = value.as_f64() else {
                return Err(not_numeric(func, &value));
            };
            let result = match func {
                ScalarFunc::Sqrt => v.sqrt(),
                ScalarFunc::Log => v.ln(),
                ScalarFunc::Log10 => v.log10(),
                _ => v.exp(),
            };
            if result.is_nan() {
                Na
            } else {
                Float64(result)
            }
        }
    };
    Ok(result)
}

fn not_numeric(func: ScalarFunc, value: &DataValue) -> Error {
    Error::TypeMismatch(format!(
        "{}() needs a number, found {} value `{}`",
        func.name(),
        value.type_name(),
        value
    ))
}

fn evaluate_window(func: WindowFunc, values: Vec<DataValue>) -> Result<Vec<DataValue>> {
    let n = values.len();
    let out = match func {
        WindowFunc::RowNumber => (1..=n as i64).map(DataValue::Int64).collect(),
        WindowFunc::Lag(k) => (0..n)
            .map(|i| {
                if i >= k {
                    values[i - k].clone()
                } else {
                    DataValue::Na
                }
            })
            .collect(),
        WindowFunc::Lead(k) => (0..n)
            .map(|i| values.get(i + k).cloned().unwrap_or(DataValue::Na))
            .collect(),
        WindowFunc::CumSum => {
            let mut out = Vec::with_capacity(n);
            let mut acc = DataValue::Int64(0);
            for value in values {
                if !value.is_na() && !value.is_numeric() {
                    return Err(Error::TypeMismatch(format!(
                        "cumsum() needs numbers, found {} value `{}`",
                        value.type_name(),
                        value
                    )));
                }
                acc = binary_value(&acc, BinaryOp::Add, &value)?;
                out.push(acc.clone());
            }
            out
        }
        WindowFunc::MinRank => {
            let mut order: Vec<usize> = (0..n).filter(|&i| !values[i].is_na()).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            let mut out = vec![DataValue::Na; n];
            let mut rank = 0;
            for (pos, &i) in order.iter().enumerate() {
                if pos == 0 || values[order[pos - 1]] != values[i] {
                    rank = pos + 1;
                }
                out[i] = DataValue::Int64(rank as i64);
            }
            out
        }
    };
    Ok(out)
}
