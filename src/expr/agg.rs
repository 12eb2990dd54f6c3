//! Aggregate expressions

use std::collections::HashSet;
use std::fmt;

use crate::core::DataValue;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::na::MissingPolicy;
use crate::stats;

/// Aggregate functions reducing a set of rows to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunc {
    /// Number of rows; takes no input
    N,
    Count,
    CountDistinct,
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Sd,
    Var,
    First,
    Last,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::N => "n",
            AggFunc::Count => "count",
            AggFunc::CountDistinct => "count_distinct",
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Median => "median",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Sd => "sd",
            AggFunc::Var => "var",
            AggFunc::First => "first",
            AggFunc::Last => "last",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "n" => AggFunc::N,
            "count" => AggFunc::Count,
            "count_distinct" | "n_distinct" => AggFunc::CountDistinct,
            "sum" => AggFunc::Sum,
            "mean" | "avg" => AggFunc::Mean,
            "median" => AggFunc::Median,
            "min" => AggFunc::Min,
            "max" => AggFunc::Max,
            "sd" | "std" => AggFunc::Sd,
            "var" => AggFunc::Var,
            "first" => AggFunc::First,
            "last" => AggFunc::Last,
            _ => return None,
        };
        Some(func)
    }

    /// Defined on an empty input (yields zero rather than no value)
    pub fn is_total(&self) -> bool {
        matches!(self, AggFunc::N | AggFunc::Count | AggFunc::CountDistinct)
    }

    fn requires_numeric(&self) -> bool {
        matches!(
            self,
            AggFunc::Sum | AggFunc::Mean | AggFunc::Median | AggFunc::Sd | AggFunc::Var
        )
    }

    /// Reduces values that already went through the missing-value policy.
    ///
    /// Returns `Ok(None)` when the function has no value for an empty input.
    fn compute(&self, values: &[DataValue]) -> Result<Option<DataValue>> {
        if self.requires_numeric() {
            if let Some(bad) = values.iter().find(|v| !v.is_na() && !v.is_numeric()) {
                return Err(Error::TypeMismatch(format!(
                    "{}() needs numeric input, found {} value `{}`",
                    self.name(),
                    bad.type_name(),
                    bad
                )));
            }
        }

        let result = match self {
            AggFunc::N | AggFunc::Count => Some(DataValue::Int64(values.len() as i64)),
            AggFunc::CountDistinct => {
                let distinct: HashSet<&DataValue> = values.iter().collect();
                Some(DataValue::Int64(distinct.len() as i64))
            }
            AggFunc::Sum => {
                if values.is_empty() {
                    None
                } else if values.iter().all(|v| matches!(v, DataValue::Int64(_))) {
                    let total = values
                        .iter()
                        .filter_map(DataValue::as_i64)
                        .try_fold(0i64, |acc, x| acc.checked_add(x));
                    match total {
                        Some(total) => Some(DataValue::Int64(total)),
                        None => Some(DataValue::Float64(stats::sum(&numbers(values)))),
                    }
                } else {
                    Some(DataValue::Float64(stats::sum(&numbers(values))))
                }
            }
            AggFunc::Mean => stats::mean(&numbers(values)).map(DataValue::Float64),
            AggFunc::Median => stats::median(&numbers(values)).map(DataValue::Float64),
            AggFunc::Sd | AggFunc::Var => match values.len() {
                0 => None,
                // A single observation has no spread estimate
                1 => Some(DataValue::Na),
                _ => {
                    let data = numbers(values);
                    let result = if *self == AggFunc::Sd {
                        stats::std_dev(&data)
                    } else {
                        stats::sample_variance(&data)
                    };
                    result.map(DataValue::Float64)
                }
            },
            AggFunc::Min => values.iter().min_by(|a, b| a.total_cmp(b)).cloned(),
            AggFunc::Max => values.iter().max_by(|a, b| a.total_cmp(b)).cloned(),
            AggFunc::First => values.first().cloned(),
            AggFunc::Last => values.last().cloned(),
        };
        Ok(result)
    }
}

fn numbers(values: &[DataValue]) -> Vec<f64> {
    values.iter().filter_map(DataValue::as_f64).collect()
}

/// An aggregate function applied to an input expression.
///
/// Every aggregate other than `n()` must carry an explicit
/// [`MissingPolicy`]; evaluating one without it fails with
/// [`Error::AmbiguousMissingPolicy`]. Aggregates that are undefined on an
/// empty input fail with [`Error::EmptyGroupResult`] unless a default is
/// supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct AggExpr {
    pub func: AggFunc,
    pub input: Option<Expr>,
    pub missing: Option<MissingPolicy>,
    pub default: Option<DataValue>,
}

impl AggExpr {
    pub fn new(func: AggFunc, input: Option<Expr>) -> Self {
        Self {
            func,
            input,
            missing: None,
            default: None,
        }
    }

    /// Parses an aggregate from text, e.g. `mean(n, na_rm = true)`
    pub fn parse(text: &str) -> Result<Self> {
        match Expr::parse(text)? {
            Expr::Aggregate(agg) => Ok(*agg),
            other => Err(Error::InvalidInput(format!(
                "expected an aggregate such as mean(x, na_rm = true), found `{}`",
                other
            ))),
        }
    }

    pub fn with_missing(mut self, policy: MissingPolicy) -> Self {
        self.missing = Some(policy);
        self
    }

    /// Missing inputs propagate into the result
    pub fn include_missing(self) -> Self {
        self.with_missing(MissingPolicy::Include)
    }

    /// Missing inputs are dropped before aggregating
    pub fn exclude_missing(self) -> Self {
        self.with_missing(MissingPolicy::Exclude)
    }

    /// Value produced when the aggregate has no input rows
    pub fn or_default(mut self, value: impl Into<DataValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Fails with `AmbiguousMissingPolicy` unless this is `n()` or carries
    /// an explicit policy
    pub fn check_missing_policy(&self) -> Result<()> {
        if self.func != AggFunc::N && self.missing.is_none() {
            return Err(Error::AmbiguousMissingPolicy(self.to_string()));
        }
        Ok(())
    }

    /// Evaluates the aggregate over `rows` of `df`
    pub fn evaluate(&self, df: &DataFrame, rows: &[usize]) -> Result<DataValue> {
        if self.func == AggFunc::N {
            return Ok(DataValue::Int64(rows.len() as i64));
        }

        let input = self.input.as_ref().ok_or_else(|| {
            Error::InvalidInput(format!("{}() needs an input expression", self.func.name()))
        })?;
        let policy = self
            .missing
            .ok_or_else(|| Error::AmbiguousMissingPolicy(self.to_string()))?;

        let values = input.evaluate(df, rows)?;
        let Some(values) = policy.apply(values) else {
            return Ok(DataValue::Na);
        };

        match self.func.compute(&values)? {
            Some(value) => Ok(value),
            None => self
                .default
                .clone()
                .ok_or_else(|| Error::EmptyGroupResult(self.to_string())),
        }
    }
}

impl fmt::Display for AggExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.func.name())?;
        let mut first = true;
        if let Some(input) = &self.input {
            write!(f, "{}", input)?;
            first = false;
        }
        if let Some(policy) = self.missing {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", policy)?;
            first = false;
        }
        if let Some(default) = &self.default {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "default = {}", Expr::Literal(default.clone()))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_ints_stays_int() {
        let values = vec![DataValue::Int64(2), DataValue::Int64(5)];
        assert_eq!(AggFunc::Sum.compute(&values).unwrap(), Some(DataValue::Int64(7)));
    }

    #[test]
    fn counts_are_total() {
        assert_eq!(AggFunc::Count.compute(&[]).unwrap(), Some(DataValue::Int64(0)));
        assert_eq!(AggFunc::Mean.compute(&[]).unwrap(), None);
        assert!(AggFunc::CountDistinct.is_total());
    }

    #[test]
    fn single_value_has_missing_spread() {
        let values = vec![DataValue::Float64(3.0)];
        assert_eq!(AggFunc::Sd.compute(&values).unwrap(), Some(DataValue::Na));
    }

    #[test]
    fn mean_rejects_text() {
        let values = vec![DataValue::from("a")];
        assert!(matches!(AggFunc::Mean.compute(&values), Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn policy_is_required_except_for_n() {
        let mean = AggExpr::new(AggFunc::Mean, Some(Expr::Column("x".into())));
        assert!(matches!(
            mean.check_missing_policy(),
            Err(Error::AmbiguousMissingPolicy(_))
        ));
        assert!(mean.exclude_missing().check_missing_policy().is_ok());
        assert!(AggExpr::new(AggFunc::N, None).check_missing_policy().is_ok());
    }

    #[test]
    fn min_max_over_strings() {
        let values = vec![DataValue::from("b"), DataValue::from("a"), DataValue::from("c")];
        assert_eq!(AggFunc::Min.compute(&values).unwrap(), Some(DataValue::from("a")));
        assert_eq!(AggFunc::Max.compute(&values).unwrap(), Some(DataValue::from("c")));
    }
}
