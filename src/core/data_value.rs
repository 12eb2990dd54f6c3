//! Scalar cell values
//!
//! A [`DataValue`] is one cell of a table, detached from its column. Row-wise
//! expression evaluation, grouping keys and CSV type inference all work in
//! terms of this type.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::column::ColumnType;

/// A single table cell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    String(String),
    /// Missing value marker
    Na,
}

impl DataValue {
    /// Returns true for the missing marker
    pub fn is_na(&self) -> bool {
        matches!(self, DataValue::Na)
    }

    /// The column type this value belongs to, or `None` for a missing value
    pub fn data_type(&self) -> Option<ColumnType> {
        match self {
            DataValue::Int64(_) => Some(ColumnType::Int64),
            DataValue::Float64(_) => Some(ColumnType::Float64),
            DataValue::Boolean(_) => Some(ColumnType::Boolean),
            DataValue::String(_) => Some(ColumnType::String),
            DataValue::Na => None,
        }
    }

    /// Numeric view of the value; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Int64(v) => Some(*v as f64),
            DataValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for Int64 and Float64 values
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataValue::Int64(_) | DataValue::Float64(_))
    }

    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Int64(_) => "int64",
            DataValue::Float64(_) => "float64",
            DataValue::Boolean(_) => "boolean",
            DataValue::String(_) => "string",
            DataValue::Na => "NA",
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            DataValue::Boolean(_) => 0,
            DataValue::Int64(_) | DataValue::Float64(_) => 1,
            DataValue::String(_) => 2,
            DataValue::Na => 3,
        }
    }

    /// Total order used for sorting and group ordering.
    ///
    /// Integers and floats compare numerically, NaN sorts after every number,
    /// and the missing marker sorts after everything else.
    pub fn total_cmp(&self, other: &DataValue) -> Ordering {
        use DataValue::*;
        match (self, other) {
            (Int64(a), Int64(b)) => a.cmp(b),
            (Float64(a), Float64(b)) => cmp_f64(*a, *b),
            (Int64(a), Float64(b)) => cmp_f64(*a as f64, *b).then(Ordering::Less),
            (Float64(a), Int64(b)) => cmp_f64(*a, *b as f64).then(Ordering::Greater),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Na, Na) => Ordering::Equal,
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        None => a.is_nan().cmp(&b.is_nan()),
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for DataValue {}

impl PartialOrd for DataValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.total_cmp(other))
    }
}

impl Ord for DataValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DataValue::Int64(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            DataValue::Float64(v) => {
                1u8.hash(state);
                // 0.0 and -0.0 compare equal, and every NaN compares equal
                let bits = if *v == 0.0 {
                    0u64
                } else if v.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    v.to_bits()
                };
                bits.hash(state);
            }
            DataValue::Boolean(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            DataValue::String(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            DataValue::Na => 4u8.hash(state),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Int64(v) => write!(f, "{}", v),
            DataValue::Float64(v) => write!(f, "{}", v),
            DataValue::Boolean(v) => write!(f, "{}", v),
            DataValue::String(v) => write!(f, "{}", v),
            DataValue::Na => write!(f, "NA"),
        }
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int64(v)
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Int64(v as i64)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float64(v)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Boolean(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::String(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::String(v)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => DataValue::Na,
        }
    }
}

/// The tuple of key-column values identifying one group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub Vec<DataValue>);

impl GroupKey {
    pub fn values(&self) -> &[DataValue] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
