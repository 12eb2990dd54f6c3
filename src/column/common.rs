use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::column::{BooleanColumn, Float64Column, Int64Column, StringColumn};
use crate::core::DataValue;
use crate::error::{Error, Result};

/// Physical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Boolean,
}

impl ColumnType {
    /// Short label used in table rendering
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "<int>",
            ColumnType::Float64 => "<dbl>",
            ColumnType::String => "<chr>",
            ColumnType::Boolean => "<lgl>",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }

    /// Smallest type able to hold values of both types, if any.
    ///
    /// Only Int64 and Float64 widen into each other.
    pub fn common_type(self, other: ColumnType) -> Option<ColumnType> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (ColumnType::Int64, ColumnType::Float64) | (ColumnType::Float64, ColumnType::Int64) => {
                Some(ColumnType::Float64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
        };
        write!(f, "{}", name)
    }
}

/// Packed bit vector; in a column's null mask a set bit marks a missing value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    pub(crate) data: Arc<[u8]>,
    pub(crate) len: usize,
}

impl BitMask {
    pub fn from_bools(bools: &[bool]) -> Self {
        let length = bools.len();
        let bytes_needed = (length + 7) / 8;
        let mut data = vec![0u8; bytes_needed];

        for (i, &is_set) in bools.iter().enumerate() {
            if is_set {
                data[i / 8] |= 1 << (i % 8);
            }
        }

        Self {
            data: data.into(),
            len: length,
        }
    }

    /// Builds a mask only when at least one bit would be set
    pub fn from_bools_sparse(bools: &[bool]) -> Option<Self> {
        if bools.iter().any(|&b| b) {
            Some(Self::from_bools(bools))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Result<bool> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.len,
            });
        }
        Ok(self.bit(index))
    }

    #[inline]
    pub(crate) fn bit(&self, index: usize) -> bool {
        (self.data[index / 8] & (1 << (index % 8))) != 0
    }

    pub fn count_ones(&self) -> usize {
        (0..self.len).filter(|&i| self.bit(i)).count()
    }

    /// Gathers the bits at `indices` into a new mask
    pub fn take(&self, indices: &[usize]) -> Self {
        let bools: Vec<bool> = indices.iter().map(|&i| self.bit(i)).collect();
        Self::from_bools(&bools)
    }

    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.bit(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A typed column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Int64Column),
    Float64(Float64Column),
    String(StringColumn),
    Boolean(BooleanColumn),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(col) => col.len(),
            Column::Float64(col) => col.len(),
            Column::String(col) => col.len(),
            Column::Boolean(col) => col.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::String(_) => ColumnType::String,
            Column::Boolean(_) => ColumnType::Boolean,
        }
    }

    /// Value at `index`, or `DataValue::Na` when missing.
    ///
    /// Panics if `index` is out of bounds; callers iterate within `len()`.
    pub fn value(&self, index: usize) -> DataValue {
        match self {
            Column::Int64(col) => col.value(index).into(),
            Column::Float64(col) => col.value(index).into(),
            Column::String(col) => col.value(index).map(str::to_string).into(),
            Column::Boolean(col) => col.value(index).into(),
        }
    }

    /// Bounds-checked variant of [`Column::value`]
    pub fn get(&self, index: usize) -> Result<DataValue> {
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self.value(index))
    }

    pub fn is_null(&self, index: usize) -> bool {
        match self {
            Column::Int64(col) => col.is_null(index),
            Column::Float64(col) => col.is_null(index),
            Column::String(col) => col.is_null(index),
            Column::Boolean(col) => col.is_null(index),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Int64(col) => col.null_count(),
            Column::Float64(col) => col.null_count(),
            Column::String(col) => col.null_count(),
            Column::Boolean(col) => col.null_count(),
        }
    }

    pub fn values(&self) -> Vec<DataValue> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }

    /// New column holding the rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Int64(col) => Column::Int64(col.take(indices)),
            Column::Float64(col) => Column::Float64(col.take(indices)),
            Column::String(col) => Column::String(col.take(indices)),
            Column::Boolean(col) => Column::Boolean(col.take(indices)),
        }
    }

    /// Builds a column of the given type. Int64 values are accepted into a
    /// Float64 column; any other mismatch is an error.
    pub fn from_values(column_type: ColumnType, values: Vec<DataValue>) -> Result<Column> {
        let mismatch = |v: &DataValue| {
            Error::TypeMismatch(format!(
                "cannot store {} value `{}` in a {} column",
                v.type_name(),
                v,
                column_type
            ))
        };

        let column = match column_type {
            ColumnType::Int64 => {
                let mut out = Vec::with_capacity(values.len());
                for v in &values {
                    match v {
                        DataValue::Int64(x) => out.push(Some(*x)),
                        DataValue::Na => out.push(None),
                        other => return Err(mismatch(other)),
                    }
                }
                Column::Int64(Int64Column::from_options(out))
            }
            ColumnType::Float64 => {
                let mut out = Vec::with_capacity(values.len());
                for v in &values {
                    match v {
                        DataValue::Float64(x) => out.push(Some(*x)),
                        DataValue::Int64(x) => out.push(Some(*x as f64)),
                        DataValue::Na => out.push(None),
                        other => return Err(mismatch(other)),
                    }
                }
                Column::Float64(Float64Column::from_options(out))
            }
            ColumnType::Boolean => {
                let mut out = Vec::with_capacity(values.len());
                for v in &values {
                    match v {
                        DataValue::Boolean(x) => out.push(Some(*x)),
                        DataValue::Na => out.push(None),
                        other => return Err(mismatch(other)),
                    }
                }
                Column::Boolean(BooleanColumn::from_options(out))
            }
            ColumnType::String => {
                let mut out = Vec::with_capacity(values.len());
                for v in values {
                    match v {
                        DataValue::String(x) => out.push(Some(x)),
                        DataValue::Na => out.push(None),
                        other => return Err(mismatch(&other)),
                    }
                }
                Column::String(StringColumn::from_options(out))
            }
        };
        Ok(column)
    }

    /// Builds a column whose type is inferred from the values.
    ///
    /// Int64 and Float64 widen to Float64; an all-missing input becomes a
    /// Float64 column of missing values.
    pub fn from_values_inferred(values: Vec<DataValue>) -> Result<Column> {
        let column_type = infer_type(&values)?.unwrap_or(ColumnType::Float64);
        Column::from_values(column_type, values)
    }

    /// Converts the column to another type.
    ///
    /// Numbers and booleans convert between each other, anything converts
    /// to String, and strings are parsed; unparseable strings become missing.
    pub fn cast(&self, target: ColumnType) -> Result<Column> {
        if self.column_type() == target {
            return Ok(self.clone());
        }
        let values = self.values().into_iter().map(|v| cast_value(v, target)).collect();
        Column::from_values(target, values)
    }
}

/// Common type of a set of values, ignoring missing ones
pub(crate) fn infer_type(values: &[DataValue]) -> Result<Option<ColumnType>> {
    let mut current: Option<ColumnType> = None;
    for v in values {
        let Some(t) = v.data_type() else { continue };
        current = match current {
            None => Some(t),
            Some(c) => match c.common_type(t) {
                Some(common) => Some(common),
                None => {
                    return Err(Error::TypeMismatch(format!(
                        "values of type {} and {} cannot share a column",
                        c, t
                    )))
                }
            },
        };
    }
    Ok(current)
}

pub(crate) fn cast_value(value: DataValue, target: ColumnType) -> DataValue {
    use DataValue::*;
    match (value, target) {
        (Na, _) => Na,
        (Int64(v), ColumnType::Float64) => Float64(v as f64),
        (Int64(v), ColumnType::Boolean) => Boolean(v != 0),
        (Float64(v), ColumnType::Int64) if v.is_finite() => Int64(v.trunc() as i64),
        (Float64(_), ColumnType::Int64) => Na,
        (Float64(v), ColumnType::Boolean) => Boolean(v != 0.0),
        (Boolean(v), ColumnType::Int64) => Int64(v as i64),
        (Boolean(v), ColumnType::Float64) => Float64(if v { 1.0 } else { 0.0 }),
        (String(s), ColumnType::Int64) => s.trim().parse::<i64>().map(Int64).unwrap_or(Na),
        (String(s), ColumnType::Float64) => s.trim().parse::<f64>().map(Float64).unwrap_or(Na),
        (String(s), ColumnType::Boolean) => match s.trim() {
            "true" | "TRUE" | "True" | "T" => Boolean(true),
            "false" | "FALSE" | "False" | "F" => Boolean(false),
            _ => Na,
        },
        (v, ColumnType::String) => String(v.to_string()),
        (v, _) => v,
    }
}

impl From<Int64Column> for Column {
    fn from(col: Int64Column) -> Self {
        Column::Int64(col)
    }
}

impl From<Float64Column> for Column {
    fn from(col: Float64Column) -> Self {
        Column::Float64(col)
    }
}

impl From<StringColumn> for Column {
    fn from(col: StringColumn) -> Self {
        Column::String(col)
    }
}

impl From<BooleanColumn> for Column {
    fn from(col: BooleanColumn) -> Self {
        Column::Boolean(col)
    }
}

macro_rules! impl_column_from_vec {
    ($native:ty, $variant:ident, $typed:ident) => {
        impl From<Vec<$native>> for Column {
            fn from(values: Vec<$native>) -> Self {
                Column::$variant($typed::new(values))
            }
        }

        impl From<Vec<Option<$native>>> for Column {
            fn from(values: Vec<Option<$native>>) -> Self {
                Column::$variant($typed::from_options(values))
            }
        }
    };
}

impl_column_from_vec!(i64, Int64, Int64Column);
impl_column_from_vec!(f64, Float64, Float64Column);
impl_column_from_vec!(bool, Boolean, BooleanColumn);
impl_column_from_vec!(String, String, StringColumn);

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::String(StringColumn::from(values))
    }
}

impl From<Vec<Option<&str>>> for Column {
    fn from(values: Vec<Option<&str>>) -> Self {
        Column::String(StringColumn::from_options(
            values.into_iter().map(|v| v.map(str::to_string)).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmask_take_reorders() {
        let mask = BitMask::from_bools(&[true, false, false, true, false, false, false, false, true]);
        assert_eq!(mask.count_ones(), 3);
        let taken = mask.take(&[8, 1, 0]);
        assert_eq!(taken.to_bools(), vec![true, false, true]);
    }

    #[test]
    fn inferred_widening() {
        let col = Column::from_values_inferred(vec![
            DataValue::Int64(1),
            DataValue::Float64(2.5),
            DataValue::Na,
        ])
        .unwrap();
        assert_eq!(col.column_type(), ColumnType::Float64);
        assert_eq!(col.value(0), DataValue::Float64(1.0));
        assert!(col.value(2).is_na());
    }

    #[test]
    fn inferred_rejects_text_with_numbers() {
        let result = Column::from_values_inferred(vec![DataValue::Int64(1), "a".into()]);
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn explicit_null_mask() {
        let col = Int64Column::with_nulls(vec![1, 0, 3], vec![false, true, false]).unwrap();
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.get(1).unwrap(), None);
        assert!(col.get(3).is_err());

        let ragged = StringColumn::with_nulls(vec!["a".into()], vec![false, true]);
        assert!(matches!(ragged, Err(Error::InconsistentRowCount { .. })));
    }

    #[test]
    fn cast_string_to_int() {
        let col = Column::from(StringColumn::new(vec!["1".into(), "x".into()]));
        let cast = col.cast(ColumnType::Int64).unwrap();
        assert_eq!(cast.value(0), DataValue::Int64(1));
        assert!(cast.value(1).is_na());
    }
}
