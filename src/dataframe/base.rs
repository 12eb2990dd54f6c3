use std::collections::HashSet;

use crate::column::{Column, ColumnType};
use crate::core::DataValue;
use crate::error::{Error, Result};

/// An ordered collection of equally long, uniquely named, typed columns.
///
/// A table may carry a grouping: an ordered list of key column names that
/// makes `summarize`, `mutate` and `filter` operate per group. Every verb
/// returns a new table and leaves its input untouched; column data is
/// shared between the two where it is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    /// Column names, in column order
    names: Vec<String>,

    /// Column data, parallel to `names`
    columns: Vec<Column>,

    /// Number of rows; kept separately so a table without columns still has one
    row_count: usize,

    /// Grouping column names, outermost first
    group_keys: Vec<String>,
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFrame {
    /// Creates an empty table
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
            group_keys: Vec::new(),
        }
    }

    /// A table with no columns but `row_count` rows
    pub(crate) fn with_row_count(row_count: usize) -> Self {
        Self {
            row_count,
            ..Self::new()
        }
    }

    /// Builds a table from `(name, column)` pairs
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Column)>) -> Result<Self> {
        let mut df = Self::new();
        for (name, column) in columns {
            df.add_column(name, column)?;
        }
        Ok(df)
    }

    /// Appends a column.
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.contains_column(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column.len(),
            });
        }

        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Returns a table with `column` stored under `name`, replacing an
    /// existing column in place or appending a new one
    pub fn with_column(&self, name: impl Into<String>, column: Column) -> Result<DataFrame> {
        let name = name.into();
        if column.len() != self.row_count && !self.columns.is_empty() {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: column.len(),
            });
        }

        let mut df = self.clone();
        match df.position(&name) {
            Some(index) => df.columns[index] = column,
            None => {
                if df.columns.is_empty() {
                    df.row_count = column.len();
                }
                df.names.push(name);
                df.columns.push(column);
            }
        }
        Ok(df)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Index of the named column
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let index = self.column_index(name)?;
        Ok(&self.columns[index])
    }

    /// Name and data of the column at `index`
    pub fn column_at(&self, index: usize) -> Result<(&str, &Column)> {
        match (self.names.get(index), self.columns.get(index)) {
            (Some(name), Some(column)) => Ok((name, column)),
            _ => Err(Error::IndexOutOfBounds {
                index,
                size: self.columns.len(),
            }),
        }
    }

    /// Iterates `(name, column)` pairs in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        Ok(self.column(name)?.column_type())
    }

    /// Value of the named column at `row`
    pub fn value(&self, row: usize, name: &str) -> Result<DataValue> {
        self.column(name)?.get(row)
    }

    /// All values of one row, in column order
    pub fn row(&self, index: usize) -> Result<Vec<DataValue>> {
        if index >= self.row_count {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.row_count,
            });
        }
        Ok(self.columns.iter().map(|c| c.value(index)).collect())
    }

    /// Grouping column names, outermost first; empty when ungrouped
    pub fn group_keys(&self) -> &[String] {
        &self.group_keys
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_keys.is_empty()
    }

    pub(crate) fn set_group_keys(&mut self, keys: Vec<String>) {
        self.group_keys = keys;
    }

    /// New table with the rows at `indices`, in that order; grouping is kept
    pub fn take_rows(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            row_count: indices.len(),
            group_keys: self.group_keys.clone(),
        }
    }

    /// New table with the columns at `indices`, in that order.
    ///
    /// Grouping keys that are not among the chosen columns are dropped.
    pub(crate) fn take_columns(&self, indices: &[usize]) -> DataFrame {
        let names: Vec<String> = indices.iter().map(|&i| self.names[i].clone()).collect();
        let group_keys = self
            .group_keys
            .iter()
            .filter(|k| names.contains(k))
            .cloned()
            .collect();
        DataFrame {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            names,
            row_count: self.row_count,
            group_keys,
        }
    }

    /// Replaces column names, keeping data and grouping aligned
    pub(crate) fn with_names(&self, names: Vec<String>) -> Result<DataFrame> {
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateColumnName(name.clone()));
            }
        }

        let group_keys = self
            .group_keys
            .iter()
            .filter_map(|k| self.position(k).map(|i| names[i].clone()))
            .collect();
        Ok(DataFrame {
            names,
            columns: self.columns.clone(),
            row_count: self.row_count,
            group_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_names() {
        let mut df = DataFrame::new();
        df.add_column("a", vec![1i64].into()).unwrap();
        let err = df.add_column("a", vec![2i64].into()).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumnName(name) if name == "a"));
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = DataFrame::from_columns(vec![
            ("a", vec![1i64, 2].into()),
            ("b", vec![1i64].into()),
        ]);
        assert!(matches!(
            result,
            Err(Error::InconsistentRowCount {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn with_column_replaces_in_place() {
        let df = DataFrame::from_columns(vec![
            ("a", vec![1i64, 2].into()),
            ("b", vec![3i64, 4].into()),
        ])
        .unwrap();
        let replaced = df.with_column("a", vec![0.5, 1.5].into()).unwrap();
        assert_eq!(replaced.column_names(), &["a", "b"]);
        assert_eq!(replaced.column_type("a").unwrap(), ColumnType::Float64);
        // the input is unchanged
        assert_eq!(df.column_type("a").unwrap(), ColumnType::Int64);
    }
}
