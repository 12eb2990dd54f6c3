//! Wide/long reshaping

use std::collections::HashMap;

use super::select::{resolve_selectors, Selector};
use super::DataFrame;
use crate::column::{Column, ColumnType, StringColumn};
use crate::core::{DataValue, GroupKey};
use crate::error::{Error, Result};

impl DataFrame {
    /// Collapses the selected columns into key/value pairs (wide to long).
    ///
    /// Each input row yields one output row per gathered column, in row-major
    /// order: all gathered values of row 0, then row 1, and so on. The result
    /// holds the non-gathered columns in their original order, then a string
    /// column `key` with the gathered column names, then `value` with their
    /// values. Int64 and Float64 columns gather into Float64; any other mix
    /// of types fails with `ColumnCountMismatch`.
    ///
    /// ```
    /// use tidyrs::{DataFrame, Selector};
    ///
    /// let wide = DataFrame::from_columns(vec![
    ///     ("country", vec!["US", "CA"].into()),
    ///     ("2010", vec![7000i64, 6500].into()),
    ///     ("2015", vec![3000i64, 4500].into()),
    /// ])
    /// .unwrap();
    ///
    /// let long = wide
    ///     .gather("year", "n", &[Selector::name("2010"), Selector::name("2015")])
    ///     .unwrap();
    /// assert_eq!(long.row_count(), 4);
    /// assert_eq!(long.column_names(), &["country", "year", "n"]);
    /// ```
    pub fn gather(&self, key: &str, value: &str, selectors: &[Selector]) -> Result<DataFrame> {
        let gathered = resolve_selectors(self, selectors)?;
        if gathered.is_empty() {
            return Err(Error::InvalidInput(
                "gather needs at least one column to collapse".to_string(),
            ));
        }

        let kept: Vec<usize> = (0..self.column_count())
            .filter(|i| !gathered.contains(i))
            .collect();

        if key == value {
            return Err(Error::DuplicateColumnName(key.to_string()));
        }
        for &i in &kept {
            let (name, _) = self.column_at(i)?;
            if name == key || name == value {
                return Err(Error::DuplicateColumnName(name.to_string()));
            }
        }

        let gathered_columns = gathered
            .iter()
            .map(|&i| self.column_at(i))
            .collect::<Result<Vec<_>>>()?;

        let mut value_type: Option<ColumnType> = None;
        for (name, column) in &gathered_columns {
            let column_type = column.column_type();
            value_type = match value_type {
                None => Some(column_type),
                Some(current) => match current.common_type(column_type) {
                    Some(common) => Some(common),
                    None => {
                        return Err(Error::ColumnCountMismatch(format!(
                            "column `{}` is {} but earlier gathered columns are {}",
                            name, column_type, current
                        )))
                    }
                },
            };
        }
        let value_type = value_type.unwrap_or(ColumnType::Float64);

        let width = gathered_columns.len();
        let source_rows: Vec<usize> = (0..self.row_count())
            .flat_map(|row| std::iter::repeat(row).take(width))
            .collect();

        let mut key_values = Vec::with_capacity(source_rows.len());
        let mut values = Vec::with_capacity(source_rows.len());
        for row in 0..self.row_count() {
            for (name, column) in &gathered_columns {
                key_values.push(name.to_string());
                values.push(column.value(row));
            }
        }

        let mut result = DataFrame::with_row_count(source_rows.len());
        for &i in &kept {
            let (name, column) = self.column_at(i)?;
            result.add_column(name, column.take(&source_rows))?;
        }
        result.add_column(key, Column::String(StringColumn::new(key_values)))?;
        result.add_column(value, Column::from_values(value_type, values)?)?;

        let group_keys = self
            .group_keys()
            .iter()
            .filter(|k| result.contains_column(k))
            .cloned()
            .collect();
        result.set_group_keys(group_keys);

        log::debug!(
            "gather {} columns into `{}`/`{}`: {} -> {} rows",
            width,
            key,
            value,
            self.row_count(),
            result.row_count()
        );
        Ok(result)
    }

    /// Spreads a key/value pair across columns (long to wide); the inverse
    /// of [`DataFrame::gather`].
    ///
    /// Every other column identifies an output row. Distinct identifier
    /// combinations become rows and distinct keys become columns, both in
    /// order of first appearance. A repeated (identifier, key) pair fails with
    /// `DuplicateKey`. Cells with no input row hold `fill`, or missing.
    pub fn spread(&self, key: &str, value: &str, fill: Option<DataValue>) -> Result<DataFrame> {
        let key_column = self.column(key)?;
        let value_column = self.column(value)?;
        let value_type = value_column.column_type();

        let id_columns: Vec<(&str, &Column)> = self
            .columns()
            .filter(|(name, _)| *name != key && *name != value)
            .collect();

        let mut new_names: Vec<String> = Vec::new();
        let mut name_index: HashMap<String, usize> = HashMap::new();
        let mut id_rows: Vec<usize> = Vec::new();
        let mut id_index: HashMap<GroupKey, usize> = HashMap::new();
        let mut cells: HashMap<(usize, usize), usize> = HashMap::new();

        for row in 0..self.row_count() {
            let name = key_column.value(row).to_string();
            let column = *name_index.entry(name.clone()).or_insert_with(|| {
                new_names.push(name.clone());
                new_names.len() - 1
            });

            let id = GroupKey(id_columns.iter().map(|(_, c)| c.value(row)).collect());
            let out_row = match id_index.get(&id) {
                Some(&r) => r,
                None => {
                    id_rows.push(row);
                    id_index.insert(id.clone(), id_rows.len() - 1);
                    id_rows.len() - 1
                }
            };

            if cells.insert((out_row, column), row).is_some() {
                return Err(Error::DuplicateKey(format!(
                    "key `{}` appears more than once for row {}",
                    name, id
                )));
            }
        }

        for name in &new_names {
            if id_columns.iter().any(|(id, _)| id == name) {
                return Err(Error::DuplicateColumnName(name.clone()));
            }
        }

        let mut result = DataFrame::with_row_count(id_rows.len());
        for (name, column) in &id_columns {
            result.add_column(*name, column.take(&id_rows))?;
        }

        let fill = fill.unwrap_or(DataValue::Na);
        for (column_index, name) in new_names.iter().enumerate() {
            let values = (0..id_rows.len())
                .map(|out_row| match cells.get(&(out_row, column_index)) {
                    Some(&row) => value_column.value(row),
                    None => fill.clone(),
                })
                .collect();
            result.add_column(name.clone(), Column::from_values(value_type, values)?)?;
        }

        let group_keys = self
            .group_keys()
            .iter()
            .filter(|k| result.contains_column(k))
            .cloned()
            .collect();
        result.set_group_keys(group_keys);

        log::debug!(
            "spread `{}`/`{}` into {} columns: {} -> {} rows",
            key,
            value,
            new_names.len(),
            self.row_count(),
            result.row_count()
        );
        Ok(result)
    }
}
