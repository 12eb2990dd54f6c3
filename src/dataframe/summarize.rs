//! Group reduction

use super::mutate::column_from_values;
use super::DataFrame;
use crate::column::Column;
use crate::error::{Error, Result};
use crate::expr::{AggExpr, AggFunc};
use crate::groupby::GroupIndex;

impl DataFrame {
    /// Reduces each group to one row.
    ///
    /// The result holds the grouping columns (one row per group, ascending
    /// by key) followed by one column per aggregate, in definition order. An
    /// ungrouped table yields exactly one row. The result is grouped by all
    /// but the last of the input's grouping columns.
    ///
    /// Every aggregate except `n()` must declare its missing-value policy,
    /// including aggregates nested in another aggregate's input. Otherwise
    /// this fails with `AmbiguousMissingPolicy` before any group is
    /// evaluated, even when the table is empty.
    pub fn summarize<S: AsRef<str>>(&self, definitions: &[(S, AggExpr)]) -> Result<DataFrame> {
        let keys = self.group_keys().to_vec();

        let mut names = keys.clone();
        for (name, agg) in definitions {
            let name = name.as_ref();
            if names.iter().any(|n| n == name) {
                return Err(Error::DuplicateColumnName(name.to_string()));
            }
            names.push(name.to_string());

            agg.check_missing_policy()?;
            if let Some(input) = &agg.input {
                input.check_missing_policies()?;
                for column in input.referenced_columns() {
                    self.column_index(column)?;
                }
            }
        }

        let index = GroupIndex::new(self)?;
        let mut result = DataFrame::with_row_count(index.group_count());

        for (position, name) in keys.iter().enumerate() {
            let values = index
                .keys()
                .iter()
                .map(|key| key.values()[position].clone())
                .collect();
            let column = Column::from_values(self.column_type(name)?, values)?;
            result.add_column(name.clone(), column)?;
        }

        for (name, agg) in definitions {
            let values = index
                .iter()
                .map(|(_, rows)| agg.evaluate(self, rows))
                .collect::<Result<Vec<_>>>()?;
            let column = column_from_values(values, agg.type_hint(self))?;
            result.add_column(name.as_ref(), column)?;
        }

        let remaining = keys[..keys.len().saturating_sub(1)].to_vec();
        log::debug!(
            "summarize: {} groups by {:?}, {} aggregates",
            index.group_count(),
            keys,
            definitions.len()
        );
        result.set_group_keys(remaining);
        Ok(result)
    }

    /// Number of rows per combination of the given columns (added to the
    /// current grouping), in a column named `n`
    pub fn count<S: AsRef<str>>(&self, columns: &[S]) -> Result<DataFrame> {
        let mut keys = self.group_keys().to_vec();
        for column in columns {
            let column = column.as_ref();
            self.column_index(column)?;
            if !keys.iter().any(|k| k == column) {
                keys.push(column.to_string());
            }
        }

        let mut grouped = self.clone();
        grouped.set_group_keys(keys);
        let mut counted = grouped.summarize(&[("n", AggExpr::new(AggFunc::N, None))])?;
        counted.set_group_keys(self.group_keys().to_vec());
        Ok(counted)
    }
}
