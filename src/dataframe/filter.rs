//! Row subsetting

use std::collections::HashSet;

use super::select::{resolve_selectors, Selector};
use super::DataFrame;
use crate::core::{DataValue, GroupKey};
use crate::error::{Error, Result};
use crate::expr::Expr;

impl DataFrame {
    /// Keeps the rows where `predicate` is true.
    ///
    /// Rows where it is false or missing are dropped; surviving rows keep
    /// their relative order. On a grouped table aggregates in the predicate
    /// are computed per group. A predicate producing anything other than
    /// logical values fails with `TypeMismatch`.
    pub fn filter(&self, predicate: &Expr) -> Result<DataFrame> {
        let values = self.evaluate_by_group(predicate)?;

        let mut keep = Vec::new();
        for (row, value) in values.iter().enumerate() {
            match value {
                DataValue::Boolean(true) => keep.push(row),
                DataValue::Boolean(false) | DataValue::Na => {}
                other => {
                    return Err(Error::TypeMismatch(format!(
                        "filter predicate `{}` must be logical, found {} value `{}`",
                        predicate,
                        other.type_name(),
                        other
                    )))
                }
            }
        }

        log::debug!(
            "filter `{}`: kept {} of {} rows",
            predicate,
            keep.len(),
            self.row_count()
        );
        Ok(self.take_rows(&keep))
    }

    /// Rows `offset..offset + length`, clamped to the table
    pub fn slice(&self, offset: usize, length: usize) -> DataFrame {
        let start = offset.min(self.row_count());
        let end = start.saturating_add(length).min(self.row_count());
        let rows: Vec<usize> = (start..end).collect();
        self.take_rows(&rows)
    }

    /// The first `n` rows
    pub fn head(&self, n: usize) -> DataFrame {
        self.slice(0, n)
    }

    /// Keeps the first row of each distinct combination of the selected
    /// columns (all columns when `selectors` is empty); every column is kept
    pub fn distinct(&self, selectors: &[Selector]) -> Result<DataFrame> {
        let indices = if selectors.is_empty() {
            (0..self.column_count()).collect()
        } else {
            resolve_selectors(self, selectors)?
        };
        let columns = indices
            .iter()
            .map(|&i| self.column_at(i).map(|(_, c)| c))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut keep = Vec::new();
        for row in 0..self.row_count() {
            let key = GroupKey(columns.iter().map(|c| c.value(row)).collect());
            if seen.insert(key) {
                keep.push(row);
            }
        }

        log::debug!("distinct: {} of {} rows", keep.len(), self.row_count());
        Ok(self.take_rows(&keep))
    }
}
