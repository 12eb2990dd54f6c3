//! Column derivation

use super::DataFrame;
use crate::column::{infer_type, Column, ColumnType};
use crate::core::DataValue;
use crate::error::Result;
use crate::expr::Expr;
use crate::groupby::GroupIndex;

/// Builds a column from evaluated values; `hint` decides the type when
/// every value is missing
pub(crate) fn column_from_values(values: Vec<DataValue>, hint: Option<ColumnType>) -> Result<Column> {
    let column_type = infer_type(&values)?
        .or(hint)
        .unwrap_or(ColumnType::Float64);
    Column::from_values(column_type, values)
}

impl DataFrame {
    /// Evaluates `expr` once per group and scatters the results back into
    /// table row order
    pub(crate) fn evaluate_by_group(&self, expr: &Expr) -> Result<Vec<DataValue>> {
        expr.check_missing_policies()?;
        for name in expr.referenced_columns() {
            self.column_index(name)?;
        }

        if !self.is_grouped() {
            let rows: Vec<usize> = (0..self.row_count()).collect();
            return expr.evaluate(self, &rows);
        }

        let index = GroupIndex::new(self)?;
        let mut out = vec![DataValue::Na; self.row_count()];
        for (_, rows) in index.iter() {
            let values = expr.evaluate(self, rows)?;
            for (&row, value) in rows.iter().zip(values) {
                out[row] = value;
            }
        }
        Ok(out)
    }

    /// Adds or replaces columns, one definition at a time.
    ///
    /// Each definition sees the columns produced by the ones before it. A
    /// name that already exists is replaced in place; a new name is appended.
    /// Row count, row order and grouping are unchanged. On a grouped table
    /// aggregates inside an expression are computed per group.
    pub fn mutate<S: AsRef<str>>(&self, definitions: &[(S, Expr)]) -> Result<DataFrame> {
        let mut df = self.clone();
        for (name, expr) in definitions {
            let name = name.as_ref();
            let values = df.evaluate_by_group(expr)?;
            let column = column_from_values(values, expr.type_hint(&df))?;
            log::debug!("mutate: {} = {} ({})", name, expr, column.column_type());
            df = df.with_column(name, column)?;
        }
        Ok(df)
    }
}
