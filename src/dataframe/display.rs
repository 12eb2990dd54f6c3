use std::fmt;

use super::DataFrame;
use crate::column::ColumnType;

/// Rows rendered before the output is truncated
const MAX_DISPLAY_ROWS: usize = 20;

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DataFrame: {} rows x {} columns",
            self.row_count(),
            self.column_count()
        )?;
        if self.is_grouped() {
            let groups = self.groups().map(|g| g.group_count()).unwrap_or(0);
            writeln!(f, "Groups: {} [{}]", self.group_keys().join(", "), groups)?;
        }
        if self.column_count() == 0 {
            return Ok(());
        }

        let shown = self.row_count().min(MAX_DISPLAY_ROWS);

        let mut rendered: Vec<(Vec<String>, usize, bool)> = Vec::with_capacity(self.column_count());
        for (name, column) in self.columns() {
            let cells: Vec<String> = (0..shown).map(|row| column.value(row).to_string()).collect();
            let width = cells
                .iter()
                .map(|c| c.chars().count())
                .chain([name.chars().count(), column.column_type().label().len()])
                .max()
                .unwrap_or(0);
            let right_align = column.column_type() != ColumnType::String;
            rendered.push((cells, width, right_align));
        }

        let write_row = |f: &mut fmt::Formatter<'_>, cells: Vec<&str>| -> fmt::Result {
            for (i, (cell, (_, width, right))) in cells.iter().zip(&rendered).enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                if *right {
                    write!(f, "{:>width$}", cell, width = *width)?;
                } else {
                    write!(f, "{:<width$}", cell, width = *width)?;
                }
            }
            writeln!(f)
        };

        write_row(f, self.column_names().iter().map(String::as_str).collect())?;
        let labels: Vec<&str> = self.columns().map(|(_, c)| c.column_type().label()).collect();
        write_row(f, labels)?;
        for row in 0..shown {
            write_row(f, rendered.iter().map(|(cells, _, _)| cells[row].as_str()).collect())?;
        }

        if self.row_count() > shown {
            writeln!(f, "… {} more rows", self.row_count() - shown)?;
        }
        Ok(())
    }
}
