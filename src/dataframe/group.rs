use super::DataFrame;
use crate::error::Result;
use crate::groupby::GroupIndex;

impl DataFrame {
    /// Tags the table with grouping columns, replacing any existing grouping.
    ///
    /// Data and row order are unchanged; repeated names are ignored.
    pub fn group_by<S: AsRef<str>>(&self, columns: &[S]) -> Result<DataFrame> {
        let mut keys: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            self.column_index(column)?;
            if !keys.iter().any(|k| k == column) {
                keys.push(column.to_string());
            }
        }

        log::debug!("group_by {:?}", keys);
        let mut df = self.clone();
        df.set_group_keys(keys);
        Ok(df)
    }

    /// Removes the grouping
    pub fn ungroup(&self) -> DataFrame {
        let mut df = self.clone();
        df.set_group_keys(Vec::new());
        df
    }

    /// The row partition induced by the current grouping
    pub fn groups(&self) -> Result<GroupIndex> {
        GroupIndex::new(self)
    }
}
