use std::collections::HashMap;

use crate::core::GroupKey;
use crate::dataframe::DataFrame;
use crate::error::Result;

/// Partition of a table's rows by the values of its grouping columns.
///
/// Groups are ordered ascending by key tuple (missing key values last), and
/// the row indices within each group keep table order. An ungrouped table is
/// a single group holding every row.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    /// Grouping column names
    key_names: Vec<String>,

    /// One key per group, sorted
    keys: Vec<GroupKey>,

    /// Row indices of each group, parallel to `keys`
    groups: Vec<Vec<usize>>,
}

impl GroupIndex {
    /// Builds the partition for the table's current grouping
    pub fn new(df: &DataFrame) -> Result<Self> {
        Self::by(df, df.group_keys())
    }

    /// Builds the partition for an explicit set of key columns
    pub fn by<S: AsRef<str>>(df: &DataFrame, key_names: &[S]) -> Result<Self> {
        let key_names: Vec<String> = key_names.iter().map(|s| s.as_ref().to_string()).collect();

        if key_names.is_empty() {
            return Ok(GroupIndex {
                key_names,
                keys: vec![GroupKey(Vec::new())],
                groups: vec![(0..df.row_count()).collect()],
            });
        }

        let key_columns = key_names
            .iter()
            .map(|name| df.column(name))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();
        for row in 0..df.row_count() {
            let key = GroupKey(key_columns.iter().map(|c| c.value(row)).collect());
            groups.entry(key).or_default().push(row);
        }

        let mut entries: Vec<(GroupKey, Vec<usize>)> = groups.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let (keys, groups): (Vec<GroupKey>, Vec<Vec<usize>>) = entries.into_iter().unzip();

        log::trace!("grouped {} rows into {:?} groups", df.row_count(), key_names);

        Ok(GroupIndex {
            key_names,
            keys,
            groups,
        })
    }

    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// Row indices of the group at `index`
    pub fn rows(&self, index: usize) -> &[usize] {
        &self.groups[index]
    }

    /// Size of each group, in group order
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Vec::len).collect()
    }

    /// Iterates `(key, rows)` pairs in group order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &[usize])> {
        self.keys
            .iter()
            .zip(self.groups.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataValue;

    #[test]
    fn groups_sorted_by_key() {
        let df = DataFrame::from_columns(vec![
            ("g", vec!["b", "a", "b", "c"].into()),
            ("x", vec![1i64, 2, 3, 4].into()),
        ])
        .unwrap();
        let index = GroupIndex::by(&df, &["g"]).unwrap();
        assert_eq!(index.group_count(), 3);
        assert_eq!(index.keys()[0], GroupKey(vec![DataValue::from("a")]));
        assert_eq!(index.rows(1), &[0, 2]);
        assert_eq!(index.sizes(), vec![1, 2, 1]);
    }

    #[test]
    fn ungrouped_is_one_group() {
        let df = DataFrame::from_columns(vec![("x", vec![1i64, 2].into())]).unwrap();
        let index = GroupIndex::new(&df).unwrap();
        assert_eq!(index.group_count(), 1);
        assert_eq!(index.rows(0), &[0, 1]);
    }

    #[test]
    fn missing_keys_form_last_group() {
        let df = DataFrame::from_columns(vec![(
            "g",
            vec![None, Some(2i64), Some(1)].into(),
        )])
        .unwrap();
        let index = GroupIndex::by(&df, &["g"]).unwrap();
        assert!(index.keys()[2].values()[0].is_na());
        assert_eq!(index.rows(2), &[0]);
    }
}
