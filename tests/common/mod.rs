//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tidyrs::prelude::*;

/// Case counts per country, one column per year
pub fn wide_cases() -> DataFrame {
    DataFrame::from_columns(vec![
        ("country", vec!["US", "CA", "DE"].into()),
        ("2010", vec![7000i64, 6500, 5000].into()),
        ("2015", vec![3000i64, 4500, 6000].into()),
    ])
    .unwrap()
}

/// Long-format measurements with missing values
///
/// | site | year | temp | rain |
/// |------|------|------|------|
/// | a    | 2020 | 10.5 | 3    |
/// | b    | 2020 | NA   | 5    |
/// | a    | 2021 | 12.0 | NA   |
/// | b    | 2021 | 8.0  | 7    |
/// | a    | 2022 | 11.5 | 1    |
pub fn measurements() -> DataFrame {
    DataFrame::from_columns(vec![
        ("site", vec!["a", "b", "a", "b", "a"].into()),
        ("year", vec![2020i64, 2020, 2021, 2021, 2022].into()),
        (
            "temp",
            vec![Some(10.5), None, Some(12.0), Some(8.0), Some(11.5)].into(),
        ),
        (
            "rain",
            vec![Some(3i64), Some(5), None, Some(7), Some(1)].into(),
        ),
    ])
    .unwrap()
}

/// All values of a column, top to bottom
pub fn values(df: &DataFrame, name: &str) -> Vec<DataValue> {
    df.column(name).unwrap().values()
}

/// Writes `contents` to `name` inside a fresh temporary directory; the
/// directory lives as long as the returned guard
pub fn temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    (dir, path)
}
