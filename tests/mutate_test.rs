mod common;

use common::{measurements, values};
use tidyrs::prelude::*;

#[test]
fn test_mutate_definitions_see_earlier_ones() {
    let _ = env_logger::try_init();
    let df = measurements();

    let result = df
        .mutate(&[
            ("offset", col("year") - 2020),
            ("double_offset", col("offset") * 2),
        ])
        .unwrap();

    assert_eq!(
        result.column_names(),
        &["site", "year", "temp", "rain", "offset", "double_offset"]
    );
    assert_eq!(result.column_type("offset").unwrap(), ColumnType::Int64);
    assert_eq!(
        values(&result, "double_offset"),
        [0i64, 0, 2, 2, 4].map(DataValue::Int64).to_vec()
    );
}

#[test]
fn test_mutate_replaces_in_place() {
    let df = measurements();
    let result = df.mutate(&[("temp", col("temp") * 2.0)]).unwrap();

    assert_eq!(result.column_names(), df.column_names());
    assert_eq!(
        values(&result, "temp"),
        vec![
            DataValue::Float64(21.0),
            DataValue::Na,
            DataValue::Float64(24.0),
            DataValue::Float64(16.0),
            DataValue::Float64(23.0),
        ]
    );
    // The input table is unchanged
    assert_eq!(values(&df, "temp")[0], DataValue::Float64(10.5));
}

#[test]
fn test_mutate_grouped_aggregates_and_windows() {
    let grouped = measurements().group_by(&["site"]).unwrap();
    let result = grouped
        .mutate(&[("site_rows", Expr::from(n())), ("visit", row_number())])
        .unwrap();

    assert_eq!(
        values(&result, "site_rows"),
        [3i64, 2, 3, 2, 3].map(DataValue::Int64).to_vec()
    );
    assert_eq!(
        values(&result, "visit"),
        [1i64, 1, 2, 2, 3].map(DataValue::Int64).to_vec()
    );
    assert_eq!(result.group_keys(), &["site"]);
    assert_eq!(result.row_count(), 5);
}

#[test]
fn test_mutate_lag_and_cumsum() {
    let df = measurements();
    let result = df
        .mutate(&[
            ("previous", lag(col("rain"), 1)),
            ("running", cumsum(col("year") - 2019)),
        ])
        .unwrap();

    assert_eq!(
        values(&result, "previous"),
        vec![
            DataValue::Na,
            DataValue::Int64(3),
            DataValue::Int64(5),
            DataValue::Na,
            DataValue::Int64(7),
        ]
    );
    assert_eq!(
        values(&result, "running"),
        [1i64, 2, 4, 6, 9].map(DataValue::Int64).to_vec()
    );
}

#[test]
fn test_mutate_if_else_and_coalesce() {
    let df = measurements();
    let result = df
        .mutate(&[
            ("hot", if_else(col("temp").gt(11.0), "yes", "no")),
            ("rain_filled", coalesce(vec![col("rain"), lit(0)])),
        ])
        .unwrap();

    assert_eq!(
        values(&result, "hot"),
        vec![
            DataValue::from("no"),
            DataValue::Na,
            DataValue::from("yes"),
            DataValue::from("no"),
            DataValue::from("yes"),
        ]
    );
    assert_eq!(result.column("rain_filled").unwrap().null_count(), 0);
}

#[test]
fn test_mutate_division_by_zero_is_missing() {
    let result = measurements().mutate(&[("ratio", col("rain") / 0)]).unwrap();
    assert_eq!(result.column("ratio").unwrap().null_count(), 5);
}

#[test]
fn test_mutate_all_missing_uses_expression_type() {
    let df = measurements();

    let untyped = df.mutate(&[("nothing", na())]).unwrap();
    assert_eq!(untyped.column_type("nothing").unwrap(), ColumnType::Float64);

    // A single row has no predecessor, so the lag is missing everywhere
    let lagged = df
        .filter(&col("temp").is_na())
        .unwrap()
        .mutate(&[("previous_site", lag(col("site"), 1))])
        .unwrap();
    assert_eq!(lagged.column("previous_site").unwrap().null_count(), 1);
    assert_eq!(lagged.column_type("previous_site").unwrap(), ColumnType::String);
}

#[test]
fn test_mutate_requires_missing_policy() {
    let result = measurements().mutate(&[("avg", Expr::from(mean(col("temp"))))]);
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));
    // Omitting the policy is an error even when there is nothing to aggregate
    let empty = measurements().filter(&col("year").gt(3000)).unwrap();
    let result = empty.mutate(&[("avg", Expr::from(mean(col("temp"))))]);
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));

    let grouped = empty.group_by(&["site"]).unwrap();
    let result = grouped.mutate(&[("centered", col("temp") - mean(col("temp")))]);
    assert!(matches!(result, Err(Error::AmbiguousMissingPolicy(_))));
}

#[test]
fn test_mutate_unknown_column() {
    let result = measurements().mutate(&[("x", col("humidity") + 1)]);
    assert!(matches!(result, Err(Error::UnknownColumn(_))));
}

#[test]
fn test_mutate_string_concatenation() {
    let df = measurements();
    let result = df
        .mutate(&[("tag", col("site") + "-" + col("year").cast(ColumnType::String))])
        .unwrap();
    assert_eq!(values(&result, "tag")[2], DataValue::from("a-2021"));
}
